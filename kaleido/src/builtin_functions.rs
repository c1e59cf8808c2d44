use kaleido_vm::Vm;
use std::fmt;
use std::io::{self, Write};
use tracing::warn;

/// Registers the native functions every session provides.
pub fn register_builtin_functions(vm: &mut Vm) {
    vm.add_native_fn("putchard", &putchard, 1);
    vm.add_native_fn("printd", &printd, 1);
}

/// Writes the character with code point `args[0]` to stdout.
pub fn putchard(args: &[f64]) -> f64 {
    let c = char::from_u32(args[0] as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
    write_output(&mut io::stdout(), format_args!("{}", c));
    0.0
}

/// Writes `args[0]` followed by a newline to stdout.
pub fn printd(args: &[f64]) -> f64 {
    write_output(&mut io::stdout(), format_args!("{}\n", args[0]));
    0.0
}

/// Writes and flushes `output`. A failed write is logged and reported as `false`;
/// the natives return `0.0` either way.
fn write_output(out: &mut impl Write, output: fmt::Arguments<'_>) -> bool {
    match out.write_fmt(output).and_then(|_| out.flush()) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "failed to write output of native function");
            false
        }
    }
}
