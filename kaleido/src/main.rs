use anyhow::{bail, Context};
use clap::{Arg, ArgAction, Command};
use console::style;
use kaleido::{Outcome, Session, SessionOptions};
use kaleido_source::Source;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Command::new("kaleido")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles and runs Kaleidoscope programs")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Program to run. Starts an interactive session when omitted"),
        )
        .arg(
            Arg::new("emit-ir")
                .long("emit-ir")
                .action(ArgAction::SetTrue)
                .help("Print the IR of every generated function to stderr"),
        )
        .arg(
            Arg::new("no-exec")
                .long("no-exec")
                .action(ArgAction::SetTrue)
                .help("Generate code without running top-level expressions"),
        )
        .get_matches();

    let options = SessionOptions {
        emit_ir: args.get_flag("emit-ir"),
        execute: !args.get_flag("no-exec"),
    };
    let mut session = Session::new(options);

    match args.get_one::<String>("file") {
        Some(path) => run_file(&mut session, path),
        None => repl(&mut session),
    }
}

fn run_file(session: &mut Session, path: &str) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let source = Source::new(&content);
    let outcomes = session.run(&source);
    print_outcomes(&outcomes);
    report_errors(&source);

    let errors = source.errors.len();
    if errors > 0 {
        bail!("{} statement(s) of {} failed", errors, path);
    }
    Ok(())
}

/// Reads lines until the buffered input ends with `;`, then runs it.
fn repl(session: &mut Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.trim().is_empty() {
            "ready> "
        } else {
            "...> "
        };
        print!("{}", prompt);
        stdout.flush().context("Failed to write prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            // end of input runs whatever is left
            if !buffer.trim().is_empty() {
                run_input(session, &buffer);
            }
            println!();
            return Ok(());
        }

        buffer.push_str(&line);
        if buffer.trim_end().ends_with(';') {
            run_input(session, &buffer);
            buffer.clear();
        }
    }
}

fn run_input(session: &mut Session, input: &str) {
    let source = Source::new(input);
    let outcomes = session.run(&source);
    print_outcomes(&outcomes);
    report_errors(&source);
}

fn print_outcomes(outcomes: &[Outcome]) {
    for outcome in outcomes {
        match outcome {
            Outcome::Evaluated(value) => println!("Evaluated to {}", value),
            Outcome::Defined(name) => eprintln!("{}", style(format!("defined {}", name)).dim()),
            Outcome::Declared(name) => eprintln!("{}", style(format!("declared {}", name)).dim()),
        }
    }
}

fn report_errors(source: &Source) {
    for diagnostic in source.errors.diagnostics() {
        let (line, col) = source.line_col(diagnostic.span().start);
        eprintln!(
            "{} {}:{}: {}",
            style("error:").red().bold(),
            line,
            col,
            diagnostic.message()
        );
    }
}
