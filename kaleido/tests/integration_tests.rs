use kaleido::{interpret, Outcome, Session, SessionOptions};
use kaleido_source::Source;

/// Runs `source` and returns the value of every evaluated expression.
/// Panics if any statement fails.
fn evaluate(source: &str) -> Vec<f64> {
    let (outcomes, errors) = interpret(source);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            Outcome::Evaluated(value) => Some(value),
            _ => None,
        })
        .collect()
}

#[test]
fn smoke_empty() {
    assert_eq!(interpret(""), (Vec::new(), Vec::new()));
    assert_eq!(interpret(";;"), (Vec::new(), Vec::new()));
    assert_eq!(interpret("# only a comment\n"), (Vec::new(), Vec::new()));
}

#[test]
fn precedence() {
    assert_eq!(evaluate("1+2*3"), vec![7.0]);
    assert_eq!(evaluate("(1+2)*3"), vec![9.0]);
    assert_eq!(evaluate("10-4-3"), vec![3.0]);
    assert_eq!(evaluate("1 < 2 + 3 * 4 - 20"), vec![0.0]);
}

#[test]
fn shadowing() {
    assert_eq!(evaluate("var x = 1 in (var x = x+1 in x) + x"), vec![3.0]);
    assert_eq!(evaluate("var a = 1, b = a + 1, a = b * 10 in a + b"), vec![22.0]);
    assert_eq!(evaluate("var x in x"), vec![0.0]);
}

#[test]
fn parameters_are_mutable() {
    assert_eq!(evaluate("def f(x) (x = x * 2) + x; f(3)"), vec![12.0]);
}

#[test]
fn loop_iteration_count() {
    let source = "
        def count(n) var c in (for i = 1, i < n in c = c + 1) + c;
        count(4);
        def countstep() var c in (for i = 1, i < 10, 2 in c = c + 1) + c;
        countstep();
        for i = 1, i < 4 in 0;
    ";
    assert_eq!(evaluate(source), vec![3.0, 5.0, 0.0]);
}

#[test]
fn loop_restores_outer_binding() {
    let source = "def f(i) (for i = 10, i < 12 in 0) + i; f(3)";
    assert_eq!(evaluate(source), vec![3.0]);
}

#[test]
fn custom_binary_operator() {
    let source = "
        def binary > 10 (a b) b < a;
        3 > 2;
        2 > 3;
        1 + 2 > 2;
    ";
    assert_eq!(evaluate(source), vec![1.0, 0.0, 1.0]);
}

#[test]
fn custom_unary_operator() {
    let source = "
        def unary ! (v) if v then 0 else 1;
        def unary - (v) 0 - v;
        !0;
        !!3;
        -(2 * 3) + 10;
    ";
    assert_eq!(evaluate(source), vec![1.0, 1.0, 4.0]);
}

#[test]
fn default_operator_precedence() {
    // `:` binds at 30: tighter than `+`, looser than `*`.
    let source = "
        def binary : (a b) a * 100 + b;
        1 + 2 : 3 * 2;
    ";
    assert_eq!(evaluate(source), vec![207.0]);
}

#[test]
fn sequencing_operator() {
    let source = "
        def binary : 1 (x y) y;
        def f(x) x = x + 1 : x = x * 2 : x;
        f(4);
    ";
    assert_eq!(evaluate(source), vec![10.0]);
}

#[test]
fn redefinition() {
    let source = "
        def f(x) x+1;
        f(1);
        def f(x) x+2;
        f(1);
    ";
    assert_eq!(evaluate(source), vec![2.0, 3.0]);
}

#[test]
fn redefinition_updates_callers() {
    let source = "
        def g(x) x;
        def f(x) g(x) * 2;
        f(5);
        def g(x) x + 1;
        f(5);
    ";
    assert_eq!(evaluate(source), vec![10.0, 12.0]);
}

#[test]
fn rollback() {
    let (outcomes, errors) = interpret(
        "
        def binary $ 15 (a b) a + unknown;
        def g(a b) a $ b;
        ",
    );
    assert!(outcomes.is_empty());
    assert_eq!(
        errors,
        vec![
            "unknown variable `unknown`".to_string(),
            "expected `;` after top-level statement, found `$`".to_string(),
        ]
    );
}

#[test]
fn operator_available_after_successful_retry() {
    let source = "
        def binary $ 15 (a b) a + unknown;
        def binary $ 15 (a b) a - b;
        10 $ 4;
    ";
    let (outcomes, errors) = interpret(source);
    assert_eq!(errors.len(), 1);
    assert_eq!(outcomes.last(), Some(&Outcome::Evaluated(6.0)));
}

#[test]
fn invalid_assignment_target() {
    let (outcomes, errors) = interpret("1 = 2; def f(x) (x + 1) = 2");
    assert!(outcomes.is_empty());
    assert_eq!(
        errors,
        vec![
            "destination of `=` must be a variable".to_string(),
            "destination of `=` must be a variable".to_string(),
        ]
    );
}

#[test]
fn mutual_recursion() {
    let source = "
        extern isodd(n);
        def iseven(n) if n < 1 then 1 else isodd(n - 1);
        def isodd(n) if n < 1 then 0 else iseven(n - 1);
        iseven(10);
        isodd(7);
        iseven(7);
    ";
    assert_eq!(evaluate(source), vec![1.0, 1.0, 0.0]);
}

#[test]
fn recursion() {
    let source = "
        def fib(x) if x < 3 then 1 else fib(x-1) + fib(x-2);
        fib(15);
    ";
    assert_eq!(evaluate(source), vec![610.0]);
}

#[test]
fn iterative_fib() {
    let source = "
        def binary : 1 (x y) y;
        def fibi(x)
          var a = 1, b = 1, c in
          (for i = 3, i < x + 1 in
            c = a + b :
            a = b :
            b = c) :
          b;
        fibi(15);
    ";
    assert_eq!(evaluate(source), vec![610.0]);
}

#[test]
fn native_functions() {
    let source = "
        extern putchard(c);
        extern printd(x);
        putchard(42);
        printd(1.5);
    ";
    assert_eq!(evaluate(source), vec![0.0, 0.0]);
}

#[test]
fn arity_errors() {
    let (_, errors) = interpret("def f(a b) a; f(1)");
    assert_eq!(
        errors,
        vec!["incorrect number of arguments passed to `f`: expected 2, found 1".to_string()]
    );

    let (_, errors) = interpret("def unary ~ (a b) a");
    assert_eq!(
        errors,
        vec!["invalid number of operands for operator: expected 1, found 2".to_string()]
    );
}

#[test]
fn precedence_out_of_range() {
    let (outcomes, errors) = interpret("def binary | 0 (a b) a; def binary | 101 (a b) a; 1 | 2");
    assert!(outcomes.is_empty());
    assert_eq!(
        errors,
        vec![
            "invalid precedence 0: must be in 1..100".to_string(),
            "invalid precedence 101: must be in 1..100".to_string(),
            "expected `;` after top-level statement, found `|`".to_string(),
        ]
    );
}

#[test]
fn errors_do_not_stop_later_statements() {
    let (outcomes, errors) = interpret("def (x) 1; foo(; 2 + 2");
    assert_eq!(outcomes, vec![Outcome::Evaluated(4.0)]);
    assert_eq!(errors.len(), 2);
}

#[test]
fn session_keeps_definitions_between_inputs() {
    let mut session = Session::new(SessionOptions::default());

    let first: Source = "def binary | 5 (a b) if a then 1 else if b then 1 else 0;".into();
    assert_eq!(session.run(&first), vec![Outcome::Defined("binary|".to_string())]);

    let second: Source = "0 | 1; 0 | 0".into();
    assert_eq!(
        session.run(&second),
        vec![Outcome::Evaluated(1.0), Outcome::Evaluated(0.0)]
    );
    assert!(first.has_no_errors() && second.has_no_errors());
}

#[test]
fn runaway_recursion_reports_call_depth() {
    let (outcomes, errors) = interpret("def forever(x) forever(x + 1); forever(0)");
    assert_eq!(outcomes, vec![Outcome::Defined("forever".to_string())]);
    assert_eq!(errors, vec!["maximum call depth of 1024 exceeded".to_string()]);
}
