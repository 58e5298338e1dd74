//! Whole-program behavior through the public API.

use std::thread;

use almond::token::TokenKind;
use almond::value::Value;
use almond::{tokenize, AlmondError, Diagnostics, Interpreter, RuntimeError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn run(source: &str) -> (String, Result<(), AlmondError>) {
    let mut raw_output: Vec<u8> = Vec::new();
    let result = Interpreter::new(&mut raw_output).eval(source);
    let output = String::from_utf8(raw_output).expect("cannot convert output to string");
    (output, result)
}

fn output_of(source: &str) -> String {
    let (output, result) = run(source);
    if let Err(e) = result {
        panic!("unexpected fault in {:?}: {}", source, e);
    }
    output
}

#[test]
fn increments_number() {
    assert_eq!(output_of("var x = 41; print x + 1;"), "42\n");
}

#[test]
fn inner_block_shadows_outer_variable() {
    assert_eq!(
        output_of("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn closure_keeps_its_own_counter() {
    let src = r#"
        fn make() {
            var i = 0;
            fn inc() {
                i = i + 1;
                return i;
            }
            return inc;
        }
        var c = make();
        print c();
        print c();
        var d = make();
        print d();
        print c();
    "#;
    assert_eq!(output_of(src), "1\n2\n1\n3\n");
}

#[test]
fn recursive_fibonacci() {
    let src = r#"
        fn fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(15);
    "#;
    assert_eq!(output_of(src), "610\n");
}

#[test]
fn clock_rejects_arguments() {
    let (output, result) = run("print 1;\nclock(1);");
    assert_eq!(output, "1\n");
    match result {
        Err(AlmondError::Runtime(RuntimeError::Arity {
            expected: 0,
            got: 1,
            line: 2,
        })) => {}
        r => panic!("unexpected result: {:?}", r),
    }
}

#[test]
fn clock_increases() {
    assert_eq!(
        output_of("var a = clock(); sleep(2); print clock() > a;"),
        "true\n"
    );
}

#[test]
fn for_matches_equivalent_while() {
    let for_output = output_of("for (var i = 0; i < 4; i = i + 1) print i * i;");
    let while_output = output_of("{ var i = 0; while (i < 4) { print i * i; i = i + 1; } }");
    assert_eq!(for_output, "0\n1\n4\n9\n");
    assert_eq!(for_output, while_output);
}

#[test]
fn for_without_clauses_runs_until_return() {
    let src = r#"
        fn first_square_above(n) {
            var i = 0;
            for (;;) {
                if (i * i > n) return i;
                i = i + 1;
            }
        }
        print first_square_above(50);
    "#;
    assert_eq!(output_of(src), "8\n");
}

#[test]
fn unterminated_string_is_syntax_fault() {
    let (output, result) = run("print \"abc");
    assert_eq!(output, "");
    let e = result.unwrap_err();
    assert_eq!(e.exit_code(), 65);
    assert!(e
        .to_string()
        .contains("[line 1] Error: Unterminated string."));
}

#[test]
fn division_by_zero_is_infinite() {
    assert_eq!(output_of("print 1 / 0;"), "inf\n");
    assert_eq!(output_of("print -1 / 0;"), "-inf\n");
}

#[test]
fn logical_operators_yield_deciding_operand() {
    assert_eq!(
        output_of("print null | \"x\"; print 0 & 1; print 2 & 3; print false | 0;"),
        "x\n0\n3\n0\n"
    );
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let src = "# header\n\nprint \"a#b\"; # trailing\n";
    assert_eq!(output_of(src), "a#b\n");
}

#[test]
fn runtime_fault_keeps_prior_output() {
    let (output, result) = run("print \"before\";\nprint \"a\" + 1;\nprint \"after\";");
    assert_eq!(output, "before\n");
    let e = result.unwrap_err();
    assert_eq!(e.exit_code(), 70);
    assert_eq!(e.to_string(), "Type mismatch between string and number.\n[line 2]");
}

#[test]
fn deep_recursion_is_reported() {
    let (_, result) = run("fn f(n) { return f(n + 1); } f(0);");
    match result {
        Err(AlmondError::Runtime(RuntimeError::StackOverflow { .. })) => {}
        r => panic!("unexpected result: {:?}", r),
    }
}

/// Runs `f` on a thread whose stack matches the main thread of the binary on Linux.
fn with_main_thread_stack<F: FnOnce() + Send + 'static>(f: F) {
    thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(f)
        .expect("cannot spawn test thread")
        .join()
        .expect("test thread panicked");
}

const NESTING: usize = 10_000;

#[test]
fn deeply_nested_groupings() {
    with_main_thread_stack(|| {
        let src = format!("print {}1{};", "(".repeat(NESTING), ")".repeat(NESTING));
        assert_eq!(output_of(&src), "1\n");
    });
}

#[test]
fn deeply_nested_blocks() {
    with_main_thread_stack(|| {
        let src = format!("{}print 1;{}", "{".repeat(NESTING), "}".repeat(NESTING));
        assert_eq!(output_of(&src), "1\n");
    });
}

#[test]
fn long_unary_chain() {
    with_main_thread_stack(|| {
        let src = format!("print {}1;", "-".repeat(NESTING));
        assert_eq!(output_of(&src), "1\n");
        let src = format!("print {}0;", "!".repeat(NESTING + 1));
        assert_eq!(output_of(&src), "true\n");
    });
}

#[test]
fn long_assignment_chain() {
    with_main_thread_stack(|| {
        let src = format!("var a; {}7; print a;", "a = ".repeat(NESTING));
        assert_eq!(output_of(&src), "7\n");
    });
}

#[test]
fn diagnostics_reset_between_prompt_lines() {
    let mut raw_output: Vec<u8> = Vec::new();
    let mut interp = Interpreter::new(&mut raw_output);
    let mut diags = Diagnostics::new();

    interp.run("var x = ;", &mut diags);
    assert!(diags.had_syntax_error());
    diags.reset_syntax();

    interp.run("var x = 3; print x;", &mut diags);
    assert!(!diags.had_syntax_error());
    assert!(!diags.had_runtime_error());
    drop(interp);
    assert_eq!(raw_output, b"3\n");
}

proptest! {
    #[test]
    fn decimal_literal_is_one_number_token(int in 0u32..1_000_000, frac in "[0-9]{1,6}") {
        let source = format!("{}.{}", int, frac);
        let mut diags = Diagnostics::new();
        let tokens = tokenize(&source, &mut diags);
        prop_assert!(!diags.had_syntax_error());
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].kind, TokenKind::Number);
        let expected: f64 = source.parse().unwrap();
        prop_assert_eq!(&tokens[0].literal, &Value::Number(expected));
        prop_assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn integer_literal_is_one_number_token(n in 0u64..u64::from(u32::MAX)) {
        let source = n.to_string();
        let mut diags = Diagnostics::new();
        let tokens = tokenize(&source, &mut diags);
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(&tokens[0].literal, &Value::Number(n as f64));
    }

    #[test]
    fn string_literal_keeps_its_text(text in "[^\"]{0,40}") {
        let source = format!("\"{}\"", text);
        let mut diags = Diagnostics::new();
        let tokens = tokenize(&source, &mut diags);
        prop_assert!(!diags.had_syntax_error());
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].kind, TokenKind::String);
        prop_assert_eq!(&tokens[0].literal, &Value::String(text));
    }

    #[test]
    fn printed_sum_matches_host_arithmetic(a in -1000i32..1000, b in -1000i32..1000) {
        let output = output_of(&format!("print {} + {};", a, b));
        prop_assert_eq!(output, format!("{}\n", a + b));
    }
}
