use barebones::{
    backends, parse, BlockId, BlockKind, Command, Debugger, Interpreter, Program, RunError,
    MAX_VALUE,
};
use pretty_assertions::assert_eq;

fn run(program: &Program) -> Result<(), RunError> {
    Interpreter::new(program).run()
}

/// Run under the debugger with `breaks` active, feeding `console` as input.
/// Returns the console transcript.
fn debug_run(
    program: &Program,
    breaks: &[usize],
    console: &str,
) -> (Result<(), RunError>, String) {
    let mut out = Vec::new();
    let result = {
        let mut debugger = Debugger::new(console.as_bytes(), &mut out);
        for line in breaks {
            debugger.set_breakpoint(*line);
        }
        Interpreter::new(program).run_debug(&mut debugger)
    };
    (result, String::from_utf8(out).unwrap())
}

fn value(program: &Program, name: &str) -> Option<u32> {
    program.global(name).and_then(|v| v.value())
}

/// Structural outline: variant sequence, variable names and nesting.
fn shape(program: &Program, id: BlockId) -> Vec<String> {
    let mut out = Vec::new();
    for command in &program.block(id).commands {
        match command {
            Command::Incr { var, .. } => out.push(format!("incr {}", var.name())),
            Command::Decr { var, .. } => out.push(format!("decr {}", var.name())),
            Command::Clear { var, .. } => out.push(format!("clear {}", var.name())),
            Command::Block { body, .. } => out.extend(shape(program, *body)),
            Command::While { body, .. } => {
                let BlockKind::While { guard, .. } = &program.block(*body).kind else {
                    panic!("while without guard");
                };
                out.push(format!("while {}", guard.name()));
                out.extend(shape(program, *body).into_iter().map(|s| format!("  {}", s)));
                out.push("end".to_string());
            }
            Command::FuncBlock { body, .. } => {
                let block = program.block(*body);
                out.push(format!(
                    "func {:?}({})",
                    block.func_name(),
                    block.params().join(",")
                ));
                out.extend(shape(program, *body).into_iter().map(|s| format!("  {}", s)));
                out.push("end".to_string());
            }
            Command::Func(call) => {
                let args: Vec<&str> = call.args.iter().map(|a| a.name()).collect();
                out.push(format!(
                    "call {:?} {:?} {:?}",
                    program.block(call.target).func_name(),
                    args,
                    call.by_ref
                ));
            }
        }
    }
    out
}

#[test]
fn test_decr_after_clear_is_negative() {
    let program = parse("clear v;\ndecr v;").unwrap();
    assert!(matches!(
        run(&program),
        Err(RunError::NegativeValue { ref name, line: 2 }) if name == "v"
    ));
}

#[test]
fn test_incr_then_decr_round_trips() {
    let program = parse("incr v;\ndecr v;").unwrap();
    let v = program.global("v").unwrap();
    for start in [1, 2, 1000, MAX_VALUE - 1] {
        v.set(start);
        run(&program).unwrap();
        assert_eq!(v.value(), Some(start));
    }
}

#[test]
fn test_incr_at_max_overflows_without_wrapping() {
    let program = parse("incr big;").unwrap();
    let big = program.global("big").unwrap();
    big.set(MAX_VALUE);
    let err = run(&program).unwrap_err();
    assert!(matches!(err, RunError::Overflow { ref name, line: 1 } if name == "big"));
    assert!(err.to_string().contains("big"));
    assert_eq!(big.value(), Some(MAX_VALUE));
}

#[test]
fn test_loop_with_zero_guard_never_runs() {
    let program = parse("while n not 0 do;\nincr count;\nend;").unwrap();
    program.global("n").unwrap().set(0);
    program.global("count").unwrap().set(0);
    run(&program).unwrap();
    assert_eq!(value(&program, "count"), Some(0));
}

#[test]
fn test_loop_runs_exactly_guard_times() {
    let program = parse("while n not 0 do;\nincr count;\ndecr n;\nend;").unwrap();
    for iterations in [1, 5, 20] {
        program.global("n").unwrap().set(iterations);
        program.global("count").unwrap().set(0);
        run(&program).unwrap();
        assert_eq!(value(&program, "count"), Some(iterations));
        assert_eq!(value(&program, "n"), Some(0));
    }
}

#[test]
fn test_call_by_reference_copies_back_only_marked_arguments() {
    let source = "\
func f(a, b);
    incr a;
    decr b;
end;
clear x;
incr x;
incr x;
incr x;
clear y;
incr y;
incr y;
incr y;
incr y;
incr y;
f(&x, y);";
    let program = parse(source).unwrap();
    run(&program).unwrap();
    assert_eq!(value(&program, "x"), Some(4));
    assert_eq!(value(&program, "y"), Some(5));
}

#[test]
fn test_canonical_output_reparses_to_same_structure() {
    let source = "\
func addto(total, n);   // add n into total
  while n not 0 do;
  incr total; decr n;
  end;
end;
clear a; clear b;
incr b;
incr b;
while b not 0 do; // outer
    clear t;
    addto(&a, b);
    decr b;
end;
addto(a, &b);";
    let program = parse(source).unwrap();
    let formatted = backends()
        .iter()
        .find(|b| b.name() == "barebones")
        .unwrap()
        .emit(&program);
    let reparsed = parse(&formatted).unwrap();

    assert_eq!(shape(&program, program.root), shape(&reparsed, reparsed.root));
    assert_eq!(
        backends()[1].emit(&reparsed),
        formatted,
        "formatting is idempotent"
    );

    run(&program).unwrap();
    run(&reparsed).unwrap();
    assert_eq!(value(&program, "a"), value(&reparsed, "a"));
}

#[test]
fn test_comments_reattached_in_every_backend() {
    let source = "\
func f(a); // c1
incr a; // c2
end; // c3
clear x; // c4
while x not 0 do; // c5
decr x; // c6
end; // c7
f(&x); // c8";
    let program = parse(source).unwrap();

    let expected: &[(&str, [&str; 8])] = &[
        (
            "barebones",
            [
                "func f(a);",
                "incr a;",
                "end;",
                "clear x;",
                "while x not 0 do;",
                "decr x;",
                "end;",
                "f(&x);",
            ],
        ),
        (
            "python",
            [
                "def f(a):",
                "a += 1",
                "return a,",
                "x = 0",
                "while x != 0:",
                "x -= 1",
                "",
                "x, = f(x)",
            ],
        ),
        (
            "java",
            [
                "static int[] f(int a) {",
                "a += 1;",
                "}",
                "x = 0;",
                "while (x != 0) {",
                "x -= 1;",
                "}",
                "{ int[] result$ = f(x); x = result$[0]; }",
            ],
        ),
        (
            "c++",
            [
                "std::tuple<int> f(int a) {",
                "a += 1;",
                "}",
                "x = 0;",
                "while (x != 0) {",
                "x -= 1;",
                "}",
                "std::tie(x) = f(x);",
            ],
        ),
        (
            "rust",
            [
                "fn f(mut a: i32) -> (i32,) {",
                "a += 1;",
                "}",
                "x = 0;",
                "while x != 0 {",
                "x -= 1;",
                "}",
                "(x,) = f(x);",
            ],
        ),
    ];

    let all = backends();
    assert_eq!(all.len(), expected.len());
    for (name, fragments) in expected {
        let backend = all.iter().find(|b| b.name() == *name).unwrap();
        let text = backend.emit(&program);
        let (gap, marker) = if *name == "python" { ("  ", "#") } else { (" ", "//") };

        for (i, fragment) in fragments.iter().enumerate() {
            let comment = format!("{} c{}", marker, i + 1);
            let hits: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|l| l.ends_with(&comment))
                .collect();
            let want = if fragment.is_empty() {
                comment.clone()
            } else {
                format!("{}{}{}", fragment, gap, comment)
            };
            assert_eq!(hits, vec![want.as_str()], "{} backend, comment c{}", name, i + 1);
        }
    }
}

#[test]
fn test_procedure_and_variable_with_one_name() {
    let program = parse("func f(a); incr a; end;\nclear f;\nf(&f);").unwrap();
    run(&program).unwrap();
    assert_eq!(value(&program, "f"), Some(1));

    let expected = [
        ("barebones", "f(&f);"),
        ("python", "f, = f_(f)"),
        ("java", "{ int[] result$ = f_(f); f = result$[0]; }"),
        ("c++", "std::tie(f) = f_(f);"),
        ("rust", "(f,) = f_(f);"),
    ];
    for backend in backends() {
        let (_, call) = expected.iter().find(|(n, _)| *n == backend.name()).unwrap();
        let text = backend.emit(&program);
        assert!(
            text.lines().any(|l| l.trim() == *call),
            "{} backend:\n{}",
            backend.name(),
            text
        );
    }
}

#[test]
fn test_escaped_names_never_merge_variables() {
    let program = parse("clear main;\nclear main_;\nincr main_;").unwrap();
    for backend in backends().iter().filter(|b| ["java", "c++", "rust"].contains(&b.name())) {
        let text = backend.emit(&program);
        assert!(text.contains("main__ = 0;"), "{} backend:\n{}", backend.name(), text);
        assert!(text.contains("main_ += 1;"), "{} backend:\n{}", backend.name(), text);
    }
}

#[test]
fn test_breakpoint_on_loop_suspends_once_per_iteration() {
    let source = "\
clear x;
incr x;
incr x;
incr x;
while x not 0 do;
    decr x;
end;
clear y;";
    let program = parse(source).unwrap();
    let (result, transcript) = debug_run(&program, &[5], "p x\nc\np x\nc\np x\nc\n");
    result.unwrap();

    assert_eq!(transcript.matches("Broke at line 5.").count(), 3);
    let values: Vec<&str> = transcript
        .lines()
        .filter(|l| l.starts_with("x is equal to"))
        .collect();
    assert_eq!(
        values,
        vec!["x is equal to: 3", "x is equal to: 2", "x is equal to: 1"]
    );
    assert_eq!(value(&program, "x"), Some(0));
    assert_eq!(value(&program, "y"), Some(0));
}

#[test]
fn test_skip_resumes_like_continue() {
    let program = parse("clear x;\nincr x;\nincr x;").unwrap();
    let (result, transcript) = debug_run(&program, &[2, 3], "s\nc\n");
    result.unwrap();
    assert_eq!(transcript.matches("Broke at line").count(), 2);
    assert_eq!(value(&program, "x"), Some(2));
}

#[test]
fn test_breakpoint_set_from_console_is_honoured() {
    let program = parse("clear x;\nincr x;\nincr x;\nincr x;").unwrap();
    let (result, transcript) = debug_run(&program, &[1], "b 4\nc\nr 4\nc\n");
    result.unwrap();
    assert!(transcript.contains("Broke at line 1."));
    assert!(transcript.contains("Broke at line 4."));
    assert!(transcript.contains("Set breakpoint!"));
    assert!(transcript.contains("Unset breakpoint!"));
}

#[test]
fn test_callee_sees_bound_parameters_at_first_suspension() {
    let source = "\
func f(a);
    incr a;
end;
clear x;
incr x;
f(&x);";
    let program = parse(source).unwrap();

    let (result, transcript) = debug_run(&program, &[1], "p a\nc\n");
    result.unwrap();
    assert!(transcript.contains("a is equal to: 1"));
    assert_eq!(value(&program, "x"), Some(2));

    // at the call line only the caller's scope is visible
    let program = parse(source).unwrap();
    let (result, transcript) = debug_run(&program, &[6], "p x\np a\nc\n");
    result.unwrap();
    assert!(transcript.contains("x is equal to: 1"));
    assert!(!transcript.contains("a is"));
}

#[test]
fn test_loop_scope_sees_enclosing_variables() {
    let source = "\
clear x;
incr x;
while x not 0 do;
    clear inner;
    decr x;
end;";
    let program = parse(source).unwrap();
    let (result, transcript) = debug_run(&program, &[5], "p\nc\n");
    result.unwrap();
    assert!(transcript.contains("x is equal to: 1"));
    assert!(transcript.contains("inner is equal to: 0"));
}

#[test]
fn test_console_end_of_input_resumes() {
    let program = parse("clear x;\nincr x;").unwrap();
    let (result, _) = debug_run(&program, &[1, 2], "");
    result.unwrap();
    assert_eq!(value(&program, "x"), Some(1));
}

#[test]
fn test_interpretation_error_under_debugger() {
    let program = parse("clear x;\ndecr x;").unwrap();
    let (result, _) = debug_run(&program, &[], "");
    assert!(matches!(result, Err(RunError::NegativeValue { line: 2, .. })));
}

#[test]
fn test_emitters_do_not_touch_values() {
    let program = parse("clear x;\nincr x;").unwrap();
    run(&program).unwrap();
    for backend in backends() {
        backend.emit(&program);
    }
    assert_eq!(value(&program, "x"), Some(1));
}
