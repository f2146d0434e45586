#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    use quill::error::QuillError;
    use quill::interpreter::Interpreter;
    use quill::parser::Parser;
    use quill::resolver::Resolver;
    use quill::scanner::Scanner;

    /// Cloneable sink so the test keeps a handle on the bytes the
    /// interpreter writes.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Full pipeline: scan, parse, resolve, execute.  Returns everything
    /// the program printed.
    fn run(source: &str) -> Result<String, QuillError> {
        let tokens: Vec<_> = Scanner::new(source)
            .collect::<Result<_, _>>()
            .expect("source scans cleanly");

        let mut parser = Parser::new(tokens);
        let statements = parser.parse().expect("source parses cleanly");

        let buf = SharedBuf::default();
        let mut interpreter = Interpreter::with_output(Box::new(buf.clone()));

        let diagnostics = Resolver::new(&mut interpreter).resolve(&statements);
        assert!(
            !diagnostics.had_errors(),
            "resolution failed: {:?}",
            diagnostics.entries()
        );

        interpreter.interpret(&statements)?;

        let bytes = buf.0.borrow().clone();
        Ok(String::from_utf8(bytes).expect("output is UTF-8"))
    }

    fn output(source: &str) -> String {
        run(source).expect("program runs cleanly")
    }

    fn failure(source: &str) -> QuillError {
        run(source).expect_err("program fails at runtime")
    }

    // ───────────────────── values and operators ───────────────────

    #[test]
    fn test_interp_01_number_formatting() {
        assert_eq!(output("print 3.0;"), "3\n");
        assert_eq!(output("print 5 / 2;"), "2.5\n");
        assert_eq!(output("print 1.50;"), "1.5\n");
    }

    #[test]
    fn test_interp_02_division_by_zero_is_its_own_error() {
        let err = failure("print 1 / 0;");

        assert!(matches!(err, QuillError::DivisionByZero { line: 1 }));
        assert!(err.to_string().contains("Division by zero."));
    }

    #[test]
    fn test_interp_03_string_concatenation_coerces() {
        assert_eq!(output(r#"print "x" + 1;"#), "x1\n");
        assert_eq!(output(r#"print 1.50 + "x";"#), "1.5x\n");
        assert_eq!(output(r#"print "a" + "b";"#), "ab\n");
    }

    #[test]
    fn test_interp_04_plus_rejects_other_mixes() {
        let err = failure("print true + 1;");

        assert!(err
            .to_string()
            .contains("Operands must be numbers or strings."));
    }

    #[test]
    fn test_interp_05_equality_is_by_value_within_one_kind() {
        assert_eq!(output("print null == null;"), "true\n");
        assert_eq!(output(r#"print "1" == 1;"#), "false\n");
        assert_eq!(output("print 2 != 3;"), "true\n");
    }

    #[test]
    fn test_interp_06_instances_are_never_equal() {
        assert_eq!(
            output(
                r#"
                class Point {}
                print Point() == Point();
                "#
            ),
            "false\n"
        );
    }

    #[test]
    fn test_interp_07_logical_operators_short_circuit() {
        // The right side names an undefined variable; reaching it would
        // be a runtime error.
        assert_eq!(output("print false and ghost;"), "false\n");
        assert_eq!(output("print true or ghost;"), "true\n");
    }

    #[test]
    fn test_interp_08_ternary_evaluates_only_the_taken_branch() {
        assert_eq!(output("print true ? 1 : ghost;"), "1\n");
        assert_eq!(output("print false ? ghost : 2;"), "2\n");
    }

    // ─────────────────────── scoping and closures ─────────────────

    #[test]
    fn test_interp_09_shadowing() {
        let source = r#"
            let a = 1;
            {
                let a = 2;
                print a;
            }
            print a;
        "#;

        assert_eq!(output(source), "2\n1\n");
    }

    #[test]
    fn test_interp_10_closure_captures_its_defining_frame() {
        let source = r#"
            fun makeCounter() {
                let count = 0;
                fun bump() {
                    count = count + 1;
                    return count;
                }
                return bump;
            }

            let counter = makeCounter();
            print counter();
            print counter();
        "#;

        assert_eq!(output(source), "1\n2\n");
    }

    #[test]
    fn test_interp_11_two_closures_alias_one_frame() {
        let source = r#"
            fun makePair() {
                let shared = 0;
                fun set(v) { shared = v; }
                fun get() { return shared; }
                set(42);
                return get;
            }

            print makePair()();
        "#;

        assert_eq!(output(source), "42\n");
    }

    #[test]
    fn test_interp_12_global_redeclaration_fails() {
        let err = failure("let a = 1; let a = 2;");

        assert!(err.to_string().contains("Cannot redefine variable 'a'"));
    }

    #[test]
    fn test_interp_13_undefined_variable() {
        let err = failure("print ghost;");

        assert!(err.to_string().contains("Undefined variable 'ghost'."));
    }

    // ─────────────────────────── functions ────────────────────────

    #[test]
    fn test_interp_14_arity_mismatch() {
        let err = failure(
            r#"
            fun add(a, b) { return a + b; }
            add(1);
            "#,
        );

        assert!(err
            .to_string()
            .contains("Expected 2 arguments but got 1 in call to 'add'."));
    }

    #[test]
    fn test_interp_15_function_without_return_yields_null() {
        assert_eq!(
            output(
                r#"
                fun noisy() { print "side effect"; }
                print noisy();
                "#
            ),
            "side effect\nnull\n"
        );
    }

    #[test]
    fn test_interp_16_return_unwinds_through_loops() {
        let source = r#"
            fun find() {
                while (true) {
                    return 7;
                }
            }
            print find();
        "#;

        assert_eq!(output(source), "7\n");
    }

    #[test]
    fn test_interp_17_lambdas_are_first_class() {
        let source = r#"
            fun apply(f, v) { return f(v); }
            print apply(fun (n) { return n * 2; }, 21);
        "#;

        assert_eq!(output(source), "42\n");
    }

    #[test]
    fn test_interp_18_calling_a_non_callable() {
        let err = failure(r#""nope"();"#);

        assert!(err
            .to_string()
            .contains("Can only call functions and classes."));
    }

    // ──────────────────────────── loops ───────────────────────────

    #[test]
    fn test_interp_19_break_exits_the_nearest_loop() {
        let source = r#"
            let i = 0;
            while (true) {
                i = i + 1;
                if (i == 3) break;
            }
            print i;
        "#;

        assert_eq!(output(source), "3\n");
    }

    #[test]
    fn test_interp_20_for_loop_desugars_to_while() {
        assert_eq!(
            output("for (let i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    // ──────────────────────────── classes ─────────────────────────

    #[test]
    fn test_interp_21_fields_and_methods() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
                sum() { return this.x + this.y; }
            }

            let p = Point(1, 2);
            print p.sum();
        "#;

        assert_eq!(output(source), "3\n");
    }

    #[test]
    fn test_interp_22_class_without_init_takes_no_arguments() {
        let err = failure(
            r#"
            class Empty {}
            Empty(1);
            "#,
        );

        assert!(err
            .to_string()
            .contains("Expected 0 arguments but got 1 in call to 'Empty'."));
    }

    #[test]
    fn test_interp_23_initializer_always_returns_the_receiver() {
        let source = r#"
            class Box {
                init() { this.v = 1; }
            }

            let b = Box();
            let again = b.init();
            print again.v;
        "#;

        assert_eq!(output(source), "1\n");
    }

    #[test]
    fn test_interp_24_fields_shadow_methods() {
        let source = r#"
            class Widget {
                label() { return "method"; }
            }

            let w = Widget();
            w.label = "field";
            print w.label;
        "#;

        assert_eq!(output(source), "field\n");
    }

    #[test]
    fn test_interp_25_inheritance_and_super() {
        let source = r#"
            class Base {
                greet() { return "base"; }
            }
            class Child < Base {
                greet() { return super.greet() + "+child"; }
            }

            print Child().greet();
        "#;

        assert_eq!(output(source), "base+child\n");
    }

    #[test]
    fn test_interp_26_super_methods_see_the_subclass_receiver() {
        let source = r#"
            class Base {
                who() { return this.name; }
            }
            class Child < Base {
                init() { this.name = "child"; }
                call() { return super.who(); }
            }

            print Child().call();
        "#;

        assert_eq!(output(source), "child\n");
    }

    #[test]
    fn test_interp_27_superclass_must_be_a_class() {
        let err = failure(
            r#"
            let notAClass = 1;
            class Broken < notAClass {}
            "#,
        );

        assert!(err.to_string().contains("Superclass must be a class."));
    }

    #[test]
    fn test_interp_28_static_methods_dispatch_on_the_class() {
        let source = r#"
            class MathUtil {
                static twice(n) { return n * 2; }
            }

            print MathUtil.twice(21);
        "#;

        assert_eq!(output(source), "42\n");
    }

    #[test]
    fn test_interp_28b_subclass_static_captures_enclosing_locals() {
        // The subclass's methods close over an extra `super` frame;
        // its statics must not, or resolved distances land one frame off.
        let source = r#"
            {
                let x = 1;
                class Base {}
                class Child < Base {
                    static f() { return x; }
                }
                print Child.f();
            }
        "#;

        assert_eq!(output(source), "1\n");
    }

    #[test]
    fn test_interp_29_static_methods_are_not_inherited() {
        let err = failure(
            r#"
            class Base {
                static make() { return 1; }
            }
            class Child < Base {}

            Child.make();
            "#,
        );

        assert!(err.to_string().contains("Undefined static method 'make'"));
    }

    #[test]
    fn test_interp_30_undefined_property() {
        let err = failure(
            r#"
            class Empty {}
            Empty().missing;
            "#,
        );

        assert!(err.to_string().contains("Undefined property 'missing'."));
    }

    #[test]
    fn test_interp_31_properties_require_an_instance() {
        let err = failure("1 .missing;");

        assert!(err.to_string().contains("Only instances have properties."));
    }

    // ──────────────────────────── printing ────────────────────────

    #[test]
    fn test_interp_32_print_unescapes_at_output_time() {
        assert_eq!(output(r#"print "a\nb";"#), "a\nb\n");
        assert_eq!(output(r#"print "a\tb";"#), "a\tb\n");

        // Unknown escapes pass through untouched.
        assert_eq!(output(r#"print "a\qb";"#), "a\\qb\n");
    }

    #[test]
    fn test_interp_33_bare_print_emits_a_blank_line() {
        assert_eq!(output("print;"), "\n");
    }

    #[test]
    fn test_interp_34_printing_callables_and_instances() {
        let source = r#"
            fun f() {}
            class C {}
            print f;
            print C;
            print C();
        "#;

        assert_eq!(output(source), "<fn f>\n<class C>\n<instance of C>\n");
    }

    // ──────────────────────────── natives ─────────────────────────

    #[test]
    fn test_interp_35_native_functions() {
        assert_eq!(output(r#"print toUpper("abc");"#), "ABC\n");
        assert_eq!(output(r#"print toLower("ABC");"#), "abc\n");
        assert_eq!(output("print pow(2, 10);"), "1024\n");
        assert_eq!(output("print sqrt(9);"), "3\n");
        assert_eq!(output("print clock() > 0;"), "true\n");
    }

    #[test]
    fn test_interp_36_native_argument_errors_carry_the_call_site() {
        let err = failure("sqrt(-1);");

        assert!(err.to_string().contains("non-negative"));
        assert!(err.to_string().contains("[line 1]"));
    }

    #[test]
    fn test_interp_37_unary_operators() {
        assert_eq!(output("print -(3);"), "-3\n");
        assert_eq!(output("print !null;"), "true\n");
        assert_eq!(output("print !0;"), "false\n");

        let err = failure(r#"print -"x";"#);
        assert!(err.to_string().contains("Operand must be a number."));
    }

    #[test]
    fn test_interp_38_truthiness_in_conditions() {
        // Only null and false are falsy.
        assert_eq!(output(r#"if (0) print "taken";"#), "taken\n");
        assert_eq!(output(r#"if ("") print "taken";"#), "taken\n");
        assert_eq!(output(r#"if (null) print "a"; else print "b";"#), "b\n");
    }
}
