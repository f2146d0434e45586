#[cfg(test)]
mod resolver_tests {
    use quill::error::{Diagnostics, Severity};
    use quill::interpreter::Interpreter;
    use quill::parser::Parser;
    use quill::resolver::Resolver;
    use quill::scanner::Scanner;

    fn resolve(source: &str) -> Diagnostics {
        let tokens: Vec<_> = Scanner::new(source)
            .collect::<Result<_, _>>()
            .expect("source scans cleanly");

        let mut parser = Parser::new(tokens);
        let statements = parser.parse().expect("source parses cleanly");

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements)
    }

    fn assert_error(source: &str, expected: &str) {
        let diagnostics = resolve(source);

        assert!(
            diagnostics
                .entries()
                .iter()
                .any(|d| d.severity == Severity::Error && d.message.contains(expected)),
            "expected an error containing {:?}, got {:?}",
            expected,
            diagnostics.entries()
        );
    }

    fn assert_clean(source: &str) {
        let diagnostics = resolve(source);

        assert!(
            diagnostics.is_empty(),
            "expected no diagnostics, got {:?}",
            diagnostics.entries()
        );
    }

    #[test]
    fn test_resolver_01_clean_program() {
        assert_clean(
            r#"
            let a = 1;
            fun show(x) { print x; }
            show(a);
            "#,
        );
    }

    #[test]
    fn test_resolver_02_return_at_top_level() {
        assert_error("return 1;", "Cannot return from top-level code.");
    }

    #[test]
    fn test_resolver_03_break_outside_loop() {
        assert_error("break;", "Cannot use 'break' outside of a loop.");
    }

    #[test]
    fn test_resolver_04_break_does_not_cross_function_boundaries() {
        // The loop is outside the nested function, so the break is illegal.
        assert_error(
            r#"
            while (true) {
                fun f() { break; }
                f();
            }
            "#,
            "Cannot use 'break' outside of a loop.",
        );
    }

    #[test]
    fn test_resolver_05_break_inside_loop_is_legal() {
        assert_clean("while (true) { break; }");
    }

    #[test]
    fn test_resolver_06_self_referential_initializer() {
        assert_error(
            r#"
            let a = 1;
            {
                let a = a;
                print a;
            }
            "#,
            "Cannot read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_07_duplicate_declaration_in_one_scope() {
        assert_error(
            r#"
            {
                let a = 1;
                let a = 2;
                print a;
            }
            "#,
            "Variable with this name already declared in this scope.",
        );
    }

    #[test]
    fn test_resolver_08_shadowing_across_scopes_is_legal() {
        assert_clean(
            r#"
            {
                let a = 1;
                {
                    let a = 2;
                    print a;
                }
                print a;
            }
            "#,
        );
    }

    #[test]
    fn test_resolver_09_this_outside_class() {
        assert_error("print this;", "Cannot use 'this' outside of a class.");
    }

    #[test]
    fn test_resolver_10_this_in_static_method() {
        assert_error(
            r#"
            class Counter {
                static bump() { return this; }
            }
            "#,
            "Cannot use 'this' in a static method.",
        );
    }

    #[test]
    fn test_resolver_11_super_outside_class() {
        assert_error("super.m();", "Cannot use 'super' outside of a class.");
    }

    #[test]
    fn test_resolver_12_super_without_superclass() {
        assert_error(
            r#"
            class Base {
                m() { return super.m(); }
            }
            "#,
            "Cannot use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_resolver_13_super_in_static_method() {
        assert_error(
            r#"
            class Base { m() { return 1; } }
            class Child < Base {
                static s() { return super.m(); }
            }
            "#,
            "Cannot use 'super' in a static method.",
        );
    }

    #[test]
    fn test_resolver_14_class_inheriting_from_itself() {
        assert_error("class A < A {}", "A class cannot inherit from itself.");
    }

    #[test]
    fn test_resolver_15_return_value_from_initializer() {
        assert_error(
            r#"
            class Point {
                init() { return 1; }
            }
            "#,
            "Cannot return a value from an initializer.",
        );
    }

    #[test]
    fn test_resolver_16_bare_return_from_initializer_is_legal() {
        assert_clean(
            r#"
            class Point {
                init() { return; }
            }
            "#,
        );
    }

    #[test]
    fn test_resolver_17_unused_let_warns_without_gating() {
        let diagnostics = resolve(
            r#"
            {
                let forgotten = 1;
            }
            "#,
        );

        assert!(!diagnostics.had_errors());
        assert!(diagnostics
            .entries()
            .iter()
            .any(|d| d.severity == Severity::Warning
                && d.context == "forgotten"
                && d.message.contains("never used")));
    }

    #[test]
    fn test_resolver_18_read_counts_as_use_but_write_does_not() {
        assert_clean(
            r#"
            {
                let a = 1;
                print a;
            }
            "#,
        );

        let diagnostics = resolve(
            r#"
            {
                let a = 1;
                a = 2;
            }
            "#,
        );

        assert!(diagnostics
            .entries()
            .iter()
            .any(|d| d.severity == Severity::Warning && d.context == "a"));
    }

    #[test]
    fn test_resolver_19_all_errors_reported_in_one_pass() {
        let diagnostics = resolve(
            r#"
            return 1;
            break;
            print this;
            "#,
        );

        let errors = diagnostics
            .entries()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();

        assert_eq!(errors, 3);
    }

    #[test]
    fn test_resolver_20_lambda_keeps_enclosing_return_rules() {
        // A lambda at the top level cannot return either.
        assert_error(
            "let f = fun (x) { return x; };",
            "Cannot return from top-level code.",
        );

        // Inside a function the same lambda is fine.
        assert_clean(
            r#"
            fun outer() {
                let f = fun (x) { return x; };
                return f(1);
            }
            "#,
        );
    }
}
