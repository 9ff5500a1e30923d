#[cfg(test)]
mod resolver_tests {
    use loxide as lox;

    use lox::{Lox, RunOutcome};

    fn run_source(source: &str) -> (RunOutcome, Vec<String>) {
        let mut lox = Lox::new(Vec::new());
        let (outcome, diags) = lox.run(source.as_bytes());
        (outcome, diags.messages().collect())
    }

    fn assert_static_error(source: &str, expected: &str) {
        let (outcome, messages) = run_source(source);

        assert_eq!(outcome, RunOutcome::SyntaxError, "source: {}", source);
        assert!(
            messages.iter().any(|m| m.contains(expected)),
            "expected {:?} in {:?}",
            expected,
            messages
        );
    }

    #[test]
    fn test_resolver_self_reference_in_initializer() {
        assert_static_error(
            "{ var a = 1; { var a = a; print a; } print a; }",
            "Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_self_reference_allowed_at_global_scope() {
        // Globally, `var a = a;` is not a static error; the read fails at
        // runtime instead.
        let (outcome, messages) = run_source("var a = a;");

        assert_eq!(outcome, RunOutcome::RuntimeError);
        assert!(messages.iter().any(|m| m.contains("Undefined variable 'a'.")));
    }

    #[test]
    fn test_resolver_redeclaration_in_same_scope() {
        assert_static_error(
            "{ var a = 1; var a = 2; print a; }",
            "Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_resolver_redeclaration_allowed_at_global_scope() {
        let (outcome, _) = run_source("var a = 1; var a = 2; print a;");

        assert_eq!(outcome, RunOutcome::Ok);
    }

    #[test]
    fn test_resolver_return_outside_function() {
        assert_static_error("return 1;", "Can't return from top-level code.");
    }

    #[test]
    fn test_resolver_return_value_from_initializer() {
        assert_static_error(
            "class C { init() { return 1; } }",
            "Can't return a value from an initializer.",
        );
    }

    #[test]
    fn test_resolver_bare_return_from_initializer_is_fine() {
        let (outcome, _) = run_source("class C { init() { return; } } C();");

        assert_eq!(outcome, RunOutcome::Ok);
    }

    #[test]
    fn test_resolver_break_outside_loop() {
        assert_static_error("break;", "Can't break outside of loop body.");
    }

    #[test]
    fn test_resolver_break_inside_loop_is_fine() {
        let (outcome, _) = run_source("while (false) { break; }");

        assert_eq!(outcome, RunOutcome::Ok);
    }

    #[test]
    fn test_resolver_this_outside_class() {
        assert_static_error("print this;", "Can't use 'this' outside of a class.");
    }

    #[test]
    fn test_resolver_super_outside_class() {
        assert_static_error("print super.m;", "Can't use 'super' outside of a class.");
    }

    #[test]
    fn test_resolver_super_without_superclass() {
        assert_static_error(
            "class A { m() { return super.m; } }",
            "Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_resolver_class_cannot_inherit_from_itself() {
        assert_static_error("class A < A {}", "A class can't inherit from itself.");
    }

    #[test]
    fn test_resolver_unused_local_warns() {
        let (outcome, messages) = run_source("fun f() { var x = 1; } f();");

        assert_eq!(outcome, RunOutcome::SyntaxError);
        assert_eq!(
            messages
                .iter()
                .filter(|m| m.contains("Local variable x not used."))
                .count(),
            1
        );
    }

    #[test]
    fn test_resolver_used_local_does_not_warn() {
        let (outcome, messages) = run_source("fun g() { var x = 1; print x; } g();");

        assert_eq!(outcome, RunOutcome::Ok);
        assert!(messages.is_empty(), "unexpected: {:?}", messages);
    }

    #[test]
    fn test_resolver_write_only_local_still_warns() {
        let (outcome, messages) = run_source("fun f() { var x = 1; x = 2; } f();");

        assert_eq!(outcome, RunOutcome::SyntaxError);
        assert!(messages
            .iter()
            .any(|m| m.contains("Local variable x not used.")));
    }

    #[test]
    fn test_resolver_unused_parameter_does_not_warn() {
        let (outcome, messages) = run_source("fun f(a, b) { return a; } f(1, 2);");

        assert_eq!(outcome, RunOutcome::Ok);
        assert!(messages.is_empty(), "unexpected: {:?}", messages);
    }

    #[test]
    fn test_resolver_warning_reports_declaration_line() {
        let (_, messages) = run_source("fun f() {\n  var dead = 1;\n}\nf();");

        assert!(messages
            .iter()
            .any(|m| m.contains("[line 2]") && m.contains("Local variable dead not used.")));
    }

    #[test]
    fn test_resolver_warnings_do_not_block_execution() {
        let mut lox = Lox::new(Vec::new());
        let (outcome, _diags) = lox.run(b"fun f() { var x = 1; } f(); print 7;");

        assert_eq!(outcome, RunOutcome::SyntaxError);

        let output = String::from_utf8_lossy(lox.output());
        assert_eq!(output, "7\n");
    }

    #[test]
    fn test_resolver_multiple_errors_in_one_pass() {
        let (_, messages) = run_source("break;\nreturn 1;\nprint this;");

        assert!(messages.iter().any(|m| m.contains("Can't break outside of loop body.")));
        assert!(messages.iter().any(|m| m.contains("Can't return from top-level code.")));
        assert!(messages
            .iter()
            .any(|m| m.contains("Can't use 'this' outside of a class.")));
    }

    #[test]
    fn test_resolver_closure_binds_declaration_site_environment() {
        let mut lox = Lox::new(Vec::new());
        let source = r#"
            var a = "global";
            {
              fun show() { print a; }
              show();
              var a = "block";
              show();
              print a;
            }
        "#;
        let (_, _diags) = lox.run(source.as_bytes());

        let output = String::from_utf8_lossy(lox.output());
        assert_eq!(output, "global\nglobal\nblock\n");
    }
}
