#[cfg(test)]
mod interpreter_tests {
    use loxide as lox;

    use lox::{Lox, RunOutcome};

    /// Run a source text and return what it printed.  Panics on any
    /// diagnostic so tests fail loudly on unexpected errors.
    fn run_clean(source: &str) -> String {
        let mut lox = Lox::new(Vec::new());
        let (outcome, diags) = lox.run(source.as_bytes());

        assert_eq!(
            outcome,
            RunOutcome::Ok,
            "diagnostics: {:?}",
            diags.messages().collect::<Vec<_>>()
        );

        String::from_utf8_lossy(lox.output()).into_owned()
    }

    /// Run a source text expected to die with a runtime error; returns the
    /// rendered error together with whatever was printed first.
    fn run_expect_runtime_error(source: &str) -> (String, String) {
        let mut lox = Lox::new(Vec::new());
        let (outcome, diags) = lox.run(source.as_bytes());

        assert_eq!(outcome, RunOutcome::RuntimeError);

        let error = diags
            .messages()
            .last()
            .expect("a runtime error should have been recorded");
        let output = String::from_utf8_lossy(lox.output()).into_owned();

        (error, output)
    }

    // ── values, operators, printing ─────────────────────────────────────

    #[test]
    fn test_arithmetic_and_number_formatting() {
        assert_eq!(run_clean("print 1 + 2;"), "3\n");
        assert_eq!(run_clean("print 10 / 4;"), "2.5\n");
        assert_eq!(run_clean("print -(-3);"), "3\n");
        assert_eq!(run_clean("print 2 * 3 + 4;"), "10\n");
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(run_clean("print 1 / 0;"), "inf\n");
        assert_eq!(run_clean("print -1 / 0;"), "-inf\n");
        assert_eq!(run_clean("print 0 / 0;"), "NaN\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_clean("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn test_mixed_plus_operands_error() {
        let (error, _) = run_expect_runtime_error("print 1 + \"a\";");
        assert!(error.contains("Operands must be two numbers or two strings."));
    }

    #[test]
    fn test_unary_minus_requires_number() {
        let (error, _) = run_expect_runtime_error("print -\"a\";");
        assert!(error.contains("Operand must be a number."));
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let (error, _) = run_expect_runtime_error("print 1 < \"two\";");
        assert!(error.contains("Operands must be numbers."));
    }

    #[test]
    fn test_equality_semantics() {
        assert_eq!(run_clean("print nil == nil;"), "true\n");
        assert_eq!(run_clean("print 1 == 1;"), "true\n");
        assert_eq!(run_clean("print 1 == \"1\";"), "false\n");
        assert_eq!(run_clean("print \"a\" != \"b\";"), "true\n");
        assert_eq!(run_clean("print (0 / 0) == (0 / 0);"), "false\n");
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(run_clean("print !nil;"), "true\n");
        assert_eq!(run_clean("print !false;"), "true\n");
        assert_eq!(run_clean("print !0;"), "false\n");
        assert_eq!(run_clean("print !\"\";"), "false\n");
        assert_eq!(run_clean("print !nil == !(!(!nil));"), "true\n");
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(run_clean("print nil or \"yes\";"), "yes\n");
        assert_eq!(run_clean("print false and 1;"), "false\n");
        assert_eq!(run_clean("print 1 and 2;"), "2\n");
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        // The right side must not run when the left side decides.
        let source = r#"
            fun boom() { print "evaluated"; return true; }
            print true or boom();
            print false and boom();
        "#;
        assert_eq!(run_clean(source), "true\nfalse\n");
    }

    #[test]
    fn test_ternary_operator() {
        assert_eq!(run_clean("print true ? 1 : 2;"), "1\n");
        assert_eq!(run_clean("print nil ? 1 : 2;"), "2\n");
        assert_eq!(run_clean("print 1 < 2 ? \"lt\" : \"ge\";"), "lt\n");
    }

    // ── variables and scope ─────────────────────────────────────────────

    #[test]
    fn test_block_scope_shadowing() {
        let source = r#"
            var a = "outer";
            {
              var a = "inner";
              print a;
            }
            print a;
        "#;
        assert_eq!(run_clean(source), "inner\nouter\n");
    }

    #[test]
    fn test_uninitialized_variable_read_is_runtime_error() {
        let (error, _) = run_expect_runtime_error("var a; print a;");
        assert!(error.contains("Use of uninitialized variable 'a'."));
    }

    #[test]
    fn test_uninitialized_variable_can_be_assigned_first() {
        assert_eq!(run_clean("var a; a = 5; print a;"), "5\n");
    }

    #[test]
    fn test_uninitialized_local_read_is_runtime_error() {
        let (error, _) = run_expect_runtime_error("{ var a; print a; }");
        assert!(error.contains("Use of uninitialized variable 'a'."));
    }

    #[test]
    fn test_undefined_variable_errors() {
        let (error, _) = run_expect_runtime_error("print nope;");
        assert!(error.contains("Undefined variable 'nope'."));

        let (error, _) = run_expect_runtime_error("nope = 1;");
        assert!(error.contains("Undefined variable 'nope'."));
    }

    #[test]
    fn test_assignment_is_an_expression() {
        assert_eq!(run_clean("var a = 1; print a = 2;"), "2\n");
    }

    #[test]
    fn test_runtime_error_reports_line() {
        let (error, output) = run_expect_runtime_error("print 1;\nprint -\"x\";");
        assert_eq!(output, "1\n");
        assert!(error.ends_with("[line 2]"));
    }

    // ── control flow ────────────────────────────────────────────────────

    #[test]
    fn test_if_else() {
        assert_eq!(
            run_clean("if (1 < 2) print \"then\"; else print \"else\";"),
            "then\n"
        );
        assert_eq!(
            run_clean("if (nil) print \"then\"; else print \"else\";"),
            "else\n"
        );
    }

    #[test]
    fn test_while_loop() {
        let source = r#"
            var i = 0;
            while (i < 3) {
              print i;
              i = i + 1;
            }
        "#;
        assert_eq!(run_clean(source), "0\n1\n2\n");
    }

    #[test]
    fn test_for_loop_with_break() {
        let source = r#"
            for (var i = 0; i < 5; i = i + 1) {
              if (i == 3) break;
              print i;
            }
        "#;
        assert_eq!(run_clean(source), "0\n1\n2\n");
    }

    #[test]
    fn test_break_only_exits_innermost_loop() {
        let source = r#"
            for (var i = 0; i < 2; i = i + 1) {
              for (var j = 0; j < 5; j = j + 1) {
                if (j == 1) break;
                print i + j;
              }
            }
        "#;
        assert_eq!(run_clean(source), "0\n1\n");
    }

    // ── functions and closures ──────────────────────────────────────────

    #[test]
    fn test_function_declaration_and_call() {
        let source = r#"
            fun add(a, b) { return a + b; }
            print add(1, 2);
        "#;
        assert_eq!(run_clean(source), "3\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        let source = r#"
            fun noop() {}
            print noop();
        "#;
        assert_eq!(run_clean(source), "nil\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
              if (n < 2) return n;
              return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        "#;
        assert_eq!(run_clean(source), "55\n");
    }

    #[test]
    fn test_closure_counter_shares_environment() {
        let source = r#"
            fun make_counter() {
              var count = 0;
              fun increment() {
                count = count + 1;
                print count;
              }
              return increment;
            }
            var counter = make_counter();
            counter();
            counter();
        "#;
        assert_eq!(run_clean(source), "1\n2\n");
    }

    #[test]
    fn test_closure_sees_later_reassignment() {
        let source = r#"
            var a = 1;
            fun show() { print a; }
            show();
            a = 2;
            show();
        "#;
        assert_eq!(run_clean(source), "1\n2\n");
    }

    #[test]
    fn test_lambda_values() {
        let source = r#"
            var twice = fun (x) { return x + x; };
            print twice(4);
            fun apply(f, v) { return f(v); }
            print apply(fun (n) { return n * n; }, 5);
        "#;
        assert_eq!(run_clean(source), "8\n25\n");
    }

    #[test]
    fn test_arity_mismatch_is_runtime_error() {
        let (error, _) = run_expect_runtime_error("fun f(a) { return a; } f();");
        assert!(error.contains("Expected 1 arguments but got 0."));
    }

    #[test]
    fn test_calling_a_non_callable_errors() {
        let (error, _) = run_expect_runtime_error("\"not a function\"();");
        assert!(error.contains("Can only call functions and classes."));
    }

    #[test]
    fn test_clock_builtin_returns_a_number() {
        assert_eq!(run_clean("print clock() >= 0;"), "true\n");
        assert_eq!(run_clean("print clock;"), "<native fn clock>\n");
    }

    #[test]
    fn test_function_stringification() {
        let source = r#"
            fun named() {}
            print named;
        "#;
        assert_eq!(run_clean(source), "<fn named>\n");
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_class_stringification_and_instances() {
        let source = r#"
            class Bagel {}
            print Bagel;
            print Bagel();
        "#;
        assert_eq!(run_clean(source), "Bagel\nBagel instance\n");
    }

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Breakfast {
              describe() {
                print "eggs and " + this.side;
              }
            }
            var b = Breakfast();
            b.side = "toast";
            b.describe();
        "#;
        assert_eq!(run_clean(source), "eggs and toast\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class C {
              m() { return "method"; }
            }
            var c = C();
            print c.m();
            c.m = fun () { return "field"; };
            print c.m();
        "#;
        assert_eq!(run_clean(source), "method\nfield\n");
    }

    #[test]
    fn test_initializer_receives_arguments_and_returns_receiver() {
        let source = r#"
            class C {
              init(x) {
                this.x = x;
                return;
              }
            }
            print C(3).x;
        "#;
        assert_eq!(run_clean(source), "3\n");
    }

    #[test]
    fn test_calling_init_directly_returns_the_instance() {
        let source = r#"
            class C {
              init() { this.n = 1; }
            }
            var c = C();
            print c.init() == c;
        "#;
        assert_eq!(run_clean(source), "true\n");
    }

    #[test]
    fn test_bound_methods_remember_their_receiver() {
        let source = r#"
            class Person {
              init(name) { this.name = name; }
              greet() { print "hi, " + this.name; }
            }
            var greet = Person("ada").greet;
            greet();
        "#;
        assert_eq!(run_clean(source), "hi, ada\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = r#"
            class A {
              m() { print "A"; }
            }
            class B < A {
              m() {
                super.m();
                print "B";
              }
            }
            B().m();
        "#;
        assert_eq!(run_clean(source), "A\nB\n");
    }

    #[test]
    fn test_methods_inherit_through_the_chain() {
        let source = r#"
            class A { m() { return "from A"; } }
            class B < A {}
            class C < B {}
            print C().m();
        "#;
        assert_eq!(run_clean(source), "from A\n");
    }

    #[test]
    fn test_super_in_inherited_method_stays_static() {
        let source = r#"
            class A { m() { print "A"; } }
            class B < A { test() { super.m(); } }
            class C < B {}
            C().test();
        "#;
        assert_eq!(run_clean(source), "A\n");
    }

    #[test]
    fn test_class_methods() {
        let source = r#"
            class Math {
              class square(n) { return n * n; }
            }
            print Math.square(4);
        "#;
        assert_eq!(run_clean(source), "16\n");
    }

    #[test]
    fn test_class_method_this_is_the_class_object() {
        let source = r#"
            class Registry {
              class describe() { print this; }
            }
            Registry.describe();
        "#;
        assert_eq!(run_clean(source), "Registry\n");
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (error, _) = run_expect_runtime_error("var NotAClass = 10; class Sub < NotAClass {}");
        assert!(error.contains("Superclass must be a class."));
    }

    #[test]
    fn test_undefined_property_errors() {
        let (error, _) = run_expect_runtime_error("class C {} print C().missing;");
        assert!(error.contains("Undefined property 'missing'."));
    }

    #[test]
    fn test_property_access_on_non_instance_errors() {
        let (error, _) = run_expect_runtime_error("print (1).field;");
        assert!(error.contains("Only instances have properties."));

        let (error, _) = run_expect_runtime_error("(1).field = 2;");
        assert!(error.contains("Only instances have properties."));
    }

    #[test]
    fn test_instance_identity_equality() {
        let source = r#"
            class C {}
            var a = C();
            var b = C();
            print a == a;
            print a == b;
        "#;
        assert_eq!(run_clean(source), "true\nfalse\n");
    }

    // ── REPL-style persistent sessions ──────────────────────────────────

    #[test]
    fn test_globals_persist_across_runs() {
        let mut lox = Lox::new(Vec::new());

        let (outcome, _) = lox.run(b"var x = 10;");
        assert_eq!(outcome, RunOutcome::Ok);

        let (outcome, _) = lox.run(b"print x;");
        assert_eq!(outcome, RunOutcome::Ok);

        assert_eq!(String::from_utf8_lossy(lox.output()), "10\n");
    }

    #[test]
    fn test_functions_persist_across_runs() {
        let mut lox = Lox::new(Vec::new());

        let (outcome, _) = lox.run(b"fun double(n) { return 2 * n; }");
        assert_eq!(outcome, RunOutcome::Ok);

        let (outcome, _) = lox.run(b"print double(21);");
        assert_eq!(outcome, RunOutcome::Ok);

        assert_eq!(String::from_utf8_lossy(lox.output()), "42\n");
    }

    #[test]
    fn test_runtime_error_leaves_session_usable() {
        let mut lox = Lox::new(Vec::new());

        let (outcome, _) = lox.run(b"var a = 1;");
        assert_eq!(outcome, RunOutcome::Ok);

        let (outcome, _) = lox.run(b"print missing;");
        assert_eq!(outcome, RunOutcome::RuntimeError);

        let (outcome, _) = lox.run(b"print a;");
        assert_eq!(outcome, RunOutcome::Ok);

        assert_eq!(String::from_utf8_lossy(lox.output()), "1\n");
    }

    #[test]
    fn test_classes_persist_across_runs() {
        let mut lox = Lox::new(Vec::new());

        let (outcome, _) = lox.run(b"class Point { init(x, y) { this.x = x; this.y = y; } }");
        assert_eq!(outcome, RunOutcome::Ok);

        let (outcome, _) = lox.run(b"print Point(3, 4).x;");
        assert_eq!(outcome, RunOutcome::Ok);

        assert_eq!(String::from_utf8_lossy(lox.output()), "3\n");
    }
}
