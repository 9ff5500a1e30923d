#[cfg(test)]
mod scanner_tests {
    use loxide as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_ternary_symbols() {
        assert_token_sequence(
            "a ? b : c;",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::QUESTION, "?"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_one_or_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords() {
        assert_token_sequence(
            "and break class else false fun for if nil or print return super this true var while",
            &[
                (TokenType::AND, "and"),
                (TokenType::BREAK, "break"),
                (TokenType::CLASS, "class"),
                (TokenType::ELSE, "else"),
                (TokenType::FALSE, "false"),
                (TokenType::FUN, "fun"),
                (TokenType::FOR, "for"),
                (TokenType::IF, "if"),
                (TokenType::NIL, "nil"),
                (TokenType::OR, "or"),
                (TokenType::PRINT, "print"),
                (TokenType::RETURN, "return"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::TRUE, "true"),
                (TokenType::VAR, "var"),
                (TokenType::WHILE, "while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_number_literals() {
        let tokens: Vec<Token> = Scanner::new(b"12 3.5 0.25")
            .filter_map(Result::ok)
            .collect();

        assert!(matches!(&tokens[0].token_type, TokenType::NUMBER(n) if *n == 12.0));
        assert!(matches!(&tokens[1].token_type, TokenType::NUMBER(n) if *n == 3.5));
        assert!(matches!(&tokens[2].token_type, TokenType::NUMBER(n) if *n == 0.25));
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_06_number_needs_digit_after_dot() {
        // `1.` is a number followed by a dot, not a fractional literal.
        assert_token_sequence(
            "1.",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_string_literal() {
        let tokens: Vec<Token> = Scanner::new(b"\"hello world\"")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s.as_str() == "hello world"));
    }

    #[test]
    fn test_scanner_08_multiline_string_tracks_lines() {
        let tokens: Vec<Token> = Scanner::new(b"\"line one\nline two\"\nx")
            .filter_map(Result::ok)
            .collect();

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(_)));
        // The identifier after the string sits on line 3.
        assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_09_unterminated_string_is_error() {
        let results: Vec<_> = Scanner::new(b"\"oops").collect();

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 1);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(err.to_string().contains("Unterminated string."));
        }
    }

    #[test]
    fn test_scanner_10_line_comment_skipped() {
        assert_token_sequence(
            "x // the rest is ignored\ny",
            &[
                (TokenType::IDENTIFIER, "x"),
                (TokenType::IDENTIFIER, "y"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_11_nested_block_comment_skipped() {
        assert_token_sequence(
            "a /* outer /* inner */ still outer */ b",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_12_unterminated_block_comment_is_error() {
        let results: Vec<_> = Scanner::new(b"a /* no end").collect();

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unterminated block comment."));
    }

    #[test]
    fn test_scanner_13_unexpected_chars_scanning_continues() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source.as_bytes()).collect();

        // COMMA, DOT, error '$', LEFT_PAREN, error '#', EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character."),
                "unexpected message: {}",
                err
            );
        }

        let kinds: Vec<_> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|t| t.token_type.clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::LEFT_PAREN,
                TokenType::EOF
            ]
        );
    }

    #[test]
    fn test_scanner_14_identifiers_and_underscores() {
        assert_token_sequence(
            "foo _bar Baz_99 classy",
            &[
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::IDENTIFIER, "_bar"),
                (TokenType::IDENTIFIER, "Baz_99"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::EOF, ""),
            ],
        );
    }
}
