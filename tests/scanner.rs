#[cfg(test)]
mod scanner_tests {
    use quill::scanner::*;
    use quill::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
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
    fn test_scanner_02_ternary_operators() {
        assert_token_sequence(
            "a ? b : c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::QUESTION, "?"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords() {
        assert_token_sequence(
            "let x = null; break; static fun",
            &[
                (TokenType::LET, "let"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NULL, "null"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::BREAK, "break"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::STATIC, "static"),
                (TokenType::FUN, "fun"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_two_char_operators() {
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
    fn test_scanner_05_number_literals() {
        let scanner = Scanner::new("123 3.14 0.5");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let numbers: Vec<f64> = tokens
            .iter()
            .filter_map(|t| match t.token_type {
                TokenType::NUMBER(n) => Some(n),
                _ => None,
            })
            .collect();

        assert_eq!(numbers, vec![123.0, 3.14, 0.5]);
    }

    #[test]
    fn test_scanner_06_string_literal_keeps_raw_escapes() {
        let scanner = Scanner::new(r#""a\nb""#);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, r"a\nb"),
            other => panic!("expected string token, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_07_comments_and_lines() {
        let source = "let a = 1; // trailing comment\nlet b = 2;";
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        // Comment text produces no tokens.
        assert!(tokens.iter().all(|t| t.lexeme != "//"));

        let b = tokens
            .iter()
            .find(|t| t.lexeme == "b")
            .expect("identifier b scanned");
        assert_eq!(b.line, 2);
    }

    #[test]
    fn test_scanner_08_unexpected_character_is_an_error() {
        let results: Vec<_> = Scanner::new("let $ = 1;").collect();

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 1);

        let err = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .next()
            .expect("one error");
        assert!(err.to_string().contains("Unexpected character: $"));
    }

    #[test]
    fn test_scanner_09_unterminated_string() {
        let results: Vec<_> = Scanner::new("\"never closed").collect();

        let err = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .next()
            .expect("one error");
        assert!(err.to_string().contains("Unterminated string."));
    }

    #[test]
    fn test_scanner_10_exactly_one_eof() {
        let mut scanner = Scanner::new("1 + 2");

        let mut eof_count = 0;
        while let Some(token) = scanner.next() {
            if let Ok(token) = token {
                if token.token_type == TokenType::EOF {
                    eof_count += 1;
                }
            }
        }

        assert_eq!(eof_count, 1);
        assert!(scanner.next().is_none()); // fused
    }
}
