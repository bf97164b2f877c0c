#[cfg(test)]
mod scanner_tests {
    use rox::error::{Diagnostics, LoxError};
    use rox::scanner::*;
    use rox::token::*;

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
    fn test_two_char_operators_use_maximal_munch() {
        assert_token_sequence(
            "!= == <= >= ! = < > / ",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA, 1: DOT, 2: error '$', 3: LEFT_PAREN, 4: error '#', 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("é;", &mut diagnostics);

        assert_eq!(diagnostics.errors().len(), 1);
        assert_eq!(
            diagnostics.errors()[0].to_string(),
            "[line 1] Error: Unexpected character: é"
        );
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::SEMICOLON);
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("// header\nvar a; // trailing\n\nprint a;", &mut diagnostics);

        assert!(!diagnostics.has_errors());

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![2, 2, 2, 4, 4, 4, 4]);
    }

    #[test]
    fn test_string_literals() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("\"hello\" \"two\nlines\"", &mut diagnostics);

        assert!(!diagnostics.has_errors());
        assert_eq!(tokens[0].literal(), Some(Literal::Str("hello".to_string())));
        assert_eq!(tokens[0].lexeme, "\"hello\"");
        assert_eq!(tokens[1].literal(), Some(Literal::Str("two\nlines".to_string())));
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
    }

    #[test]
    fn test_unterminated_string_is_reported_and_stream_still_ends() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("print \"oops\nnever closed", &mut diagnostics);

        assert_eq!(diagnostics.errors().len(), 1);
        assert_eq!(
            diagnostics.errors()[0].to_string(),
            "[line 2] Error: Unterminated string."
        );
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn test_numbers_leave_trailing_dot_alone() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("123 4.5 6.", &mut diagnostics);

        assert!(!diagnostics.has_errors());
        assert_eq!(tokens[0].literal(), Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].literal(), Some(Literal::Number(4.5)));
        assert_eq!(tokens[2].lexeme, "6");
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "class fun var import this _private constructor orchid",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::VAR, "var"),
                (TokenType::IMPORT, "import"),
                (TokenType::THIS, "this"),
                (TokenType::IDENTIFIER, "_private"),
                (TokenType::IDENTIFIER, "constructor"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_lexemes_reproduce_significant_source() {
        let source = "fun add(a, b) {\n  return a+b; // sum\n}\nprint add(1.5, 2) >= 3;";

        let mut diagnostics = Diagnostics::new();
        let rebuilt: String = scan_tokens(source, &mut diagnostics)
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect();

        let significant: String = source
            .lines()
            .map(|line| line.split("//").next().unwrap_or(""))
            .collect::<String>()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        assert_eq!(rebuilt, significant);
    }

    #[test]
    fn test_token_display() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("42 \"hi\" x", &mut diagnostics);

        let printed: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            printed,
            vec![
                "NUMBER 42 42.0",
                "STRING \"hi\" hi",
                "IDENTIFIER x null",
                "EOF  null",
            ]
        );
    }
}
