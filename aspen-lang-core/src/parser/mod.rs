pub mod error;
pub mod expressions;

use std::rc::Rc;

use crate::ast::{Identifier, Program};
use crate::span::Span;
use crate::token::{Keyword, Token, TokenKind, TokenStream};
pub use error::{Expected, ParseError};
use expressions::parse_expression;

pub struct Parser {
    stream: TokenStream,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            stream: TokenStream::new(tokens),
        }
    }

    pub(crate) fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.stream.advance();
        match token {
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
            }) => Ok(Identifier { name, span }),
            other => Err(ParseError::unexpected(Expected::Identifier, other)),
        }
    }

    pub(crate) fn parse_string(&mut self) -> Result<(Rc<str>, Span), ParseError> {
        let token = self.stream.advance();
        match token {
            Some(Token {
                kind: TokenKind::Str(text),
                span,
            }) => Ok((text, span)),
            other => Err(ParseError::unexpected(Expected::StringLiteral, other)),
        }
    }

    pub(crate) fn expect_punc(&mut self, punc: char) -> Result<Span, ParseError> {
        let token = self.stream.advance();
        match token {
            Some(Token {
                kind: TokenKind::Punc(ch),
                span,
            }) if ch == punc => Ok(span),
            other => Err(ParseError::unexpected(Expected::Punc(punc), other)),
        }
    }

    pub(crate) fn expect_op(&mut self, op: &'static str) -> Result<Span, ParseError> {
        let token = self.stream.advance();
        match token {
            Some(Token {
                kind: TokenKind::Op(text),
                span,
            }) if &*text == op => Ok(span),
            other => Err(ParseError::unexpected(Expected::Op(op), other)),
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Span, ParseError> {
        let token = self.stream.advance();
        match token {
            Some(Token {
                kind: TokenKind::Keyword(k),
                span,
            }) if k == keyword => Ok(span),
            other => Err(ParseError::unexpected(Expected::Keyword(keyword), other)),
        }
    }

    pub(crate) fn at_punc(&self, punc: char) -> bool {
        matches!(
            self.stream.peek(),
            Some(Token { kind: TokenKind::Punc(ch), .. }) if *ch == punc
        )
    }

    pub(crate) fn at_op(&self, op: &str) -> bool {
        matches!(
            self.stream.peek(),
            Some(Token { kind: TokenKind::Op(text), .. }) if &**text == op
        )
    }

    pub(crate) fn at_ident(&self) -> bool {
        matches!(
            self.stream.peek(),
            Some(Token {
                kind: TokenKind::Ident(_),
                ..
            })
        )
    }

    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut body = Vec::new();
        let mut errors = Vec::new();

        while !self.stream.is_eof() {
            match parse_expression(self) {
                Ok(expression) => body.push(expression),
                Err(err) => errors.push(err),
            }
            // Clear until the next semicolon, giving an error if there
            // are other tokens in between
            match self.stream.peek() {
                Some(Token {
                    kind: TokenKind::Punc(';'),
                    ..
                }) => {
                    self.stream.advance();
                }
                None => {}
                Some(token) => {
                    errors.push(ParseError::UnexpectedToken {
                        expected: Expected::Punc(';'),
                        got: token.clone(),
                    });
                    while let Some(token) = self.stream.advance() {
                        if token.kind == TokenKind::Punc(';') {
                            break;
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(Program { body })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            let tokens = crate::lexer::tokenize(input).unwrap();
            let mut parser = crate::parser::Parser::new(tokens);

            let program = parser.parse_program().unwrap();

            assert_eq!(program.to_string(), expected)
        }
    }

    #[test]
    fn test_precedence() {
        let tests = vec![
            ("1 + 2 * 3", "(1 + (2 * 3));\n"),
            ("a + b + c", "((a + b) + c);\n"),
            ("a * b + c", "((a * b) + c);\n"),
            ("(1 + 2) * 3", "((1 + 2) * 3);\n"),
            ("a < b == c > d", "((a < b) == (c > d));\n"),
            ("a || b && c", "(a || (b && c));\n"),
            ("1 :: rest @ tail", "((1 :: rest) @ tail);\n"),
            ("x |> f |> g", "((x |> f) |> g);\n"),
            ("a + b |> f", "(a + (b |> f));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_calls() {
        let tests = vec![
            ("add 1 2", "(add 1 2);\n"),
            ("f (g 1) 2", "(f (g 1) 2);\n"),
            ("a + add b c + d", "((a + (add b c)) + d);\n"),
            ("io.print \"hi\"", "(io.print \"hi\");\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_function_literals() {
        let tests = vec![
            ("n => n + 2", "(n => (n + 2));\n"),
            ("a b => a + b", "(a b => (a + b));\n"),
            ("1 |> (n => n * 3)", "(1 |> (n => (n * 3)));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_bindings() {
        let tests = vec![
            ("let x = 1", "let x = 1;\n"),
            ("let f a b = a + b", "let f = (a b => (a + b));\n"),
            ("let (a :: b) = [1, 2]", "let (a :: b) = [1, 2];\n"),
            (
                "let (a :: b :: rest) = xs",
                "let (a :: b :: rest) = xs;\n",
            ),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_conditionals() {
        let tests = vec![
            ("if x < y then x else y", "(if (x < y) then x else y);\n"),
            ("x < y ? x : y", "(if (x < y) then x else y);\n"),
            ("a ? b : c ? d : e", "(if a then b else (if c then d else e));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_modules() {
        let tests = vec![
            (
                "import (a, b) from \"./m.aspen\"",
                "import (a, b) from \"./m.aspen\";\n",
            ),
            ("import str from \"string\"", "import str from \"string\";\n"),
            ("export let x = 1", "export let x = 1;\n"),
            (
                "export let double n = n * 2",
                "export let double = (n => (n * 2));\n",
            ),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_objects_and_members() {
        let tests = vec![
            ("{ a: 1, b: 2 }", "{a: 1, b: 2};\n"),
            ("o.a + o.b", "(o.a + o.b);\n"),
            ("{ 1; 2 }", "{1; 2};\n"),
            ("(.a)", ".a;\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_unit_and_arrays() {
        let tests = vec![
            ("()", "();\n"),
            ("[]", "[];\n"),
            ("[1, 2, [3]]", "[1, 2, [3]];\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_printing_is_a_fixed_point() {
        let inputs = vec![
            "1 + 2 * 3",
            "a < b == c > d",
            "x |> f >> g <| h",
            "add 1 (f 2) [3]",
            "n => n + 2",
            "a b => a :: b",
            "let f a b = a + b",
            "let (a :: b :: rest) = xs",
            "if x < y then x else y",
            "x ? f y : { let z = 1; z }",
            "{ a: 1, b: [2, g 3] }",
            "o.a |> (.b)",
            "import (a, b) from \"./m.aspen\"",
            "import str from \"string\"",
            "export let double n = n * 2",
            "()",
        ];
        for input in inputs {
            let tokens = crate::lexer::tokenize(input).unwrap();
            let printed = crate::parser::Parser::new(tokens)
                .parse_program()
                .unwrap()
                .to_string();
            let tokens = crate::lexer::tokenize(&printed).unwrap();
            let reprinted = crate::parser::Parser::new(tokens)
                .parse_program()
                .unwrap()
                .to_string();
            assert_eq!(reprinted, printed, "input: {}", input);
        }
    }

    #[test]
    fn test_missing_semicolon_is_an_error() {
        let tokens = crate::lexer::tokenize("let x = 1 let y = 2").unwrap();
        let mut parser = crate::parser::Parser::new(tokens);
        assert!(parser.parse_program().is_err());
    }
}
