use std::fmt;

use thiserror::Error;

use crate::span::Span;
use crate::token::{Keyword, Token};

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error("Unexpected end of input, expected {expected}")]
    PrematureEndOfInput { expected: Expected },
    #[error("Unexpected token '{got}', expected {expected}")]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("Invalid number literal '{0}'")]
    InvalidNumber(Token),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expected {
    Punc(char),
    Op(&'static str),
    Keyword(Keyword),
    Identifier,
    Expression,
    StringLiteral,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Punc(ch) => write!(f, "'{}'", ch),
            Expected::Op(op) => write!(f, "'{}'", op),
            Expected::Keyword(keyword) => write!(f, "'{}'", keyword),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
            Expected::StringLiteral => write!(f, "a string literal"),
        }
    }
}

impl ParseError {
    pub(crate) fn unexpected(expected: Expected, got: Option<Token>) -> ParseError {
        match got {
            Some(got) => ParseError::UnexpectedToken { expected, got },
            None => ParseError::PrematureEndOfInput { expected },
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::PrematureEndOfInput { .. } => None,
            ParseError::UnexpectedToken { got, .. } => Some(got.span),
            ParseError::InvalidNumber(token) => Some(token.span),
        }
    }
}
