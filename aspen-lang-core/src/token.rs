use std::fmt;
use std::rc::Rc;

use crate::span::Span;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    Let,
    True,
    False,
    If,
    Then,
    Else,
    Export,
    Import,
    From,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Ident(Rc<str>),
    Keyword(Keyword),
    Number(Rc<str>),
    Str(Rc<str>),
    Op(Rc<str>),
    Punc(char),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let word = match self {
            Keyword::Let => "let",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::If => "if",
            Keyword::Then => "then",
            Keyword::Else => "else",
            Keyword::Export => "export",
            Keyword::Import => "import",
            Keyword::From => "from",
        };
        write!(f, "{}", word)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::Keyword(keyword) => write!(f, "{}", keyword),
            TokenKind::Number(text) => write!(f, "{}", text),
            TokenKind::Str(text) => write!(f, "\"{}\"", text),
            TokenKind::Op(op) => write!(f, "{}", op),
            TokenKind::Punc(ch) => write!(f, "{}", ch),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Cursor over the lexed token buffer. The parser only ever looks a
/// couple of tokens ahead, so the whole buffer is kept around.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream { tokens, index: 0 }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.index + n)
    }

    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }
}
