use thiserror::Error;

use crate::span::{Position, Span};
use crate::token::{Keyword, Token, TokenKind};

/// Longer operators first so the accumulator extends greedily.
pub const OPERATORS: &[&str] = &[
    "|>", ">>", "<|", "<<", "=>", "<=", ">=", "!=", "==", "||", "&&", "**", "::", "<", ">", "=",
    "+", "-", "/", "%", "*", "@",
];

pub const PUNCTUATION: &str = "()[]{};?:,.";

static KEYWORDS: phf::Map<&str, Keyword> = phf::phf_map! {
    "let" => Keyword::Let,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "if" => Keyword::If,
    "then" => Keyword::Then,
    "else" => Keyword::Else,
    "export" => Keyword::Export,
    "import" => Keyword::Import,
    "from" => Keyword::From,
};

pub fn is_operator(text: &str) -> bool {
    OPERATORS.contains(&text)
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum LexError {
    #[error("Unexpected character {character:?}")]
    UnexpectedCharacter { character: char, span: Span },
    #[error("Unterminated string")]
    UnterminatedString { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
        }
    }
}

/// Single left-to-right scan over the source. Characters pile up in an
/// accumulator until the next character can no longer extend it, at
/// which point the accumulator is committed as one token. Newlines
/// always force a commit, so a token never crosses a line.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut stack = String::new();
    let mut start = Position { line: 1, col: 1 };
    let mut line: u32 = 1;
    let mut col: u32 = 0;
    let mut in_comment = false;

    // A trailing newline guarantees the last accumulator commits.
    for ch in input.chars().chain(std::iter::once('\n')) {
        if ch == '\n' {
            if !in_comment && !stack.is_empty() {
                if stack.starts_with('"') {
                    return Err(LexError::UnterminatedString {
                        span: span_of(start, &stack),
                    });
                }
                tokens.push(commit(&mut stack, start)?);
            }
            in_comment = false;
            stack.clear();
            line += 1;
            col = 0;
            continue;
        }
        col += 1;
        if in_comment {
            continue;
        }

        if stack.starts_with('"') {
            stack.push(ch);
            if ch == '"' {
                tokens.push(commit(&mut stack, start)?);
            }
            continue;
        }

        if stack.is_empty() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                continue;
            }
            start = Position { line, col };
            stack.push(ch);
            continue;
        }

        if extends(&stack, ch) {
            stack.push(ch);
            if stack == "//" {
                stack.clear();
                in_comment = true;
            }
            continue;
        }

        tokens.push(commit(&mut stack, start)?);
        if ch == ' ' || ch == '\t' || ch == '\r' {
            continue;
        }
        start = Position { line, col };
        stack.push(ch);
    }

    Ok(tokens)
}

/// Whether `ch` can keep growing the accumulator without changing what
/// kind of token it will commit as.
fn extends(stack: &str, ch: char) -> bool {
    if stack == "/" && ch == '/' {
        return true;
    }
    let first = match stack.chars().next() {
        Some(first) => first,
        None => return false,
    };
    if first.is_ascii_alphabetic() {
        return ch.is_ascii_alphabetic() || ch == '-';
    }
    if first.is_ascii_digit() {
        return ch.is_ascii_digit() || (ch == '.' && !stack.contains('.'));
    }
    // Operator and punctuation territory. A punctuation character only
    // grows when the longer text is itself an operator, which is how
    // `::` wins over two `:`.
    let mut candidate = String::from(stack);
    candidate.push(ch);
    is_operator(&candidate)
}

fn span_of(start: Position, text: &str) -> Span {
    Span {
        start,
        end: Position {
            line: start.line,
            col: start.col + text.chars().count() as u32,
        },
    }
}

fn commit(stack: &mut String, start: Position) -> Result<Token, LexError> {
    let text = std::mem::take(stack);
    let span = span_of(start, &text);
    match classify(&text) {
        Some(kind) => Ok(Token { kind, span }),
        None => Err(LexError::UnexpectedCharacter {
            character: text.chars().next().unwrap_or(' '),
            span,
        }),
    }
}

fn classify(text: &str) -> Option<TokenKind> {
    if let Some(keyword) = KEYWORDS.get(text) {
        return Some(TokenKind::Keyword(*keyword));
    }
    if is_operator(text) {
        return Some(TokenKind::Op(text.into()));
    }
    let first = text.chars().next()?;
    if text.chars().count() == 1 && PUNCTUATION.contains(first) {
        return Some(TokenKind::Punc(first));
    }
    if first.is_ascii_alphabetic() && text.chars().all(|ch| ch.is_ascii_alphabetic() || ch == '-') {
        return Some(TokenKind::Ident(text.into()));
    }
    if first.is_ascii_digit()
        && text.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        && text.matches('.').count() <= 1
    {
        return Some(TokenKind::Number(text.into()));
    }
    if first == '"' && text.len() >= 2 && text.ends_with('"') {
        return Some(TokenKind::Str(text[1..text.len() - 1].into()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            kinds("let add = a b => a + b;"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Ident("add".into()),
                TokenKind::Op("=".into()),
                TokenKind::Ident("a".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Op("=>".into()),
                TokenKind::Ident("a".into()),
                TokenKind::Op("+".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Punc(';'),
            ]
        );
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            kinds("a<=b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Op("<=".into()),
                TokenKind::Ident("b".into()),
            ]
        );
        assert_eq!(
            kinds("x |> f >> g"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Op("|>".into()),
                TokenKind::Ident("f".into()),
                TokenKind::Op(">>".into()),
                TokenKind::Ident("g".into()),
            ]
        );
    }

    #[test]
    fn test_colon_extends_to_cons() {
        assert_eq!(
            kinds("a::b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Op("::".into()),
                TokenKind::Ident("b".into()),
            ]
        );
        assert_eq!(
            kinds("a: b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punc(':'),
                TokenKind::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn test_kebab_identifier() {
        assert_eq!(kinds("read-file"), vec![TokenKind::Ident("read-file".into())]);
    }

    #[test]
    fn test_keywords_at_word_boundary() {
        assert_eq!(kinds("lets"), vec![TokenKind::Ident("lets".into())]);
        assert_eq!(kinds("let"), vec![TokenKind::Keyword(Keyword::Let)]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1.5"), vec![TokenKind::Number("1.5".into())]);
        assert_eq!(
            kinds("1 2.25"),
            vec![
                TokenKind::Number("1".into()),
                TokenKind::Number("2.25".into()),
            ]
        );
    }

    #[test]
    fn test_strings_and_comments() {
        assert_eq!(
            kinds("\"hello world\" // trailing\n5"),
            vec![
                TokenKind::Str("hello world".into()),
                TokenKind::Number("5".into()),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("let x = 5").unwrap();
        let spans: Vec<(u32, u32, u32)> = tokens
            .iter()
            .map(|token| (token.span.start.line, token.span.start.col, token.span.end.col))
            .collect();
        assert_eq!(spans, vec![(1, 1, 4), (1, 5, 6), (1, 7, 8), (1, 9, 10)]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("1 $ 2").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '$',
                span: Span {
                    start: Position { line: 1, col: 3 },
                    end: Position { line: 1, col: 4 },
                },
            }
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("\"abc").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_relexing_lexemes_is_stable() {
        let input = "let f = a => a :: [1, 2.5] @ rest; f <| \"x\";";
        let tokens = tokenize(input).unwrap();
        let lexemes = tokens
            .iter()
            .map(|token| token.kind.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let relexed = tokenize(&lexemes).unwrap();
        let left: Vec<_> = tokens.into_iter().map(|token| token.kind).collect();
        let right: Vec<_> = relexed.into_iter().map(|token| token.kind).collect();
        assert_eq!(left, right);
    }
}
