use std::rc::Rc;

use crate::ast::{ArrayPattern, ExprKind, Expression, Identifier, Pattern};
use crate::span::Span;
use crate::token::{Keyword, Token, TokenKind};

use super::{Expected, ParseError, Parser};

/// Binding strength of an infix operator, or None for tokens that are
/// never infix (`=` and `=>` among them).
pub fn precedence_of(op: &str) -> Option<u8> {
    match op {
        "||" => Some(2),
        "&&" => Some(3),
        "<" | ">" | "<=" | ">=" | "==" | "!=" => Some(7),
        "+" | "-" => Some(10),
        "*" | "/" | "%" | "**" => Some(20),
        "::" | "@" => Some(30),
        "|>" | ">>" | "<|" | "<<" => Some(40),
        _ => None,
    }
}

pub fn parse_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let left = parse_applied(parser)?;
    let left = maybe_binary(parser, left, 0)?;
    maybe_ternary(parser, left)
}

fn maybe_ternary(parser: &mut Parser, condition: Expression) -> Result<Expression, ParseError> {
    if !parser.at_punc('?') {
        return Ok(condition);
    }
    parser.expect_punc('?')?;
    let then = parse_expression(parser)?;
    parser.expect_punc(':')?;
    let otherwise = parse_expression(parser)?;
    let span = condition.span.to(otherwise.span);
    Ok(Expression {
        kind: ExprKind::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        span,
    })
}

/// Precedence climbing. Each infix operator becomes a call of the
/// operator identifier with the arguments stored right operand first,
/// so evaluation can treat operators like any other curried callable.
fn maybe_binary(
    parser: &mut Parser,
    mut left: Expression,
    min_precedence: u8,
) -> Result<Expression, ParseError> {
    loop {
        let (op, op_span, precedence) = match parser.stream.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                span,
            }) => match precedence_of(op) {
                Some(precedence) if precedence > min_precedence => {
                    (op.clone(), *span, precedence)
                }
                _ => return Ok(left),
            },
            _ => return Ok(left),
        };
        parser.stream.advance();
        let right = parse_applied(parser)?;
        let right = maybe_binary(parser, right, precedence)?;
        let span = left.span.to(right.span);
        let callee = Expression {
            kind: ExprKind::Identifier(op),
            span: op_span,
        };
        left = Expression {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                args: vec![right, left],
            },
            span,
        };
    }
}

fn parse_applied(parser: &mut Parser) -> Result<Expression, ParseError> {
    let atom = parse_atom(parser)?;
    maybe_call(parser, atom)
}

fn starts_atom(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Ident(_)
            | TokenKind::Number(_)
            | TokenKind::Str(_)
            | TokenKind::Keyword(Keyword::True)
            | TokenKind::Keyword(Keyword::False)
            | TokenKind::Punc('(')
            | TokenKind::Punc('[')
    )
}

/// A bare identifier (or member access) followed by a run of atoms is
/// a call. When the head and every consumed atom are bare identifiers
/// and the next token is `=>`, the whole run was actually a parameter
/// list and the construct is reinterpreted as a function literal. The
/// reclassification only ever goes that way.
fn maybe_call(parser: &mut Parser, head: Expression) -> Result<Expression, ParseError> {
    if !matches!(head.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
        return Ok(head);
    }
    let mut args = Vec::new();
    while parser.stream.peek().map(starts_atom).unwrap_or(false) {
        args.push(parse_atom(parser)?);
    }
    if parser.at_op("=>") {
        if let Some(params) = as_parameters(&head, &args) {
            parser.expect_op("=>")?;
            let body = parse_expression(parser)?;
            let span = head.span.to(body.span);
            return Ok(Expression {
                kind: ExprKind::Function {
                    params,
                    body: Rc::new(body),
                },
                span,
            });
        }
    }
    if args.is_empty() {
        return Ok(head);
    }
    let span = head.span.to(args[args.len() - 1].span);
    Ok(Expression {
        kind: ExprKind::Call {
            callee: Box::new(head),
            args,
        },
        span,
    })
}

fn as_parameters(head: &Expression, args: &[Expression]) -> Option<Vec<Identifier>> {
    let mut params = Vec::with_capacity(args.len() + 1);
    for expression in std::iter::once(head).chain(args) {
        match &expression.kind {
            ExprKind::Identifier(name) => params.push(Identifier {
                name: name.clone(),
                span: expression.span,
            }),
            _ => return None,
        }
    }
    Some(params)
}

fn parse_atom(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser
        .stream
        .advance()
        .ok_or(ParseError::PrematureEndOfInput {
            expected: Expected::Expression,
        })?;
    let span = token.span;
    let atom = match &token.kind {
        TokenKind::Number(text) => {
            let value = text
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber(token.clone()))?;
            Expression {
                kind: ExprKind::Number(value),
                span,
            }
        }
        TokenKind::Str(text) => Expression {
            kind: ExprKind::Str(text.clone()),
            span,
        },
        TokenKind::Ident(name) => Expression {
            kind: ExprKind::Identifier(name.clone()),
            span,
        },
        TokenKind::Keyword(Keyword::True) => Expression {
            kind: ExprKind::Bool(true),
            span,
        },
        TokenKind::Keyword(Keyword::False) => Expression {
            kind: ExprKind::Bool(false),
            span,
        },
        TokenKind::Keyword(Keyword::If) => parse_if(parser, span)?,
        TokenKind::Keyword(Keyword::Let) => parse_let(parser, span)?,
        TokenKind::Keyword(Keyword::Export) => parse_export(parser, span)?,
        TokenKind::Keyword(Keyword::Import) => parse_import(parser, span)?,
        TokenKind::Punc('(') => parse_paren(parser, span)?,
        TokenKind::Punc('[') => parse_array(parser, span)?,
        TokenKind::Punc('{') => parse_brace(parser, span)?,
        TokenKind::Punc('.') => {
            let property = parser.parse_identifier()?;
            let span = span.to(property.span);
            Expression {
                kind: ExprKind::PropertyAccessor(property),
                span,
            }
        }
        _ => {
            return Err(ParseError::UnexpectedToken {
                expected: Expected::Expression,
                got: token,
            })
        }
    };
    maybe_member(parser, atom)
}

fn maybe_member(parser: &mut Parser, mut object: Expression) -> Result<Expression, ParseError> {
    while parser.at_punc('.') {
        parser.expect_punc('.')?;
        let property = parser.parse_identifier()?;
        let span = object.span.to(property.span);
        object = Expression {
            kind: ExprKind::Member {
                object: Box::new(object),
                property,
            },
            span,
        };
    }
    Ok(object)
}

fn parse_paren(parser: &mut Parser, open: Span) -> Result<Expression, ParseError> {
    if parser.at_punc(')') {
        let close = parser.expect_punc(')')?;
        return Ok(Expression {
            kind: ExprKind::Unit,
            span: open.to(close),
        });
    }
    let inner = parse_expression(parser)?;
    let close = parser.expect_punc(')')?;
    Ok(Expression {
        kind: inner.kind,
        span: open.to(close),
    })
}

fn parse_array(parser: &mut Parser, open: Span) -> Result<Expression, ParseError> {
    let mut items = Vec::new();
    while !parser.at_punc(']') {
        items.push(parse_expression(parser)?);
        if !parser.at_punc(']') {
            parser.expect_punc(',')?;
        }
    }
    let close = parser.expect_punc(']')?;
    Ok(Expression {
        kind: ExprKind::Array(items),
        span: open.to(close),
    })
}

/// `{` opens either an object literal or a block. It is an object when
/// the first thing inside is an identifier followed by a colon.
fn parse_brace(parser: &mut Parser, open: Span) -> Result<Expression, ParseError> {
    let object = matches!(
        parser.stream.peek(),
        Some(Token {
            kind: TokenKind::Ident(_),
            ..
        })
    ) && matches!(
        parser.stream.peek_nth(1),
        Some(Token {
            kind: TokenKind::Punc(':'),
            ..
        })
    );
    if object {
        return parse_object(parser, open);
    }
    let mut body = Vec::new();
    while !parser.at_punc('}') {
        body.push(parse_expression(parser)?);
        if parser.at_punc(';') {
            parser.expect_punc(';')?;
        } else {
            break;
        }
    }
    let close = parser.expect_punc('}')?;
    if body.len() == 1 {
        let only = body.remove(0);
        return Ok(Expression {
            kind: only.kind,
            span: open.to(close),
        });
    }
    Ok(Expression {
        kind: ExprKind::Block(body),
        span: open.to(close),
    })
}

fn parse_object(parser: &mut Parser, open: Span) -> Result<Expression, ParseError> {
    let mut entries = Vec::new();
    while !parser.at_punc('}') {
        let key = parser.parse_identifier()?;
        parser.expect_punc(':')?;
        let value = parse_expression(parser)?;
        entries.push((key, value));
        if !parser.at_punc('}') {
            parser.expect_punc(',')?;
        }
    }
    let close = parser.expect_punc('}')?;
    Ok(Expression {
        kind: ExprKind::Object(entries),
        span: open.to(close),
    })
}

fn parse_if(parser: &mut Parser, start: Span) -> Result<Expression, ParseError> {
    let condition = parse_expression(parser)?;
    parser.expect_keyword(Keyword::Then)?;
    let then = parse_expression(parser)?;
    parser.expect_keyword(Keyword::Else)?;
    let otherwise = parse_expression(parser)?;
    let span = start.to(otherwise.span);
    Ok(Expression {
        kind: ExprKind::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        span,
    })
}

fn parse_let(parser: &mut Parser, start: Span) -> Result<Expression, ParseError> {
    if parser.at_punc('(') {
        let open = parser.expect_punc('(')?;
        let mut names = vec![parser.parse_identifier()?];
        while parser.at_op("::") {
            parser.expect_op("::")?;
            names.push(parser.parse_identifier()?);
        }
        let close = parser.expect_punc(')')?;
        parser.expect_op("=")?;
        let value = parse_expression(parser)?;
        let span = start.to(value.span);
        return Ok(Expression {
            kind: ExprKind::Assign {
                pattern: Pattern::Array(ArrayPattern {
                    names,
                    span: open.to(close),
                }),
                value: Box::new(value),
            },
            span,
        });
    }
    let name = parser.parse_identifier()?;
    let value = parse_binding(parser)?;
    let span = start.to(value.span);
    Ok(Expression {
        kind: ExprKind::Assign {
            pattern: Pattern::Identifier(name),
            value: Box::new(value),
        },
        span,
    })
}

fn parse_export(parser: &mut Parser, start: Span) -> Result<Expression, ParseError> {
    parser.expect_keyword(Keyword::Let)?;
    let name = parser.parse_identifier()?;
    let value = parse_binding(parser)?;
    let span = start.to(value.span);
    Ok(Expression {
        kind: ExprKind::Export {
            name,
            value: Box::new(value),
        },
        span,
    })
}

/// The right-hand side of `let name ... = value`, turning any leading
/// identifiers into function parameters: `let f a b = e` is sugar for
/// `let f = (a b => e)`.
fn parse_binding(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut params = Vec::new();
    while parser.at_ident() {
        params.push(parser.parse_identifier()?);
    }
    parser.expect_op("=")?;
    let value = parse_expression(parser)?;
    if params.is_empty() {
        return Ok(value);
    }
    let span = params[0].span.to(value.span);
    Ok(Expression {
        kind: ExprKind::Function {
            params,
            body: Rc::new(value),
        },
        span,
    })
}

fn parse_import(parser: &mut Parser, start: Span) -> Result<Expression, ParseError> {
    if parser.at_punc('(') {
        parser.expect_punc('(')?;
        let mut names = vec![parser.parse_identifier()?];
        while parser.at_punc(',') {
            parser.expect_punc(',')?;
            names.push(parser.parse_identifier()?);
        }
        parser.expect_punc(')')?;
        parser.expect_keyword(Keyword::From)?;
        let (source, source_span) = parser.parse_string()?;
        return Ok(Expression {
            kind: ExprKind::Import { names, source },
            span: start.to(source_span),
        });
    }
    let name = parser.parse_identifier()?;
    parser.expect_keyword(Keyword::From)?;
    let (source, source_span) = parser.parse_string()?;
    Ok(Expression {
        kind: ExprKind::ImportAll { name, source },
        span: start.to(source_span),
    })
}
