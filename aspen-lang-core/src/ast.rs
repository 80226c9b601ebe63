use std::fmt;
use std::rc::Rc;

use crate::span::Span;

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub body: Vec<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    pub name: Rc<str>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

/// Everything is an expression, including bindings and imports.
/// Infix operators are not a separate node: `a + b` parses to a
/// [`ExprKind::Call`] whose callee is the identifier `+` and whose
/// arguments are stored right operand first.
#[derive(Debug, PartialEq, Clone)]
pub enum ExprKind {
    Number(f64),
    Str(Rc<str>),
    Bool(bool),
    Unit,
    Identifier(Rc<str>),
    Array(Vec<Expression>),
    Object(Vec<(Identifier, Expression)>),
    Member {
        object: Box<Expression>,
        property: Identifier,
    },
    /// `.name`, a function from an object to one of its members.
    PropertyAccessor(Identifier),
    Assign {
        pattern: Pattern,
        value: Box<Expression>,
    },
    Export {
        name: Identifier,
        value: Box<Expression>,
    },
    Import {
        names: Vec<Identifier>,
        source: Rc<str>,
    },
    ImportAll {
        name: Identifier,
        source: Rc<str>,
    },
    Function {
        params: Vec<Identifier>,
        body: Rc<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    If {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    Block(Vec<Expression>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Pattern {
    Identifier(Identifier),
    Array(ArrayPattern),
}

/// `(a :: b :: rest)` on the left of a binding. All names but the last
/// bind positionally; the last one takes the remaining tail.
#[derive(Debug, PartialEq, Clone)]
pub struct ArrayPattern {
    pub names: Vec<Identifier>,
    pub span: Span,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for expression in &self.body {
            writeln!(f, "{};", expression)?;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprKind::Number(value) => write!(f, "{}", value),
            ExprKind::Str(text) => write!(f, "\"{}\"", text),
            ExprKind::Bool(value) => write!(f, "{}", value),
            ExprKind::Unit => write!(f, "()"),
            ExprKind::Identifier(name) => write!(f, "{}", name),
            ExprKind::Array(items) => {
                write!(f, "[")?;
                write_joined(f, items, ", ")?;
                write!(f, "]")
            }
            ExprKind::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            ExprKind::Member { object, property } => write!(f, "{}.{}", object, property),
            ExprKind::PropertyAccessor(property) => write!(f, ".{}", property),
            ExprKind::Assign { pattern, value } => write!(f, "let {} = {}", pattern, value),
            ExprKind::Export { name, value } => write!(f, "export let {} = {}", name, value),
            ExprKind::Import { names, source } => {
                write!(f, "import (")?;
                write_joined(f, names, ", ")?;
                write!(f, ") from \"{}\"", source)
            }
            ExprKind::ImportAll { name, source } => {
                write!(f, "import {} from \"{}\"", name, source)
            }
            ExprKind::Function { params, body } => {
                write!(f, "(")?;
                write_joined(f, params, " ")?;
                write!(f, " => {})", body)
            }
            ExprKind::Call { callee, args } => {
                if let ExprKind::Identifier(name) = &callee.kind {
                    if crate::lexer::is_operator(name) && args.len() == 2 {
                        return write!(f, "({} {} {})", args[1], name, args[0]);
                    }
                }
                write!(f, "({} ", callee)?;
                write_joined(f, args, " ")?;
                write!(f, ")")
            }
            ExprKind::If {
                condition,
                then,
                otherwise,
            } => write!(f, "(if {} then {} else {})", condition, then, otherwise),
            ExprKind::Block(body) => {
                write!(f, "{{")?;
                write_joined(f, body, "; ")?;
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pattern::Identifier(name) => write!(f, "{}", name),
            Pattern::Array(pattern) => {
                write!(f, "(")?;
                write_joined(f, &pattern.names, " :: ")?;
                write!(f, ")")
            }
        }
    }
}
