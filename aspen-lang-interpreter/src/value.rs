use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use aspen_lang_core::ast::Expression;
use aspen_lang_core::span::Span;

use crate::context::Context;
use crate::environment::Environment;

use thiserror::Error;

/// The exports of one evaluated module unit.
pub type ModuleRecord = HashMap<Rc<str>, Rc<Value>>;

#[derive(Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    String(Rc<str>),
    Array(Vec<Rc<Value>>),
    Object(HashMap<Rc<str>, Rc<Value>>),
    Function(Function),
    Builtin(Builtin),
    Module(Rc<ModuleRecord>),
    Unit,
}

thread_local! {
    static TRUE: Rc<Value> = Rc::new(Value::Bool(true));
    static FALSE: Rc<Value> = Rc::new(Value::Bool(false));
    static UNIT: Rc<Value> = Rc::new(Value::Unit);
}

impl Value {
    pub fn unit() -> Rc<Value> {
        UNIT.with(|x| x.clone())
    }
    pub fn boolean(value: bool) -> Rc<Value> {
        if value {
            TRUE.with(|x| x.clone())
        } else {
            FALSE.with(|x| x.clone())
        }
    }
    pub fn number(value: f64) -> Rc<Value> {
        Rc::new(Value::Number(value))
    }
    pub fn string(value: impl Into<Rc<str>>) -> Rc<Value> {
        Rc::new(Value::String(value.into()))
    }
    pub fn array(items: Vec<Rc<Value>>) -> Rc<Value> {
        Rc::new(Value::Array(items))
    }
    pub fn object(entries: HashMap<Rc<str>, Rc<Value>>) -> Rc<Value> {
        Rc::new(Value::Object(entries))
    }
    pub fn module(record: Rc<ModuleRecord>) -> Rc<Value> {
        Rc::new(Value::Module(record))
    }
    pub fn function(params: Vec<Rc<str>>, body: Rc<Expression>, env: Environment) -> Rc<Value> {
        Rc::new(Value::Function(Function { params, body, env }))
    }
    pub fn builtin(
        name: &str,
        func: impl Fn(Rc<Value>, &Context) -> Result<Rc<Value>, EvalError> + 'static,
    ) -> Rc<Value> {
        Rc::new(Value::Builtin(Builtin {
            name: name.into(),
            func: Rc::new(func),
        }))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::Module(_) => "module",
            Value::Unit => "unit",
        }
    }
}

/// A closure: the unevaluated body plus the frame it closed over.
/// Application is curried, one parameter at a time.
#[derive(Clone)]
pub struct Function {
    pub params: Vec<Rc<str>>,
    pub body: Rc<Expression>,
    pub env: Environment,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && Rc::ptr_eq(&self.body, &other.body)
            && self.env == other.env
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("ptr", &(self as *const Function as usize))
            .finish()
    }
}

#[derive(Clone)]
pub struct Builtin {
    pub name: Rc<str>,
    #[allow(clippy::type_complexity)]
    pub func: Rc<dyn Fn(Rc<Value>, &Context) -> Result<Rc<Value>, EvalError>>,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// Structural equality. NaN equals NaN so equality stays reflexive;
/// functions compare by identity.
pub fn deep_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l == r || (l.is_nan() && r.is_nan()),
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Unit, Value::Unit) => true,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| deep_eq(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, a)| r.get(key).map(|b| deep_eq(a, b)).unwrap_or(false))
        }
        (Value::Function(l), Value::Function(r)) => l == r,
        (Value::Builtin(l), Value::Builtin(r)) => l == r,
        (Value::Module(l), Value::Module(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::String(text) => write!(f, "{}", text),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(function) => {
                write!(f, "<function")?;
                for param in &function.params {
                    write!(f, " {}", param)?;
                }
                write!(f, ">")
            }
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Value::Module(_) => write!(f, "<module>"),
            Value::Unit => write!(f, "()"),
        }
    }
}

pub fn type_error(expected: &'static str, got: &Value) -> EvalError {
    EvalError::new(EvalErrorKind::Type {
        expected,
        got: got.type_name(),
    })
}

pub fn number_of(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(type_error("number", other)),
    }
}

pub fn boolean_of(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(type_error("boolean", other)),
    }
}

pub fn string_of(value: &Value) -> Result<Rc<str>, EvalError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(type_error("string", other)),
    }
}

pub fn array_of(value: &Value) -> Result<&[Rc<Value>], EvalError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(type_error("array", other)),
    }
}

pub fn callable(value: Rc<Value>) -> Result<Rc<Value>, EvalError> {
    match value.as_ref() {
        Value::Function(_) | Value::Builtin(_) => Ok(value),
        other => Err(type_error("function", other)),
    }
}

/// An evaluation failure and where it happened. The span is attached
/// by the innermost expression that saw the error and is never
/// overwritten on the way out.
#[derive(Debug, PartialEq, Clone)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError { kind, span: None }
    }

    pub fn at(kind: EvalErrorKind, span: Span) -> Self {
        EvalError {
            kind,
            span: Some(span),
        }
    }

    pub fn with_span(self, span: Span) -> Self {
        EvalError {
            span: self.span.or(Some(span)),
            ..self
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum EvalErrorKind {
    #[error("Undefined variable {0}")]
    UndefinedVariable(Rc<str>),
    #[error("Cannot reassign {0}")]
    Reassignment(Rc<str>),
    #[error("Expected a {expected}, got a {got}")]
    Type {
        expected: &'static str,
        got: &'static str,
    },
    #[error("Function takes {expected} arguments, got {got}")]
    TooManyArguments { expected: usize, got: usize },
    #[error("Array too short: {expected} names for {got} values")]
    ArrayTooShort { expected: usize, got: usize },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Cannot resolve module {0:?}")]
    ModuleNotFound(Rc<str>),
    #[error("Module {module:?} has no export named {name}")]
    NoExport { module: Rc<str>, name: Rc<str> },
    #[error("Module {0:?} has no exports")]
    EmptyModule(Rc<str>),
    #[error("Circular import of {0:?}")]
    CircularImport(Rc<str>),
    #[error("Cannot export in block scope")]
    ExportOutsideModule,
    #[error("Unknown property {0}")]
    UndefinedProperty(Rc<str>),
    #[error("Error in module {path}:\n{rendered}")]
    ImportFailed { path: Rc<str>, rendered: String },
    #[error("IO error: {0}")]
    Io(Rc<str>),
    #[error("Call stack exhausted")]
    StackExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_eq_nan() {
        assert!(deep_eq(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn test_deep_eq_arrays() {
        let left = Value::Array(vec![Value::number(1.0), Value::array(vec![Value::number(2.0)])]);
        let right = Value::Array(vec![Value::number(1.0), Value::array(vec![Value::number(2.0)])]);
        assert!(deep_eq(&left, &right));

        let shorter = Value::Array(vec![Value::number(1.0)]);
        assert!(!deep_eq(&left, &shorter));
    }

    #[test]
    fn test_deep_eq_objects() {
        let mut a = HashMap::new();
        a.insert(Rc::from("x"), Value::number(1.0));
        let mut b = HashMap::new();
        b.insert(Rc::from("x"), Value::number(1.0));
        assert!(deep_eq(&Value::Object(a), &Value::Object(b)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Unit.to_string(), "()");
        assert_eq!(
            Value::Array(vec![Value::number(1.0), Value::boolean(true)]).to_string(),
            "[1, true]"
        );
    }
}
