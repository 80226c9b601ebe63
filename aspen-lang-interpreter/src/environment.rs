use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::value::{EvalError, EvalErrorKind, Value};

#[derive(Debug)]
struct Frame {
    store: HashMap<Rc<str>, Rc<Value>>,
    parent: Option<Environment>,
}

/// One lexical frame in the scope chain. Bindings are write-once: a
/// name can be shadowed by a child frame but never rebound in the
/// frame that owns it.
#[derive(Clone)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            frame: Rc::new(RefCell::new(Frame {
                store: HashMap::new(),
                parent: None,
            })),
        }
    }

    /// A child frame whose lookups fall through to `self`.
    pub fn extend(&self) -> Environment {
        Environment {
            frame: Rc::new(RefCell::new(Frame {
                store: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Unconditional insert, used to seed the global frame. User
    /// bindings go through [`Environment::set`].
    pub fn define(&self, name: Rc<str>, value: Rc<Value>) {
        self.frame.borrow_mut().store.insert(name, value);
    }

    pub fn set(&self, name: Rc<str>, value: Rc<Value>) -> Result<(), EvalError> {
        let mut frame = self.frame.borrow_mut();
        if frame.store.contains_key(&name) {
            return Err(EvalError::new(EvalErrorKind::Reassignment(name)));
        }
        frame.store.insert(name, value);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Value>> {
        let frame = self.frame.borrow();
        frame
            .store
            .get(name)
            .cloned()
            .or_else(|| frame.parent.as_ref().and_then(|parent| parent.lookup(name)))
    }

    pub fn get(&self, name: &str) -> Result<Rc<Value>, EvalError> {
        self.lookup(name)
            .ok_or_else(|| EvalError::new(EvalErrorKind::UndefinedVariable(name.into())))
    }

    pub fn is_empty(&self) -> bool {
        self.frame.borrow().store.is_empty()
    }

    /// A copy of this frame's own bindings, parents excluded.
    pub fn snapshot(&self) -> HashMap<Rc<str>, Rc<Value>> {
        self.frame.borrow().store.clone()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("ptr", &Rc::as_ptr(&self.frame))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let env = Environment::new();
        env.set("x".into(), Value::number(1.0)).unwrap();
        assert_eq!(env.get("x"), Ok(Value::number(1.0)));
        assert_eq!(
            env.get("y").unwrap_err().kind,
            EvalErrorKind::UndefinedVariable("y".into())
        );
    }

    #[test]
    fn test_bindings_are_write_once() {
        let env = Environment::new();
        env.set("x".into(), Value::number(1.0)).unwrap();
        assert_eq!(
            env.set("x".into(), Value::number(2.0)).unwrap_err().kind,
            EvalErrorKind::Reassignment("x".into())
        );
    }

    #[test]
    fn test_child_frames_shadow() {
        let env = Environment::new();
        env.set("x".into(), Value::number(1.0)).unwrap();
        let child = env.extend();
        child.set("x".into(), Value::number(2.0)).unwrap();
        assert_eq!(child.get("x"), Ok(Value::number(2.0)));
        assert_eq!(env.get("x"), Ok(Value::number(1.0)));
    }

    #[test]
    fn test_lookup_walks_parents() {
        let env = Environment::new();
        env.set("x".into(), Value::number(1.0)).unwrap();
        let child = env.extend().extend();
        assert_eq!(child.get("x"), Ok(Value::number(1.0)));
    }
}
