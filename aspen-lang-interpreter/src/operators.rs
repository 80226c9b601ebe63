use std::rc::Rc;

use crate::builtins;
use crate::environment::Environment;
use crate::evaluator::apply;
use crate::value::{
    array_of, boolean_of, callable, deep_eq, number_of, EvalError, EvalErrorKind, Value,
};

/// The frame every program starts from. Operators live here as
/// ordinary curried values, so `a + b` is resolved with the same
/// lookup-then-apply path as any user function. Each operator takes
/// its right operand first, matching the argument order of the call
/// nodes the parser builds.
pub fn global_environment() -> Environment {
    let env = Environment::new();
    env.define("+".into(), arithmetic("+", |l, r| l + r));
    env.define("-".into(), arithmetic("-", |l, r| l - r));
    env.define("*".into(), arithmetic("*", |l, r| l * r));
    env.define("**".into(), arithmetic("**", f64::powf));
    env.define("/".into(), division("/", |l, r| l / r));
    env.define("%".into(), division("%", |l, r| l % r));
    env.define("<".into(), comparison("<", |l, r| l < r));
    env.define("<=".into(), comparison("<=", |l, r| l <= r));
    env.define(">".into(), comparison(">", |l, r| l > r));
    env.define(">=".into(), comparison(">=", |l, r| l >= r));
    env.define("==".into(), equality("==", true));
    env.define("!=".into(), equality("!=", false));
    env.define("||".into(), logical("||", |l, r| l || r));
    env.define("&&".into(), logical("&&", |l, r| l && r));
    env.define("::".into(), cons());
    env.define("@".into(), concat());
    env.define("|>".into(), pipe());
    env.define("<|".into(), pipe_back());
    env.define(">>".into(), compose());
    env.define("<<".into(), compose_back());
    env.define("print".into(), builtins::print());
    env.define("trace".into(), builtins::trace());
    env
}

fn arithmetic(name: &'static str, op: fn(f64, f64) -> f64) -> Rc<Value> {
    Value::builtin(name, move |right, _| {
        let right = number_of(&right)?;
        Ok(Value::builtin(name, move |left, _| {
            Ok(Value::number(op(number_of(&left)?, right)))
        }))
    })
}

fn division(name: &'static str, op: fn(f64, f64) -> f64) -> Rc<Value> {
    Value::builtin(name, move |right, _| {
        let right = number_of(&right)?;
        if right == 0.0 {
            return Err(EvalError::new(EvalErrorKind::DivisionByZero));
        }
        Ok(Value::builtin(name, move |left, _| {
            Ok(Value::number(op(number_of(&left)?, right)))
        }))
    })
}

fn comparison(name: &'static str, op: fn(f64, f64) -> bool) -> Rc<Value> {
    Value::builtin(name, move |right, _| {
        let right = number_of(&right)?;
        Ok(Value::builtin(name, move |left, _| {
            Ok(Value::boolean(op(number_of(&left)?, right)))
        }))
    })
}

fn equality(name: &'static str, want: bool) -> Rc<Value> {
    Value::builtin(name, move |right, _| {
        Ok(Value::builtin(name, move |left, _| {
            Ok(Value::boolean(deep_eq(&left, &right) == want))
        }))
    })
}

/// Both operands always evaluate; currying leaves no room for
/// short-circuiting.
fn logical(name: &'static str, op: fn(bool, bool) -> bool) -> Rc<Value> {
    Value::builtin(name, move |right, _| {
        let right = boolean_of(&right)?;
        Ok(Value::builtin(name, move |left, _| {
            Ok(Value::boolean(op(boolean_of(&left)?, right)))
        }))
    })
}

fn cons() -> Rc<Value> {
    Value::builtin("::", |right, _| {
        let tail = array_of(&right)?.to_vec();
        Ok(Value::builtin("::", move |left, _| {
            let mut items = Vec::with_capacity(tail.len() + 1);
            items.push(left);
            items.extend(tail.iter().cloned());
            Ok(Value::array(items))
        }))
    })
}

fn concat() -> Rc<Value> {
    Value::builtin("@", |right, _| {
        let tail = array_of(&right)?.to_vec();
        Ok(Value::builtin("@", move |left, _| {
            let mut items = array_of(&left)?.to_vec();
            items.extend(tail.iter().cloned());
            Ok(Value::array(items))
        }))
    })
}

fn pipe() -> Rc<Value> {
    Value::builtin("|>", |right, _| {
        let function = callable(right)?;
        Ok(Value::builtin("|>", move |left, ctx| {
            apply(function.clone(), left, ctx)
        }))
    })
}

fn pipe_back() -> Rc<Value> {
    Value::builtin("<|", |right, _| {
        let argument = right;
        Ok(Value::builtin("<|", move |left, ctx| {
            apply(callable(left)?, argument.clone(), ctx)
        }))
    })
}

/// `f >> g` applies f first; `f << g` applies g first.
fn compose() -> Rc<Value> {
    Value::builtin(">>", |right, _| {
        let outer = callable(right)?;
        Ok(Value::builtin(">>", move |left, _| {
            let inner = callable(left)?;
            let outer = outer.clone();
            Ok(Value::builtin(">>", move |value, ctx| {
                apply(outer.clone(), apply(inner.clone(), value, ctx)?, ctx)
            }))
        }))
    })
}

fn compose_back() -> Rc<Value> {
    Value::builtin("<<", |right, _| {
        let inner = callable(right)?;
        Ok(Value::builtin("<<", move |left, _| {
            let outer = callable(left)?;
            let inner = inner.clone();
            Ok(Value::builtin("<<", move |value, ctx| {
                apply(outer.clone(), apply(inner.clone(), value, ctx)?, ctx)
            }))
        }))
    })
}
