use std::rc::Rc;

use crate::evaluator::apply;
use crate::value::{
    array_of, boolean_of, callable, number_of, string_of, EvalError, EvalErrorKind, ModuleRecord,
    Value,
};

/// Modules importable by bare specifier. Everything they expose is an
/// ordinary curried value.
pub fn library_module(name: &str) -> Option<Rc<ModuleRecord>> {
    match name {
        "string" => Some(string_module()),
        "list" => Some(list_module()),
        "io" => Some(io_module()),
        _ => None,
    }
}

fn record(entries: Vec<(&str, Rc<Value>)>) -> Rc<ModuleRecord> {
    Rc::new(
        entries
            .into_iter()
            .map(|(name, value)| (Rc::from(name), value))
            .collect(),
    )
}

pub fn print() -> Rc<Value> {
    Value::builtin("print", |value, _| {
        println!("{}", value);
        Ok(Value::unit())
    })
}

/// `trace label value` prints and passes the value through, so it can
/// be dropped into the middle of a pipeline.
pub fn trace() -> Rc<Value> {
    Value::builtin("trace", |label, _| {
        let label = string_of(&label)?;
        Ok(Value::builtin("trace", move |value, _| {
            println!("{} {}", label, value);
            Ok(value)
        }))
    })
}

fn string_module() -> Rc<ModuleRecord> {
    record(vec![
        (
            "length",
            Value::builtin("length", |value, _| {
                Ok(Value::number(string_of(&value)?.chars().count() as f64))
            }),
        ),
        (
            "append",
            Value::builtin("append", |suffix, _| {
                let suffix = string_of(&suffix)?;
                Ok(Value::builtin("append", move |target, _| {
                    let target = string_of(&target)?;
                    Ok(Value::string(format!("{}{}", target, suffix)))
                }))
            }),
        ),
        (
            "prepend",
            Value::builtin("prepend", |prefix, _| {
                let prefix = string_of(&prefix)?;
                Ok(Value::builtin("prepend", move |target, _| {
                    let target = string_of(&target)?;
                    Ok(Value::string(format!("{}{}", prefix, target)))
                }))
            }),
        ),
        (
            "split",
            Value::builtin("split", |separator, _| {
                let separator = string_of(&separator)?;
                Ok(Value::builtin("split", move |target, _| {
                    let target = string_of(&target)?;
                    let parts: Vec<Rc<Value>> = if separator.is_empty() {
                        target
                            .chars()
                            .map(|ch| Value::string(ch.to_string()))
                            .collect()
                    } else {
                        target
                            .split(&*separator)
                            .map(|part| Value::string(part.to_string()))
                            .collect()
                    };
                    Ok(Value::array(parts))
                }))
            }),
        ),
        (
            "join",
            Value::builtin("join", |separator, _| {
                let separator = string_of(&separator)?;
                Ok(Value::builtin("join", move |items, _| {
                    let mut out = String::new();
                    for (i, item) in array_of(&items)?.iter().enumerate() {
                        if i > 0 {
                            out.push_str(&separator);
                        }
                        out.push_str(&string_of(item)?);
                    }
                    Ok(Value::string(out))
                }))
            }),
        ),
    ])
}

fn list_module() -> Rc<ModuleRecord> {
    record(vec![
        (
            "length",
            Value::builtin("length", |items, _| {
                Ok(Value::number(array_of(&items)?.len() as f64))
            }),
        ),
        (
            "head",
            Value::builtin("head", |items, _| {
                array_of(&items)?.first().cloned().ok_or_else(|| {
                    EvalError::new(EvalErrorKind::ArrayTooShort {
                        expected: 1,
                        got: 0,
                    })
                })
            }),
        ),
        (
            "tail",
            Value::builtin("tail", |items, _| {
                let items = array_of(&items)?;
                if items.is_empty() {
                    return Err(EvalError::new(EvalErrorKind::ArrayTooShort {
                        expected: 1,
                        got: 0,
                    }));
                }
                Ok(Value::array(items[1..].to_vec()))
            }),
        ),
        (
            "reverse",
            Value::builtin("reverse", |items, _| {
                let mut items = array_of(&items)?.to_vec();
                items.reverse();
                Ok(Value::array(items))
            }),
        ),
        (
            "map",
            Value::builtin("map", |function, _| {
                let function = callable(function)?;
                Ok(Value::builtin("map", move |items, ctx| {
                    array_of(&items)?
                        .iter()
                        .map(|item| apply(function.clone(), item.clone(), ctx))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::array)
                }))
            }),
        ),
        (
            "filter",
            Value::builtin("filter", |function, _| {
                let function = callable(function)?;
                Ok(Value::builtin("filter", move |items, ctx| {
                    let mut kept = Vec::new();
                    for item in array_of(&items)? {
                        let verdict = apply(function.clone(), item.clone(), ctx)?;
                        if boolean_of(&verdict)? {
                            kept.push(item.clone());
                        }
                    }
                    Ok(Value::array(kept))
                }))
            }),
        ),
        (
            "fold",
            Value::builtin("fold", |function, _| {
                let function = callable(function)?;
                Ok(Value::builtin("fold", move |initial, _| {
                    let function = function.clone();
                    Ok(Value::builtin("fold", move |items, ctx| {
                        let mut accumulator = initial.clone();
                        for item in array_of(&items)? {
                            let step = apply(function.clone(), accumulator, ctx)?;
                            accumulator = apply(step, item.clone(), ctx)?;
                        }
                        Ok(accumulator)
                    }))
                }))
            }),
        ),
        (
            "range",
            Value::builtin("range", |from, _| {
                let from = number_of(&from)?;
                Ok(Value::builtin("range", move |to, _| {
                    let to = number_of(&to)?;
                    let mut items = Vec::new();
                    let mut n = from;
                    while n < to {
                        items.push(Value::number(n));
                        n += 1.0;
                    }
                    Ok(Value::array(items))
                }))
            }),
        ),
    ])
}

fn io_module() -> Rc<ModuleRecord> {
    record(vec![
        (
            "read-file",
            Value::builtin("read-file", |path, ctx| {
                let path = string_of(&path)?;
                let contents = std::fs::read_to_string(ctx.current_dir.join(&*path))
                    .map_err(|err| EvalError::new(EvalErrorKind::Io(err.to_string().into())))?;
                Ok(Value::string(contents))
            }),
        ),
        (
            "write-file",
            Value::builtin("write-file", |path, _| {
                let path = string_of(&path)?;
                Ok(Value::builtin("write-file", move |contents, ctx| {
                    let contents = string_of(&contents)?;
                    std::fs::write(ctx.current_dir.join(&*path), contents.as_bytes())
                        .map_err(|err| EvalError::new(EvalErrorKind::Io(err.to_string().into())))?;
                    Ok(Value::unit())
                }))
            }),
        ),
        ("print", print()),
        ("trace", trace()),
    ])
}
