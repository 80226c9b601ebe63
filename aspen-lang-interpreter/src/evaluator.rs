use std::collections::HashMap;
use std::rc::Rc;

use aspen_lang_core::ast::{ArrayPattern, ExprKind, Expression, Identifier, Pattern, Program};

use crate::context::Context;
use crate::environment::Environment;
use crate::modules;
use crate::operators;
use crate::value::{EvalError, EvalErrorKind, Value, type_error};

/// Evaluates a whole unit. The result is a module value when anything
/// was exported, the last expression's value otherwise.
pub fn eval_program(program: &Program, ctx: &Context) -> Result<Rc<Value>, EvalError> {
    let env = operators::global_environment().extend();
    let exports = Environment::new();
    let mut output = Value::unit();
    for expression in &program.body {
        output = eval_toplevel(expression, &env, Some(&exports), ctx)?;
    }
    if exports.is_empty() {
        Ok(output)
    } else {
        Ok(Value::module(Rc::new(exports.snapshot())))
    }
}

/// One statement at module top level. `export` is only legal here;
/// everywhere else it falls through to [`eval_expression`] and fails.
pub fn eval_toplevel(
    expression: &Expression,
    env: &Environment,
    exports: Option<&Environment>,
    ctx: &Context,
) -> Result<Rc<Value>, EvalError> {
    match (&expression.kind, exports) {
        (ExprKind::Export { name, value }, Some(export_env)) => {
            let value = eval_expression(value, env, ctx)?;
            env.set(name.name.clone(), value.clone())
                .map_err(|err| err.with_span(name.span))?;
            export_env
                .set(name.name.clone(), value.clone())
                .map_err(|err| err.with_span(name.span))?;
            Ok(value)
        }
        _ => eval_expression(expression, env, ctx),
    }
}

/// Evaluation errors pick up the span of the innermost expression that
/// saw them and keep it on the way out.
pub fn eval_expression(
    expression: &Expression,
    env: &Environment,
    ctx: &Context,
) -> Result<Rc<Value>, EvalError> {
    eval_kind(expression, env, ctx).map_err(|err| err.with_span(expression.span))
}

fn eval_kind(
    expression: &Expression,
    env: &Environment,
    ctx: &Context,
) -> Result<Rc<Value>, EvalError> {
    match &expression.kind {
        ExprKind::Number(value) => Ok(Value::number(*value)),
        ExprKind::Str(text) => Ok(Value::string(text.clone())),
        ExprKind::Bool(value) => Ok(Value::boolean(*value)),
        ExprKind::Unit => Ok(Value::unit()),
        ExprKind::Identifier(name) => env.get(name),
        ExprKind::Array(items) => Ok(Value::array(
            items
                .iter()
                .map(|item| eval_expression(item, env, ctx))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        ExprKind::Object(entries) => {
            let mut object = HashMap::new();
            for (key, value) in entries {
                object.insert(key.name.clone(), eval_expression(value, env, ctx)?);
            }
            Ok(Value::object(object))
        }
        ExprKind::Member { object, property } => {
            let value = eval_expression(object, env, ctx)?;
            member_of(&value, property)
        }
        ExprKind::PropertyAccessor(property) => {
            let name = property.name.clone();
            Ok(Value::builtin(&format!(".{}", name), move |value, _| {
                match value.as_ref() {
                    Value::Object(entries) => entries.get(&name).cloned().ok_or_else(|| {
                        EvalError::new(EvalErrorKind::UndefinedProperty(name.clone()))
                    }),
                    Value::Module(record) => record.get(&name).cloned().ok_or_else(|| {
                        EvalError::new(EvalErrorKind::UndefinedProperty(name.clone()))
                    }),
                    other => Err(type_error("object", other)),
                }
            }))
        }
        ExprKind::Assign { pattern, value } => {
            let value = eval_expression(value, env, ctx)?;
            match pattern {
                Pattern::Identifier(name) => {
                    env.set(name.name.clone(), value.clone())
                        .map_err(|err| err.with_span(name.span))?;
                }
                Pattern::Array(pattern) => destructure(pattern, &value, env)?,
            }
            Ok(value)
        }
        ExprKind::Export { .. } => Err(EvalError::new(EvalErrorKind::ExportOutsideModule)),
        ExprKind::Import { names, source } => {
            let record = modules::resolve(source, ctx)?;
            for name in names {
                let value = record.get(&name.name).cloned().ok_or_else(|| {
                    EvalError::at(
                        EvalErrorKind::NoExport {
                            module: source.clone(),
                            name: name.name.clone(),
                        },
                        name.span,
                    )
                })?;
                env.set(name.name.clone(), value)
                    .map_err(|err| err.with_span(name.span))?;
            }
            Ok(Value::unit())
        }
        ExprKind::ImportAll { name, source } => {
            let record = modules::resolve(source, ctx)?;
            env.set(name.name.clone(), Value::module(record))
                .map_err(|err| err.with_span(name.span))?;
            Ok(Value::unit())
        }
        ExprKind::Function { params, body } => Ok(Value::function(
            params.iter().map(|param| param.name.clone()).collect(),
            body.clone(),
            env.clone(),
        )),
        ExprKind::Call { callee, args } => {
            let mut value = eval_expression(callee, env, ctx)?;
            if let Value::Function(function) = value.as_ref() {
                if args.len() > function.params.len() {
                    return Err(EvalError::at(
                        EvalErrorKind::TooManyArguments {
                            expected: function.params.len(),
                            got: args.len(),
                        },
                        args[function.params.len()].span,
                    ));
                }
            }
            for (index, arg) in args.iter().enumerate() {
                // A builtin's arity is not statically known; leftover
                // arguments once the chain stops producing callables
                // are the same over-application.
                if index > 0 && !matches!(value.as_ref(), Value::Function(_) | Value::Builtin(_)) {
                    return Err(EvalError::at(
                        EvalErrorKind::TooManyArguments {
                            expected: index,
                            got: args.len(),
                        },
                        arg.span,
                    ));
                }
                let argument = eval_expression(arg, env, ctx)?;
                value = apply(value, argument, ctx)?;
            }
            Ok(value)
        }
        ExprKind::If {
            condition,
            then,
            otherwise,
        } => {
            let verdict = eval_expression(condition, env, ctx)?;
            match verdict.as_ref() {
                Value::Bool(true) => eval_expression(then, env, ctx),
                Value::Bool(false) => eval_expression(otherwise, env, ctx),
                other => Err(EvalError::at(
                    EvalErrorKind::Type {
                        expected: "boolean",
                        got: other.type_name(),
                    },
                    condition.span,
                )),
            }
        }
        ExprKind::Block(body) => {
            let scope = env.extend();
            let mut output = Value::unit();
            for expression in body {
                output = eval_expression(expression, &scope, ctx)?;
            }
            Ok(output)
        }
    }
}

/// The single application path shared by closures, builtins, operator
/// values, pipes and composition. Always one argument at a time: a
/// closure that still has parameters left just returns itself with one
/// more frame bound.
pub fn apply(callee: Rc<Value>, argument: Rc<Value>, ctx: &Context) -> Result<Rc<Value>, EvalError> {
    match callee.as_ref() {
        Value::Function(function) => match function.params.split_first() {
            Some((first, rest)) => {
                let env = function.env.extend();
                env.set(first.clone(), argument)?;
                if rest.is_empty() {
                    ctx.enter_call()?;
                    let result = eval_expression(&function.body, &env, ctx);
                    ctx.exit_call();
                    result
                } else {
                    Ok(Value::function(
                        rest.to_vec(),
                        function.body.clone(),
                        env,
                    ))
                }
            }
            None => Err(type_error("function", callee.as_ref())),
        },
        Value::Builtin(builtin) => (builtin.func)(argument, ctx),
        other => Err(type_error("function", other)),
    }
}

fn member_of(value: &Rc<Value>, property: &Identifier) -> Result<Rc<Value>, EvalError> {
    match value.as_ref() {
        Value::Object(entries) => entries.get(&property.name).cloned().ok_or_else(|| {
            EvalError::at(
                EvalErrorKind::UndefinedProperty(property.name.clone()),
                property.span,
            )
        }),
        Value::Module(record) => record.get(&property.name).cloned().ok_or_else(|| {
            EvalError::at(
                EvalErrorKind::UndefinedProperty(property.name.clone()),
                property.span,
            )
        }),
        other => Err(type_error("object", other)),
    }
}

/// `let (a :: b :: rest) = value`. Needs at least one value per name
/// except the last, which takes whatever tail remains.
fn destructure(
    pattern: &ArrayPattern,
    value: &Rc<Value>,
    env: &Environment,
) -> Result<(), EvalError> {
    let items = match value.as_ref() {
        Value::Array(items) => items,
        other => {
            return Err(EvalError::at(
                EvalErrorKind::Type {
                    expected: "array",
                    got: other.type_name(),
                },
                pattern.span,
            ))
        }
    };
    if pattern.names.len() > items.len() + 1 {
        return Err(EvalError::at(
            EvalErrorKind::ArrayTooShort {
                expected: pattern.names.len(),
                got: items.len(),
            },
            pattern.span,
        ));
    }
    let split = pattern.names.len() - 1;
    for (name, item) in pattern.names[..split].iter().zip(items) {
        env.set(name.name.clone(), item.clone())
            .map_err(|err| err.with_span(name.span))?;
    }
    let rest = &pattern.names[split];
    env.set(rest.name.clone(), Value::array(items[split..].to_vec()))
        .map_err(|err| err.with_span(rest.span))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aspen_lang_core::lexer::tokenize;
    use aspen_lang_core::parser::Parser;
    use aspen_lang_core::span::{Position, Span};

    fn run(input: &str) -> Result<Rc<Value>, EvalError> {
        let tokens = tokenize(input).unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        eval_program(&program, &Context::new(std::env::temp_dir()))
    }

    fn run_kind(input: &str) -> EvalErrorKind {
        run(input).unwrap_err().kind
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3;"), Ok(Value::number(7.0)));
        assert_eq!(run("(1 + 2) * 3;"), Ok(Value::number(9.0)));
        assert_eq!(run("2 ** 3;"), Ok(Value::number(8.0)));
        assert_eq!(run("7 % 2;"), Ok(Value::number(1.0)));
        assert_eq!(run("10 - 4 - 3;"), Ok(Value::number(3.0)));
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(run("1 < 2;"), Ok(Value::boolean(true)));
        assert_eq!(run("2 <= 1;"), Ok(Value::boolean(false)));
        assert_eq!(run("true && false;"), Ok(Value::boolean(false)));
        assert_eq!(run("1 < 2 || false;"), Ok(Value::boolean(true)));
    }

    #[test]
    fn test_deep_equality() {
        assert_eq!(run("[1, [2]] == [1, [2]];"), Ok(Value::boolean(true)));
        assert_eq!(run("[1] != [1, 2];"), Ok(Value::boolean(true)));
        assert_eq!(run("\"a\" == \"a\";"), Ok(Value::boolean(true)));
    }

    #[test]
    fn test_nan_equals_nan() {
        assert_eq!(
            run("let nan = (0 - 1) ** 0.5; nan == nan;"),
            Ok(Value::boolean(true))
        );
    }

    #[test]
    fn test_currying() {
        assert_eq!(
            run("let add a b = a + b; let inc = add 1; inc 5;"),
            Ok(Value::number(6.0))
        );
        assert_eq!(
            run("let add a b c = a + b + c; add 1 2 3;"),
            Ok(Value::number(6.0))
        );
        assert_eq!(
            run("let add a b c = a + b + c; let f = add 1; let g = f 2; g 3;"),
            Ok(Value::number(6.0))
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let err = run("let id a = a; id 1 2;").unwrap_err();
        assert_eq!(
            err.kind,
            EvalErrorKind::TooManyArguments {
                expected: 1,
                got: 2
            }
        );
        assert_eq!(
            err.span,
            Some(Span {
                start: Position { line: 1, col: 20 },
                end: Position { line: 1, col: 21 },
            })
        );
    }

    #[test]
    fn test_too_many_arguments_for_a_builtin() {
        let err = run("print 1 2;").unwrap_err();
        assert_eq!(
            err.kind,
            EvalErrorKind::TooManyArguments {
                expected: 1,
                got: 2
            }
        );
        assert_eq!(
            err.span,
            Some(Span {
                start: Position { line: 1, col: 9 },
                end: Position { line: 1, col: 10 },
            })
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            run_kind("let div b a = a / b; div 0 5;"),
            EvalErrorKind::DivisionByZero
        );
        assert_eq!(run("let div b a = a / b; div 2 5;"), Ok(Value::number(2.5)));
    }

    #[test]
    fn test_write_once_bindings() {
        assert_eq!(
            run_kind("let x = 1; let x = 2;"),
            EvalErrorKind::Reassignment("x".into())
        );
        // shadowing in a child frame is fine and leaves the outer
        // binding alone
        assert_eq!(
            run("let x = 1; { let x = 2; x } + x;"),
            Ok(Value::number(3.0))
        );
    }

    #[test]
    fn test_destructuring() {
        assert_eq!(
            run("let (a :: b :: rest) = [1, 2, 3, 4]; rest;"),
            Ok(Value::array(vec![Value::number(3.0), Value::number(4.0)]))
        );
        assert_eq!(
            run("let (a :: rest) = [1]; rest;"),
            Ok(Value::array(vec![]))
        );
        assert_eq!(
            run("let (a :: b :: rest) = [1, 2]; a + b;"),
            Ok(Value::number(3.0))
        );
        assert_eq!(
            run_kind("let (a :: b :: c) = [1];"),
            EvalErrorKind::ArrayTooShort {
                expected: 3,
                got: 1
            }
        );
    }

    #[test]
    fn test_pipes_and_composition() {
        assert_eq!(
            run("1 |> (n => n + 2) |> (n => n * 3);"),
            Ok(Value::number(9.0))
        );
        assert_eq!(run("(n => n + 1) <| 5;"), Ok(Value::number(6.0)));
        assert_eq!(
            run("let f = (n => n + 2) >> (n => n * 3); f 1;"),
            Ok(Value::number(9.0))
        );
        assert_eq!(
            run("let f = (n => n + 2) << (n => n * 3); f 1;"),
            Ok(Value::number(5.0))
        );
    }

    #[test]
    fn test_cons_and_concat() {
        assert_eq!(
            run("1 :: [2, 3];"),
            Ok(Value::array(vec![
                Value::number(1.0),
                Value::number(2.0),
                Value::number(3.0),
            ]))
        );
        assert_eq!(
            run("[1] @ [2, 3];"),
            Ok(Value::array(vec![
                Value::number(1.0),
                Value::number(2.0),
                Value::number(3.0),
            ]))
        );
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(run("if true then 1 else 2;"), Ok(Value::number(1.0)));
        assert_eq!(run("false ? 1 : 2;"), Ok(Value::number(2.0)));
        assert_eq!(
            run_kind("if 1 then 2 else 3;"),
            EvalErrorKind::Type {
                expected: "boolean",
                got: "number"
            }
        );
    }

    #[test]
    fn test_objects_and_members() {
        assert_eq!(
            run("let o = { a: 1, b: 2 }; o.a + o.b;"),
            Ok(Value::number(3.0))
        );
        assert_eq!(run("{ a: 5 } |> (.a);"), Ok(Value::number(5.0)));
        assert_eq!(
            run_kind("let o = { a: 1 }; o.b;"),
            EvalErrorKind::UndefinedProperty("b".into())
        );
    }

    #[test]
    fn test_exports_build_a_module() {
        let result = run("export let x = 1; export let y = 2;").unwrap();
        match result.as_ref() {
            Value::Module(record) => {
                assert_eq!(record.len(), 2);
                assert_eq!(record.get("x"), Some(&Value::number(1.0)));
            }
            other => panic!("expected a module, got {:?}", other),
        }
    }

    #[test]
    fn test_export_in_block_scope() {
        assert_eq!(
            run_kind("{ export let x = 1; 2 };"),
            EvalErrorKind::ExportOutsideModule
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            run_kind("foo;"),
            EvalErrorKind::UndefinedVariable("foo".into())
        );
    }

    #[test]
    fn test_calling_a_non_function() {
        assert_eq!(
            run_kind("let x = 1; x 2;"),
            EvalErrorKind::Type {
                expected: "function",
                got: "number"
            }
        );
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            run("let fact n = n == 0 ? 1 : n * fact (n - 1); fact 5;"),
            Ok(Value::number(120.0))
        );
    }

    #[test]
    fn test_runaway_recursion_is_cut_off() {
        assert_eq!(
            run_kind("let spin n = spin n; spin 1;"),
            EvalErrorKind::StackExhausted
        );
    }

    #[test]
    fn test_errors_keep_the_innermost_span() {
        let err = run("let x = 1 + y;").unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::UndefinedVariable("y".into()));
        assert_eq!(
            err.span,
            Some(Span {
                start: Position { line: 1, col: 13 },
                end: Position { line: 1, col: 14 },
            })
        );
    }

    #[test]
    fn test_trace_passes_through() {
        assert_eq!(run("trace \"value:\" 5;"), Ok(Value::number(5.0)));
    }

    #[test]
    fn test_block_yields_last_value() {
        assert_eq!(run("{ 1; 2; 3 };"), Ok(Value::number(3.0)));
        assert_eq!(run("let a = 2; { let b = 3; a * b };"), Ok(Value::number(6.0)));
    }
}
