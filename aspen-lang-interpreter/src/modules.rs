use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use aspen_lang_core::diagnostics;
use aspen_lang_core::lexer;
use aspen_lang_core::parser::Parser;
use aspen_lang_core::span::Span;

use crate::builtins;
use crate::context::Context;
use crate::environment::Environment;
use crate::evaluator;
use crate::operators;
use crate::value::{EvalError, EvalErrorKind, ModuleRecord};

/// Evaluated modules, keyed by canonical path. The in-progress set
/// holds files whose evaluation has started but not finished, which is
/// exactly what an import cycle looks like.
#[derive(Default)]
pub struct ModuleRegistry {
    cache: HashMap<PathBuf, Rc<ModuleRecord>>,
    in_progress: HashSet<PathBuf>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }
}

/// A specifier that does not start with `.` or `/` names a built-in
/// library module. Anything else is a file path relative to the
/// importing file's directory, evaluated at most once.
pub fn resolve(specifier: &str, ctx: &Context) -> Result<Rc<ModuleRecord>, EvalError> {
    if !specifier.starts_with('.') && !specifier.starts_with('/') {
        return builtins::library_module(specifier)
            .ok_or_else(|| EvalError::new(EvalErrorKind::ModuleNotFound(specifier.into())));
    }

    let path = ctx
        .current_dir
        .join(specifier)
        .canonicalize()
        .map_err(|_| EvalError::new(EvalErrorKind::ModuleNotFound(specifier.into())))?;

    if let Some(record) = ctx.modules.borrow().cache.get(&path) {
        return Ok(record.clone());
    }
    if ctx.modules.borrow().in_progress.contains(&path) {
        return Err(EvalError::new(EvalErrorKind::CircularImport(
            specifier.into(),
        )));
    }

    ctx.modules.borrow_mut().in_progress.insert(path.clone());
    let result = load(&path, ctx);
    ctx.modules.borrow_mut().in_progress.remove(&path);

    let record = result?;
    ctx.modules.borrow_mut().cache.insert(path, record.clone());
    Ok(record)
}

/// Reads, parses and evaluates one file with its own directory as the
/// new base. Failures inside the file are reported with that file's
/// own code frame, wrapped so the importing site still gets a span.
fn load(path: &Path, ctx: &Context) -> Result<Rc<ModuleRecord>, EvalError> {
    let source = std::fs::read_to_string(path)
        .map_err(|err| EvalError::new(EvalErrorKind::Io(err.to_string().into())))?;

    let tokens = lexer::tokenize(&source)
        .map_err(|err| import_failed(path, &source, Some(err.span()), &err.to_string()))?;
    let program = Parser::new(tokens).parse_program().map_err(|errors| {
        let rendered = errors
            .iter()
            .map(|err| diagnostics::render(&source, err.span(), &err.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        wrap(path, rendered)
    })?;

    let module_ctx = ctx.for_module(path.parent().map(Path::to_path_buf).unwrap_or_default());
    let env = operators::global_environment().extend();
    let exports = Environment::new();
    for expression in &program.body {
        evaluator::eval_toplevel(expression, &env, Some(&exports), &module_ctx)
            .map_err(|err| import_failed(path, &source, err.span, &err.to_string()))?;
    }

    if exports.is_empty() {
        return Err(EvalError::new(EvalErrorKind::EmptyModule(
            path.display().to_string().into(),
        )));
    }
    Ok(Rc::new(exports.snapshot()))
}

fn import_failed(path: &Path, source: &str, span: Option<Span>, message: &str) -> EvalError {
    wrap(path, diagnostics::render(source, span, message))
}

fn wrap(path: &Path, rendered: String) -> EvalError {
    EvalError::new(EvalErrorKind::ImportFailed {
        path: path.display().to_string().into(),
        rendered,
    })
}
