use std::path::Path;

use aspen_lang_core::diagnostics;
use aspen_lang_core::lexer;
use aspen_lang_core::parser::Parser;
use aspen_lang_core::span::Span;
use aspen_lang_interpreter::context::Context;
use aspen_lang_interpreter::evaluator;

pub fn execute(path: &Path, tokens: bool, ast: bool, source: bool) {
    let path = match path.canonicalize() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Cannot open {}: {}", path.display(), err);
            std::process::exit(1);
        }
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("Cannot read {}: {}", path.display(), err);
            std::process::exit(1);
        }
    };

    let stream = match lexer::tokenize(&contents) {
        Ok(stream) => stream,
        Err(err) => report(&contents, Some(err.span()), &err.to_string()),
    };
    if tokens {
        for token in &stream {
            println!("{:?}", token);
        }
    }

    let program = match Parser::new(stream).parse_program() {
        Ok(program) => program,
        Err(errors) => {
            for err in errors {
                eprintln!("{}", diagnostics::render(&contents, err.span(), &err.to_string()));
            }
            std::process::exit(1);
        }
    };
    if ast {
        println!("{:#?}", program);
    }
    if source {
        print!("{}", program);
    }

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let ctx = Context::new(base);
    match evaluator::eval_program(&program, &ctx) {
        Ok(value) => println!("{}", value),
        Err(err) => report(&contents, err.span, &err.to_string()),
    }
}

fn report(source: &str, span: Option<Span>, message: &str) -> ! {
    eprintln!("{}", diagnostics::render(source, span, message));
    std::process::exit(1);
}
