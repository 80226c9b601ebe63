use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use aspen_lang_core::diagnostics;
use aspen_lang_core::lexer;
use aspen_lang_core::parser::Parser;
use aspen_lang_interpreter::context::Context;
use aspen_lang_interpreter::environment::Environment;
use aspen_lang_interpreter::evaluator;
use aspen_lang_interpreter::operators;

const PROMPT: &str = ">> ";

/// Bindings and exports persist across lines, so the session behaves
/// like one module typed in piece by piece.
pub fn start() -> Result<(), ReadlineError> {
    let env = operators::global_environment().extend();
    let exports = Environment::new();
    let ctx = Context::new(std::env::current_dir().unwrap_or_default());

    let mut rl = DefaultEditor::new()?;
    let mut content: String;

    loop {
        let readline = rl.readline(PROMPT);

        match readline {
            Err(ReadlineError::Interrupted) => {
                continue; // Clear line
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                content = line;
            }
        }

        let stream = match lexer::tokenize(&content) {
            Ok(stream) => stream,
            Err(err) => {
                eprintln!(
                    "{}",
                    diagnostics::render(&content, Some(err.span()), &err.to_string())
                );
                continue;
            }
        };

        let program = match Parser::new(stream).parse_program() {
            Ok(program) => program,
            Err(errors) => {
                for err in errors {
                    eprintln!(
                        "{}",
                        diagnostics::render(&content, err.span(), &err.to_string())
                    );
                }
                continue;
            }
        };

        for expression in &program.body {
            match evaluator::eval_toplevel(expression, &env, Some(&exports), &ctx) {
                Ok(value) => println!("{}", value),
                Err(err) => {
                    eprintln!(
                        "{}",
                        diagnostics::render(&content, err.span, &err.to_string())
                    );
                    break;
                }
            }
        }
    }
    Ok(())
}
