mod repl;
mod runner;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Dump the token stream before parsing
    #[arg(long)]
    tokens: bool,
    /// Dump the parsed tree before evaluating
    #[arg(long)]
    ast: bool,
    /// Print the parsed tree back as source
    #[arg(long)]
    source: bool,
    path: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    match cli.path {
        None => {
            if let Err(err) = repl::start() {
                eprintln!("Error: {:?}", err);
                std::process::exit(1);
            }
        }
        Some(path) => runner::execute(&path, cli.tokens, cli.ast, cli.source),
    }
}
