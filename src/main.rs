use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser as ClapParser};
use colored::Colorize;

use rill::frontend::{ast::pretty_print::pretty_print_program, parser::Parser, SourceFile};

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    source_files: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if args.source_files.is_empty() {
        Args::command()
            .error(ErrorKind::MissingRequiredArgument, "no source files given")
            .exit();
    }

    for path in &args.source_files {
        let source = match SourceFile::read(path) {
            Ok(source) => source,
            Err(error) => Args::command()
                .error(
                    ErrorKind::Io,
                    format!("cannot read '{}': {error}", path.display()),
                )
                .exit(),
        };

        match Parser::parse_program(&source) {
            Ok(program) => pretty_print_program(&program),
            Err(error) => {
                eprintln!("{} {error}", "[Error]".red());
                eprintln!("{} {}", "[Line]".red(), error.line());
                std::process::exit(1);
            }
        }
    }
}
