use std::{path::PathBuf, process::ExitCode};

use clap::{CommandFactory, Parser as ClapParser, error::ErrorKind};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use koi::{
    CompileError,
    frontend::{SourceFile, ast::print::print_ast, parser::Parser, scanner::Scanner},
    middle::{analyze::analyze, ir::build::build_ir, ir::print::pretty_print_ir},
};

#[derive(Debug, ClapParser)]
#[command(name = "koic", version, about = "Koi compiler", long_about = None)]
struct Args {
    /// Stop after the given stage and print its output
    #[arg(short = 'e', value_enum)]
    emit: Option<EmitFormat>,

    source_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitFormat {
    #[value(name = "tokens")]
    Tokens,
    #[value(name = "ast")]
    Ast,
    #[value(name = "symbols")]
    Symbols,
    #[value(name = "ir")]
    Ir,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.source_files.is_empty() {
        Args::command()
            .error(ErrorKind::MissingRequiredArgument, "Missing source files!")
            .exit();
    }

    for source_file in &args.source_files {
        if !source_file.is_file() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Source file '{}' does not exist!", source_file.display()),
                )
                .exit()
        }
    }

    for source_file in &args.source_files {
        if let Err(error) = compile(source_file, args.emit) {
            match error {
                CompileError::Read(error) => {
                    eprintln!("{}: {error}", "error".red());
                }
                CompileError::Compile(diagnostics) => {
                    eprintln!("{diagnostics}");
                    eprintln!(
                        "{}",
                        format!("{} error(s) in {}", diagnostics.len(), source_file.display())
                            .red()
                    );
                }
            }

            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn compile(path: &PathBuf, emit: Option<EmitFormat>) -> Result<(), CompileError> {
    let file = SourceFile::read(path)?;

    let mut scanner = Scanner::new(&file);
    let tokens = scanner.scan_all();

    if scanner.num_errors() > 0 {
        return Err(CompileError::Compile(scanner.into_diagnostics()));
    }

    if emit == Some(EmitFormat::Tokens) {
        for token in &tokens {
            println!("{token}");
        }
        return Ok(());
    }

    let mut parser = Parser::new(&file, tokens);
    let ast = parser.parse();

    if parser.num_errors() > 0 {
        return Err(CompileError::Compile(parser.into_diagnostics()));
    }

    if emit == Some(EmitFormat::Ast) {
        print!("{}", print_ast(&ast));
        return Ok(());
    }

    let (table, diagnostics) = analyze(&file, &ast);

    if !diagnostics.is_empty() {
        return Err(CompileError::Compile(diagnostics));
    }

    if emit == Some(EmitFormat::Symbols) {
        for symbol in table.reader().exported() {
            println!("pub {} {}", symbol.name.blue(), symbol.ty);
        }
        return Ok(());
    }

    // Code generation is an external collaborator; the IR is the final
    // product of this pipeline.
    let ir = build_ir(&ast, &table);
    pretty_print_ir(&ir);

    Ok(())
}
