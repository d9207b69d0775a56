//! Compiler front-end and middle-end for the Koi programming language. The
//! pipeline is strictly feed-forward: source bytes are scanned to tokens,
//! parsed to an AST, semantically analyzed into a symbol table, and lowered
//! to a linear IR for a target specific code generator.
//!
//! Each stage either produces its output in full or the pipeline stops with
//! the stage's diagnostics.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::{
    diagnostics::DiagnosticList,
    frontend::{SourceFile, SourceFileOrigin, ast::Ast, parser::Parser, scanner::Scanner},
    middle::{analyze::analyze, ir::Ir, ir::build::build_ir, symtab::SymbolTable},
};

pub mod diagnostics;
pub mod frontend;
pub mod index;
pub mod middle;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Read(#[from] std::io::Error),
    #[error("{0}")]
    Compile(DiagnosticList),
}

impl CompileError {
    /// The diagnostics behind a compile failure, if any.
    pub fn diagnostics(&self) -> Option<&DiagnosticList> {
        match self {
            CompileError::Read(_) => None,
            CompileError::Compile(diagnostics) => Some(diagnostics),
        }
    }
}

/// Scan, parse, and analyze a single file. When `src` is given the text is
/// compiled from memory under the given name; otherwise the file is read
/// from disk. Scanner and parser errors short circuit; semantic errors are
/// reported the same way after the whole tree has been checked.
pub fn parse_file(
    filename: impl Into<PathBuf>,
    src: Option<&str>,
) -> Result<(Ast, SymbolTable), CompileError> {
    let path = filename.into();

    let file = match src {
        Some(text) => SourceFile::new(SourceFileOrigin::File(path), text.as_bytes().to_vec()),
        None => SourceFile::read(path)?,
    };

    front_end(&file)
}

/// Run the full pipeline on a source file, producing the linear IR.
pub fn generate_ir(file: &SourceFile) -> Result<Ir, CompileError> {
    let (ast, table) = front_end(file)?;
    Ok(build_ir(&ast, &table))
}

fn front_end(file: &SourceFile) -> Result<(Ast, SymbolTable), CompileError> {
    info!("compiling {}", file.origin);

    let mut scanner = Scanner::new(file);
    let tokens = scanner.scan_all();

    if scanner.num_errors() > 0 {
        return Err(CompileError::Compile(scanner.into_diagnostics()));
    }

    let mut parser = Parser::new(file, tokens);
    let ast = parser.parse();

    if parser.num_errors() > 0 {
        return Err(CompileError::Compile(parser.into_diagnostics()));
    }

    let (table, diagnostics) = analyze(file, &ast);

    if !diagnostics.is_empty() {
        return Err(CompileError::Compile(diagnostics));
    }

    Ok((ast, table))
}
