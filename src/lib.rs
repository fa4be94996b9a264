pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod typeck;

use std::path::Path;

use diagnostics::CompileError;

/// Compile a source string to target text (lex → parse → check → lower).
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut parser = parser::Parser::new(&tokens, source);
    let program = parser.parse_program()?;
    let table = typeck::check(&program)?;
    codegen::lower(&program, &table)
}

/// Run the front end and validation only, without emitting code.
pub fn check(source: &str) -> Result<(), CompileError> {
    let tokens = lexer::lex(source)?;
    let mut parser = parser::Parser::new(&tokens, source);
    let program = parser.parse_program()?;
    typeck::check(&program).map(|_| ())
}

/// Compile `input` and write the emitted program to `output`.
///
/// A failing compilation writes nothing; partial output is never left
/// on disk.
pub fn compile_file(input: &Path, output: &Path) -> Result<(), CompileError> {
    let source = std::fs::read_to_string(input)
        .map_err(|e| CompileError::codegen(format!("failed to read {}: {e}", input.display())))?;
    let emitted = compile(&source)?;
    std::fs::write(output, emitted)
        .map_err(|e| CompileError::codegen(format!("failed to write {}: {e}", output.display())))?;
    Ok(())
}
