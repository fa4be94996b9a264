pub mod token;
pub use token::is_keyword;

use logos::Logos;
use crate::span::{Span, Spanned};
use crate::diagnostics::CompileError;
use token::Token;

pub fn lex(source: &str) -> Result<Vec<Spanned<Token>>, CompileError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(tok) => {
                if matches!(tok, Token::Comment) {
                    continue;
                }
                tokens.push(Spanned::new(tok, Span::new(span.start, span.end)));
            }
            Err(()) => {
                return Err(CompileError::syntax(
                    format!("unexpected character '{}'", &source[span.start..span.end]),
                    Span::new(span.start, span.end),
                ));
            }
        }
    }

    Ok(tokens)
}
