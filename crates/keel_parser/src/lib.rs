//! Keel front ends: turn source text into a [`Program`].
//!
//! Two input formats are supported:
//! - the line-oriented text syntax (`bind R1 @ S0`, `borrow mut R1 @ S0 = B1`, ...),
//!   handled by [`Lexer`] and [`Parser`];
//! - a JSON array of operation objects tagged by `"op"`, handled by [`parse_json`].
//!
//! Both produce the same [`Program`]; only text input carries line numbers.

pub mod token;
pub mod lexer;
pub mod parser;
pub mod json;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod adversarial_tests;

use keel_ops::{Program, Span};

pub use json::parse_json;
pub use lexer::{is_identifier, Lexer};
pub use parser::{ParseResult, Parser};
pub use token::{Token, TokenKind};

/// A lex, parse or JSON decoding error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}:{}: {}", .span.line, .span.column, .message)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Lex and parse text source. Returns every error found if any.
pub fn parse_text(source: &str) -> Result<Program, Vec<ParseError>> {
    let lexed = Lexer::new(source).tokenize();
    let parsed = Parser::new(lexed.tokens).parse();

    let mut errors = lexed.errors;
    errors.extend(parsed.errors);
    if errors.is_empty() {
        Ok(parsed.program)
    } else {
        errors.sort_by_key(|e| e.span.start);
        Err(errors)
    }
}
