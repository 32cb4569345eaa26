//! Lexer for the operation language.
//!
//! Scans source text byte by byte. Whitespace other than newlines is
//! insignificant; `#` starts a comment running to the end of the line.
//! Runs of blank lines collapse into a single `Newline` token and a
//! trailing `Newline` is always emitted before `Eof` when the last line
//! had content.

use keel_ops::Span;

use crate::token::{Token, TokenKind};
use crate::ParseError;

/// Tokens and errors from one lexing run.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    line: u32,
    column: u32,
    errors: Vec<ParseError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source.
    pub fn tokenize(mut self) -> LexResult {
        let mut tokens: Vec<Token> = Vec::new();

        loop {
            self.skip_whitespace();
            self.skip_comment();

            if self.is_at_end() {
                if let Some(last) = tokens.last() {
                    if last.kind != TokenKind::Newline {
                        tokens.push(Token::new(TokenKind::Newline, self.here(0)));
                    }
                }
                tokens.push(Token::new(TokenKind::Eof, self.here(0)));
                break;
            }

            let Some(token) = self.lex_token() else {
                continue;
            };

            if token.kind == TokenKind::Newline {
                // Drop leading and repeated newlines.
                match tokens.last() {
                    Some(last) if last.kind != TokenKind::Newline => tokens.push(token),
                    _ => {}
                }
            } else {
                tokens.push(token);
            }
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // === Character navigation ===

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.pos]
        }
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    /// Zero-width span at the current position, widened by `len` bytes.
    fn here(&self, len: usize) -> Span {
        Span::new(
            self.pos as u32,
            (self.pos + len) as u32,
            self.line,
            self.column,
        )
    }

    // === Whitespace and comments ===

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), b' ' | b'\t' | b'\r') && !self.is_at_end() {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        if self.peek() == b'#' {
            while !self.is_at_end() && self.peek() != b'\n' {
                self.advance();
            }
        }
    }

    // === Tokens ===

    fn lex_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let line = self.line;
        let column = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'\n' => TokenKind::Newline,
            b'@' => TokenKind::At,
            b'=' => TokenKind::Eq,
            c if is_ident_start(c) => {
                while !self.is_at_end() && is_ident_continue(self.peek()) {
                    self.advance();
                }
                let text = self.text(start);
                TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text))
            }
            c if c.is_ascii_digit() => {
                while self.peek().is_ascii_digit() && !self.is_at_end() {
                    self.advance();
                }
                let text = self.text(start);
                match text.parse::<u64>() {
                    Ok(n) => TokenKind::IntLiteral(n),
                    Err(_) => {
                        self.error(
                            format!("integer literal `{}` is too large", text),
                            start,
                            line,
                            column,
                        );
                        return None;
                    }
                }
            }
            other => {
                // Consume the rest of a multi-byte character so the error
                // points at one whole character.
                while !self.is_at_end() && (self.peek() & 0xC0) == 0x80 {
                    self.advance();
                }
                let shown = if other.is_ascii() {
                    (other as char).to_string()
                } else {
                    self.text(start)
                };
                self.error(format!("unexpected character `{}`", shown), start, line, column);
                return None;
            }
        };

        Some(Token::new(
            kind,
            Span::new(start as u32, self.pos as u32, line, column),
        ))
    }

    fn text(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn error(&mut self, message: String, start: usize, line: u32, column: u32) {
        let span = Span::new(start as u32, self.pos as u32, line, column);
        self.errors.push(ParseError::new(message, span));
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Whether `text` lexes as a single identifier (and not a keyword).
pub fn is_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes.split_first() {
        Some((&first, rest)) => {
            is_ident_start(first)
                && rest.iter().all(|&c| is_ident_continue(c))
                && TokenKind::keyword(text).is_none()
        }
        None => false,
    }
}
