//! Parser: one operation per line.
//!
//! ```text
//! op      := enter NAME | exit NAME
//!          | bind NAME @ NAME (rc | size INT)*
//!          | borrow [mut] NAME @ NAME [= NAME]
//!          | release NAME
//!          | move NAME @ NAME [as NAME]
//!          | clone NAME @ NAME as NAME
//!          | return NAME @ NAME
//!          | use NAME | mutate NAME | drop NAME
//! program := (op NEWLINE)* EOF
//! ```
//!
//! On error the parser records it and skips to the next line, so one run
//! reports every malformed line.

use keel_ops::{BorrowKind, Name, Operation, Program, Span};

use crate::token::{Token, TokenKind};
use crate::ParseError;

/// Result of parsing a token stream.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            errors: vec![],
        }
    }

    pub fn parse(mut self) -> ParseResult {
        let mut program = Program::new();

        loop {
            self.skip_newlines();
            if self.at(&TokenKind::Eof) {
                break;
            }
            let start = self.current_span();
            match self.parse_operation() {
                Ok(op) => {
                    let span = start.merge(self.prev_span());
                    match self.expect_terminator() {
                        Ok(()) => program.push(op, span),
                        Err(err) => {
                            self.errors.push(err);
                            self.synchronize();
                        }
                    }
                }
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        ParseResult {
            program,
            errors: self.errors,
        }
    }

    // ---- Operations ----

    fn parse_operation(&mut self) -> Result<Operation, ParseError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Enter => Ok(Operation::Enter {
                scope: self.expect_name("scope")?,
            }),
            TokenKind::Exit => Ok(Operation::Exit {
                scope: self.expect_name("scope")?,
            }),
            TokenKind::Bind => self.parse_bind(),
            TokenKind::Borrow => self.parse_borrow(),
            TokenKind::Release => Ok(Operation::Release {
                label: self.expect_name("borrow label")?,
            }),
            TokenKind::Move => {
                let (resource, scope) = self.parse_target()?;
                let as_name = if self.eat(&TokenKind::As) {
                    Some(self.expect_name("binding")?)
                } else {
                    None
                };
                Ok(Operation::Move {
                    resource,
                    scope,
                    as_name,
                })
            }
            TokenKind::Clone => {
                let (resource, scope) = self.parse_target()?;
                self.expect(&TokenKind::As)?;
                let as_name = self.expect_name("binding")?;
                Ok(Operation::Clone {
                    resource,
                    scope,
                    as_name,
                })
            }
            TokenKind::Return => {
                let (resource, scope) = self.parse_target()?;
                Ok(Operation::Return { resource, scope })
            }
            TokenKind::Use => Ok(Operation::Use {
                resource: self.expect_name("resource")?,
            }),
            TokenKind::Mutate => Ok(Operation::Mutate {
                resource: self.expect_name("resource")?,
            }),
            TokenKind::Drop => Ok(Operation::Drop {
                resource: self.expect_name("resource")?,
            }),
            other => Err(ParseError::new(
                format!("expected an operation, found {}", other),
                tok.span,
            )),
        }
    }

    fn parse_bind(&mut self) -> Result<Operation, ParseError> {
        let (name, scope) = self.parse_target()?;
        let mut shared = false;
        let mut size = None;

        loop {
            if self.eat(&TokenKind::Rc) {
                if shared {
                    return Err(ParseError::new("duplicate `rc` modifier", self.prev_span()));
                }
                shared = true;
            } else if self.eat(&TokenKind::Size) {
                if size.is_some() {
                    return Err(ParseError::new("duplicate `size` modifier", self.prev_span()));
                }
                size = Some(self.expect_int()?);
            } else {
                break;
            }
        }

        Ok(Operation::Bind {
            name,
            scope,
            shared,
            size: size.unwrap_or(0),
        })
    }

    fn parse_borrow(&mut self) -> Result<Operation, ParseError> {
        let kind = if self.eat(&TokenKind::Mut) {
            BorrowKind::Exclusive
        } else {
            BorrowKind::Shared
        };
        let (resource, scope) = self.parse_target()?;
        let label = if self.eat(&TokenKind::Eq) {
            Some(self.expect_name("borrow label")?)
        } else {
            None
        };
        Ok(Operation::Borrow {
            resource,
            kind,
            scope,
            label,
        })
    }

    /// `NAME @ NAME`
    fn parse_target(&mut self) -> Result<(Name, Name), ParseError> {
        let resource = self.expect_name("resource")?;
        self.expect(&TokenKind::At)?;
        let scope = self.expect_name("scope")?;
        Ok((resource, scope))
    }

    // ---- Token navigation ----

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(format!(
                "expected {}, found {}",
                kind,
                self.current().kind
            )))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<Name, ParseError> {
        if let TokenKind::Identifier(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_at_current(format!(
                "expected {} name, found {}",
                what,
                self.current().kind
            )))
        }
    }

    fn expect_int(&mut self) -> Result<u64, ParseError> {
        if let TokenKind::IntLiteral(n) = self.current().kind {
            self.advance();
            Ok(n)
        } else {
            Err(self.error_at_current(format!(
                "expected integer, found {}",
                self.current().kind
            )))
        }
    }

    // ---- Newline handling ----

    fn skip_newlines(&mut self) {
        while self.at(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Newline) || self.at(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error_at_current(format!(
                "expected end of line, found {}",
                self.current().kind
            )))
        }
    }

    // ---- Error handling ----

    fn error_at_current(&self, message: String) -> ParseError {
        ParseError::new(message, self.current_span())
    }

    /// Skip to the start of the next line.
    fn synchronize(&mut self) {
        loop {
            match self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
