//! Token types for the operation language.

use std::fmt;

use keel_ops::Span;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every token kind in the operation language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    IntLiteral(u64),

    // === Keywords ===
    Enter,
    Exit,
    Bind,
    Borrow,
    Mut,
    Release,
    Move,
    Clone,
    Return,
    Use,
    Mutate,
    Drop,
    As,
    Rc,
    Size,

    // === Punctuation ===
    At,
    Eq,

    // === Structure ===
    Newline,
    Eof,
}

impl TokenKind {
    /// Map a word to its keyword, if it is one.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "enter" => TokenKind::Enter,
            "exit" => TokenKind::Exit,
            "bind" => TokenKind::Bind,
            "borrow" => TokenKind::Borrow,
            "mut" => TokenKind::Mut,
            "release" => TokenKind::Release,
            "move" => TokenKind::Move,
            "clone" => TokenKind::Clone,
            "return" => TokenKind::Return,
            "use" => TokenKind::Use,
            "mutate" => TokenKind::Mutate,
            "drop" => TokenKind::Drop,
            "as" => TokenKind::As,
            "rc" => TokenKind::Rc,
            "size" => TokenKind::Size,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this token can start an operation line.
    pub fn starts_operation(&self) -> bool {
        matches!(
            self,
            TokenKind::Enter
                | TokenKind::Exit
                | TokenKind::Bind
                | TokenKind::Borrow
                | TokenKind::Release
                | TokenKind::Move
                | TokenKind::Clone
                | TokenKind::Return
                | TokenKind::Use
                | TokenKind::Mutate
                | TokenKind::Drop
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(s) => write!(f, "identifier `{s}`"),
            TokenKind::IntLiteral(n) => write!(f, "integer `{n}`"),
            TokenKind::Enter => write!(f, "`enter`"),
            TokenKind::Exit => write!(f, "`exit`"),
            TokenKind::Bind => write!(f, "`bind`"),
            TokenKind::Borrow => write!(f, "`borrow`"),
            TokenKind::Mut => write!(f, "`mut`"),
            TokenKind::Release => write!(f, "`release`"),
            TokenKind::Move => write!(f, "`move`"),
            TokenKind::Clone => write!(f, "`clone`"),
            TokenKind::Return => write!(f, "`return`"),
            TokenKind::Use => write!(f, "`use`"),
            TokenKind::Mutate => write!(f, "`mutate`"),
            TokenKind::Drop => write!(f, "`drop`"),
            TokenKind::As => write!(f, "`as`"),
            TokenKind::Rc => write!(f, "`rc`"),
            TokenKind::Size => write!(f, "`size`"),
            TokenKind::At => write!(f, "`@`"),
            TokenKind::Eq => write!(f, "`=`"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
