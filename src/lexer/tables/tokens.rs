// src/lexer/tables/tokens.rs

use super::ActionId;

/// Token kinds of the demo grammar. Discriminants are the action ids in the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TokenKind {
    Ident = 0,
    /// Digits with an optional `.digits` fraction; cell [`FRACTION_CELL`]
    /// holds the fraction start when present.
    Number = 1,
    White = 2,

    LParen = 3,
    RParen = 4,
    Plus = 5,
    Minus = 6,
    Star = 7,
    Slash = 8,
    Dot = 9,
    Assign = 10,
    EqEq = 11,
    LineComment = 12,
}

pub const ALL_KINDS: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::Number,
    TokenKind::White,
    TokenKind::LParen,
    TokenKind::RParen,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Star,
    TokenKind::Slash,
    TokenKind::Dot,
    TokenKind::Assign,
    TokenKind::EqEq,
    TokenKind::LineComment,
];

/// Capture cell holding the offset of the first fraction digit of a `Number`.
pub const FRACTION_CELL: usize = 0;

impl TokenKind {
    pub fn action(self) -> ActionId {
        self as ActionId
    }

    /// Whitespace and comments.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::White | TokenKind::LineComment)
    }
}

impl TryFrom<ActionId> for TokenKind {
    type Error = ActionId;

    fn try_from(v: ActionId) -> Result<Self, ActionId> {
        ALL_KINDS.get(v as usize).copied().ok_or(v)
    }
}
