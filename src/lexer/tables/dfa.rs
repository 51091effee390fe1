// src/lexer/tables/dfa.rs
// Hand-built DFA for the demo grammar, fed through the table builder.

use super::{
    DfaBuilder, Tables,
    tokens::{FRACTION_CELL, TokenKind},
};
use crate::lexer::{
    capture::{Instr, Program},
    error::TableError,
};

// DFA states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S {
    Start,
    Ident,
    Int,
    // `digits .`, waiting for the first fraction digit
    IntDot,
    Frac,
    White,

    MaybeSlash,
    LineComment,
    MaybeEq,

    // single-char and two-char acceptors
    AfterLParen,
    AfterRParen,
    AfterPlus,
    AfterMinus,
    AfterStar,
    AfterDot,
    EqEqDone,
}

impl S {
    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }
}

pub const ALL_STATES: &[S] = &[
    S::Start,
    S::Ident,
    S::Int,
    S::IntDot,
    S::Frac,
    S::White,
    S::MaybeSlash,
    S::LineComment,
    S::MaybeEq,
    S::AfterLParen,
    S::AfterRParen,
    S::AfterPlus,
    S::AfterMinus,
    S::AfterStar,
    S::AfterDot,
    S::EqEqDone,
];

/// Scratch cell written when the `.` of a number is consumed.
const DOT_CELL: u8 = 1;

#[inline]
fn is_alpha(b: u8) -> bool {
    matches!(b, b'a'..=b'z' | b'A'..=b'Z' | b'_')
}
#[inline]
fn is_alnum(b: u8) -> bool {
    is_alpha(b) || b.is_ascii_digit()
}
#[inline]
fn is_white(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn bytes_where(f: impl Fn(u8) -> bool) -> impl Iterator<Item = u8> {
    (0u8..=255).filter(move |&b| f(b))
}

/// The demo grammar as a dense DFA.
pub fn demo_builder() -> Result<DfaBuilder, TableError> {
    let mut b = DfaBuilder::new();
    for s in ALL_STATES {
        let id = b.add_state();
        debug_assert_eq!(id, s.idx());
    }

    let unset_fraction = Program::new(vec![Instr::Mark {
        dest: FRACTION_CELL as u8,
    }])?;
    let mark_dot = Program::new(vec![Instr::Mark { dest: DOT_CELL }])?;
    let take_fraction = Program::new(vec![Instr::Copy {
        dest: FRACTION_CELL as u8,
        src: DOT_CELL,
    }])?;

    // Start
    b.edges(S::Start.idx(), bytes_where(is_alpha), S::Ident.idx());
    b.edges(S::Start.idx(), b'0'..=b'9', S::Int.idx());
    b.edges(S::Start.idx(), bytes_where(is_white), S::White.idx());
    for (c, to) in [
        (b'(', S::AfterLParen),
        (b')', S::AfterRParen),
        (b'+', S::AfterPlus),
        (b'-', S::AfterMinus),
        (b'*', S::AfterStar),
        (b'.', S::AfterDot),
        (b'/', S::MaybeSlash),
        (b'=', S::MaybeEq),
    ] {
        b.edge(S::Start.idx(), c as usize, to.idx());
    }

    // Ident
    b.backtrack(S::Ident.idx(), TokenKind::Ident.action());
    b.edges(S::Ident.idx(), bytes_where(is_alnum), S::Ident.idx());

    // Number: digits, then optionally `.` and at least one digit
    b.backtrack_with(S::Int.idx(), TokenKind::Number.action(), unset_fraction);
    b.edges(S::Int.idx(), b'0'..=b'9', S::Int.idx());
    b.edge_with(S::Int.idx(), b'.' as usize, S::IntDot.idx(), mark_dot);
    b.edges(S::IntDot.idx(), b'0'..=b'9', S::Frac.idx());
    b.backtrack_with(S::Frac.idx(), TokenKind::Number.action(), take_fraction);
    b.edges(S::Frac.idx(), b'0'..=b'9', S::Frac.idx());

    // Whitespace
    b.backtrack(S::White.idx(), TokenKind::White.action());
    b.edges(S::White.idx(), bytes_where(is_white), S::White.idx());

    // Slash / line comments
    b.backtrack(S::MaybeSlash.idx(), TokenKind::Slash.action());
    b.edge(S::MaybeSlash.idx(), b'/' as usize, S::LineComment.idx());
    b.backtrack(S::LineComment.idx(), TokenKind::LineComment.action());
    b.edges(
        S::LineComment.idx(),
        bytes_where(|c| c != b'\n'),
        S::LineComment.idx(),
    );

    // `=` / `==`
    b.backtrack(S::MaybeEq.idx(), TokenKind::Assign.action());
    b.edge(S::MaybeEq.idx(), b'=' as usize, S::EqEqDone.idx());

    for (s, k) in [
        (S::AfterLParen, TokenKind::LParen),
        (S::AfterRParen, TokenKind::RParen),
        (S::AfterPlus, TokenKind::Plus),
        (S::AfterMinus, TokenKind::Minus),
        (S::AfterStar, TokenKind::Star),
        (S::AfterDot, TokenKind::Dot),
        (S::EqEqDone, TokenKind::EqEq),
    ] {
        b.accept(s.idx(), k.action());
    }

    Ok(b)
}

/// Packed tables for the demo grammar.
pub fn demo_tables() -> Result<Tables, TableError> {
    demo_builder()?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{
        buffer::ScanBuffer,
        engine::{START, Step, new_engine},
    };

    fn first(input: &[u8]) -> (TokenKind, usize, Option<usize>) {
        let t = demo_tables().unwrap();
        let mut buf = ScanBuffer::from_bytes(input);
        buf.reset_captures(2);
        let Ok(Step::Action(a)) = new_engine(&t, START, &mut buf) else {
            panic!("no token for {input:?}");
        };
        (TokenKind::try_from(a).unwrap(), buf.curr_pos, buf.mem[FRACTION_CELL])
    }

    #[test]
    fn demo_tables_build() {
        let t = demo_tables().unwrap();
        assert_eq!(t.n_states(), ALL_STATES.len());
        assert_eq!(t.captures().unwrap().mem_size(), 2);
    }

    #[test]
    fn numbers_capture_fraction() {
        assert_eq!(first(b"12.50+"), (TokenKind::Number, 5, Some(3)));
        assert_eq!(first(b"12"), (TokenKind::Number, 2, None));
        // `.` without a digit backtracks to the integer part
        assert_eq!(first(b"7.x"), (TokenKind::Number, 1, None));
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(first(b"==1").0, TokenKind::EqEq);
        assert_eq!(first(b"=1").0, TokenKind::Assign);
        assert_eq!(first(b"// hi\nx"), (TokenKind::LineComment, 5, None));
        assert_eq!(first(b"/x").0, TokenKind::Slash);
    }
}
