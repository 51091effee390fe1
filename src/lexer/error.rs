// src/lexer/error.rs

use thiserror::Error;

/// Errors raised while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// No transition on the first probe and no backtrack point crossed.
    #[error("lexing: empty token at offset {at}")]
    EmptyToken { at: usize },

    #[error("start state {0} is not a state of these tables")]
    InvalidState(i32),

    #[error("tables carry no capture programs")]
    MissingCaptureTables,
}

/// Errors raised while decoding or validating automaton tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("truncated tables: expected {what}")]
    Truncated { what: &'static str },

    #[error("bad magic in tables .bin")]
    BadMagic,

    #[error("field `{field}` has odd byte length {len}")]
    OddLength { field: &'static str, len: usize },

    #[error("tables have no states")]
    Empty,

    #[error("{n_states} states do not fit in 16-bit state numbers")]
    TooManyStates { n_states: usize },

    #[error("`{field}` does not fit in a 16-bit table entry")]
    Overflow { field: &'static str },

    #[error("field `{field}` has length {got}, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("state {state}: `{field}` offset {offset} leaves no room for 257 columns (len {len})")]
    OffsetOutOfRange {
        field: &'static str,
        state: usize,
        offset: i16,
        len: usize,
    },

    #[error("`{field}`[{index}] targets state {target}, only {n_states} states exist")]
    TargetOutOfRange {
        field: &'static str,
        index: usize,
        target: i16,
        n_states: usize,
    },

    #[error("capture program at offset {offset}: {reason}")]
    BadProgram { offset: usize, reason: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse tables JSON: {0}")]
    Json(#[from] serde_json::Error),
}
