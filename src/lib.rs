//! Table-driven lexer automaton: runs compiled scanner tables over a byte
//! buffer with longest-match backtracking, position capture, and a
//! suspend/resume protocol for streaming input.

pub mod dev;
pub mod lexer;
