// src/lexer/mod.rs
pub mod buffer;
pub mod capture;
pub mod driver;
pub mod engine;
pub mod error;
pub mod tables;

pub use buffer::{Position, ScanBuffer};
pub use capture::{Cell, UNSET};
pub use driver::{Scanner, Token, lex_in_chunks, lex_on_cpu};
pub use engine::{START, Step, engine, new_engine};
pub use error::{LexError, TableError};
pub use tables::{ActionId, EOF_CHAR, Tables};
