// src/lexer/buffer.rs

use super::{capture::Cell, tables::ActionId};

/// Location metadata. The engine carries it without looking at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub fname: String,
    /// 1-based line number.
    pub lnum: usize,
    /// Absolute offset of the start of the current line.
    pub bol: usize,
    /// Absolute offset of this position.
    pub cnum: usize,
}

impl Position {
    pub fn new(fname: impl Into<String>) -> Self {
        Self {
            fname: fname.into(),
            lnum: 1,
            bol: 0,
            cnum: 0,
        }
    }
}

/// Mutable per-session scanning state.
///
/// `buffer[..len]` is the window the engine may read. All cursors are offsets
/// into that window; `abs_pos` is the absolute offset of `buffer[0]`.
#[derive(Debug, Clone, Default)]
pub struct ScanBuffer {
    pub buffer: Vec<u8>,
    pub len: usize,
    pub abs_pos: usize,
    pub start_pos: usize,
    pub curr_pos: usize,
    pub last_pos: usize,
    pub last_action: Option<ActionId>,
    pub eof_reached: bool,
    pub mem: Vec<Cell>,
    pub start_p: Position,
    pub curr_p: Position,
}

impl ScanBuffer {
    pub fn new() -> Self {
        Self {
            start_p: Position::new(""),
            curr_p: Position::new(""),
            ..Self::default()
        }
    }

    /// A buffer holding all of its input up front.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = Self::new();
        buf.refill(bytes);
        buf.set_eof();
        buf
    }

    pub fn with_name(mut self, fname: impl Into<String>) -> Self {
        let fname = fname.into();
        self.start_p.fname = fname.clone();
        self.curr_p.fname = fname;
        self
    }

    /// Appends `bytes` after the current window.
    pub fn refill(&mut self, bytes: &[u8]) {
        self.buffer.truncate(self.len);
        self.buffer.extend_from_slice(bytes);
        self.len = self.buffer.len();
    }

    pub fn set_eof(&mut self) {
        self.eof_reached = true;
    }

    /// Fully consumed and no more input will come.
    pub fn at_end(&self) -> bool {
        self.eof_reached && self.curr_pos >= self.len
    }

    /// Sizes the cell array to `n` cells, all unset.
    pub fn reset_captures(&mut self, n: usize) {
        self.mem.clear();
        self.mem.resize(n, None);
    }

    /// Moves the location metadata past the token just recognized.
    pub fn commit_token(&mut self) {
        self.start_p = self.curr_p.clone();
        self.start_p.cnum = self.abs_pos + self.start_pos;
        self.curr_p.cnum = self.abs_pos + self.curr_pos;
    }

    pub fn lexeme(&self) -> &[u8] {
        &self.buffer[self.start_pos..self.curr_pos]
    }

    pub fn lexeme_start(&self) -> usize {
        self.abs_pos + self.start_pos
    }

    pub fn lexeme_end(&self) -> usize {
        self.abs_pos + self.curr_pos
    }

    /// Byte `i` of the current lexeme.
    pub fn lexeme_char(&self, i: usize) -> Option<u8> {
        self.lexeme().get(i).copied()
    }

    /// Window bytes between two buffer offsets, usually capture cells.
    pub fn sub_lexeme(&self, from: usize, to: usize) -> Option<&[u8]> {
        if from > to || to > self.len {
            return None;
        }
        self.buffer.get(from..to)
    }

    /// Like [`ScanBuffer::sub_lexeme`], but `None` when either cell is unset.
    pub fn sub_lexeme_opt(&self, from: Cell, to: Cell) -> Option<&[u8]> {
        self.sub_lexeme(from?, to?)
    }

    /// Records that a newline ends at the current position.
    pub fn new_line(&mut self) {
        self.curr_p.lnum += 1;
        self.curr_p.bol = self.curr_p.cnum;
    }

    /// Drops all input and starts over, keeping the file name.
    pub fn flush(&mut self) {
        let fname = std::mem::take(&mut self.curr_p.fname);
        *self = Self::new().with_name(fname);
    }
}
