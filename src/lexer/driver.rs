// src/lexer/driver.rs
// Host-side scanning loop: repeated engine calls, refilling by appending.

use super::{
    buffer::ScanBuffer,
    capture::Cell,
    engine::{self, START, Step},
    error::LexError,
    tables::{ActionId, Tables},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub action: ActionId,
    /// Absolute offset of the first byte.
    pub start: usize,
    pub len: usize,
    /// Capture cells at the time of the match; empty when scanning without captures.
    pub captures: Vec<Cell>,
}

/// Drives one automaton over a buffer, token by token.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'t> {
    tables: &'t Tables,
    captures: bool,
}

impl<'t> Scanner<'t> {
    /// Uses the capture engine whenever the tables carry capture programs.
    pub fn new(tables: &'t Tables) -> Self {
        Self {
            tables,
            captures: tables.captures().is_some(),
        }
    }

    /// Always uses the plain engine.
    pub fn plain(tables: &'t Tables) -> Self {
        Self {
            tables,
            captures: false,
        }
    }

    pub fn tables(&self) -> &'t Tables {
        self.tables
    }

    /// Scans one token starting at `buf.curr_pos`.
    ///
    /// Whenever the engine asks for input, `refill` is called; it should append
    /// to the buffer and return `true`, or return `false` once the input is
    /// exhausted (the end-of-input flag is then set). Returns `Ok(None)` when
    /// nothing is left to scan.
    pub fn next_token<F>(&self, buf: &mut ScanBuffer, mut refill: F) -> Result<Option<Token>, LexError>
    where
        F: FnMut(&mut ScanBuffer) -> bool,
    {
        while buf.curr_pos >= buf.len && !buf.eof_reached {
            if !refill(buf) {
                buf.set_eof();
            }
        }
        if buf.at_end() {
            return Ok(None);
        }

        if self.captures {
            let cells = self.tables.captures().map_or(0, |c| c.mem_size());
            buf.reset_captures(cells);
        }

        let mut state = START;
        loop {
            let step = if self.captures {
                engine::new_engine(self.tables, state, buf)?
            } else {
                engine::engine(self.tables, state, buf)?
            };
            match step {
                Step::Action(action) => {
                    buf.commit_token();
                    return Ok(Some(Token {
                        action,
                        start: buf.lexeme_start(),
                        len: buf.curr_pos - buf.start_pos,
                        captures: if self.captures {
                            buf.mem.clone()
                        } else {
                            Vec::new()
                        },
                    }));
                }
                Step::Refill(code) => {
                    if !refill(buf) {
                        buf.set_eof();
                    }
                    state = code;
                }
            }
        }
    }

    /// Scans every token of a sequence of chunks. A zero-length match ends the scan.
    pub fn lex_chunks<'a, I>(&self, chunks: I) -> Result<Vec<Token>, LexError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut chunks = chunks.into_iter();
        let mut buf = ScanBuffer::new();
        let mut out = Vec::new();
        let mut refill = |b: &mut ScanBuffer| match chunks.next() {
            Some(c) => {
                b.refill(c);
                true
            }
            None => false,
        };

        while let Some(tok) = self.next_token(&mut buf, &mut refill)? {
            let empty = tok.len == 0;
            out.push(tok);
            if empty {
                log::warn!("zero-length token at {}; stopping", buf.lexeme_start());
                break;
            }
        }
        Ok(out)
    }
}

/// Scans a whole input held in memory.
pub fn lex_on_cpu(tables: &Tables, input: &[u8]) -> Result<Vec<Token>, LexError> {
    Scanner::new(tables).lex_chunks(std::iter::once(input))
}

/// Scans `input` delivered in pieces of at most `chunk` bytes.
pub fn lex_in_chunks(tables: &Tables, input: &[u8], chunk: usize) -> Result<Vec<Token>, LexError> {
    Scanner::new(tables).lex_chunks(input.chunks(chunk.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tables::{
        dfa::demo_tables,
        tokens::{FRACTION_CELL, TokenKind},
    };

    fn kinds(toks: &[Token]) -> Vec<TokenKind> {
        toks.iter()
            .map(|t| TokenKind::try_from(t.action).unwrap())
            .collect()
    }

    #[test]
    fn lexes_demo_source() {
        let t = demo_tables().unwrap();
        let toks = lex_on_cpu(&t, b"x1 = 3.25*(y-7) // done").unwrap();
        use TokenKind::*;
        assert_eq!(
            kinds(&toks),
            vec![
                Ident, White, Assign, White, Number, Star, LParen, Ident, Minus, Number, RParen,
                White, LineComment
            ]
        );
        let num = &toks[4];
        assert_eq!((num.start, num.len), (5, 4));
        assert_eq!(num.captures[FRACTION_CELL], Some(7));
        assert_eq!(toks[9].captures[FRACTION_CELL], None);
    }

    #[test]
    fn chunked_matches_contiguous() {
        let t = demo_tables().unwrap();
        let src = b"a==b / 10.5 + c.d 1.x";
        let whole = lex_on_cpu(&t, src).unwrap();
        for chunk in 1..=src.len() {
            assert_eq!(lex_in_chunks(&t, src, chunk).unwrap(), whole, "chunk={chunk}");
        }
    }

    #[test]
    fn empty_chunks_are_harmless() {
        let t = demo_tables().unwrap();
        let pieces: [&[u8]; 5] = [b"", b"ab", b"", b"", b"c"];
        let toks = Scanner::new(&t).lex_chunks(pieces).unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].len, 3);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let t = demo_tables().unwrap();
        assert!(lex_on_cpu(&t, b"").unwrap().is_empty());
    }

    #[test]
    fn unknown_byte_is_empty_token() {
        let t = demo_tables().unwrap();
        assert_eq!(
            lex_on_cpu(&t, b"ab $"),
            Err(LexError::EmptyToken { at: 3 })
        );
    }

    #[test]
    fn plain_scanner_skips_cells() {
        let t = demo_tables().unwrap();
        let toks = Scanner::plain(&t).lex_chunks([&b"1.5"[..]]).unwrap();
        assert_eq!(toks.len(), 1);
        assert!(toks[0].captures.is_empty());
    }
}
