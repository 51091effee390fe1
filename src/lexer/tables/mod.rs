// src/lexer/tables/mod.rs
pub mod build;
pub mod dfa;
pub mod io;
pub mod tokens;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{
    capture::{Program, TagPoint},
    error::TableError,
};

// Re-exports to keep the external API flat.
pub use build::DfaBuilder;
pub use io::{
    load_tables_bin_bytes, load_tables_file, load_tables_json_bytes, save_tables_bin,
    save_tables_json,
};
pub use tokens::TokenKind;

/// Result of an accepting state or a backtrack point. Opaque to the engine.
pub type ActionId = u16;

/// Pseudo-character fed to the automaton once input is exhausted and the
/// end-of-input flag is set. Tables must never use this column for a byte.
pub const EOF_CHAR: usize = 256;

/// Columns per state row: every byte plus [`EOF_CHAR`].
pub const N_SYMBOLS: usize = 257;

/// Largest state count addressable by `i16` entries.
pub const MAX_STATES: usize = i16::MAX as usize + 1;

/// Plain recognition tables, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableParts {
    pub base: Vec<i16>,
    pub backtrk: Vec<i16>,
    pub default: Vec<i16>,
    pub trans: Vec<i16>,
    pub check: Vec<i16>,
}

/// Capture program tables, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureParts {
    pub base_code: Vec<i16>,
    pub backtrk_code: Vec<i16>,
    pub default_code: Vec<i16>,
    pub trans_code: Vec<i16>,
    pub check_code: Vec<i16>,
    pub code: Vec<u8>,
}

/// Table fields as raw little-endian byte strings, the way a generator emits them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTables<'a> {
    pub base: &'a [u8],
    pub backtrk: &'a [u8],
    pub default: &'a [u8],
    pub trans: &'a [u8],
    pub check: &'a [u8],
    pub captures: Option<RawCaptureTables<'a>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawCaptureTables<'a> {
    pub base_code: &'a [u8],
    pub backtrk_code: &'a [u8],
    pub default_code: &'a [u8],
    pub trans_code: &'a [u8],
    pub check_code: &'a [u8],
    pub code: &'a [u8],
}

/// Decodes a field of 16-bit little-endian signed integers.
pub fn decode_i16_le(field: &'static str, bytes: &[u8]) -> Result<Vec<i16>, TableError> {
    if bytes.len() % 2 != 0 {
        return Err(TableError::OddLength {
            field,
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|p| i16::from_le_bytes([p[0], p[1]]))
        .collect())
}

/// Validated automaton tables. Immutable once built and safe to share across
/// any number of scan buffers.
#[derive(Debug, Clone)]
pub struct Tables {
    parts: TableParts,
    captures: Option<CaptureTables>,
}

/// Validated capture tables with every reachable program decoded.
#[derive(Debug, Clone)]
pub struct CaptureTables {
    parts: CaptureParts,
    programs: HashMap<usize, Program>,
    mem_size: usize,
}

impl Tables {
    pub fn new(parts: TableParts, captures: Option<CaptureParts>) -> Result<Self, TableError> {
        validate(&parts)?;
        let captures = captures
            .map(|c| CaptureTables::new(&parts, c))
            .transpose()?;
        log::debug!(
            "tables: {} states, {} transition slots, captures={}",
            parts.base.len(),
            parts.trans.len(),
            captures.is_some()
        );
        Ok(Self { parts, captures })
    }

    pub fn from_raw(raw: &RawTables<'_>) -> Result<Self, TableError> {
        let parts = TableParts {
            base: decode_i16_le("base", raw.base)?,
            backtrk: decode_i16_le("backtrk", raw.backtrk)?,
            default: decode_i16_le("default", raw.default)?,
            trans: decode_i16_le("trans", raw.trans)?,
            check: decode_i16_le("check", raw.check)?,
        };
        let captures = match &raw.captures {
            Some(c) => Some(CaptureParts {
                base_code: decode_i16_le("base_code", c.base_code)?,
                backtrk_code: decode_i16_le("backtrk_code", c.backtrk_code)?,
                default_code: decode_i16_le("default_code", c.default_code)?,
                trans_code: decode_i16_le("trans_code", c.trans_code)?,
                check_code: decode_i16_le("check_code", c.check_code)?,
                code: c.code.to_vec(),
            }),
            None => None,
        };
        Self::new(parts, captures)
    }

    pub fn parts(&self) -> &TableParts {
        &self.parts
    }

    pub fn captures(&self) -> Option<&CaptureTables> {
        self.captures.as_ref()
    }

    #[inline]
    pub fn n_states(&self) -> usize {
        self.parts.base.len()
    }

    #[inline]
    pub(crate) fn base(&self, state: usize) -> i16 {
        self.parts.base[state]
    }

    #[inline]
    pub(crate) fn backtrk(&self, state: usize) -> i16 {
        self.parts.backtrk[state]
    }

    /// Double-array lookup. `base` must be the (non-negative) base of `state`.
    #[inline]
    pub(crate) fn next_state(&self, state: usize, base: i16, c: usize) -> i16 {
        let idx = base as usize + c;
        if self.parts.check[idx] == state as i16 {
            self.parts.trans[idx]
        } else {
            self.parts.default[state]
        }
    }
}

impl CaptureTables {
    fn new(plain: &TableParts, parts: CaptureParts) -> Result<Self, TableError> {
        let n = plain.base.len();
        expect_len("base_code", parts.base_code.len(), n)?;
        expect_len("backtrk_code", parts.backtrk_code.len(), n)?;
        expect_len("default_code", parts.default_code.len(), n)?;
        expect_len("check_code", parts.check_code.len(), parts.trans_code.len())?;

        let mut programs = HashMap::new();
        let mut want = |pc: i16| -> Result<(), TableError> {
            if pc > 0 && !programs.contains_key(&(pc as usize)) {
                let p = Program::decode(&parts.code, pc as usize)?;
                programs.insert(pc as usize, p);
            }
            Ok(())
        };

        for s in 0..n {
            if plain.base[s] < 0 {
                want(parts.base_code[s])?;
            } else {
                check_row("base_code", s, parts.base_code[s], parts.trans_code.len())?;
                want(parts.default_code[s])?;
            }
            if plain.backtrk[s] >= 0 {
                want(parts.backtrk_code[s])?;
            }
        }
        for (i, &owner) in parts.check_code.iter().enumerate() {
            if owner >= 0 && (owner as usize) < n {
                want(parts.trans_code[i])?;
            }
        }

        let mem_size = programs
            .values()
            .map(Program::cells_needed)
            .max()
            .unwrap_or(0);
        Ok(Self {
            parts,
            programs,
            mem_size,
        })
    }

    pub fn parts(&self) -> &CaptureParts {
        &self.parts
    }

    /// Number of cells referenced by any program.
    pub fn mem_size(&self) -> usize {
        self.mem_size
    }

    #[inline]
    fn program(&self, pc: i16) -> Option<&Program> {
        if pc <= 0 {
            return None;
        }
        self.programs.get(&(pc as usize))
    }

    #[inline]
    pub(crate) fn tag_program(&self, point: TagPoint, state: usize) -> Option<&Program> {
        let pc = match point {
            TagPoint::Accept => self.parts.base_code[state],
            TagPoint::Backtrack => self.parts.backtrk_code[state],
        };
        self.program(pc)
    }

    /// Record program for the transition out of `prev` on `c`, resolved with
    /// the same check/default rule as the state lookup.
    #[inline]
    pub(crate) fn record_program(&self, prev: usize, c: usize) -> Option<&Program> {
        let idx = self.parts.base_code[prev] as usize + c;
        let pc = if self.parts.check_code[idx] == prev as i16 {
            self.parts.trans_code[idx]
        } else {
            self.parts.default_code[prev]
        };
        self.program(pc)
    }
}

fn expect_len(field: &'static str, got: usize, expected: usize) -> Result<(), TableError> {
    if got != expected {
        return Err(TableError::LengthMismatch {
            field,
            got,
            expected,
        });
    }
    Ok(())
}

/// A row starting at `offset` must have all [`N_SYMBOLS`] columns in range.
fn check_row(field: &'static str, state: usize, offset: i16, len: usize) -> Result<(), TableError> {
    if offset < 0 || offset as usize + N_SYMBOLS > len {
        return Err(TableError::OffsetOutOfRange {
            field,
            state,
            offset,
            len,
        });
    }
    Ok(())
}

fn check_target(
    field: &'static str,
    index: usize,
    target: i16,
    n_states: usize,
) -> Result<(), TableError> {
    if target >= 0 && target as usize >= n_states {
        return Err(TableError::TargetOutOfRange {
            field,
            index,
            target,
            n_states,
        });
    }
    Ok(())
}

fn validate(t: &TableParts) -> Result<(), TableError> {
    let n = t.base.len();
    if n == 0 {
        return Err(TableError::Empty);
    }
    if n > MAX_STATES {
        return Err(TableError::TooManyStates { n_states: n });
    }
    expect_len("backtrk", t.backtrk.len(), n)?;
    expect_len("default", t.default.len(), n)?;
    expect_len("check", t.check.len(), t.trans.len())?;

    for s in 0..n {
        if t.base[s] >= 0 {
            check_row("base", s, t.base[s], t.trans.len())?;
        }
        check_target("default", s, t.default[s], n)?;
    }
    for (i, &owner) in t.check.iter().enumerate() {
        if owner >= 0 && (owner as usize) < n {
            check_target("trans", i, t.trans[i], n)?;
        }
    }
    Ok(())
}
