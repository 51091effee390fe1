// src/lexer/capture.rs
//! Position memory: the tag/record mini-programs and the capture strategies
//! the engine is parameterized over.
//!
//! A program in the `code` blob is a run of `(dest, src)` byte pairs closed by
//! a `dest` of `0xFF`. A `src` of `0xFF` is a mark: the tag program writes
//! [`UNSET`], the record program writes the current position. Any other
//! `src` copies one cell into another.

use super::{
    error::TableError,
    tables::{CaptureTables, EOF_CHAR},
};

/// One capture cell. `None` means the sub-pattern did not take part in the match.
pub type Cell = Option<usize>;

pub const UNSET: Cell = None;

/// Terminator when read as `dest`, mark when read as `src`.
pub const SPECIAL: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instr {
    Copy { dest: u8, src: u8 },
    Mark { dest: u8 },
}

impl Instr {
    #[inline]
    fn dest(self) -> u8 {
        match self {
            Instr::Copy { dest, .. } | Instr::Mark { dest } => dest,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Program(Vec<Instr>);

impl Program {
    pub fn new(instrs: Vec<Instr>) -> Result<Self, TableError> {
        for i in &instrs {
            let reserved = i.dest() == SPECIAL || matches!(i, Instr::Copy { src: SPECIAL, .. });
            if reserved {
                return Err(TableError::BadProgram {
                    offset: 0,
                    reason: "cell 255 is reserved",
                });
            }
        }
        Ok(Self(instrs))
    }

    /// Decodes the program starting at `offset` in `code`.
    pub fn decode(code: &[u8], offset: usize) -> Result<Self, TableError> {
        let mut pc = offset;
        let mut instrs = Vec::new();
        loop {
            let dest = *code.get(pc).ok_or(TableError::BadProgram {
                offset,
                reason: "missing terminator",
            })?;
            if dest == SPECIAL {
                return Ok(Self(instrs));
            }
            let src = *code.get(pc + 1).ok_or(TableError::BadProgram {
                offset,
                reason: "instruction without source",
            })?;
            instrs.push(if src == SPECIAL {
                Instr::Mark { dest }
            } else {
                Instr::Copy { dest, src }
            });
            pc += 2;
        }
    }

    /// Appends the byte form of this program, terminator included.
    pub fn encode(&self, out: &mut Vec<u8>) {
        for i in &self.0 {
            match *i {
                Instr::Copy { dest, src } => out.extend_from_slice(&[dest, src]),
                Instr::Mark { dest } => out.extend_from_slice(&[dest, SPECIAL]),
            }
        }
        out.push(SPECIAL);
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of cells this program needs to run without going out of bounds.
    pub fn cells_needed(&self) -> usize {
        self.0
            .iter()
            .map(|i| match *i {
                Instr::Copy { dest, src } => dest.max(src) as usize + 1,
                Instr::Mark { dest } => dest as usize + 1,
            })
            .max()
            .unwrap_or(0)
    }

    /// Runs this program as a tag program: marks unset the cell.
    pub fn run_tag(&self, mem: &mut [Cell]) {
        self.run(mem, UNSET);
    }

    /// Runs this program as a record program: marks record `curr_pos`.
    pub fn run_mem(&self, mem: &mut [Cell], curr_pos: usize) {
        self.run(mem, Some(curr_pos));
    }

    fn run(&self, mem: &mut [Cell], mark: Cell) {
        for i in &self.0 {
            match *i {
                Instr::Copy { dest, src } => {
                    log::trace!("[{dest}] <- [{src}]");
                    mem[dest as usize] = mem[src as usize];
                }
                Instr::Mark { dest } => {
                    log::trace!("[{dest}] <- {mark:?}");
                    mem[dest as usize] = mark;
                }
            }
        }
    }
}

/// Where a tag program is being run from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPoint {
    Accept,
    Backtrack,
}

/// Hooks the engine calls at automaton events. The recognition decisions never
/// depend on what a strategy does.
pub trait CaptureStrategy {
    /// Minimum length of the cell array before the engine runs.
    fn required_cells(&self) -> usize;

    fn on_accept_or_backtrack(&self, point: TagPoint, state: usize, mem: &mut [Cell]);

    /// Called after the transition out of `prev_state` on `c` succeeded;
    /// `curr_pos` already points past the consumed unit.
    fn on_transition(&self, prev_state: usize, c: usize, curr_pos: usize, mem: &mut [Cell]);
}

/// Plain recognition: no cells are touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl CaptureStrategy for NoCapture {
    #[inline(always)]
    fn required_cells(&self) -> usize {
        0
    }

    #[inline(always)]
    fn on_accept_or_backtrack(&self, _: TagPoint, _: usize, _: &mut [Cell]) {}

    #[inline(always)]
    fn on_transition(&self, _: usize, _: usize, _: usize, _: &mut [Cell]) {}
}

/// Runs the decoded capture programs of a table.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCapture<'t> {
    code: &'t CaptureTables,
}

impl<'t> MemoryCapture<'t> {
    pub fn new(code: &'t CaptureTables) -> Self {
        Self { code }
    }
}

impl CaptureStrategy for MemoryCapture<'_> {
    fn required_cells(&self) -> usize {
        self.code.mem_size()
    }

    fn on_accept_or_backtrack(&self, point: TagPoint, state: usize, mem: &mut [Cell]) {
        if let Some(p) = self.code.tag_program(point, state) {
            p.run_tag(mem);
        }
    }

    fn on_transition(&self, prev_state: usize, c: usize, curr_pos: usize, mem: &mut [Cell]) {
        debug_assert!(c <= EOF_CHAR);
        if let Some(p) = self.code.record_program(prev_state, c) {
            p.run_mem(mem, curr_pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_stops_at_terminator() {
        let code = [0xFF, 0, 0xFF, 1, 0, 0xFF, 7];
        assert!(Program::decode(&code, 0).unwrap().is_empty());
        let p = Program::decode(&code, 1).unwrap();
        assert_eq!(
            p.instrs(),
            &[Instr::Mark { dest: 0 }, Instr::Copy { dest: 1, src: 0 }]
        );
        assert_eq!(p.cells_needed(), 2);
    }

    #[test]
    fn decode_rejects_unterminated() {
        assert!(Program::decode(&[0, 0xFF, 1], 0).is_err());
        assert!(Program::decode(&[0, 1, 2], 0).is_err());
        assert!(Program::decode(&[0xFF], 3).is_err());
    }

    #[test]
    fn encode_matches_decode() {
        let p = Program::new(vec![Instr::Copy { dest: 2, src: 0 }, Instr::Mark { dest: 1 }]).unwrap();
        let mut code = vec![0xFF];
        p.encode(&mut code);
        assert_eq!(code, vec![0xFF, 2, 0, 1, 0xFF, 0xFF]);
        assert_eq!(Program::decode(&code, 1).unwrap(), p);
    }

    #[test]
    fn reserved_cell_rejected() {
        assert!(Program::new(vec![Instr::Mark { dest: SPECIAL }]).is_err());
        assert!(Program::new(vec![Instr::Copy { dest: 0, src: SPECIAL }]).is_err());
    }

    #[test]
    fn tag_and_record_differ_only_in_mark() {
        let p = Program::new(vec![Instr::Mark { dest: 0 }, Instr::Copy { dest: 1, src: 2 }]).unwrap();

        let mut mem = vec![Some(9), None, Some(4)];
        p.run_mem(&mut mem, 5);
        assert_eq!(mem, vec![Some(5), Some(4), Some(4)]);

        p.run_tag(&mut mem);
        assert_eq!(mem, vec![UNSET, Some(4), Some(4)]);
    }

    #[test]
    fn copies_run_in_order() {
        // [1] <- [0]; [0] <- [2]: the second move must not leak into the first
        let p = Program::new(vec![Instr::Copy { dest: 1, src: 0 }, Instr::Copy { dest: 0, src: 2 }]).unwrap();
        let mut mem = vec![Some(1), Some(2), Some(3)];
        p.run_tag(&mut mem);
        assert_eq!(mem, vec![Some(3), Some(1), Some(3)]);
    }
}
