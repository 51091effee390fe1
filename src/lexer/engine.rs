// src/lexer/engine.rs
//! The table-driven automaton interpreter.
//!
//! One call runs the automaton from a start state (fresh attempt) or from a
//! suspended state until it accepts, runs dry, or dead-ends. Running dry hands
//! back a negative resume code; every other piece of resumable state lives in
//! the [`ScanBuffer`], so the host can refill from anywhere and call again.

use super::{
    buffer::ScanBuffer,
    capture::{CaptureStrategy, MemoryCapture, NoCapture, TagPoint},
    error::LexError,
    tables::{ActionId, EOF_CHAR, Tables},
};

/// Start state of a freshly generated scanner entry point.
pub const START: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A token was recognized; the buffer cursors delimit it.
    Action(ActionId),
    /// Input ran out before a decision. Refill the buffer or set its
    /// end-of-input flag, then call again with this code unchanged.
    Refill(i32),
}

impl Step {
    pub fn action(self) -> Option<ActionId> {
        match self {
            Step::Action(a) => Some(a),
            Step::Refill(_) => None,
        }
    }
}

/// Runs the plain automaton.
pub fn engine(tables: &Tables, start_state: i32, buf: &mut ScanBuffer) -> Result<Step, LexError> {
    run(tables, &NoCapture, start_state, buf)
}

/// Runs the automaton with position memory; the tables must carry capture programs.
pub fn new_engine(
    tables: &Tables,
    start_state: i32,
    buf: &mut ScanBuffer,
) -> Result<Step, LexError> {
    let code = tables.captures().ok_or(LexError::MissingCaptureTables)?;
    run(tables, &MemoryCapture::new(code), start_state, buf)
}

/// Shared loop behind [`engine`] and [`new_engine`].
///
/// `start_state >= 0` starts a new attempt at `buf.curr_pos`; a negative value
/// is a code previously returned in [`Step::Refill`].
pub fn run<C: CaptureStrategy>(
    tables: &Tables,
    captures: &C,
    start_state: i32,
    buf: &mut ScanBuffer,
) -> Result<Step, LexError> {
    let fresh = start_state >= 0;
    let decoded = if fresh { start_state } else { -(start_state + 1) };
    let mut state = usize::try_from(decoded)
        .ok()
        .filter(|&s| s < tables.n_states())
        .ok_or(LexError::InvalidState(start_state))?;

    if fresh {
        buf.start_pos = buf.curr_pos;
        buf.last_pos = buf.curr_pos;
        buf.last_action = None;
    }
    let need = captures.required_cells();
    if buf.mem.len() < need {
        buf.mem.resize(need, None);
    }

    loop {
        let base = tables.base(state);
        if base < 0 {
            captures.on_accept_or_backtrack(TagPoint::Accept, state, &mut buf.mem);
            return Ok(Step::Action((-(base as i32) - 1) as ActionId));
        }

        let backtrk = tables.backtrk(state);
        if backtrk >= 0 {
            captures.on_accept_or_backtrack(TagPoint::Backtrack, state, &mut buf.mem);
            buf.last_pos = buf.curr_pos;
            buf.last_action = Some(backtrk as ActionId);
        }

        let c = if buf.curr_pos >= buf.len.min(buf.buffer.len()) {
            if !buf.eof_reached {
                return Ok(Step::Refill(-(state as i32) - 1));
            }
            EOF_CHAR
        } else {
            let b = buf.buffer[buf.curr_pos];
            buf.curr_pos += 1;
            b as usize
        };

        let next = tables.next_state(state, base, c);
        if next < 0 {
            buf.curr_pos = buf.last_pos;
            return buf
                .last_action
                .map(Step::Action)
                .ok_or(LexError::EmptyToken { at: buf.curr_pos });
        }

        captures.on_transition(state, c, buf.curr_pos, &mut buf.mem);
        // EOF was consumed by a real transition: a later resume must probe
        // for fresh input again.
        if c == EOF_CHAR {
            buf.eof_reached = false;
        }
        state = next as usize;
    }
}
