// src/lexer/tables/build.rs
//! Packs a dense, hand-described DFA into the double-array table format.
//!
//! Every state row has [`N_SYMBOLS`] columns. The most frequent target of a
//! row becomes its `default`; only the columns that differ go into
//! `trans`/`check`, placed first-fit. Record programs are packed the same way
//! into the code tables, and all programs are interned into one `code` blob
//! whose offset 0 holds the empty program.

use hashbrown::HashMap;

use super::{
    ActionId, CaptureParts, MAX_STATES, N_SYMBOLS, TableParts, Tables,
};
use crate::lexer::{
    capture::{Program, SPECIAL},
    error::TableError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Move {
    target: usize,
    record: Program,
}

#[derive(Debug, Clone)]
struct StateSpec {
    accept: Option<(ActionId, Program)>,
    backtrack: Option<(ActionId, Program)>,
    moves: Vec<Option<Move>>,
}

impl Default for StateSpec {
    fn default() -> Self {
        Self {
            accept: None,
            backtrack: None,
            moves: vec![None; N_SYMBOLS],
        }
    }
}

/// Dense DFA under construction. State and column arguments index directly;
/// out-of-range values panic like slice indexing does.
#[derive(Debug, Clone, Default)]
pub struct DfaBuilder {
    states: Vec<StateSpec>,
}

impl DfaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self) -> usize {
        self.states.push(StateSpec::default());
        self.states.len() - 1
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Makes `state` a final state: the engine returns `action` on entering
    /// it without reading further. Its transitions are ignored.
    pub fn accept(&mut self, state: usize, action: ActionId) -> &mut Self {
        self.accept_with(state, action, Program::default())
    }

    pub fn accept_with(&mut self, state: usize, action: ActionId, tag: Program) -> &mut Self {
        self.states[state].accept = Some((action, tag));
        self
    }

    /// Makes `state` a backtrack point for `action`.
    pub fn backtrack(&mut self, state: usize, action: ActionId) -> &mut Self {
        self.backtrack_with(state, action, Program::default())
    }

    pub fn backtrack_with(&mut self, state: usize, action: ActionId, tag: Program) -> &mut Self {
        self.states[state].backtrack = Some((action, tag));
        self
    }

    /// Transition on column `c` (a byte, or [`super::EOF_CHAR`]).
    pub fn edge(&mut self, from: usize, c: usize, to: usize) -> &mut Self {
        self.edge_with(from, c, to, Program::default())
    }

    pub fn edge_with(&mut self, from: usize, c: usize, to: usize, record: Program) -> &mut Self {
        self.states[from].moves[c] = Some(Move { target: to, record });
        self
    }

    pub fn edges(
        &mut self,
        from: usize,
        bytes: impl IntoIterator<Item = u8>,
        to: usize,
    ) -> &mut Self {
        for b in bytes {
            self.edge(from, b as usize, to);
        }
        self
    }

    pub fn edges_with(
        &mut self,
        from: usize,
        bytes: impl IntoIterator<Item = u8>,
        to: usize,
        record: &Program,
    ) -> &mut Self {
        for b in bytes {
            self.edge_with(from, b as usize, to, record.clone());
        }
        self
    }

    pub fn build(&self) -> Result<Tables, TableError> {
        let n = self.states.len();
        if n > MAX_STATES {
            return Err(TableError::TooManyStates { n_states: n });
        }

        let mut parts = TableParts {
            base: vec![0; n],
            backtrk: vec![-1; n],
            default: vec![-1; n],
            ..TableParts::default()
        };
        let mut code = CodeInterner::new();
        let mut base_code = vec![0i16; n];
        let mut backtrk_code = vec![0i16; n];
        let mut default_code = vec![0i16; n];

        let mut state_rows = Vec::new();
        let mut code_rows = Vec::new();

        for (s, spec) in self.states.iter().enumerate() {
            if let Some((action, tag)) = &spec.backtrack {
                parts.backtrk[s] = action_entry("backtrk", *action)?;
                backtrk_code[s] = code.intern(tag)?;
            }
            if let Some((action, tag)) = &spec.accept {
                if spec.moves.iter().any(Option::is_some) {
                    log::warn!("state {s} is final; its transitions are never taken");
                }
                parts.base[s] = -action_entry("base", *action)? - 1;
                base_code[s] = code.intern(tag)?;
                continue;
            }

            let mut targets = Vec::with_capacity(N_SYMBOLS);
            let mut pcs = Vec::with_capacity(N_SYMBOLS);
            for m in &spec.moves {
                match m {
                    Some(m) => {
                        let t = i16::try_from(m.target)
                            .map_err(|_| TableError::Overflow { field: "trans" })?;
                        targets.push(t);
                        pcs.push(Some(code.intern(&m.record)?));
                    }
                    None => {
                        targets.push(-1);
                        pcs.push(None);
                    }
                }
            }

            let dflt = most_common(targets.iter().copied()).unwrap_or(-1);
            parts.default[s] = dflt;
            state_rows.push((s, exceptions(targets.into_iter().map(Some), dflt)));

            // Columns without a move never run a program; leave them to the default.
            let dcode = most_common(pcs.iter().flatten().copied()).unwrap_or(0);
            default_code[s] = dcode;
            code_rows.push((s, exceptions(pcs.into_iter(), dcode)));
        }

        let (bases, trans, check) = pack(&state_rows)?;
        for (s, b) in bases {
            parts.base[s] = b;
        }
        parts.trans = trans;
        parts.check = check;

        let captures = if code.is_empty() {
            None
        } else {
            let (bases, trans_code, check_code) = pack(&code_rows)?;
            for (s, b) in bases {
                base_code[s] = b;
            }
            Some(CaptureParts {
                base_code,
                backtrk_code,
                default_code,
                trans_code,
                check_code,
                code: code.into_bytes(),
            })
        };

        Tables::new(parts, captures)
    }
}

fn action_entry(field: &'static str, action: ActionId) -> Result<i16, TableError> {
    i16::try_from(action).map_err(|_| TableError::Overflow { field })
}

/// Most frequent value; ties go to the smallest value so output is stable.
fn most_common(values: impl Iterator<Item = i16>) -> Option<i16> {
    let mut counts: HashMap<i16, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then(vb.cmp(va)))
        .map(|(v, _)| v)
}

/// Columns whose value differs from `dflt`. `None` columns are don't-cares.
fn exceptions(row: impl Iterator<Item = Option<i16>>, dflt: i16) -> Vec<(usize, i16)> {
    row.enumerate()
        .filter_map(|(c, v)| v.filter(|&v| v != dflt).map(|v| (c, v)))
        .collect()
}

type Packed = (Vec<(usize, i16)>, Vec<i16>, Vec<i16>);

/// First-fit double-array packing. A slot is free while its `check` is -1.
fn pack(rows: &[(usize, Vec<(usize, i16)>)]) -> Result<Packed, TableError> {
    let mut trans = vec![-1i16; N_SYMBOLS];
    let mut check = vec![-1i16; N_SYMBOLS];
    let mut bases = Vec::with_capacity(rows.len());

    for (s, row) in rows {
        let mut b = 0usize;
        while !row
            .iter()
            .all(|&(c, _)| check.get(b + c).is_none_or(|&owner| owner < 0))
        {
            b += 1;
        }
        if b + N_SYMBOLS > check.len() {
            check.resize(b + N_SYMBOLS, -1);
            trans.resize(b + N_SYMBOLS, -1);
        }
        for &(c, v) in row {
            check[b + c] = *s as i16;
            trans[b + c] = v;
        }
        let b = i16::try_from(b).map_err(|_| TableError::Overflow { field: "base" })?;
        bases.push((*s, b));
    }
    Ok((bases, trans, check))
}

struct CodeInterner {
    code: Vec<u8>,
    offsets: HashMap<Program, i16>,
}

impl CodeInterner {
    fn new() -> Self {
        Self {
            code: vec![SPECIAL],
            offsets: HashMap::new(),
        }
    }

    fn intern(&mut self, p: &Program) -> Result<i16, TableError> {
        if p.is_empty() {
            return Ok(0);
        }
        if let Some(&pc) = self.offsets.get(p) {
            return Ok(pc);
        }
        let pc = i16::try_from(self.code.len()).map_err(|_| TableError::Overflow { field: "code" })?;
        p.encode(&mut self.code);
        self.offsets.insert(p.clone(), pc);
        Ok(pc)
    }

    fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.code
    }
}
