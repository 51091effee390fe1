// src/lexer/tables/io.rs
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{CaptureParts, TableParts, Tables};
use crate::lexer::error::TableError;

// -------------------- JSON (de)serialization --------------------

#[skip_serializing_none]
#[derive(Serialize, Deserialize)]
struct TablesDisk {
    #[serde(flatten)]
    parts: TableParts,
    captures: Option<CaptureParts>,
}

impl From<&Tables> for TablesDisk {
    fn from(t: &Tables) -> Self {
        Self {
            parts: t.parts().clone(),
            captures: t.captures().map(|c| c.parts().clone()),
        }
    }
}

pub fn save_tables_json(path: &Path, t: &Tables) -> Result<(), TableError> {
    // Stream to disk to avoid giant intermediate strings.
    let f = fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &TablesDisk::from(t))?;
    w.flush()?;
    Ok(())
}

pub fn load_tables_json_bytes(data: &[u8]) -> Result<Tables, TableError> {
    let disk: TablesDisk = serde_json::from_slice(data)?;
    Tables::new(disk.parts, disk.captures)
}

// -------------------- Compact binary (i16 little-endian) --------------------
//   magic: 8 bytes = "LXAUTO01"
//   u32: n_states, flags (bit 0: captures), trans_len, code_trans_len, code_len
//   i16: base, backtrk, default [n_states]; trans, check [trans_len]
//   if captures:
//   i16: base_code, backtrk_code, default_code [n_states];
//        trans_code, check_code [code_trans_len]
//   u8:  code [code_len]

const BIN_MAGIC: &[u8; 8] = b"LXAUTO01";
const FLAG_CAPTURES: u32 = 1;

fn write_i16s(w: &mut impl Write, v: &[i16]) -> std::io::Result<()> {
    let mut bytes = Vec::with_capacity(v.len() * 2);
    for x in v {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    w.write_all(&bytes)
}

fn len_u32(len: usize, field: &'static str) -> Result<u32, TableError> {
    u32::try_from(len).map_err(|_| TableError::Overflow { field })
}

pub fn write_tables_bin(w: &mut impl Write, t: &Tables) -> Result<(), TableError> {
    let p = t.parts();
    let c = t.captures().map(|c| c.parts());

    w.write_all(BIN_MAGIC)?;
    w.write_all(&len_u32(p.base.len(), "base")?.to_le_bytes())?;
    let flags = if c.is_some() { FLAG_CAPTURES } else { 0 };
    w.write_all(&flags.to_le_bytes())?;
    w.write_all(&len_u32(p.trans.len(), "trans")?.to_le_bytes())?;
    let (code_trans_len, code_len) = c.map_or((0, 0), |c| (c.trans_code.len(), c.code.len()));
    w.write_all(&len_u32(code_trans_len, "trans_code")?.to_le_bytes())?;
    w.write_all(&len_u32(code_len, "code")?.to_le_bytes())?;

    for field in [&p.base, &p.backtrk, &p.default, &p.trans, &p.check] {
        write_i16s(w, field)?;
    }
    if let Some(c) = c {
        for field in [
            &c.base_code,
            &c.backtrk_code,
            &c.default_code,
            &c.trans_code,
            &c.check_code,
        ] {
            write_i16s(w, field)?;
        }
        w.write_all(&c.code)?;
    }
    Ok(())
}

pub fn save_tables_bin(path: &Path, t: &Tables) -> Result<(), TableError> {
    let instant = Instant::now();
    let f = fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    write_tables_bin(&mut w, t)?;
    w.flush()?;
    log::debug!(
        "saved tables to {} in {} ms",
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

#[inline]
fn take<'a>(buf: &mut &'a [u8], n: usize, what: &'static str) -> Result<&'a [u8], TableError> {
    if buf.len() < n {
        return Err(TableError::Truncated { what });
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

#[inline]
fn take_u32(buf: &mut &[u8]) -> Result<u32, TableError> {
    let b = take(buf, 4, "u32 header field")?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn take_i16s(buf: &mut &[u8], n: usize, what: &'static str) -> Result<Vec<i16>, TableError> {
    let bytes = n
        .checked_mul(2)
        .ok_or(TableError::Overflow { field: what })?;
    super::decode_i16_le(what, take(buf, bytes, what)?)
}

pub fn load_tables_bin_bytes(mut data: &[u8]) -> Result<Tables, TableError> {
    let magic = take(&mut data, 8, "magic")?;
    if magic != BIN_MAGIC {
        return Err(TableError::BadMagic);
    }

    let n_states = take_u32(&mut data)? as usize;
    let flags = take_u32(&mut data)?;
    let trans_len = take_u32(&mut data)? as usize;
    let code_trans_len = take_u32(&mut data)? as usize;
    let code_len = take_u32(&mut data)? as usize;

    let parts = TableParts {
        base: take_i16s(&mut data, n_states, "base")?,
        backtrk: take_i16s(&mut data, n_states, "backtrk")?,
        default: take_i16s(&mut data, n_states, "default")?,
        trans: take_i16s(&mut data, trans_len, "trans")?,
        check: take_i16s(&mut data, trans_len, "check")?,
    };

    let captures = if flags & FLAG_CAPTURES != 0 {
        Some(CaptureParts {
            base_code: take_i16s(&mut data, n_states, "base_code")?,
            backtrk_code: take_i16s(&mut data, n_states, "backtrk_code")?,
            default_code: take_i16s(&mut data, n_states, "default_code")?,
            trans_code: take_i16s(&mut data, code_trans_len, "trans_code")?,
            check_code: take_i16s(&mut data, code_trans_len, "check_code")?,
            code: take(&mut data, code_len, "code")?.to_vec(),
        })
    } else {
        None
    };
    if !data.is_empty() {
        log::warn!("{} trailing bytes after tables ignored", data.len());
    }

    log::debug!("loaded binary tables: {n_states} states, flags={flags:#x}");
    Tables::new(parts, captures)
}

/// Loads tables from a `.json` file, or the binary format otherwise.
pub fn load_tables_file(path: &Path) -> Result<Tables, TableError> {
    log::debug!("loading tables from: {}", path.display());
    let data = fs::read(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        load_tables_json_bytes(&data)
    } else {
        load_tables_bin_bytes(&data)
    }
}
