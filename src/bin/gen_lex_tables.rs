// src/bin/gen_lex_tables.rs
// Build the demo grammar tables once and write them in both formats.
// Usage:
//   cargo run --bin gen_lex_tables                        # tables/lexer_tables.{bin,json}
//   cargo run --bin gen_lex_tables -- out.bin out.json

use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use lexauto::lexer::tables::{dfa::demo_tables, save_tables_bin, save_tables_json};

fn main() -> Result<()> {
    let bin_out = env::args()
        .nth(1)
        .unwrap_or_else(|| "tables/lexer_tables.bin".to_string());
    let json_out = env::args()
        .nth(2)
        .unwrap_or_else(|| "tables/lexer_tables.json".to_string());

    println!("[gen_tables] building demo grammar tables...");
    let t = demo_tables().context("demo grammar failed to pack")?;

    let p = t.parts();
    let code_bytes = t.captures().map_or(0, |c| c.parts().code.len());
    println!(
        "[gen_tables] states = {}, transition slots = {}, code = {} bytes, cells = {}",
        t.n_states(),
        p.trans.len(),
        code_bytes,
        t.captures().map_or(0, |c| c.mem_size())
    );

    for out in [&bin_out, &json_out] {
        if let Some(dir) = Path::new(out).parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
    }

    save_tables_bin(Path::new(&bin_out), &t).with_context(|| format!("write {bin_out}"))?;
    let size = fs::metadata(&bin_out)?.len();
    println!(
        "[gen_tables] wrote {} bytes (~{:.1} KiB) → {}",
        size,
        size as f64 / 1024.0,
        bin_out
    );

    save_tables_json(Path::new(&json_out), &t).with_context(|| format!("write {json_out}"))?;
    println!("[gen_tables] wrote {json_out}");
    Ok(())
}
