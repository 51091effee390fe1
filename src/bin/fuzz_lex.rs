// src/bin/fuzz_lex.rs
// Generate random-but-valid inputs and check that
//   - randomly chunked scanning matches contiguous scanning, and
//   - the plain engine makes the same decisions as the capture engine.
// Config via env:
//   FUZZ_LEN=<bytes>         size of each generated source (default 100_000)
//   FUZZ_ITERS=<n>           number of sources (default 3)
//   FUZZ_SEED=<u64>          rng seed (default 42)
//   FUZZ_MAX_CHUNK=<bytes>   largest refill piece (default 64)
//   FUZZ_INPUT=<path>        replay a saved source instead
//   FUZZ_SAVE=1, FUZZ_DIR=.. save generated sources

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, bail};
use lexauto::{
    dev::generator::gen_valid_source,
    lexer::{Scanner, Tables, Token, lex_on_cpu, tables::dfa::demo_tables},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    let tables = demo_tables()?;

    let max_chunk: usize = env_parse("FUZZ_MAX_CHUNK", 64);
    let seed: u64 = env_parse("FUZZ_SEED", 42);
    let mut rng = StdRng::seed_from_u64(seed);

    // --- REPLAY MODE ---
    if let Ok(p) = std::env::var("FUZZ_INPUT") {
        let src = fs::read(&p).with_context(|| format!("read {p}"))?;
        eprintln!("[replay] {} ({} bytes)", p, src.len());
        return run_once(&tables, &src, &mut rng, max_chunk);
    }

    // --- FUZZ MODE ---
    let save_cases = std::env::var("FUZZ_SAVE").ok().as_deref() == Some("1");
    let out_dir = std::env::var("FUZZ_DIR").unwrap_or_else(|_| "fuzz-cases".to_string());
    let len: usize = env_parse("FUZZ_LEN", 100_000);
    let iters: usize = env_parse("FUZZ_ITERS", 3);

    eprintln!("[fuzz] len={len} iters={iters} seed={seed} max_chunk={max_chunk}");
    if save_cases {
        fs::create_dir_all(&out_dir).with_context(|| format!("create {out_dir}"))?;
    }

    let mut sources = Vec::with_capacity(iters);
    for i in 0..iters {
        let s = gen_valid_source(&mut rng, len);
        eprintln!("[fuzz] iter {i}: generated {} bytes", s.len());
        if save_cases {
            let path = save_case(&out_dir, seed, i, &s)?;
            eprintln!("[save] wrote {}", path.display());
        }
        sources.push(s);
    }

    // Sessions are independent; the tables are shared read-only.
    sources
        .par_iter()
        .enumerate()
        .try_for_each(|(i, s)| {
            let mut rng = StdRng::seed_from_u64(seed ^ (i as u64).wrapping_mul(0x9E3779B97F4A7C15));
            run_once(&tables, s.as_bytes(), &mut rng, max_chunk)
                .with_context(|| format!("iter {i} (seed {seed})"))
        })?;
    eprintln!("[fuzz] all iterations matched ✅");
    Ok(())
}

fn run_once(tables: &Tables, src: &[u8], rng: &mut StdRng, max_chunk: usize) -> Result<()> {
    let t0 = Instant::now();
    let whole = lex_on_cpu(tables, src)?;
    let t1 = Instant::now();

    // Random split points, including empty pieces.
    let mut pieces = Vec::new();
    let mut at = 0;
    while at < src.len() {
        let n = rng.random_range(0..=max_chunk.max(1)).min(src.len() - at);
        pieces.push(&src[at..at + n]);
        at += n;
    }
    let chunked = Scanner::new(tables).lex_chunks(pieces.iter().copied())?;
    let t2 = Instant::now();

    let plain = Scanner::plain(tables).lex_chunks([src])?;
    let t3 = Instant::now();

    eprintln!(
        "[fuzz] whole {} ms | chunked ({} pieces) {} ms | plain {} ms | tokens = {}",
        (t1 - t0).as_millis(),
        pieces.len(),
        (t2 - t1).as_millis(),
        (t3 - t2).as_millis(),
        whole.len()
    );

    if let Some(i) = first_divergence(&whole, &chunked, true) {
        dump_near(src, &whole, &chunked, i);
        bail!("chunked scan diverges at token {i}");
    }
    if let Some(i) = first_divergence(&whole, &plain, false) {
        dump_near(src, &whole, &plain, i);
        bail!("plain engine diverges at token {i}");
    }
    Ok(())
}

fn first_divergence(a: &[Token], b: &[Token], with_captures: bool) -> Option<usize> {
    let n = a.len().min(b.len());
    for i in 0..n {
        let (x, y) = (&a[i], &b[i]);
        let same = x.action == y.action
            && x.start == y.start
            && x.len == y.len
            && (!with_captures || x.captures == y.captures);
        if !same {
            return Some(i);
        }
    }
    (a.len() != b.len()).then_some(n)
}

fn dump_near(src: &[u8], a: &[Token], b: &[Token], from: usize) {
    let lo = from.saturating_sub(2);
    let hi = (from + 3).min(a.len().max(b.len()));
    eprintln!("--- context tokens [{lo}..{hi}) ---");
    let show = |t: Option<&Token>| {
        t.map(|t| {
            (
                t.action,
                t.start,
                t.len,
                String::from_utf8_lossy(&src[t.start..t.start + t.len]).into_owned(),
                t.captures.clone(),
            )
        })
    };
    for i in lo..hi {
        let (x, y) = (show(a.get(i)), show(b.get(i)));
        let mark = if x == y { "✅" } else { "❌" };
        eprintln!("{mark} #{i:06} A={x:?}  B={y:?}");
    }
}

fn save_case(dir: &str, seed: u64, iter: usize, src: &str) -> Result<PathBuf> {
    let path = Path::new(dir).join(format!("case_s{seed}_i{iter}_n{}.txt", src.len()));
    fs::write(&path, src.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
