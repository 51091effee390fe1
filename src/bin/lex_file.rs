// src/bin/lex_file.rs
// Lex a file in fixed-size chunks through the refill protocol.
//   LEX_TABLES=<path>   tables to load (.json or binary); demo grammar otherwise
//   LEX_CHUNK=<bytes>   refill size (default 4096)

use std::{
    env,
    fs::File,
    io::Read,
    path::Path,
    time::Instant,
};

use anyhow::{Context, Result, anyhow};
use lexauto::lexer::{
    ScanBuffer, Scanner,
    tables::{TokenKind, dfa::demo_tables, load_tables_file},
};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: lex_file <path>"))?;
    let chunk: usize = env::var("LEX_CHUNK")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4096);

    let tables = match env::var("LEX_TABLES") {
        Ok(p) => load_tables_file(Path::new(&p)).with_context(|| format!("load tables {p}"))?,
        Err(_) => demo_tables()?,
    };
    let demo = env::var("LEX_TABLES").is_err();

    let mut file = File::open(&path).with_context(|| format!("open {path}"))?;
    let mut io_err = None;
    let mut refill = |buf: &mut ScanBuffer| {
        let mut piece = vec![0u8; chunk.max(1)];
        match file.read(&mut piece) {
            Ok(0) => false,
            Ok(n) => {
                buf.refill(&piece[..n]);
                true
            }
            Err(e) => {
                io_err = Some(e);
                false
            }
        }
    };

    let t0 = Instant::now();
    let scanner = Scanner::new(&tables);
    let mut buf = ScanBuffer::new().with_name(path.as_str());
    let mut count = 0usize;
    while let Some(tok) = scanner
        .next_token(&mut buf, &mut refill)
        .with_context(|| format!("{path}:{}", buf.curr_p.cnum))?
    {
        count += 1;
        let text = String::from_utf8_lossy(&buf.buffer[tok.start..tok.start + tok.len]);
        match TokenKind::try_from(tok.action) {
            Ok(k) if demo => println!("{:>8} {:?} {:?}", tok.start, k, text),
            _ => println!("{:>8} #{} {:?}", tok.start, tok.action, text),
        }
        if tok.len == 0 {
            break;
        }
    }
    if let Some(e) = io_err {
        return Err(e).with_context(|| format!("read {path}"));
    }

    eprintln!(
        "[lex_file] {} tokens in {} ms",
        count,
        t0.elapsed().as_millis()
    );
    Ok(())
}
