// src/main.rs
use lexauto::lexer::{
    lex_in_chunks,
    tables::{
        dfa::demo_tables,
        tokens::{FRACTION_CELL, TokenKind},
    },
};

fn main() -> anyhow::Result<()> {
    // A tiny sample covering identifiers, numbers, comments, and symbols.
    let src = r#"
        foo = 12 + bar*(7.25) // hello
        baz==3.x-qux
    "#;

    let tables = demo_tables()?;
    // Small chunks so every token crosses a few refills.
    let tokens = lex_in_chunks(&tables, src.as_bytes(), 5)?;

    println!("TOKENS:");
    for t in tokens {
        let kind = TokenKind::try_from(t.action)
            .map_err(|a| anyhow::anyhow!("action {a} is not a demo token"))?;
        if kind.is_trivia() {
            continue;
        }
        let lexeme = &src.as_bytes()[t.start..t.start + t.len];
        match t.captures.get(FRACTION_CELL).copied().flatten() {
            Some(frac) => println!(
                "{:?}  {:?}  fraction={:?}",
                kind,
                String::from_utf8_lossy(lexeme),
                String::from_utf8_lossy(&src.as_bytes()[frac..t.start + t.len])
            ),
            None => println!("{:?}  {:?}", kind, String::from_utf8_lossy(lexeme)),
        }
    }
    Ok(())
}
