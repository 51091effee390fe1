//! Negative lexer tests: inputs the automaton does not cover must fail with
//! `EmptyToken`, never produce a spurious action.

use lexauto::lexer::{
    LexError, START, ScanBuffer, Step, engine, lex_in_chunks, lex_on_cpu, new_engine,
    tables::{DfaBuilder, dfa::demo_tables},
};

#[test]
fn unknown_first_byte() {
    let t = demo_tables().unwrap();
    assert_eq!(lex_on_cpu(&t, b"$"), Err(LexError::EmptyToken { at: 0 }));
}

#[test]
fn unknown_byte_after_tokens() {
    let t = demo_tables().unwrap();
    assert_eq!(
        lex_on_cpu(&t, b"x = 1 # 2"),
        Err(LexError::EmptyToken { at: 6 })
    );
}

#[test]
fn unknown_byte_in_chunked_input() {
    let t = demo_tables().unwrap();
    for chunk in 1..4 {
        assert_eq!(
            lex_in_chunks(&t, b"ab{", chunk),
            Err(LexError::EmptyToken { at: 2 }),
            "chunk={chunk}"
        );
    }
}

#[test]
fn dead_end_without_backtrack_point() {
    // only `ab` is a token; `a` alone is not
    let mut b = DfaBuilder::new();
    let s0 = b.add_state();
    let s1 = b.add_state();
    let s2 = b.add_state();
    b.edge(s0, b'a' as usize, s1);
    b.edge(s1, b'b' as usize, s2);
    b.accept(s2, 0);
    let t = b.build().unwrap();

    for input in [&b"a"[..], b"ac", b"b"] {
        let mut buf = ScanBuffer::from_bytes(input);
        assert_eq!(
            engine(&t, START, &mut buf),
            Err(LexError::EmptyToken { at: 0 }),
            "input {input:?}"
        );
        // the cursor is back where the attempt started
        assert_eq!(buf.curr_pos, 0);
    }

    let mut buf = ScanBuffer::from_bytes(b"ab");
    assert_eq!(engine(&t, START, &mut buf), Ok(Step::Action(0)));
}

#[test]
fn empty_token_is_not_retried() {
    let t = demo_tables().unwrap();
    let mut buf = ScanBuffer::from_bytes(b"$$");
    for _ in 0..3 {
        assert_eq!(
            new_engine(&t, START, &mut buf),
            Err(LexError::EmptyToken { at: 0 })
        );
    }
}
