//! The highlight cache must be a pure accelerator: after any edit sequence,
//! cached lookups match tokenising every row from scratch in order.

use core_syntax::{HighlightedLine, SyntaxRegistry, highlight_line};
use core_text::Buffer;

fn fresh_tokenise(buf: &Buffer, registry: &SyntaxRegistry) -> Vec<HighlightedLine> {
    let syn = registry.get(buf.syntax().unwrap()).unwrap();
    let mut out = Vec::new();
    let mut carry = false;
    for y in 0..buf.row_count() {
        let hl = highlight_line(syn, buf.row(y).unwrap().as_bytes(), carry);
        carry = hl.ends_in_multiline;
        out.push(hl);
    }
    out
}

fn assert_cache_matches(buf: &mut Buffer, registry: &SyntaxRegistry) {
    let expected = fresh_tokenise(buf, registry);
    let syn = registry.get(buf.syntax().unwrap()).unwrap();
    // Query rows out of order to stress miss handling.
    let count = buf.row_count();
    for y in (0..count).rev() {
        let got = buf.highlight_row(syn, y).unwrap().clone();
        assert_eq!(got, expected[y], "row {y} diverged from fresh tokenisation");
    }
}

fn c_buffer(text: &str, registry: &SyntaxRegistry) -> Buffer {
    let mut buf = Buffer::from_text(text);
    buf.attach_syntax(registry.find_by_filename("t.c"));
    buf
}

#[test]
fn cache_matches_after_insert_opening_comment() {
    let registry = SyntaxRegistry::with_builtin();
    let mut buf = c_buffer("int a;\nint b;\nint c;", &registry);
    assert_cache_matches(&mut buf, &registry);

    // Typing "/*" on row 0 flips every following row into a comment.
    buf.set_cursor(6, 0);
    buf.insert_byte(b'/');
    buf.insert_byte(b'*');
    assert_cache_matches(&mut buf, &registry);
}

#[test]
fn cache_matches_after_deleting_comment_close() {
    let registry = SyntaxRegistry::with_builtin();
    let mut buf = c_buffer("/* c */ int a;\nint b;", &registry);
    assert_cache_matches(&mut buf, &registry);

    // Remove the '/' of the close marker; the comment now swallows row 1.
    buf.set_cursor(7, 0);
    buf.delete_byte_before_cursor();
    assert_cache_matches(&mut buf, &registry);
}

#[test]
fn cache_matches_after_newline_split_inside_comment() {
    let registry = SyntaxRegistry::with_builtin();
    let mut buf = c_buffer("/* one two */ int x;", &registry);
    buf.set_cursor(6, 0);
    buf.insert_newline();
    assert_cache_matches(&mut buf, &registry);
}

#[test]
fn cache_matches_after_paste_and_undo() {
    let registry = SyntaxRegistry::with_builtin();
    let mut buf = c_buffer("int a;\nint b;", &registry);
    buf.set_cursor(0, 0);
    buf.paste_text(b"/* open\n");
    assert_cache_matches(&mut buf, &registry);
    buf.undo();
    assert_cache_matches(&mut buf, &registry);
    buf.redo();
    assert_cache_matches(&mut buf, &registry);
}

#[test]
fn c_line_highlights_keyword_number_and_comment() {
    let registry = SyntaxRegistry::with_builtin();
    let mut buf = c_buffer("int x = 42;\n// hi", &registry);
    let syn = registry.get(buf.syntax().unwrap()).unwrap();

    let row0 = buf.highlight_row(syn, 0).unwrap().clone();
    use core_syntax::HighlightKind::*;
    assert_eq!(row0.segments[0].kind, Type); // `int`
    assert_eq!(row0.segments[0].start, 0);
    assert_eq!(row0.segments[0].end, 3);
    assert_eq!(row0.segments[1].kind, Number); // `42`
    assert!(row0.kind_at(10).is_none()); // `;` uncoloured

    let row1 = buf.highlight_row(syn, 1).unwrap().clone();
    assert_eq!(row1.segments.len(), 1);
    assert_eq!(row1.segments[0].kind, Comment);
    assert_eq!(row1.segments[0].start, 0);
    assert_eq!(row1.segments[0].end, 5);
}
