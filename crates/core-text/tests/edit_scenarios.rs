//! End-to-end editing scenarios exercising buffer, undo, and paste together.

use core_text::Buffer;

fn rows(buf: &Buffer) -> Vec<Vec<u8>> {
    (0..buf.row_count())
        .map(|y| buf.row(y).unwrap().as_bytes().to_vec())
        .collect()
}

fn type_str(buf: &mut Buffer, s: &str) {
    for b in s.bytes() {
        buf.insert_byte(b);
    }
}

#[test]
fn typing_newline_typing_then_unwinding() {
    let mut buf = Buffer::new();
    type_str(&mut buf, "abc");
    buf.insert_newline();
    type_str(&mut buf, "def");

    assert_eq!(rows(&buf), vec![b"abc".to_vec(), b"def".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (3, 1));
    assert!(buf.is_modified());

    // One undo per typed byte, one for the whole line split.
    for _ in 0..3 {
        assert!(buf.undo());
    }
    assert_eq!(rows(&buf), vec![b"abc".to_vec(), b"".to_vec()]);
    assert!(buf.undo()); // the split undoes as one unit
    assert_eq!(rows(&buf), vec![b"abc".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (3, 0));

    assert!(buf.undo()); // 'c'
    assert!(buf.undo()); // 'b'
    assert_eq!(rows(&buf), vec![b"a".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (1, 0));
}

#[test]
fn k_undos_revert_last_k_units() {
    let seeded = || {
        let mut b = Buffer::new();
        b.append_row_pristine(b"");
        b
    };
    let mut buf = seeded();
    let mut checkpoints = Vec::new();
    for b in [b'w', b'x', b'y', b'z'] {
        checkpoints.push(rows(&buf));
        buf.insert_byte(b);
    }
    // Undo K of the N=4 units; state must equal the checkpoint before the
    // (N-K+1)-th push.
    for k in 1..=4usize {
        let mut probe = seeded();
        for b in [b'w', b'x', b'y', b'z'] {
            probe.insert_byte(b);
        }
        for _ in 0..k {
            assert!(probe.undo());
        }
        assert_eq!(rows(&probe), checkpoints[4 - k]);
    }
}

#[test]
fn undo_then_redo_is_identity() {
    let mut buf = Buffer::new();
    type_str(&mut buf, "fn main");
    buf.insert_newline();
    type_str(&mut buf, "end");
    let before = rows(&buf);
    let cursor = (buf.cx, buf.cy);

    assert!(buf.undo());
    assert!(buf.redo());
    assert_eq!(rows(&buf), before);
    assert_eq!((buf.cx, buf.cy), cursor);

    // And the other way round over a compound unit.
    for _ in 0..3 {
        buf.undo();
    }
    let mid = rows(&buf);
    assert!(buf.redo());
    assert!(buf.undo());
    assert_eq!(rows(&buf), mid);
}

#[test]
fn redo_branch_is_discarded_by_new_edit() {
    let mut buf = Buffer::new();
    type_str(&mut buf, "ab");
    buf.undo();
    buf.insert_byte(b'z');
    assert_eq!(rows(&buf), vec![b"az".to_vec()]);
    assert!(!buf.redo());
    assert_eq!(rows(&buf), vec![b"az".to_vec()]);
}

#[test]
fn undo_bound_discards_oldest_action() {
    let mut buf = Buffer::with_undo_limit(5);
    type_str(&mut buf, "abcdefgh");
    let mut undone = 0;
    while buf.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    // The first three inserts fell off the head and survive the rewind.
    assert_eq!(rows(&buf), vec![b"abc".to_vec()]);
}

#[test]
fn join_and_split_undo_as_units() {
    let mut buf = Buffer::from_text("one\ntwo");
    buf.set_cursor(0, 1);
    buf.delete_byte_before_cursor();
    assert_eq!(rows(&buf), vec![b"onetwo".to_vec()]);
    assert!(buf.undo());
    assert_eq!(rows(&buf), vec![b"one".to_vec(), b"two".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (0, 1));
    assert!(buf.redo());
    assert_eq!(rows(&buf), vec![b"onetwo".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (3, 0));
}

#[test]
fn paste_into_row_carries_tail() {
    let mut buf = Buffer::from_text("XY");
    buf.set_cursor(1, 0);
    buf.paste_text(b"foo\nbar");
    assert_eq!(rows(&buf), vec![b"Xfoo".to_vec(), b"barY".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (3, 1));
}

#[test]
fn paste_undoes_and_redoes_as_one_unit() {
    let mut buf = Buffer::from_text("XY");
    buf.set_cursor(1, 0);
    buf.paste_text(b"foo\nbar");
    assert!(buf.undo());
    assert_eq!(rows(&buf), vec![b"XY".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (1, 0));
    assert!(buf.redo());
    assert_eq!(rows(&buf), vec![b"Xfoo".to_vec(), b"barY".to_vec()]);
    assert_eq!((buf.cx, buf.cy), (3, 1));
}

#[test]
fn selection_delete_paste_round_trip() {
    let original = "alpha\nbeta\ngamma";
    let mut buf = Buffer::from_text(original);
    buf.set_cursor(2, 0);
    buf.start_selection();
    buf.set_cursor(3, 2);

    let text = buf.get_selected_text().expect("non-empty selection");
    buf.delete_selection();
    let start = (buf.cx, buf.cy);
    buf.set_cursor(start.0, start.1);
    buf.paste_text(&text);

    assert_eq!(
        rows(&buf),
        original
            .split('\n')
            .map(|l| l.as_bytes().to_vec())
            .collect::<Vec<_>>()
    );
}

#[test]
fn selection_delete_undoes_as_one_unit() {
    let mut buf = Buffer::from_text("alpha\nbeta\ngamma");
    buf.set_cursor(2, 0);
    buf.start_selection();
    buf.set_cursor(3, 2);
    buf.delete_selection();
    assert_eq!(rows(&buf), vec![b"alma".to_vec()]);
    assert!(buf.undo());
    assert_eq!(
        rows(&buf),
        vec![b"alpha".to_vec(), b"beta".to_vec(), b"gamma".to_vec()]
    );
}
