//! Event dispatch: user bindings first, built-in handlers second.
//!
//! Dispatch never holds the editor borrow across a script call; state is
//! read or mutated in a scoped borrow, then hooks fire on the dropped
//! borrow. The `Ctrl-W` chord arms a one-shot window-command state consumed
//! by the next key.

use core_input::{
    InputEvent, Key, KeyInput, Modifiers, MOUSE_LEFT, MOUSE_SCROLL_DOWN, MOUSE_SCROLL_UP,
    MouseInput, MouseKind,
};
use core_model::{LeafContent, Orientation, WindowId};
use core_render::plan::gutter_width;
use core_script::{ScriptHost, SharedEditor};
use tracing::{debug, trace};

const SCROLL_STEP: usize = 3;

#[derive(Debug, Default)]
pub struct DispatchState {
    /// Armed by `Ctrl-W`; the next key is a window command.
    pub window_pending: bool,
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn dispatch(
    shared: &SharedEditor,
    host: &ScriptHost,
    ds: &mut DispatchState,
    event: InputEvent,
    term: (u16, u16),
) {
    match event {
        InputEvent::Key(key) => dispatch_key(shared, host, ds, key, term),
        InputEvent::Mouse(mouse) => dispatch_mouse(shared, host, mouse),
        InputEvent::Resize(w, h) => {
            trace!(target: "runtime", w, h, "terminal_resized");
            // on_resize hooks receive the new dimensions.
            host.fire_window_event("on_resize", u64::from(w), u64::from(h));
        }
    }
}

pub fn dispatch_key(
    shared: &SharedEditor,
    host: &ScriptHost,
    ds: &mut DispatchState,
    key: KeyInput,
    term: (u16, u16),
) {
    if ds.window_pending {
        ds.window_pending = false;
        window_command(shared, host, key);
        return;
    }

    // A focused custom leaf gets first refusal on every key.
    let custom = {
        let ed = shared.borrow();
        ed.active_leaf().and_then(|l| match &l.content {
            LeafContent::Custom { renderer, data } => Some((renderer.clone(), *data)),
            LeafContent::Buffer(_) => None,
        })
    };
    if let Some((renderer, data)) = custom {
        if host.custom_on_key(&renderer, data, key) {
            return;
        }
    }

    // User bindings preempt the built-in handlers.
    let action = {
        let ed = shared.borrow();
        ed.keymap.lookup(&key).map(str::to_string)
    };
    if let Some(action) = action {
        debug!(target: "runtime.dispatch", action = %action, "user_binding");
        host.call_action(&action);
        return;
    }

    builtin_key(shared, ds, key, term);
}

fn builtin_key(shared: &SharedEditor, ds: &mut DispatchState, key: KeyInput, term: (u16, u16)) {
    let mut ed = shared.borrow_mut();

    if key.mods.contains(Modifiers::CTRL) {
        match key.key {
            Key::Char(b'q') => ed.quit(),
            Key::Char(b's') => {
                let result = ed.active_buffer_mut().map(|b| b.save());
                match result {
                    Some(Ok(bytes)) => ed.set_status(format!("{bytes} bytes written")),
                    Some(Err(e)) => ed.set_status(format!("save failed: {e}")),
                    None => {}
                }
            }
            Key::Char(b'z') => {
                let undone = ed.active_buffer_mut().map(|b| b.undo());
                if undone == Some(false) {
                    ed.set_status("nothing to undo");
                }
            }
            Key::Char(b'r') => {
                let redone = ed.active_buffer_mut().map(|b| b.redo());
                if redone == Some(false) {
                    ed.set_status("nothing to redo");
                }
            }
            Key::Char(b'c') => {
                let copied = ed.copy_selection();
                if copied > 0 {
                    ed.set_status(format!("{copied} bytes copied"));
                }
            }
            Key::Char(b'x') => {
                let cut = ed.cut_selection();
                if cut > 0 {
                    ed.set_status(format!("{cut} bytes cut"));
                }
            }
            Key::Char(b'v') => {
                ed.paste_clipboard();
            }
            Key::Char(b'w') => ds.window_pending = true,
            _ => {}
        }
        return;
    }

    let use_spaces = ed.options.use_spaces;
    let tab_width = ed.options.tab_width;
    let page = term.1.saturating_sub(2) as usize;
    let Some(buf) = ed.active_buffer_mut() else {
        return;
    };

    match key.key {
        Key::Left => buf.move_left(),
        Key::Right => buf.move_right(),
        Key::Up => buf.move_up(),
        Key::Down => buf.move_down(),
        Key::Home => buf.move_home(),
        Key::End => buf.move_end(),
        Key::PageUp => buf.page_up(page),
        Key::PageDown => buf.page_down(page),
        Key::Enter => buf.insert_newline(),
        Key::Backspace => buf.delete_byte_before_cursor(),
        Key::Delete => buf.delete_forward(),
        Key::Tab => {
            if use_spaces {
                for _ in 0..tab_width {
                    buf.insert_byte(b' ');
                }
            } else {
                buf.insert_byte(b'\t');
            }
        }
        Key::Esc => buf.clear_selection(),
        Key::Char(b) if !key.mods.contains(Modifiers::ALT) => buf.insert_byte(b),
        _ => {}
    }
}

fn window_command(shared: &SharedEditor, host: &ScriptHost, key: KeyInput) {
    enum Outcome {
        Created(WindowId, WindowId),
        Closed(core_model::Leaf, WindowId),
        Released(Vec<core_model::Leaf>, WindowId),
        Focused(WindowId, WindowId),
        Nothing,
    }

    let outcome = {
        let mut ed = shared.borrow_mut();
        let prev = ed.tabs.active_leaf_id();
        match key.key {
            Key::Char(b's') => ed
                .split_active(Orientation::Horizontal)
                .map(|id| Outcome::Created(id, prev))
                .unwrap_or(Outcome::Nothing),
            Key::Char(b'v') => ed
                .split_active(Orientation::Vertical)
                .map(|id| Outcome::Created(id, prev))
                .unwrap_or(Outcome::Nothing),
            Key::Char(b'c') => match ed.close_active_leaf() {
                Some(leaf) => {
                    let now = ed.tabs.active_leaf_id();
                    Outcome::Closed(leaf, now)
                }
                None => {
                    ed.set_status("cannot close the last window");
                    Outcome::Nothing
                }
            },
            Key::Char(b'o') => {
                let released = ed.only_active_leaf();
                let kept = ed.tabs.active_leaf_id();
                Outcome::Released(released, kept)
            }
            Key::Char(b'n') | Key::Right | Key::Down => ed
                .focus_next()
                .map(|id| Outcome::Focused(id, prev))
                .unwrap_or(Outcome::Nothing),
            Key::Char(b'p') | Key::Left | Key::Up => ed
                .focus_prev()
                .map(|id| Outcome::Focused(id, prev))
                .unwrap_or(Outcome::Nothing),
            Key::Char(b'=') => {
                ed.tabs.active_tab_mut().tree.equalize();
                Outcome::Nothing
            }
            Key::Char(b'x') => {
                let id = ed.tabs.active_leaf_id();
                let tree = &mut ed.tabs.active_tab_mut().tree;
                match tree.next_leaf(id).filter(|&n| n != id) {
                    Some(other) if tree.swap(id, other) => {
                        ed.tabs.set_active_leaf(other);
                        Outcome::Focused(other, id)
                    }
                    _ => Outcome::Nothing,
                }
            }
            Key::Char(b't') => {
                let buffer = ed.new_empty_buffer();
                let name = format!("tab {}", ed.tabs.tab_count() + 1);
                let id = ed.tabs.add_tab(name, LeafContent::Buffer(buffer));
                Outcome::Created(id, prev)
            }
            Key::Tab => {
                ed.tabs.next_tab();
                Outcome::Nothing
            }
            _ => Outcome::Nothing,
        }
    };

    match outcome {
        Outcome::Created(id, prev) => host.fire_window_event("on_create", id, prev),
        Outcome::Closed(leaf, now) => {
            host.release_leaf(&leaf);
            host.fire_window_event("on_close", leaf.id, now);
        }
        Outcome::Released(leaves, kept) => {
            for leaf in &leaves {
                host.release_leaf(leaf);
                host.fire_window_event("on_close", leaf.id, kept);
            }
        }
        Outcome::Focused(id, prev) => host.fire_window_event("on_focus", id, prev),
        Outcome::Nothing => {}
    }
}

fn dispatch_mouse(shared: &SharedEditor, host: &ScriptHost, mouse: MouseInput) {
    match (mouse.button, mouse.kind) {
        (MOUSE_LEFT, MouseKind::Press) => {
            let focus_change = {
                let mut ed = shared.borrow_mut();
                place_cursor(&mut ed, mouse.x, mouse.y, true)
            };
            if let Some((id, prev)) = focus_change {
                host.fire_window_event("on_focus", id, prev);
            }
        }
        (MOUSE_LEFT, MouseKind::Drag) => {
            let mut ed = shared.borrow_mut();
            place_cursor(&mut ed, mouse.x, mouse.y, false);
        }
        (MOUSE_SCROLL_UP, MouseKind::Press) => scroll_leaf_under(shared, mouse, |off| {
            off.saturating_sub(SCROLL_STEP)
        }),
        (MOUSE_SCROLL_DOWN, MouseKind::Press) => {
            scroll_leaf_under(shared, mouse, |off| off + SCROLL_STEP)
        }
        _ => {}
    }
}

/// Move the cursor to the clicked cell. On a press the selection re-anchors
/// there; on a drag the existing anchor extends. Returns the focus change
/// when the click landed in a different leaf.
fn place_cursor(
    ed: &mut core_state::EditorState,
    x: u16,
    y: u16,
    anchor: bool,
) -> Option<(WindowId, WindowId)> {
    let prev = ed.tabs.active_leaf_id();
    let show_numbers = ed.options.show_line_numbers;

    let target = ed
        .tabs
        .active_tab()
        .tree
        .leaf_at(x, y)
        .map(|l| (l.id, l.rect, l.row_offset, l.col_offset, l.content.clone()))?;
    let (id, rect, row_offset, col_offset, content) = target;
    let focus_change = (id != prev).then(|| {
        ed.tabs.set_active_leaf(id);
        (id, prev)
    });

    if let LeafContent::Buffer(idx) = content {
        if let Some(buf) = ed.buffers.get_mut(idx) {
            let (gutter, _) = gutter_width(buf, show_numbers);
            let file_row = (y - rect.y) as usize + row_offset;
            let col = (x.saturating_sub(rect.x + gutter)) as usize + col_offset;
            if file_row < buf.row_count() {
                let line_len = buf.row(file_row).map_or(0, |r| r.len());
                buf.cy = file_row;
                buf.cx = col.min(line_len);
                if anchor {
                    buf.start_selection();
                }
            }
        }
    }
    focus_change
}

fn scroll_leaf_under(shared: &SharedEditor, mouse: MouseInput, adjust: impl Fn(usize) -> usize) {
    let mut ed = shared.borrow_mut();
    let id = ed
        .tabs
        .active_tab()
        .tree
        .leaf_at(mouse.x, mouse.y)
        .map(|l| l.id)
        .unwrap_or_else(|| ed.tabs.active_leaf_id());
    if let Some(leaf) = ed.tabs.active_tab_mut().tree.find_mut(id) {
        leaf.row_offset = adjust(leaf.row_offset);
    }
}
