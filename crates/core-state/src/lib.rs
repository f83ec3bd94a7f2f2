//! Editor-level state: the buffer list, tab/window layout, keymap,
//! clipboard, status message, and display options.
//!
//! Buffers are owned here and referenced from leaves by index. A buffer may
//! be shown in several leaves at once and always outlives its windows; the
//! buffer list is append-only for the session, so indices stay stable.

use core_config::Config;
use core_keymap::Keymap;
use core_model::{Leaf, LeafContent, Orientation, Tabs, WindowId};
use core_syntax::SyntaxRegistry;
use core_text::Buffer;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub show_line_numbers: bool,
    pub tab_width: usize,
    pub use_spaces: bool,
    pub undo_history: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            show_line_numbers: true,
            tab_width: 4,
            use_spaces: true,
            undo_history: core_text::DEFAULT_UNDO_LIMIT,
        }
    }
}

impl From<&Config> for EditorOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            show_line_numbers: cfg.file.display.line_numbers,
            tab_width: cfg.file.editing.tab_width.max(1),
            use_spaces: cfg.file.editing.use_spaces,
            undo_history: cfg.file.editing.undo_history.max(1),
        }
    }
}

pub struct EditorState {
    pub buffers: Vec<Buffer>,
    pub registry: SyntaxRegistry,
    pub tabs: Tabs,
    pub keymap: Keymap,
    pub clipboard: Vec<u8>,
    pub status: String,
    pub options: EditorOptions,
    pub running: bool,
}

impl EditorState {
    /// Fresh editor: one empty buffer shown in a single leaf of one tab.
    pub fn new(options: EditorOptions) -> Self {
        let mut first = Buffer::with_undo_limit(options.undo_history);
        first.append_row_pristine(b"");
        Self {
            buffers: vec![first],
            registry: SyntaxRegistry::with_builtin(),
            tabs: Tabs::new(LeafContent::Buffer(0)),
            keymap: Keymap::new(),
            clipboard: Vec::new(),
            status: String::new(),
            options,
            running: true,
        }
    }

    pub fn quit(&mut self) {
        info!(target: "runtime", "quit_requested");
        self.running = false;
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    pub fn add_buffer(&mut self, buffer: Buffer) -> usize {
        self.buffers.push(buffer);
        self.buffers.len() - 1
    }

    pub fn new_empty_buffer(&mut self) -> usize {
        let mut buf = Buffer::with_undo_limit(self.options.undo_history);
        buf.append_row_pristine(b"");
        self.add_buffer(buf)
    }

    pub fn buffer_path(&self, idx: usize) -> Option<String> {
        self.buffers
            .get(idx)?
            .filename()
            .map(|p| p.display().to_string())
    }

    // ------------------------------------------------------------------
    // Focus and layout
    // ------------------------------------------------------------------

    pub fn active_leaf(&self) -> Option<&Leaf> {
        let id = self.tabs.active_leaf_id();
        self.tabs.active_tab().tree.find(id)
    }

    pub fn active_leaf_mut(&mut self) -> Option<&mut Leaf> {
        let id = self.tabs.active_leaf_id();
        self.tabs.active_tab_mut().tree.find_mut(id)
    }

    pub fn active_buffer_index(&self) -> Option<usize> {
        self.active_leaf().and_then(Leaf::buffer_index)
    }

    pub fn active_buffer(&self) -> Option<&Buffer> {
        self.buffers.get(self.active_buffer_index()?)
    }

    pub fn active_buffer_mut(&mut self) -> Option<&mut Buffer> {
        let idx = self.active_buffer_index()?;
        self.buffers.get_mut(idx)
    }

    /// Split the focused leaf. The existing leaf keeps its content; the new
    /// one receives a fresh empty buffer and takes focus. Returns the new
    /// leaf id.
    pub fn split_active(&mut self, orientation: Orientation) -> Option<WindowId> {
        let target = self.tabs.active_leaf_id();
        let buffer = self.new_empty_buffer();
        let new_id = self.tabs.alloc_window_id();
        let created = self.tabs.active_tab_mut().tree.split(
            target,
            orientation,
            new_id,
            LeafContent::Buffer(buffer),
        )?;
        self.tabs.set_active_leaf(created);
        debug!(target: "model.tree", leaf = created, ?orientation, "split_active");
        Some(created)
    }

    /// Close the focused leaf, moving focus to its cyclic successor.
    /// Returns the closed leaf (for hook dispatch and custom-data release),
    /// or `None` when the close was refused.
    pub fn close_active_leaf(&mut self) -> Option<Leaf> {
        let id = self.tabs.active_leaf_id();
        self.close_leaf(id)
    }

    /// Close an arbitrary leaf of the active tab.
    pub fn close_leaf(&mut self, id: WindowId) -> Option<Leaf> {
        let tab = self.tabs.active_tab_mut();
        let closed = tab.tree.find(id).cloned()?;
        let fallback = tab.tree.next_leaf(id).filter(|&n| n != id);
        if !tab.tree.close(id) {
            return None;
        }
        let new_active = fallback
            .filter(|&n| tab.tree.contains(n))
            .or_else(|| tab.tree.leaves().first().map(|l| l.id));
        if let Some(n) = new_active {
            self.tabs.set_active_leaf(n);
        }
        Some(closed)
    }

    /// Collapse the active tab to the focused leaf; returns the leaves that
    /// were released.
    pub fn only_active_leaf(&mut self) -> Vec<Leaf> {
        let keep = self.tabs.active_leaf_id();
        let tab = self.tabs.active_tab_mut();
        let released: Vec<Leaf> = tab
            .tree
            .leaves()
            .into_iter()
            .filter(|l| l.id != keep)
            .cloned()
            .collect();
        if tab.tree.only(keep) {
            released
        } else {
            Vec::new()
        }
    }

    pub fn focus_next(&mut self) -> Option<WindowId> {
        let id = self.tabs.active_leaf_id();
        let next = self.tabs.active_tab().tree.next_leaf(id)?;
        self.tabs.set_active_leaf(next);
        Some(next)
    }

    pub fn focus_prev(&mut self) -> Option<WindowId> {
        let id = self.tabs.active_leaf_id();
        let prev = self.tabs.active_tab().tree.prev_leaf(id)?;
        self.tabs.set_active_leaf(prev);
        Some(prev)
    }

    pub fn focus_direction(&mut self, direction: &str) -> Option<WindowId> {
        let id = self.tabs.active_leaf_id();
        let target = self.tabs.active_tab().tree.focus_direction(id, direction)?;
        self.tabs.set_active_leaf(target);
        Some(target)
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Copy the active selection into the clipboard. Returns the copied
    /// byte count.
    pub fn copy_selection(&mut self) -> usize {
        let Some(text) = self.active_buffer().and_then(Buffer::get_selected_text) else {
            return 0;
        };
        let len = text.len();
        self.clipboard = text;
        len
    }

    /// Copy then delete the active selection.
    pub fn cut_selection(&mut self) -> usize {
        let len = self.copy_selection();
        if len > 0 {
            if let Some(buf) = self.active_buffer_mut() {
                buf.delete_selection();
            }
        }
        len
    }

    /// Insert the clipboard at the cursor of the active buffer.
    pub fn paste_clipboard(&mut self) -> usize {
        if self.clipboard.is_empty() {
            return 0;
        }
        let text = self.clipboard.clone();
        if let Some(buf) = self.active_buffer_mut() {
            buf.paste_text(&text);
            text.len()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_one_buffer_one_leaf() {
        let state = EditorState::new(EditorOptions::default());
        assert_eq!(state.buffers.len(), 1);
        assert_eq!(state.tabs.active_tab().tree.leaf_count(), 1);
        assert_eq!(state.active_buffer_index(), Some(0));
        assert!(!state.buffers[0].is_modified());
    }

    #[test]
    fn split_creates_fresh_buffer_and_focuses_it() {
        let mut state = EditorState::new(EditorOptions::default());
        let new_leaf = state.split_active(Orientation::Vertical).unwrap();
        assert_eq!(state.buffers.len(), 2);
        assert_eq!(state.tabs.active_leaf_id(), new_leaf);
        assert_eq!(state.active_buffer_index(), Some(1));
    }

    #[test]
    fn close_moves_focus_and_keeps_buffer() {
        let mut state = EditorState::new(EditorOptions::default());
        state.split_active(Orientation::Horizontal).unwrap();
        let closed = state.close_active_leaf().unwrap();
        assert_eq!(closed.buffer_index(), Some(1));
        assert_eq!(state.tabs.active_tab().tree.leaf_count(), 1);
        // The buffer survives its window.
        assert_eq!(state.buffers.len(), 2);
    }

    #[test]
    fn closing_the_last_leaf_is_refused() {
        let mut state = EditorState::new(EditorOptions::default());
        assert!(state.close_active_leaf().is_none());
        assert_eq!(state.tabs.active_tab().tree.leaf_count(), 1);
    }

    #[test]
    fn only_reports_released_leaves() {
        let mut state = EditorState::new(EditorOptions::default());
        state.split_active(Orientation::Vertical).unwrap();
        state.split_active(Orientation::Horizontal).unwrap();
        let released = state.only_active_leaf();
        assert_eq!(released.len(), 2);
        assert_eq!(state.tabs.active_tab().tree.leaf_count(), 1);
    }

    #[test]
    fn copy_cut_paste_round_trip() {
        let mut state = EditorState::new(EditorOptions::default());
        {
            let buf = state.active_buffer_mut().unwrap();
            buf.paste_text(b"hello world");
            buf.set_cursor(0, 0);
            buf.start_selection();
            buf.set_cursor(5, 0);
        }
        assert_eq!(state.copy_selection(), 5);
        assert_eq!(state.clipboard, b"hello");
        assert_eq!(state.cut_selection(), 5);
        assert_eq!(
            state.active_buffer().unwrap().row(0).unwrap().as_bytes(),
            b" world"
        );
        assert_eq!(state.paste_clipboard(), 5);
        assert_eq!(
            state.active_buffer().unwrap().row(0).unwrap().as_bytes(),
            b"hello world"
        );
    }

    #[test]
    fn focus_cycles_through_leaves() {
        let mut state = EditorState::new(EditorOptions::default());
        let first = state.tabs.active_leaf_id();
        let second = state.split_active(Orientation::Vertical).unwrap();
        state.focus_next();
        assert_eq!(state.tabs.active_leaf_id(), first);
        state.focus_prev();
        assert_eq!(state.tabs.active_leaf_id(), second);
        state.focus_direction("right");
        assert_eq!(state.tabs.active_leaf_id(), first);
    }
}
