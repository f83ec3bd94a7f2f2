//! Bounded, linear undo history with redo-branch truncation.
//!
//! The history is a deque of actions plus a `current` cursor counting how
//! many of them are applied. Pushing while the cursor sits before the end
//! discards the redo branch. Group markers bracket compound edits (line
//! split, row join, selection delete, paste) so they undo and redo as one
//! unit. Applying inverses lives on `Buffer`; this module only owns the
//! structure.

use std::collections::VecDeque;
use tracing::trace;

/// Default bound on retained undo actions.
pub const DEFAULT_UNDO_LIMIT: usize = 1000;

/// One recorded edit, carrying the cursor position at the moment it was
/// applied. `x`/`y` are byte column and row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    InsertChar { x: usize, y: usize, byte: u8 },
    DeleteChar { x: usize, y: usize, byte: u8 },
    /// A row with `data` appeared at index `y`.
    InsertLine { x: usize, y: usize, data: Vec<u8> },
    /// The row at index `y` (content `data`) went away.
    DeleteLine { x: usize, y: usize, data: Vec<u8> },
    /// Opens a compound edit; carries the pre-edit cursor.
    GroupBegin { x: usize, y: usize },
    /// Closes a compound edit; carries the post-edit cursor.
    GroupEnd { x: usize, y: usize },
}

impl UndoAction {
    /// Row index the action touches, used to derive the minimum row whose
    /// highlight state an undo/redo can change.
    pub fn row(&self) -> usize {
        match self {
            UndoAction::InsertChar { y, .. }
            | UndoAction::DeleteChar { y, .. }
            | UndoAction::InsertLine { y, .. }
            | UndoAction::DeleteLine { y, .. }
            | UndoAction::GroupBegin { y, .. }
            | UndoAction::GroupEnd { y, .. } => *y,
        }
    }
}

#[derive(Debug)]
pub struct UndoHistory {
    actions: VecDeque<UndoAction>,
    /// Number of applied actions; `actions[current..]` is the redo branch.
    current: usize,
    limit: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            actions: VecDeque::new(),
            current: 0,
            limit: limit.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn applied(&self) -> usize {
        self.current
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.current = 0;
    }

    /// Append an action, discarding any redo branch and evicting from the
    /// head once the bound is exceeded.
    pub fn push(&mut self, action: UndoAction) {
        if self.current < self.actions.len() {
            self.actions.truncate(self.current);
            trace!(target: "text.undo", remaining = self.actions.len(), "redo_branch_discarded");
        }
        self.actions.push_back(action);
        self.current += 1;
        while self.actions.len() > self.limit {
            self.actions.pop_front();
            self.current = self.current.saturating_sub(1);
            trace!(target: "text.undo", "oldest_action_evicted");
        }
    }

    /// The action an undo would invert next, without consuming it.
    pub fn peek_undo(&self) -> Option<&UndoAction> {
        self.current.checked_sub(1).map(|i| &self.actions[i])
    }

    /// The action a redo would re-apply next, without consuming it.
    pub fn peek_redo(&self) -> Option<&UndoAction> {
        self.actions.get(self.current)
    }

    /// Step the cursor back over one action, returning a clone of it.
    pub fn retreat(&mut self) -> Option<UndoAction> {
        let idx = self.current.checked_sub(1)?;
        self.current = idx;
        Some(self.actions[idx].clone())
    }

    /// Step the cursor forward over one action, returning a clone of it.
    pub fn advance(&mut self) -> Option<UndoAction> {
        let action = self.actions.get(self.current)?.clone();
        self.current += 1;
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ic(x: usize, byte: u8) -> UndoAction {
        UndoAction::InsertChar { x, y: 0, byte }
    }

    #[test]
    fn push_advances_cursor() {
        let mut h = UndoHistory::new(10);
        h.push(ic(0, b'a'));
        h.push(ic(1, b'b'));
        assert_eq!(h.len(), 2);
        assert_eq!(h.applied(), 2);
        assert!(matches!(h.peek_undo(), Some(UndoAction::InsertChar { byte: b'b', .. })));
        assert!(h.peek_redo().is_none());
    }

    #[test]
    fn retreat_exposes_redo_branch() {
        let mut h = UndoHistory::new(10);
        h.push(ic(0, b'a'));
        h.push(ic(1, b'b'));
        assert!(h.retreat().is_some());
        assert!(matches!(h.peek_redo(), Some(UndoAction::InsertChar { byte: b'b', .. })));
        assert!(matches!(h.peek_undo(), Some(UndoAction::InsertChar { byte: b'a', .. })));
    }

    #[test]
    fn push_truncates_redo_branch() {
        let mut h = UndoHistory::new(10);
        h.push(ic(0, b'a'));
        h.push(ic(1, b'b'));
        h.retreat();
        h.push(ic(1, b'c'));
        assert_eq!(h.len(), 2);
        assert!(h.peek_redo().is_none());
        assert!(matches!(h.peek_undo(), Some(UndoAction::InsertChar { byte: b'c', .. })));
    }

    #[test]
    fn bound_evicts_oldest() {
        let mut h = UndoHistory::new(3);
        for (i, b) in [b'a', b'b', b'c', b'd'].into_iter().enumerate() {
            h.push(ic(i, b));
        }
        assert_eq!(h.len(), 3);
        // Rewind everything; the earliest surviving action is 'b'.
        let mut last = None;
        while let Some(a) = h.retreat() {
            last = Some(a);
        }
        assert!(matches!(last, Some(UndoAction::InsertChar { byte: b'b', .. })));
    }

    #[test]
    fn advance_replays_in_order() {
        let mut h = UndoHistory::new(10);
        h.push(ic(0, b'a'));
        h.push(ic(1, b'b'));
        h.retreat();
        h.retreat();
        assert!(matches!(h.advance(), Some(UndoAction::InsertChar { byte: b'a', .. })));
        assert!(matches!(h.advance(), Some(UndoAction::InsertChar { byte: b'b', .. })));
        assert!(h.advance().is_none());
    }
}
