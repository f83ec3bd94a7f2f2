//! Tab groups: an ordered list of named window trees, one active at a time.
//!
//! The tab list also owns the window id counter so leaf ids stay unique
//! across every tree for the editor's lifetime.

use crate::tree::{Leaf, LeafContent, WindowId, WindowTree};
use tracing::debug;

#[derive(Debug)]
pub struct TabGroup {
    pub name: String,
    pub tree: WindowTree,
    /// Id of the focused leaf inside this tab's tree.
    pub active: WindowId,
}

#[derive(Debug)]
pub struct Tabs {
    groups: Vec<TabGroup>,
    active: usize,
    next_window_id: WindowId,
}

impl Tabs {
    /// One tab named `main` holding a single leaf with the given content.
    pub fn new(content: LeafContent) -> Self {
        let mut tabs = Self {
            groups: Vec::new(),
            active: 0,
            next_window_id: 1,
        };
        let id = tabs.alloc_window_id();
        tabs.groups.push(TabGroup {
            name: "main".to_string(),
            tree: WindowTree::new(Leaf::new(id, content)),
            active: id,
        });
        tabs
    }

    /// Monotonic; never reused within a session.
    pub fn alloc_window_id(&mut self) -> WindowId {
        let id = self.next_window_id;
        self.next_window_id += 1;
        id
    }

    pub fn tab_count(&self) -> usize {
        self.groups.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn groups(&self) -> &[TabGroup] {
        &self.groups
    }

    pub fn active_tab(&self) -> &TabGroup {
        &self.groups[self.active]
    }

    pub fn active_tab_mut(&mut self) -> &mut TabGroup {
        &mut self.groups[self.active]
    }

    pub fn active_leaf_id(&self) -> WindowId {
        self.active_tab().active
    }

    /// Focus a leaf of the active tab; ignored when the id is not in the
    /// tree.
    pub fn set_active_leaf(&mut self, id: WindowId) -> bool {
        if self.active_tab().tree.contains(id) {
            self.active_tab_mut().active = id;
            true
        } else {
            false
        }
    }

    /// Append a new tab and switch to it.
    pub fn add_tab(&mut self, name: impl Into<String>, content: LeafContent) -> WindowId {
        let id = self.alloc_window_id();
        let name = name.into();
        debug!(target: "model.tabs", name = %name, leaf = id, "tab_added");
        self.groups.push(TabGroup {
            name,
            tree: WindowTree::new(Leaf::new(id, content)),
            active: id,
        });
        self.active = self.groups.len() - 1;
        id
    }

    pub fn next_tab(&mut self) {
        self.active = (self.active + 1) % self.groups.len();
    }

    pub fn prev_tab(&mut self) {
        self.active = (self.active + self.groups.len() - 1) % self.groups.len();
    }

    /// Close the active tab; refused when it is the last one.
    pub fn close_active_tab(&mut self) -> bool {
        if self.groups.len() <= 1 {
            return false;
        }
        self.groups.remove(self.active);
        if self.active >= self.groups.len() {
            self.active = self.groups.len() - 1;
        }
        true
    }

    /// Restore state wholesale (session load). The caller guarantees at
    /// least one group.
    pub fn replace_all(&mut self, groups: Vec<TabGroup>, active: usize) {
        debug_assert!(!groups.is_empty(), "tab list must stay non-empty");
        self.active = active.min(groups.len().saturating_sub(1));
        self.groups = groups;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_tab_holds_one_leaf() {
        let tabs = Tabs::new(LeafContent::Buffer(0));
        assert_eq!(tabs.tab_count(), 1);
        assert_eq!(tabs.active_tab().tree.leaf_count(), 1);
        assert_eq!(tabs.active_leaf_id(), 1);
    }

    #[test]
    fn window_ids_unique_across_tabs() {
        let mut tabs = Tabs::new(LeafContent::Buffer(0));
        let mut seen = vec![tabs.active_leaf_id()];
        seen.push(tabs.add_tab("two", LeafContent::Buffer(1)));
        let extra = tabs.alloc_window_id();
        tabs.active_tab_mut().tree.split(
            seen[1],
            crate::tree::Orientation::Vertical,
            extra,
            LeafContent::Buffer(2),
        );
        seen.push(extra);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn tab_cycling_wraps() {
        let mut tabs = Tabs::new(LeafContent::Buffer(0));
        tabs.add_tab("two", LeafContent::Buffer(1));
        tabs.add_tab("three", LeafContent::Buffer(2));
        assert_eq!(tabs.active_index(), 2);
        tabs.next_tab();
        assert_eq!(tabs.active_index(), 0);
        tabs.prev_tab();
        assert_eq!(tabs.active_index(), 2);
    }

    #[test]
    fn closing_last_tab_is_refused() {
        let mut tabs = Tabs::new(LeafContent::Buffer(0));
        assert!(!tabs.close_active_tab());
        tabs.add_tab("two", LeafContent::Buffer(1));
        assert!(tabs.close_active_tab());
        assert_eq!(tabs.tab_count(), 1);
        assert!(!tabs.close_active_tab());
    }

    #[test]
    fn set_active_leaf_rejects_foreign_ids() {
        let mut tabs = Tabs::new(LeafContent::Buffer(0));
        assert!(!tabs.set_active_leaf(99));
        assert!(tabs.set_active_leaf(1));
    }
}
