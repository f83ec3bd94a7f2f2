//! The window layout tree: a recursive binary tree of leaves and splits.
//!
//! Each split exclusively owns its two children; the tree is reached through
//! a single owning root. There are no parent pointers: parents are recovered
//! by a downward search, which is O(tree size) but the tree is tiny in
//! practice. Geometry is recomputed top-down from the root rectangle on
//! every resize and structural mutation.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unique for the editor's lifetime; allocated by [`crate::tabs::Tabs`].
pub type WindowId = u64;

pub const MIN_SPLIT_RATIO: f32 = 0.1;
pub const MAX_SPLIT_RATIO: f32 = 0.9;

pub fn clamp_ratio(ratio: f32) -> f32 {
    ratio.clamp(MIN_SPLIT_RATIO, MAX_SPLIT_RATIO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// `Horizontal` stacks children top/bottom (divides height); `Vertical`
/// places them side by side (divides width).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// What a leaf displays: a buffer owned by the editor, or custom content
/// drawn by a registered script renderer. `data` is an opaque script
/// registry reference released when the leaf closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafContent {
    Buffer(usize),
    Custom { renderer: String, data: u32 },
}

#[derive(Debug, Clone)]
pub struct Leaf {
    pub id: WindowId,
    pub rect: Rect,
    pub content: LeafContent,
    pub row_offset: usize,
    pub col_offset: usize,
}

impl Leaf {
    pub fn new(id: WindowId, content: LeafContent) -> Self {
        Self {
            id,
            rect: Rect::default(),
            content,
            row_offset: 0,
            col_offset: 0,
        }
    }

    pub fn buffer_index(&self) -> Option<usize> {
        match self.content {
            LeafContent::Buffer(i) => Some(i),
            LeafContent::Custom { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Window {
    Leaf(Leaf),
    Split {
        rect: Rect,
        orientation: Orientation,
        ratio: f32,
        left: Box<Window>,
        right: Box<Window>,
    },
}

impl Window {
    fn leaf_count(&self) -> usize {
        match self {
            Window::Leaf(_) => 1,
            Window::Split { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn contains_leaf(&self, id: WindowId) -> bool {
        match self {
            Window::Leaf(l) => l.id == id,
            Window::Split { left, right, .. } => left.contains_leaf(id) || right.contains_leaf(id),
        }
    }

    /// Recompute child geometry from `rect`, top-down.
    fn layout(&mut self, rect: Rect) {
        match self {
            Window::Leaf(l) => l.rect = rect,
            Window::Split {
                rect: own,
                orientation,
                ratio,
                left,
                right,
            } => {
                *own = rect;
                match orientation {
                    Orientation::Horizontal => {
                        let top = (f32::from(rect.h) * *ratio) as u16;
                        left.layout(Rect::new(rect.x, rect.y, rect.w, top));
                        right.layout(Rect::new(rect.x, rect.y + top, rect.w, rect.h - top));
                    }
                    Orientation::Vertical => {
                        let lw = (f32::from(rect.w) * *ratio) as u16;
                        left.layout(Rect::new(rect.x, rect.y, lw, rect.h));
                        right.layout(Rect::new(rect.x + lw, rect.y, rect.w - lw, rect.h));
                    }
                }
            }
        }
    }
}

/// One tab's layout tree. Mutations keep at least one leaf alive at all
/// times; closing the last leaf is refused.
#[derive(Debug, Clone)]
pub struct WindowTree {
    root: Window,
    area: Rect,
}

impl WindowTree {
    pub fn new(leaf: Leaf) -> Self {
        Self {
            root: Window::Leaf(leaf),
            area: Rect::default(),
        }
    }

    /// Adopt an already-built tree (session restore).
    pub fn from_root(root: Window) -> Self {
        Self {
            root,
            area: Rect::default(),
        }
    }

    pub fn root(&self) -> &Window {
        &self.root
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Re-run layout over the tree's content rectangle.
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        self.root.layout(area);
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Leaves in in-order traversal order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        fn walk<'a>(win: &'a Window, out: &mut Vec<&'a Leaf>) {
            match win {
                Window::Leaf(l) => out.push(l),
                Window::Split { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    pub fn leaves_mut(&mut self) -> Vec<&mut Leaf> {
        fn walk<'a>(win: &'a mut Window, out: &mut Vec<&'a mut Leaf>) {
            match win {
                Window::Leaf(l) => out.push(l),
                Window::Split { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&mut self.root, &mut out);
        out
    }

    pub fn find(&self, id: WindowId) -> Option<&Leaf> {
        self.leaves().into_iter().find(|l| l.id == id)
    }

    pub fn find_mut(&mut self, id: WindowId) -> Option<&mut Leaf> {
        self.leaves_mut().into_iter().find(|l| l.id == id)
    }

    /// Cyclic successor in traversal order.
    pub fn next_leaf(&self, id: WindowId) -> Option<WindowId> {
        let ids: Vec<WindowId> = self.leaves().iter().map(|l| l.id).collect();
        let pos = ids.iter().position(|&i| i == id)?;
        Some(ids[(pos + 1) % ids.len()])
    }

    /// Cyclic predecessor in traversal order.
    pub fn prev_leaf(&self, id: WindowId) -> Option<WindowId> {
        let ids: Vec<WindowId> = self.leaves().iter().map(|l| l.id).collect();
        let pos = ids.iter().position(|&i| i == id)?;
        Some(ids[(pos + ids.len() - 1) % ids.len()])
    }

    /// Directional focus is approximate: it cycles in traversal order, which
    /// matches reading order well enough for small trees. Custom-content
    /// leaves participate like any other.
    pub fn focus_direction(&self, id: WindowId, direction: &str) -> Option<WindowId> {
        match direction {
            "left" | "up" => self.prev_leaf(id),
            "right" | "down" => self.next_leaf(id),
            _ => None,
        }
    }

    /// Leaf whose rectangle covers the given terminal cell.
    pub fn leaf_at(&self, x: u16, y: u16) -> Option<&Leaf> {
        self.leaves().into_iter().find(|l| l.rect.contains(x, y))
    }

    /// Replace leaf `id` with a split holding the existing leaf on the
    /// left/top and a new leaf (`new_id`, `content`) on the right/bottom.
    /// Returns the new leaf id on success.
    pub fn split(
        &mut self,
        id: WindowId,
        orientation: Orientation,
        new_id: WindowId,
        content: LeafContent,
    ) -> Option<WindowId> {
        fn split_rec(
            win: &mut Window,
            id: WindowId,
            orientation: Orientation,
            new_id: WindowId,
            content: &LeafContent,
        ) -> bool {
            match win {
                Window::Leaf(l) if l.id == id => {
                    let rect = l.rect;
                    let existing = std::mem::replace(
                        win,
                        Window::Leaf(Leaf::new(0, LeafContent::Buffer(0))),
                    );
                    *win = Window::Split {
                        rect,
                        orientation,
                        ratio: 0.5,
                        left: Box::new(existing),
                        right: Box::new(Window::Leaf(Leaf::new(new_id, content.clone()))),
                    };
                    true
                }
                Window::Leaf(_) => false,
                Window::Split { left, right, .. } => {
                    split_rec(left, id, orientation, new_id, content)
                        || split_rec(right, id, orientation, new_id, content)
                }
            }
        }

        if split_rec(&mut self.root, id, orientation, new_id, &content) {
            debug!(target: "model.tree", leaf = id, new_leaf = new_id, "leaf_split");
            self.root.layout(self.area);
            Some(new_id)
        } else {
            None
        }
    }

    /// Remove leaf `id`, promoting its sibling into the parent's place.
    /// Refused (returns false) when `id` is the only leaf or unknown.
    pub fn close(&mut self, id: WindowId) -> bool {
        if matches!(&self.root, Window::Leaf(l) if l.id == id) {
            return false;
        }

        fn close_rec(win: &mut Window, id: WindowId) -> bool {
            if let Window::Split { left, right, .. } = win {
                let take_left = matches!(left.as_ref(), Window::Leaf(l) if l.id == id);
                let take_right = matches!(right.as_ref(), Window::Leaf(l) if l.id == id);
                if take_left || take_right {
                    let keep = if take_left {
                        std::mem::replace(
                            right.as_mut(),
                            Window::Leaf(Leaf::new(0, LeafContent::Buffer(0))),
                        )
                    } else {
                        std::mem::replace(
                            left.as_mut(),
                            Window::Leaf(Leaf::new(0, LeafContent::Buffer(0))),
                        )
                    };
                    *win = keep;
                    return true;
                }
                close_rec(left, id) || close_rec(right, id)
            } else {
                false
            }
        }

        let closed = close_rec(&mut self.root, id);
        if closed {
            debug!(target: "model.tree", leaf = id, "leaf_closed");
            self.root.layout(self.area);
        }
        closed
    }

    /// Collapse the tree to the single leaf `id`. Other leaves are released;
    /// their buffers are owned by the editor and survive.
    pub fn only(&mut self, id: WindowId) -> bool {
        let Some(keep) = self.find(id).cloned() else {
            return false;
        };
        self.root = Window::Leaf(keep);
        self.root.layout(self.area);
        debug!(target: "model.tree", leaf = id, "only_leaf_kept");
        true
    }

    /// Exchange the contents (not geometry) of two leaves.
    pub fn swap(&mut self, a: WindowId, b: WindowId) -> bool {
        if a == b {
            return false;
        }
        let mut leaves = self.leaves_mut();
        let Some(pa) = leaves.iter().position(|l| l.id == a) else {
            return false;
        };
        let Some(pb) = leaves.iter().position(|l| l.id == b) else {
            return false;
        };
        let (lo, hi) = if pa < pb { (pa, pb) } else { (pb, pa) };
        let (head, tail) = leaves.split_at_mut(hi);
        let (la, lb) = (&mut *head[lo], &mut *tail[0]);
        std::mem::swap(&mut la.content, &mut lb.content);
        std::mem::swap(&mut la.row_offset, &mut lb.row_offset);
        std::mem::swap(&mut la.col_offset, &mut lb.col_offset);
        true
    }

    /// Set the split ratio of leaf `id`'s parent. No-op on the root leaf.
    pub fn set_ratio(&mut self, id: WindowId, ratio: f32) -> bool {
        fn set_rec(win: &mut Window, id: WindowId, ratio: f32) -> bool {
            if let Window::Split {
                left,
                right,
                ratio: own,
                ..
            } = win
            {
                let is_parent = matches!(left.as_ref(), Window::Leaf(l) if l.id == id)
                    || matches!(right.as_ref(), Window::Leaf(l) if l.id == id);
                if is_parent {
                    *own = clamp_ratio(ratio);
                    return true;
                }
                set_rec(left, id, ratio) || set_rec(right, id, ratio)
            } else {
                false
            }
        }
        let changed = set_rec(&mut self.root, id, ratio);
        if changed {
            self.root.layout(self.area);
        }
        changed
    }

    /// Grow (positive) or shrink (negative) the share of leaf `id` within
    /// its parent split. No-op on the root leaf.
    pub fn resize_relative(&mut self, id: WindowId, delta: f32) -> bool {
        fn adjust_rec(win: &mut Window, id: WindowId, delta: f32) -> bool {
            if let Window::Split {
                left,
                right,
                ratio,
                ..
            } = win
            {
                if matches!(left.as_ref(), Window::Leaf(l) if l.id == id) {
                    *ratio = clamp_ratio(*ratio + delta);
                    return true;
                }
                if matches!(right.as_ref(), Window::Leaf(l) if l.id == id) {
                    *ratio = clamp_ratio(*ratio - delta);
                    return true;
                }
                adjust_rec(left, id, delta) || adjust_rec(right, id, delta)
            } else {
                false
            }
        }
        let changed = adjust_rec(&mut self.root, id, delta);
        if changed {
            self.root.layout(self.area);
        }
        changed
    }

    /// Set every split's ratio to `leaf_count(left) / leaf_count(subtree)`
    /// so leaves end up with terminal area proportional to leaf counts.
    pub fn equalize(&mut self) {
        fn eq_rec(win: &mut Window) {
            if let Window::Split {
                left,
                right,
                ratio,
                ..
            } = win
            {
                let lc = left.leaf_count() as f32;
                let total = lc + right.leaf_count() as f32;
                *ratio = clamp_ratio(lc / total);
                eq_rec(left);
                eq_rec(right);
            }
        }
        eq_rec(&mut self.root);
        self.root.layout(self.area);
    }

    /// Split ratio of the parent of leaf `id`, for introspection.
    pub fn parent_ratio(&self, id: WindowId) -> Option<f32> {
        fn find_rec(win: &Window, id: WindowId) -> Option<f32> {
            if let Window::Split {
                left,
                right,
                ratio,
                ..
            } = win
            {
                let is_parent = matches!(left.as_ref(), Window::Leaf(l) if l.id == id)
                    || matches!(right.as_ref(), Window::Leaf(l) if l.id == id);
                if is_parent {
                    return Some(*ratio);
                }
                find_rec(left, id).or_else(|| find_rec(right, id))
            } else {
                None
            }
        }
        find_rec(&self.root, id)
    }

    /// Ratio of the root split, if the root is a split.
    pub fn root_ratio(&self) -> Option<f32> {
        match &self.root {
            Window::Split { ratio, .. } => Some(*ratio),
            Window::Leaf(_) => None,
        }
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.root.contains_leaf(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: WindowId) -> Leaf {
        Leaf::new(id, LeafContent::Buffer(0))
    }

    fn three_leaf_tree() -> WindowTree {
        // Leaf 1, split horizontally (2 below), then split 2 vertically (3 right).
        let mut tree = WindowTree::new(leaf(1));
        tree.resize(Rect::new(0, 0, 60, 30));
        tree.split(1, Orientation::Horizontal, 2, LeafContent::Buffer(1));
        tree.split(2, Orientation::Vertical, 3, LeafContent::Buffer(2));
        tree
    }

    #[test]
    fn split_keeps_existing_content_on_first_child() {
        let mut tree = WindowTree::new(leaf(1));
        tree.resize(Rect::new(0, 0, 80, 24));
        tree.split(1, Orientation::Vertical, 2, LeafContent::Buffer(7));
        let ids: Vec<_> = tree.leaves().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(tree.find(2).unwrap().content, LeafContent::Buffer(7));
        assert_eq!(tree.parent_ratio(1), Some(0.5));
    }

    #[test]
    fn equalize_distributes_by_leaf_count() {
        let mut tree = three_leaf_tree();
        tree.equalize();
        assert!((tree.root_ratio().unwrap() - 1.0 / 3.0).abs() < 1e-6);
        assert!((tree.parent_ratio(2).unwrap() - 0.5).abs() < 1e-6);

        tree.resize(Rect::new(0, 0, 60, 30));
        let leaves = tree.leaves();
        assert_eq!(leaves[0].rect, Rect::new(0, 0, 60, 10));
        assert_eq!(leaves[1].rect, Rect::new(0, 10, 30, 20));
        assert_eq!(leaves[2].rect, Rect::new(30, 10, 30, 20));
    }

    #[test]
    fn close_promotes_sibling() {
        let mut tree = three_leaf_tree();
        assert!(tree.close(3));
        assert_eq!(tree.leaf_count(), 2);
        let ids: Vec<_> = tree.leaves().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2]);
        // Leaf 2 now owns the whole bottom half.
        assert_eq!(tree.find(2).unwrap().rect, Rect::new(0, 15, 60, 15));
    }

    #[test]
    fn closing_last_leaf_is_refused() {
        let mut tree = WindowTree::new(leaf(1));
        tree.resize(Rect::new(0, 0, 80, 24));
        assert!(!tree.close(1));
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn only_collapses_to_single_leaf() {
        let mut tree = three_leaf_tree();
        assert!(tree.only(3));
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.leaves()[0].id, 3);
        assert_eq!(tree.leaves()[0].rect, tree.area());
    }

    #[test]
    fn swap_exchanges_content_not_geometry() {
        let mut tree = three_leaf_tree();
        let rect_1 = tree.find(1).unwrap().rect;
        let rect_3 = tree.find(3).unwrap().rect;
        assert!(tree.swap(1, 3));
        assert_eq!(tree.find(1).unwrap().content, LeafContent::Buffer(2));
        assert_eq!(tree.find(3).unwrap().content, LeafContent::Buffer(0));
        assert_eq!(tree.find(1).unwrap().rect, rect_1);
        assert_eq!(tree.find(3).unwrap().rect, rect_3);
    }

    #[test]
    fn ratio_assignment_clamps() {
        let mut tree = WindowTree::new(leaf(1));
        tree.resize(Rect::new(0, 0, 80, 24));
        tree.split(1, Orientation::Horizontal, 2, LeafContent::Buffer(1));
        assert!(tree.set_ratio(1, 0.01));
        assert!((tree.parent_ratio(1).unwrap() - MIN_SPLIT_RATIO).abs() < 1e-6);
        assert!(tree.set_ratio(1, 2.0));
        assert!((tree.parent_ratio(1).unwrap() - MAX_SPLIT_RATIO).abs() < 1e-6);
    }

    #[test]
    fn ratio_survives_resize() {
        let mut tree = WindowTree::new(leaf(1));
        tree.resize(Rect::new(0, 0, 80, 24));
        tree.split(1, Orientation::Horizontal, 2, LeafContent::Buffer(1));
        tree.set_ratio(1, 0.25);
        tree.resize(Rect::new(0, 0, 100, 40));
        assert!((tree.parent_ratio(1).unwrap() - 0.25).abs() < 1e-6);
        assert_eq!(tree.find(1).unwrap().rect.h, 10);
        assert_eq!(tree.find(2).unwrap().rect.h, 30);
    }

    #[test]
    fn resize_relative_adjusts_parent_ratio() {
        let mut tree = WindowTree::new(leaf(1));
        tree.resize(Rect::new(0, 0, 80, 24));
        tree.split(1, Orientation::Vertical, 2, LeafContent::Buffer(1));
        assert!(tree.resize_relative(2, 0.2));
        // Growing the right child shrinks the ratio.
        assert!((tree.parent_ratio(2).unwrap() - 0.3).abs() < 1e-6);
        // The root leaf of a single-leaf tree has no parent to adjust.
        let mut single = WindowTree::new(leaf(9));
        assert!(!single.resize_relative(9, 0.1));
    }

    #[test]
    fn cyclic_navigation_wraps() {
        let tree = three_leaf_tree();
        assert_eq!(tree.next_leaf(1), Some(2));
        assert_eq!(tree.next_leaf(3), Some(1));
        assert_eq!(tree.prev_leaf(1), Some(3));
        assert_eq!(tree.focus_direction(1, "right"), Some(2));
        assert_eq!(tree.focus_direction(1, "left"), Some(3));
        assert_eq!(tree.focus_direction(1, "sideways"), None);
    }

    #[test]
    fn leaf_at_resolves_click_position() {
        let tree = three_leaf_tree();
        assert_eq!(tree.leaf_at(5, 5).unwrap().id, 1);
        assert_eq!(tree.leaf_at(5, 20).unwrap().id, 2);
        assert_eq!(tree.leaf_at(45, 20).unwrap().id, 3);
        assert!(tree.leaf_at(0, 29).is_some());
    }
}
