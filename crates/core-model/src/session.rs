//! Serialisable snapshots of the tab/window layout.
//!
//! Snapshots capture tree shape, orientations, ratios, scroll offsets, and
//! content descriptors. Buffers are recorded by file path and rebound on
//! restore through a caller-supplied binder; paths that no longer resolve
//! come back as fresh empty buffers. Custom leaves restore with a null data
//! reference, and plugins re-attach their state from the `on_create` hook.

use crate::tabs::{TabGroup, Tabs};
use crate::tree::{Leaf, LeafContent, Orientation, Window, WindowTree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentSnapshot {
    Buffer { path: Option<String> },
    Custom { renderer: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeSnapshot {
    Leaf {
        content: ContentSnapshot,
        row_offset: usize,
        col_offset: usize,
    },
    Split {
        orientation: Orientation,
        ratio: f32,
        left: Box<NodeSnapshot>,
        right: Box<NodeSnapshot>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub name: String,
    pub root: NodeSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tabs: Vec<TabSnapshot>,
    pub active_tab: usize,
}

fn snapshot_node(win: &Window, buffer_path: &dyn Fn(usize) -> Option<String>) -> NodeSnapshot {
    match win {
        Window::Leaf(leaf) => NodeSnapshot::Leaf {
            content: match &leaf.content {
                LeafContent::Buffer(idx) => ContentSnapshot::Buffer {
                    path: buffer_path(*idx),
                },
                LeafContent::Custom { renderer, .. } => ContentSnapshot::Custom {
                    renderer: renderer.clone(),
                },
            },
            row_offset: leaf.row_offset,
            col_offset: leaf.col_offset,
        },
        Window::Split {
            orientation,
            ratio,
            left,
            right,
            ..
        } => NodeSnapshot::Split {
            orientation: *orientation,
            ratio: *ratio,
            left: Box::new(snapshot_node(left, buffer_path)),
            right: Box::new(snapshot_node(right, buffer_path)),
        },
    }
}

/// Capture the full tab/window layout. `buffer_path` maps a buffer index to
/// its file path, when it has one.
pub fn snapshot(tabs: &Tabs, buffer_path: &dyn Fn(usize) -> Option<String>) -> SessionSnapshot {
    SessionSnapshot {
        tabs: tabs
            .groups()
            .iter()
            .map(|g| TabSnapshot {
                name: g.name.clone(),
                root: snapshot_node(g.tree.root(), buffer_path),
            })
            .collect(),
        active_tab: tabs.active_index(),
    }
}

fn restore_node(
    node: &NodeSnapshot,
    tabs: &mut Tabs,
    bind_buffer: &mut dyn FnMut(Option<&str>) -> usize,
) -> Window {
    match node {
        NodeSnapshot::Leaf {
            content,
            row_offset,
            col_offset,
        } => {
            let id = tabs.alloc_window_id();
            let content = match content {
                ContentSnapshot::Buffer { path } => {
                    LeafContent::Buffer(bind_buffer(path.as_deref()))
                }
                ContentSnapshot::Custom { renderer } => LeafContent::Custom {
                    renderer: renderer.clone(),
                    data: 0,
                },
            };
            let mut leaf = Leaf::new(id, content);
            leaf.row_offset = *row_offset;
            leaf.col_offset = *col_offset;
            Window::Leaf(leaf)
        }
        NodeSnapshot::Split {
            orientation,
            ratio,
            left,
            right,
        } => Window::Split {
            rect: Default::default(),
            orientation: *orientation,
            ratio: crate::tree::clamp_ratio(*ratio),
            left: Box::new(restore_node(left, tabs, bind_buffer)),
            right: Box::new(restore_node(right, tabs, bind_buffer)),
        },
    }
}

/// Rebuild the tab list from a snapshot. `bind_buffer` resolves a recorded
/// path to a buffer index, creating buffers as needed. Returns false when
/// the snapshot holds no tabs.
pub fn restore(
    tabs: &mut Tabs,
    snapshot: &SessionSnapshot,
    bind_buffer: &mut dyn FnMut(Option<&str>) -> usize,
) -> bool {
    if snapshot.tabs.is_empty() {
        return false;
    }
    let area = tabs.active_tab().tree.area();
    let mut groups = Vec::new();
    for tab in &snapshot.tabs {
        let root = restore_node(&tab.root, tabs, bind_buffer);
        let mut tree = WindowTree::from_root(root);
        tree.resize(area);
        let active = tree.leaves().first().map(|l| l.id).unwrap_or_default();
        groups.push(TabGroup {
            name: tab.name.clone(),
            tree,
            active,
        });
    }
    tabs.replace_all(groups, snapshot.active_tab);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Rect;

    fn build() -> Tabs {
        let mut tabs = Tabs::new(LeafContent::Buffer(0));
        tabs.active_tab_mut().tree.resize(Rect::new(0, 0, 80, 24));
        let first = tabs.active_leaf_id();
        let second = tabs.alloc_window_id();
        tabs.active_tab_mut()
            .tree
            .split(first, Orientation::Vertical, second, LeafContent::Buffer(1));
        tabs.active_tab_mut().tree.set_ratio(first, 0.3);
        tabs.add_tab("scratch", LeafContent::Buffer(2));
        tabs
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let tabs = build();
        let paths = |idx: usize| match idx {
            0 => Some("a.txt".to_string()),
            1 => Some("b.txt".to_string()),
            _ => None,
        };
        let snap = snapshot(&tabs, &paths);
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: SessionSnapshot = serde_json::from_str(&json).unwrap();

        let mut restored = Tabs::new(LeafContent::Buffer(0));
        restored.active_tab_mut().tree.resize(Rect::new(0, 0, 80, 24));
        let mut bound = Vec::new();
        assert!(restore(&mut restored, &parsed, &mut |path| {
            bound.push(path.map(str::to_string));
            bound.len() - 1
        }));

        assert_eq!(restored.tab_count(), 2);
        assert_eq!(restored.active_index(), 1);
        let tree = &restored.groups()[0].tree;
        assert_eq!(tree.leaf_count(), 2);
        let first = tree.leaves()[0].id;
        assert!((tree.parent_ratio(first).unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(
            bound,
            vec![
                Some("a.txt".to_string()),
                Some("b.txt".to_string()),
                None
            ]
        );
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        let mut tabs = Tabs::new(LeafContent::Buffer(0));
        let snap = SessionSnapshot {
            tabs: Vec::new(),
            active_tab: 0,
        };
        assert!(!restore(&mut tabs, &snap, &mut |_| 0));
        assert_eq!(tabs.tab_count(), 1);
    }

    #[test]
    fn custom_leaves_restore_with_null_data() {
        let mut tabs = Tabs::new(LeafContent::Custom {
            renderer: "tree_view".to_string(),
            data: 42,
        });
        tabs.active_tab_mut().tree.resize(Rect::new(0, 0, 40, 10));
        let snap = snapshot(&tabs, &|_| None);
        let mut restored = Tabs::new(LeafContent::Buffer(0));
        assert!(restore(&mut restored, &snap, &mut |_| 0));
        match &restored.active_tab().tree.leaves()[0].content {
            LeafContent::Custom { renderer, data } => {
                assert_eq!(renderer, "tree_view");
                assert_eq!(*data, 0);
            }
            other => panic!("expected custom content, got {other:?}"),
        }
    }
}
