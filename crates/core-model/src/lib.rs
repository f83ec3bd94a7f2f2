//! Editor layout model: window trees, tab groups, session snapshots.

pub mod session;
pub mod tabs;
pub mod tree;

pub use session::{ContentSnapshot, NodeSnapshot, SessionSnapshot, TabSnapshot};
pub use tabs::{TabGroup, Tabs};
pub use tree::{
    Leaf, LeafContent, MAX_SPLIT_RATIO, MIN_SPLIT_RATIO, Orientation, Rect, Window, WindowId,
    WindowTree, clamp_ratio,
};
