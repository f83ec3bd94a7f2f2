//! Partition property: for any tree shape and terminal size, the leaf
//! rectangles tile the content rectangle exactly with no overlap.

use core_model::{Leaf, LeafContent, Orientation, Rect, WindowTree};
use proptest::prelude::*;

/// Build a tree by replaying a script of (target leaf index, orientation,
/// ratio) operations against whatever leaves currently exist.
fn build_tree(ops: &[(usize, bool, f32)], area: Rect) -> WindowTree {
    let mut tree = WindowTree::new(Leaf::new(1, LeafContent::Buffer(0)));
    tree.resize(area);
    let mut next_id = 2u64;
    for &(pick, horizontal, ratio) in ops {
        let ids: Vec<u64> = tree.leaves().iter().map(|l| l.id).collect();
        let target = ids[pick % ids.len()];
        let orientation = if horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        tree.split(target, orientation, next_id, LeafContent::Buffer(0));
        tree.set_ratio(next_id, ratio);
        next_id += 1;
    }
    tree
}

fn assert_exact_partition(tree: &WindowTree, area: Rect) {
    let leaves = tree.leaves();
    let total_area: u64 = leaves
        .iter()
        .map(|l| u64::from(l.rect.w) * u64::from(l.rect.h))
        .sum();
    assert_eq!(
        total_area,
        u64::from(area.w) * u64::from(area.h),
        "leaf areas must sum to the content area"
    );

    // Every cell belongs to exactly one leaf.
    for y in area.y..area.y + area.h {
        for x in area.x..area.x + area.w {
            let covering = leaves.iter().filter(|l| l.rect.contains(x, y)).count();
            assert_eq!(covering, 1, "cell ({x},{y}) covered {covering} times");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn leaves_tile_content_rect(
        ops in prop::collection::vec((0usize..8, any::<bool>(), 0.05f32..1.2), 0..6),
        w in 4u16..80,
        h in 4u16..40,
    ) {
        let area = Rect::new(0, 0, w, h);
        let tree = build_tree(&ops, area);
        assert_exact_partition(&tree, area);
    }

    #[test]
    fn partition_survives_resize(
        ops in prop::collection::vec((0usize..8, any::<bool>(), 0.05f32..1.2), 0..6),
        w in 4u16..80,
        h in 4u16..40,
        w2 in 4u16..80,
        h2 in 4u16..40,
    ) {
        let mut tree = build_tree(&ops, Rect::new(0, 0, w, h));
        let area = Rect::new(0, 0, w2, h2);
        tree.resize(area);
        assert_exact_partition(&tree, area);
    }
}

#[test]
fn children_sum_bit_exact_on_odd_dimensions() {
    let mut tree = WindowTree::new(Leaf::new(1, LeafContent::Buffer(0)));
    tree.resize(Rect::new(0, 0, 81, 23));
    tree.split(1, Orientation::Horizontal, 2, LeafContent::Buffer(0));
    let leaves = tree.leaves();
    assert_eq!(leaves[0].rect.h + leaves[1].rect.h, 23);

    let mut tree = WindowTree::new(Leaf::new(1, LeafContent::Buffer(0)));
    tree.resize(Rect::new(0, 0, 81, 23));
    tree.split(1, Orientation::Vertical, 2, LeafContent::Buffer(0));
    let leaves = tree.leaves();
    assert_eq!(leaves[0].rect.w + leaves[1].rect.w, 81);
}
