//! Unit tests for rebalance.rs
//!
//! Walks the growth/shrink state machine through split, expand, merge and
//! contract on hand-checked layouts.

use super::*;
use crate::geometry::BoundingSphere;
use crate::octree::{Decomposition, OctreeConfig};
use glam::Vec3;
use rustc_hash::FxHashMap;

type Scene = FxHashMap<u32, BoundingSphere>;

fn sphere(x: f32, y: f32, z: f32, radius: f32) -> BoundingSphere {
    BoundingSphere::new(Vec3::new(x, y, z), radius)
}

fn config(threshold: usize, pct: f32) -> OctreeConfig {
    OctreeConfig::default()
        .with_initial_radius(100.0)
        .with_objects_threshold(threshold)
        .with_overlap_pct(pct)
}

fn add(tree: &mut Octree<u32>, scene: &mut Scene, id: u32, s: BoundingSphere) {
    scene.insert(id, s);
    tree.add(id, Decomposition::Whole, scene).unwrap();
}

fn node_of(tree: &Octree<u32>, id: u32) -> NodeKey {
    let key = tree.entities_of(id)[0];
    tree.entity(key).unwrap().node().unwrap()
}

fn child_at(tree: &Octree<u32>, node: NodeKey, octant: u8) -> Option<NodeKey> {
    tree.node(node).unwrap().child(Octant::new(octant))
}

// ============================================================================
// SPLIT
// ============================================================================

#[test]
fn test_split_sends_objects_to_octants() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(2, 0.1));
    add(&mut tree, &mut scene, 1, sphere(0.0, 0.0, 0.0, 1.0));
    add(&mut tree, &mut scene, 2, sphere(90.0, 0.0, 0.0, 1.0));
    assert_eq!(tree.node_count(), 1);

    add(&mut tree, &mut scene, 3, sphere(-90.0, 0.0, 0.0, 1.0));

    let root = tree.root_key();
    let plus_x = child_at(&tree, root, 7).unwrap();
    let minus_x = child_at(&tree, root, 6).unwrap();
    assert_eq!(tree.node_count(), 3);
    assert!(tree.root().unwrap().objects().is_empty());
    assert_eq!(node_of(&tree, 1), plus_x);
    assert_eq!(node_of(&tree, 2), plus_x);
    assert_eq!(node_of(&tree, 3), minus_x);

    let child = tree.node(plus_x).unwrap();
    assert_eq!(child.depth(), 1);
    assert_eq!(child.parent(), Some(root));
    assert_eq!(child.octant(), Some(Octant::new(7)));
    assert!((child.bounds().radius - 55.0).abs() < 1e-4);
}

#[test]
fn test_straddler_stays_in_parent() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(2, 0.1));
    add(&mut tree, &mut scene, 1, sphere(0.0, 0.0, 0.0, 30.0));
    add(&mut tree, &mut scene, 2, sphere(50.0, 50.0, 50.0, 1.0));
    add(&mut tree, &mut scene, 3, sphere(-50.0, -50.0, -50.0, 1.0));

    let root = tree.root_key();
    assert_eq!(node_of(&tree, 1), root);
    assert_eq!(tree.root().unwrap().objects().len(), 1);
    assert_ne!(node_of(&tree, 2), root);
    assert_ne!(node_of(&tree, 3), root);
}

#[test]
fn test_insert_descends_into_existing_children() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(2, 0.1));
    add(&mut tree, &mut scene, 1, sphere(50.0, 50.0, 50.0, 1.0));
    add(&mut tree, &mut scene, 2, sphere(60.0, 60.0, 60.0, 1.0));
    add(&mut tree, &mut scene, 3, sphere(-50.0, -50.0, -50.0, 1.0));

    // The root has children now: a new entity goes straight down, creating its slot
    add(&mut tree, &mut scene, 4, sphere(50.0, -50.0, 50.0, 1.0));

    let root = tree.root_key();
    assert_eq!(node_of(&tree, 4), child_at(&tree, root, 5).unwrap());
    assert!(tree.root().unwrap().objects().is_empty());
}

#[test]
fn test_threshold_zero_never_splits() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(0, 0.1));
    for id in 0..20 {
        add(&mut tree, &mut scene, id, sphere(id as f32 * 4.0 - 40.0, 10.0, 10.0, 1.0));
    }
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.root().unwrap().objects().len(), 20);
}

#[test]
fn test_max_depth_caps_split() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(1, 0.1).with_max_depth(Some(1)));
    for id in 0..4 {
        add(&mut tree, &mut scene, id, sphere(50.0 + id as f32, 50.0, 50.0, 1.0));
    }

    assert_eq!(tree.depth(), 1);
    let child = child_at(&tree, tree.root_key(), 7).unwrap();
    assert_eq!(tree.node(child).unwrap().objects().len(), 4);
}

#[test]
fn test_identical_points_stop_splitting() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(2, 0.15));
    for id in 0..5 {
        add(&mut tree, &mut scene, id, sphere(10.0, 20.0, 30.0, 0.0));
    }
    assert!(tree.depth() < 40);
    assert_eq!(tree.object_count(), 5);
}

// ============================================================================
// EXPAND
// ============================================================================

#[test]
fn test_expand_grows_root_around_large_entity() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(8, 0.15));
    let old_root = tree.root_key();

    add(&mut tree, &mut scene, 1, sphere(0.0, 0.0, 0.0, 150.0));

    let root = tree.root().unwrap();
    assert_ne!(tree.root_key(), old_root);
    assert!(root.bounds().effective_radius() >= 150.0);
    assert_eq!(node_of(&tree, 1), tree.root_key());
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.node_count(), 2);

    // Every face was crossed toward negative: the new root grew toward octant 0,
    // so the old root is its octant 7
    let old = tree.node(old_root).unwrap();
    assert_eq!(old.parent(), Some(tree.root_key()));
    assert_eq!(old.octant(), Some(Octant::new(7)));
    assert_eq!(old.depth(), 1);
}

#[test]
fn test_expand_encloses_far_entities() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(8, 0.1));
    add(&mut tree, &mut scene, 1, sphere(300.0, 0.0, 0.0, 1.0));
    add(&mut tree, &mut scene, 2, sphere(300.0, 1.0, 0.0, 1.0));

    // Two expands toward +X: the second root reaches x = 253.6 ± 363.6
    assert_eq!(tree.depth(), 2);
    let root = tree.root().unwrap();
    assert!(root.bounds().aabb().contains_point(Vec3::new(300.0, 0.0, 0.0)));
    assert!(root.bounds().center.x > 0.0);
    let hits = tree.search_sphere(Vec3::new(300.0, 0.0, 0.0), 0.5).unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_expand_refused_at_max_depth() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(8, 0.1).with_max_depth(Some(0)));
    let root = tree.root_key();

    add(&mut tree, &mut scene, 1, sphere(500.0, 0.0, 0.0, 1.0));

    assert_eq!(tree.root_key(), root);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(node_of(&tree, 1), root);
}

// ============================================================================
// MERGE
// ============================================================================

/// root → 7 → {7: [1, 2], 0: [3]}, root → 0: [4, 5]
fn two_branch_tree(scene: &mut Scene) -> Octree<u32> {
    let mut tree = Octree::new(config(2, 0.1));
    add(&mut tree, scene, 1, sphere(80.0, 80.0, 80.0, 1.0));
    add(&mut tree, scene, 2, sphere(81.0, 80.0, 80.0, 1.0));
    add(&mut tree, scene, 3, sphere(20.0, 20.0, 20.0, 1.0));
    add(&mut tree, scene, 4, sphere(-80.0, -80.0, -80.0, 1.0));
    add(&mut tree, scene, 5, sphere(-81.0, -80.0, -80.0, 1.0));
    tree
}

#[test]
fn test_two_branch_layout() {
    let mut scene = Scene::default();
    let tree = two_branch_tree(&mut scene);

    let root = tree.root_key();
    let branch = child_at(&tree, root, 7).unwrap();
    assert_eq!(node_of(&tree, 1), child_at(&tree, branch, 7).unwrap());
    assert_eq!(node_of(&tree, 3), child_at(&tree, branch, 0).unwrap());
    assert_eq!(node_of(&tree, 4), child_at(&tree, root, 0).unwrap());
    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.depth(), 2);
}

#[test]
fn test_merge_folds_empty_leaf() {
    let mut scene = Scene::default();
    let mut tree = two_branch_tree(&mut scene);
    let branch = child_at(&tree, tree.root_key(), 7).unwrap();

    tree.remove(3);

    // The emptied leaf folds into its parent; the sibling branch keeps the root
    assert_eq!(tree.node_count(), 4);
    assert!(child_at(&tree, branch, 0).is_none());
    assert!(child_at(&tree, branch, 7).is_some());
    assert_eq!(tree.subtree_object_count(tree.root_key()), 4);
}

#[test]
fn test_merge_cascades_then_contracts() {
    let mut scene = Scene::default();
    let mut tree = two_branch_tree(&mut scene);
    tree.remove(3);

    // Leaves [2] under the +X branch: the whole branch folds into the root,
    // then the root hands over to the -X child holding [4, 5]
    tree.remove(1);

    assert_eq!(tree.node_count(), 1);
    let root = tree.root().unwrap();
    assert_eq!(root.objects().len(), 3);
    assert_eq!(root.depth(), 0);
    assert!(root.is_root());
    assert_eq!(node_of(&tree, 2), tree.root_key());
}

// ============================================================================
// CONTRACT
// ============================================================================

#[test]
fn test_cluster_removal_contracts_to_single_node() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(8, 0.15));
    for i in 0..5u32 {
        add(&mut tree, &mut scene, i, sphere(50.0 + i as f32, 50.0, 50.0, 1.0));
        add(&mut tree, &mut scene, 10 + i, sphere(-50.0 - i as f32, -50.0, -50.0, 1.0));
    }
    assert_eq!(tree.node_count(), 3);

    for id in (1..5u32).chain(10..15) {
        tree.remove(id);
    }

    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.root().unwrap().objects().len(), 1);
    assert_eq!(node_of(&tree, 0), tree.root_key());
}

#[test]
fn test_contract_resets_depths() {
    let mut scene = Scene::default();
    let mut tree = two_branch_tree(&mut scene);
    let branch = child_at(&tree, tree.root_key(), 7).unwrap();

    let leaf = child_at(&tree, branch, 7).unwrap();

    tree.remove(4);

    // The -X side drops under the threshold: the +X branch becomes the root
    // and takes the remaining -X entity along
    assert_eq!(tree.root_key(), branch);
    assert_eq!(tree.node(branch).unwrap().depth(), 0);
    assert_eq!(tree.node(branch).unwrap().octant(), None);
    assert_eq!(tree.node(leaf).unwrap().depth(), 1);
    assert_eq!(tree.depth(), 1);
    assert_eq!(node_of(&tree, 5), branch);
}

// ============================================================================
// SUBTREE HELPERS
// ============================================================================

#[test]
fn test_collect_subtree_objects_parent_first() {
    let mut scene = Scene::default();
    let mut tree = Octree::new(config(2, 0.1));
    add(&mut tree, &mut scene, 1, sphere(0.0, 0.0, 0.0, 30.0));
    add(&mut tree, &mut scene, 2, sphere(50.0, 50.0, 50.0, 1.0));
    add(&mut tree, &mut scene, 3, sphere(-50.0, -50.0, -50.0, 1.0));

    let objects = tree.collect_subtree_objects(tree.root_key());
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[0], tree.entities_of(1)[0]);
    // Octant 0 before octant 7
    assert_eq!(objects[1], tree.entities_of(3)[0]);
    assert_eq!(objects[2], tree.entities_of(2)[0]);
}
