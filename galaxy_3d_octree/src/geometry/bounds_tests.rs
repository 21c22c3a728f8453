//! Unit tests for bounds.rs

use super::*;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-3
}

// ============================================================================
// AABB
// ============================================================================

#[test]
fn test_aabb_contains_and_intersects() {
    let outer = AABB { min: Vec3::splat(-10.0), max: Vec3::splat(10.0) };
    let inner = AABB { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) };
    let apart = AABB { min: Vec3::splat(11.0), max: Vec3::splat(12.0) };
    let touching = AABB { min: Vec3::splat(10.0), max: Vec3::splat(12.0) };

    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    assert!(outer.intersects(&inner));
    assert!(!outer.intersects(&apart));
    assert!(outer.intersects(&touching));
    assert_eq!(outer.center(), Vec3::ZERO);
    assert!(outer.contains_point(Vec3::new(10.0, 0.0, -10.0)));
    assert!(!outer.contains_point(Vec3::new(10.5, 0.0, 0.0)));
}

// ============================================================================
// BOUNDING SPHERE
// ============================================================================

#[test]
fn test_sphere_validity() {
    assert!(BoundingSphere::new(Vec3::ONE, 0.0).is_valid());
    assert!(!BoundingSphere::new(Vec3::ONE, -1.0).is_valid());
    assert!(!BoundingSphere::new(Vec3::ONE, f32::NAN).is_valid());
    assert!(!BoundingSphere::new(Vec3::new(f32::INFINITY, 0.0, 0.0), 1.0).is_valid());
}

#[test]
fn test_sphere_intersects_touching() {
    let a = BoundingSphere::new(Vec3::ZERO, 1.0);
    let b = BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 2.0);
    let c = BoundingSphere::new(Vec3::new(3.5, 0.0, 0.0), 2.0);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
}

// ============================================================================
// NODE BOUNDS
// ============================================================================

#[test]
fn test_node_bounds_effective_radius() {
    let bounds = NodeBounds::new(Vec3::ZERO, 100.0, 0.15);
    assert!((bounds.overlap - 15.0).abs() < 1e-4);
    assert!((bounds.effective_radius() - 115.0).abs() < 1e-4);
    assert!(approx(bounds.max(), Vec3::splat(115.0)));
    assert!((bounds.bounding_radius() - 115.0 * 3.0_f32.sqrt()).abs() < 1e-3);
}

#[test]
fn test_child_is_inside_parent() {
    let parent = NodeBounds::new(Vec3::new(3.0, -2.0, 7.0), 100.0, 0.15);
    let outer = parent.aabb();
    for octant in Octant::all() {
        let child = parent.child(octant, 0.15);
        assert!((child.radius * 2.0 - parent.effective_radius()).abs() < 1e-3);
        let inner = child.aabb();
        let eps = Vec3::splat(1e-3);
        assert!(outer.contains(&AABB { min: inner.min + eps, max: inner.max - eps }));
        // The child reaches past the parent's center on its inner side
        let toward = octant.signs();
        assert!((child.center - parent.center).dot(toward) > 0.0);
    }
}

#[test]
fn test_child_sizing() {
    let parent = NodeBounds::new(Vec3::ZERO, 100.0, 0.1);
    let child = parent.child(Octant::new(7), 0.1);
    // radius = 110 / 2, overlap = 5.5, center offset = 49.5
    assert!((child.radius - 55.0).abs() < 1e-4);
    assert!((child.overlap - 5.5).abs() < 1e-4);
    assert!(approx(child.center, Vec3::splat(49.5)));
}

#[test]
fn test_parent_reproduces_child() {
    let root = NodeBounds::new(Vec3::new(10.0, 20.0, -5.0), 100.0, 0.15);
    for growth in Octant::all() {
        let parent = root.parent(growth, 0.15);
        assert!(parent.radius > root.radius);
        let back = parent.child(growth.inverse(), 0.15);
        assert!(approx(back.center, root.center));
        assert!((back.radius - root.radius).abs() < 1e-3);
        assert!((back.overlap - root.overlap).abs() < 1e-3);
    }
}

#[test]
fn test_parent_without_overlap_doubles() {
    let root = NodeBounds::new(Vec3::ZERO, 10.0, 0.0);
    let parent = root.parent(Octant::new(7), 0.0);
    assert!((parent.radius - 20.0).abs() < 1e-5);
    assert!(approx(parent.center, Vec3::splat(10.0)));
}

#[test]
fn test_child_reaches_parent_outer_face() {
    let parent = NodeBounds::new(Vec3::new(-4.0, 9.0, 2.5), 40.0, 0.2);
    for octant in Octant::all() {
        let child = parent.child(octant, 0.2);
        let signs = octant.signs();
        let outer_face = parent.center + signs * parent.effective_radius();
        let child_face = child.center + signs * child.effective_radius();
        assert!(approx(child_face, outer_face));
    }
}
