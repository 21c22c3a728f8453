/// Query predicates against node regions.
///
/// Both tests are conservative: they may accept a node that holds nothing
/// matching, never reject one that does.

use glam::Vec3;
use super::bounds::{NodeBounds, AABB};

/// Sphere vs the node's overlap-inclusive cube.
///
/// Sums the squared gap between the sphere center and the box on every
/// axis where the center lies outside it; the sphere reaches the box when
/// `radius² - gaps >= 0`.
pub fn sphere_intersects_bounds(bounds: &NodeBounds, center: Vec3, radius: f32) -> bool {
    let min = bounds.min();
    let max = bounds.max();

    let query = AABB {
        min: center - Vec3::splat(radius),
        max: center + Vec3::splat(radius),
    };
    if !aabb_overlap(&query, &AABB { min, max }) {
        return false;
    }

    let mut remaining = radius * radius;
    for axis in 0..3 {
        let c = center[axis];
        if c < min[axis] {
            let gap = c - min[axis];
            remaining -= gap * gap;
        } else if c > max[axis] {
            let gap = c - max[axis];
            remaining -= gap * gap;
        }
    }
    remaining >= 0.0
}

/// Closest point to `target` on the ray `origin + t * direction`.
///
/// `direction` must be normalized. `t` is clamped to `[0, max_distance]`
/// when `max_distance` is finite and positive, to `[0, inf)` otherwise.
pub fn closest_point_on_ray(origin: Vec3, direction: Vec3, max_distance: f32, target: Vec3) -> Vec3 {
    let mut t = (target - origin).dot(direction).max(0.0);
    if max_distance.is_finite() && max_distance > 0.0 {
        t = t.min(max_distance);
    }
    origin + direction * t
}

/// Ray vs node, treating the node as the sphere circumscribing its
/// effective cube.
///
/// The closest point on the ray to the node center is compared against that
/// sphere, so rays that only clip a corner of the cube are still accepted.
pub fn ray_intersects_bounds(bounds: &NodeBounds, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
    let closest = closest_point_on_ray(origin, direction, max_distance, bounds.center);
    let reach = bounds.bounding_radius();
    closest.distance_squared(bounds.center) <= reach * reach
}

/// Axis-aligned overlap, touching counts.
#[inline]
pub fn aabb_overlap(a: &AABB, b: &AABB) -> bool {
    a.intersects(b)
}

#[cfg(test)]
#[path = "intersection_tests.rs"]
mod tests;
