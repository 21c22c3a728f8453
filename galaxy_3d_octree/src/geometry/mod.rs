//! Geometry predicates
//!
//! Bounding volumes, octant classification and the intersection tests the
//! octree prunes its searches with. Everything here is pure.

mod bounds;
mod classification;
mod intersection;

pub use bounds::{AABB, BoundingSphere, NodeBounds};
pub use classification::{classify, growth_octant, Classification, DirectionFlags, Octant};
pub use intersection::{
    aabb_overlap, closest_point_on_ray, ray_intersects_bounds, sphere_intersects_bounds,
};
