/// Bounding volumes used by the octree: world boxes, entity spheres and
/// the overlap-aware cubic region of a node.

use glam::Vec3;
use super::classification::Octant;

// ===== AABB =====

/// Axis-Aligned Bounding Box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Test if this AABB fully contains another AABB.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this AABB contains a point (boundary inclusive).
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Test if this AABB intersects (overlaps) another AABB.
    ///
    /// Returns `true` if the two AABBs overlap or touch.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

// ===== BOUNDING SPHERE =====

/// World-space bounding sphere of a tracked entity part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// A sphere the octree can place: finite center, finite radius >= 0
    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius >= 0.0
    }

    /// Sphere-sphere overlap (touching counts)
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }

    pub fn aabb(&self) -> AABB {
        AABB {
            min: self.center - Vec3::splat(self.radius),
            max: self.center + Vec3::splat(self.radius),
        }
    }
}

// ===== NODE BOUNDS =====

/// Cubic region of an octree node.
///
/// `radius` is the nominal half-extent; the node actually accepts objects
/// out to `radius + overlap` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBounds {
    pub center: Vec3,
    pub radius: f32,
    pub overlap: f32,
}

impl NodeBounds {
    pub fn new(center: Vec3, radius: f32, overlap_pct: f32) -> Self {
        Self {
            center,
            radius,
            overlap: radius * overlap_pct,
        }
    }

    /// Half-extent including the overlap band
    #[inline]
    pub fn effective_radius(&self) -> f32 {
        self.radius + self.overlap
    }

    pub fn min(&self) -> Vec3 {
        self.center - Vec3::splat(self.effective_radius())
    }

    pub fn max(&self) -> Vec3 {
        self.center + Vec3::splat(self.effective_radius())
    }

    pub fn aabb(&self) -> AABB {
        AABB { min: self.min(), max: self.max() }
    }

    /// Radius of the sphere circumscribing the effective cube
    pub fn bounding_radius(&self) -> f32 {
        self.effective_radius() * 3.0_f32.sqrt()
    }

    /// Bounds of the child at `octant`.
    ///
    /// The child's effective cube touches the parent's outer face on the
    /// octant side and reaches `2 * overlap` past the center on the other,
    /// so it never pokes out of the parent. The child radius is half the
    /// parent's effective radius, which [`parent`](Self::parent) inverts.
    pub fn child(&self, octant: Octant, overlap_pct: f32) -> NodeBounds {
        let radius = self.effective_radius() * 0.5;
        let overlap = radius * overlap_pct;
        let offset = radius - overlap;
        NodeBounds {
            center: self.center + octant.signs() * offset,
            radius,
            overlap,
        }
    }

    /// Bounds of a new parent growing toward `growth`, chosen so that the
    /// parent's `child(growth.inverse())` is exactly `self`.
    pub fn parent(&self, growth: Octant, overlap_pct: f32) -> NodeBounds {
        let radius = 2.0 * self.radius / (1.0 + overlap_pct);
        NodeBounds {
            center: self.center + growth.signs() * (self.radius - self.overlap),
            radius,
            overlap: radius * overlap_pct,
        }
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
