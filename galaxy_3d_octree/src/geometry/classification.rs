/// Octant classification of an entity sphere against a node.
///
/// Every (node, sphere) pair lands in exactly one of three cases:
/// - `Inside(octant)`: the sphere fits the child region at `octant`
/// - `Straddle`: the sphere crosses the overlap band around the center
/// - `Outside(flags)`: the sphere pokes out of the node's effective cube;
///   `flags` names every face it crosses

use bitflags::bitflags;
use glam::Vec3;
use super::bounds::NodeBounds;

// ===== DIRECTION FLAGS =====

bitflags! {
    /// Outward directions an entity crosses when it leaves a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirectionFlags: u8 {
        const POS_X = 1 << 0;
        const NEG_X = 1 << 1;
        const POS_Y = 1 << 2;
        const NEG_Y = 1 << 3;
        const POS_Z = 1 << 4;
        const NEG_Z = 1 << 5;
    }
}

impl DirectionFlags {
    /// Flag for one face: `axis` 0 = X, 1 = Y, 2 = Z
    pub fn outward(axis: usize, positive: bool) -> Self {
        debug_assert!(axis < 3);
        Self::from_bits_truncate(1 << (axis * 2 + usize::from(!positive)))
    }
}

// ===== OCTANT =====

/// One of the 8 child slots of a node.
///
/// Bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = negative side, 1 = positive side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Octant(u8);

impl Octant {
    pub fn new(index: u8) -> Self {
        debug_assert!(index < 8);
        Self(index & 7)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Octant on the opposite side of every axis
    pub fn inverse(self) -> Self {
        Self(self.0 ^ 7)
    }

    /// Whether this octant sits on the positive side of `axis`
    #[inline]
    pub fn is_positive(self, axis: usize) -> bool {
        self.0 & (1 << axis) != 0
    }

    /// +1 / -1 per axis
    pub fn signs(self) -> Vec3 {
        let sign = |axis| if self.is_positive(axis) { 1.0 } else { -1.0 };
        Vec3::new(sign(0), sign(1), sign(2))
    }

    /// Octant whose positive bits are the strictly positive components
    pub fn from_signs(v: Vec3) -> Self {
        Self(
            u8::from(v.x > 0.0)
                | (u8::from(v.y > 0.0) << 1)
                | (u8::from(v.z > 0.0) << 2),
        )
    }

    pub fn all() -> impl Iterator<Item = Octant> {
        (0..8u8).map(Octant)
    }
}

// ===== CLASSIFICATION =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Inside(Octant),
    Straddle,
    Outside(DirectionFlags),
}

impl Classification {
    pub fn is_inside(&self) -> bool {
        matches!(self, Classification::Inside(_))
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Classification::Outside(_))
    }

    pub fn octant(&self) -> Option<Octant> {
        match self {
            Classification::Inside(octant) => Some(*octant),
            _ => None,
        }
    }
}

/// Classify a sphere against a node.
///
/// Outside wins over everything: a sphere crossing any effective face is
/// reported with all the faces it crosses. Otherwise each axis must keep
/// the sphere clear of the overlap band around the center, or the result
/// is `Straddle`.
pub fn classify(bounds: &NodeBounds, position: Vec3, radius: f32) -> Classification {
    let delta = position - bounds.center;
    let effective = bounds.effective_radius();

    let mut outside = DirectionFlags::empty();
    for axis in 0..3 {
        let d = delta[axis];
        if d.abs() + radius > effective {
            outside |= DirectionFlags::outward(axis, d > 0.0);
        }
    }
    if !outside.is_empty() {
        return Classification::Outside(outside);
    }

    let overlap = bounds.overlap;
    let mut index = 0u8;
    for axis in 0..3 {
        let d = delta[axis];
        if d - radius > -overlap {
            index |= 1 << axis;
        } else if d + radius >= overlap {
            return Classification::Straddle;
        }
    }
    Classification::Inside(Octant(index))
}

/// Pick the octant a new root should grow toward.
///
/// `counts` holds how many outside entities push on each face, ordered
/// `+X, -X, +Y, -Y, +Z, -Z`. Faces are taken by descending count (ties keep
/// list order) until every axis has a side; an axis nobody pushes on gets
/// its positive side.
pub fn growth_octant(counts: &[usize; 6]) -> Octant {
    let mut order: [usize; 6] = [0, 1, 2, 3, 4, 5];
    order.sort_by(|a, b| counts[*b].cmp(&counts[*a]));

    let mut chosen = [None::<bool>; 3];
    for face in order {
        let axis = face / 2;
        if chosen[axis].is_none() {
            chosen[axis] = Some(face % 2 == 0);
        }
    }

    let mut index = 0u8;
    for (axis, positive) in chosen.iter().enumerate() {
        if positive.unwrap_or(true) {
            index |= 1 << axis;
        }
    }
    Octant(index)
}

#[cfg(test)]
#[path = "classification_tests.rs"]
mod tests;
