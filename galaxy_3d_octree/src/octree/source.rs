/// Host interface: how the octree reads world positions.
///
/// The octree never owns the caller's objects. It stores an opaque source
/// key per entity and asks an [`EntitySource`] for the current bounding
/// sphere of each tracked part whenever it adds or updates.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{BuildHasher, Hash};
use crate::geometry::BoundingSphere;

/// Key identifying a caller object
pub trait SourceKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> SourceKey for T {}

/// Which piece of a source object an entity descriptor tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Whole,
    Face(u32),
    Vertex(u32),
}

/// How `Octree::add` splits a source object into descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decomposition {
    #[default]
    Whole,
    Faces,
    Vertices,
}

/// World-space position provider.
///
/// Positions must be current before `add` or `update` is called; the
/// octree does no transform propagation of its own.
pub trait EntitySource<K> {
    /// Bounding sphere of one part, `None` if the host cannot locate it
    fn bounds(&self, source: K, part: Part) -> Option<BoundingSphere>;

    /// Parts a source object breaks into for `decomposition`
    fn parts(&self, _source: K, _decomposition: Decomposition) -> Vec<Part> {
        vec![Part::Whole]
    }
}

/// A plain map of whole-object spheres
impl<K: SourceKey, S: BuildHasher> EntitySource<K> for HashMap<K, BoundingSphere, S> {
    fn bounds(&self, source: K, part: Part) -> Option<BoundingSphere> {
        match part {
            Part::Whole => self.get(&source).copied(),
            Part::Face(_) | Part::Vertex(_) => None,
        }
    }
}
