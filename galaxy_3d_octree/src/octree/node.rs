/// Octree node stored in the tree's node arena.
///
/// Parent and children are arena keys; the tree owns every node. A node
/// only holds its direct objects: entities that straddle its children or
/// that arrived before a matching child existed.

use slotmap::new_key_type;
use crate::geometry::{NodeBounds, Octant};
use super::entity::EntityKey;

new_key_type! {
    /// Key of a node in the octree's node arena
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Ordinal from the tree's monotonic counter
    pub(crate) id: u64,
    pub(crate) bounds: NodeBounds,
    pub(crate) depth: u32,
    /// Slot in the parent, `None` for the root
    pub(crate) octant: Option<Octant>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: [Option<NodeKey>; 8],
    pub(crate) objects: Vec<EntityKey>,
}

impl OctreeNode {
    pub(crate) fn new(id: u64, bounds: NodeBounds, depth: u32) -> Self {
        Self {
            id,
            bounds,
            depth,
            octant: None,
            parent: None,
            children: [None; 8],
            objects: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bounds(&self) -> &NodeBounds {
        &self.bounds
    }

    /// Distance from the current root (root = 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn octant(&self) -> Option<Octant> {
        self.octant
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn child(&self, octant: Octant) -> Option<NodeKey> {
        self.children[octant.index()]
    }

    /// Existing children with their slots
    pub fn children(&self) -> impl Iterator<Item = (Octant, NodeKey)> + '_ {
        Octant::all().filter_map(move |octant| self.children[octant.index()].map(|key| (octant, key)))
    }

    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    /// Direct objects, in insertion order
    pub fn objects(&self) -> &[EntityKey] {
        &self.objects
    }
}
