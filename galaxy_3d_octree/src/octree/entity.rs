/// Entity descriptor: one tracked part of a caller object.

use glam::Vec3;
use slotmap::new_key_type;
use crate::geometry::{BoundingSphere, Classification};
use super::node::NodeKey;
use super::source::Part;

new_key_type! {
    /// Stable key of an entity descriptor in the octree's entity arena
    pub struct EntityKey;
}

#[derive(Debug, Clone)]
pub struct EntityDescriptor<K> {
    source: K,
    part: Part,
    position: Vec3,
    radius: f32,
    /// Position at the last classification, for change detection
    last_position: Vec3,
    /// Owning node; `None` while pending insertion
    pub(crate) node: Option<NodeKey>,
    /// Classification against `node` when it was last computed
    pub(crate) classification: Option<Classification>,
}

impl<K: Copy> EntityDescriptor<K> {
    pub(crate) fn new(source: K, part: Part, sphere: BoundingSphere) -> Self {
        Self {
            source,
            part,
            position: sphere.center,
            radius: sphere.radius,
            last_position: sphere.center,
            node: None,
            classification: None,
        }
    }

    pub fn source(&self) -> K {
        self.source
    }

    pub fn part(&self) -> Part {
        self.part
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }

    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.position, self.radius)
    }

    /// Node currently holding this descriptor
    pub fn node(&self) -> Option<NodeKey> {
        self.node
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    /// Store a fresh sphere from the host. Returns whether the entity moved
    /// or changed size since it was last classified.
    pub(crate) fn refresh(&mut self, sphere: BoundingSphere) -> bool {
        let resized = self.radius != sphere.radius;
        self.position = sphere.center;
        self.radius = sphere.radius;
        resized || self.position != self.last_position
    }

    /// Record the classification against the owning node
    pub(crate) fn set_classification(&mut self, classification: Classification) {
        self.classification = Some(classification);
        self.last_position = self.position;
    }
}
