/// Optional debug side channel for drawing node boxes.
///
/// The octree only pushes events; it never reads anything back.

use glam::Vec3;

/// A node appearing or disappearing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEvent {
    pub id: u64,
    pub center: Vec3,
    /// Full half-extent, radius plus overlap
    pub extent: f32,
}

pub trait NodeVisualizer {
    fn on_node_created(&mut self, event: &NodeEvent);
    fn on_node_destroyed(&mut self, event: &NodeEvent);
}
