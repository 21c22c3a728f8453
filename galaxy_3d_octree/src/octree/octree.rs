/// Octree - Dynamic sparse loose octree for moving entities.
///
/// Each tracked part (whole object, face or vertex) becomes one
/// [`EntityDescriptor`] stored in exactly one node: the deepest node whose
/// child octants cannot hold it any more. Entities straddling the overlap
/// band around a node's center stay in that node instead of being
/// duplicated into several children.
///
/// The tree is sparse and self-sizing:
/// - an overfull node splits its objects into lazily created children
/// - an entity outside the root grows a new root above it (expand)
/// - underfull subtrees fold back into an ancestor (merge)
/// - a root whose weight sits in one child hands the root role to that
///   child (contract)
///
/// Nodes and descriptors live in slotmap arenas. The tree is the only
/// holder of the current root key; callers must re-read [`Octree::root_key`]
/// after any mutation.

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::geometry::{classify, BoundingSphere, NodeBounds};
use crate::{octree_err, octree_error, octree_info};
use super::config::OctreeConfig;
use super::entity::{EntityDescriptor, EntityKey};
use super::node::{NodeKey, OctreeNode};
use super::source::{Decomposition, EntitySource, Part, SourceKey};
use super::visualizer::{NodeEvent, NodeVisualizer};

pub(super) const LOG_SOURCE: &str = "galaxy3d::Octree";

pub struct Octree<K> {
    pub(super) config: OctreeConfig,
    pub(super) nodes: SlotMap<NodeKey, OctreeNode>,
    pub(super) root: NodeKey,
    pub(super) entities: SlotMap<EntityKey, EntityDescriptor<K>>,
    /// Source object → its descriptors, in decomposition order
    pub(super) registry: FxHashMap<K, Vec<EntityKey>>,
    /// Descriptors registered but not yet placed (deferred insertion)
    pub(super) pending: Vec<EntityKey>,
    pub(super) next_node_id: u64,
    pub(super) visualizer: Option<Box<dyn NodeVisualizer>>,
}

impl<K: SourceKey> Octree<K> {
    /// Create an empty tree with a single root node.
    ///
    /// Malformed configuration values are replaced by their defaults.
    pub fn new(config: OctreeConfig) -> Self {
        let config = config.sanitized();
        let mut tree = Self {
            config,
            nodes: SlotMap::with_key(),
            root: NodeKey::default(),
            entities: SlotMap::with_key(),
            registry: FxHashMap::default(),
            pending: Vec::new(),
            next_node_id: 0,
            visualizer: None,
        };
        tree.root = tree.create_root();
        tree
    }

    fn create_root(&mut self) -> NodeKey {
        let bounds = NodeBounds::new(Vec3::ZERO, self.config.initial_radius, self.config.overlap_pct);
        self.create_node(bounds, 0)
    }

    // ===== MUTATION =====

    /// Start tracking `source`.
    ///
    /// One descriptor is created per part `host.parts` yields for
    /// `decomposition`. Adding a source that is already tracked is a no-op;
    /// to change its decomposition, remove and add it again.
    ///
    /// Every part is located before the tree is touched, so an error leaves
    /// the tree unchanged. With deferred insertion the host is not queried
    /// until the next [`update`](Self::update).
    pub fn add<S>(&mut self, source: K, decomposition: Decomposition, host: &S) -> Result<()>
    where
        S: EntitySource<K> + ?Sized,
    {
        if self.registry.contains_key(&source) {
            return Ok(());
        }

        let mut seen = FxHashSet::default();
        let parts: Vec<Part> = host
            .parts(source, decomposition)
            .into_iter()
            .filter(|part| seen.insert(*part))
            .collect();
        let located: Vec<(Part, BoundingSphere)> = if self.config.defer_insertion {
            parts
                .into_iter()
                .map(|part| (part, BoundingSphere::new(Vec3::ZERO, 0.0)))
                .collect()
        } else {
            parts
                .into_iter()
                .map(|part| locate(host, source, part).map(|sphere| (part, sphere)))
                .collect::<Result<_>>()?
        };

        let keys: Vec<EntityKey> = located
            .into_iter()
            .map(|(part, sphere)| self.entities.insert(EntityDescriptor::new(source, part, sphere)))
            .collect();
        self.registry.insert(source, keys.clone());

        for key in keys {
            if self.config.defer_insertion {
                self.pending.push(key);
            } else {
                let root = self.root;
                self.add_object(root, key);
            }
        }
        Ok(())
    }

    /// Stop tracking `source`. Returns `false` if it was not tracked.
    ///
    /// Every node that lost an object is shrunk afterwards, which may merge
    /// subtrees and contract the root.
    pub fn remove(&mut self, source: K) -> bool {
        let Some(keys) = self.registry.remove(&source) else {
            return false;
        };

        let mut vacated = Vec::new();
        for key in keys {
            match self.detach(key) {
                Some(node) => vacated.push(node),
                None => self.pending.retain(|pending| *pending != key),
            }
            self.entities.remove(key);
        }

        for node in vacated {
            self.shrink(node);
        }
        true
    }

    /// Resynchronize every descriptor with the host.
    ///
    /// All positions are read first; if any part cannot be located the
    /// tree is left untouched. Pending descriptors are then placed, and
    /// every descriptor whose classification against its node changed is
    /// reinserted from the root.
    pub fn update<S>(&mut self, host: &S) -> Result<()>
    where
        S: EntitySource<K> + ?Sized,
    {
        let mut fresh = Vec::with_capacity(self.entities.len());
        for (key, entity) in &self.entities {
            fresh.push((key, locate(host, entity.source(), entity.part())?));
        }

        let mut moved = Vec::new();
        for (key, sphere) in fresh {
            if let Some(entity) = self.entities.get_mut(key) {
                if entity.refresh(sphere) && entity.node.is_some() {
                    moved.push(key);
                }
            }
        }

        for key in std::mem::take(&mut self.pending) {
            let root = self.root;
            self.add_object(root, key);
        }

        for key in moved {
            let Some(entity) = self.entities.get(key) else { continue };
            let Some(node_key) = entity.node else { continue };
            let Some(node) = self.nodes.get(node_key) else { continue };

            let classification = classify(&node.bounds, entity.position(), entity.radius());
            // A merge earlier in this pass may have cached the new position
            // already, so an unchanged Outside below the root still has to move
            let escaped = classification.is_outside() && node.parent.is_some();
            if entity.classification == Some(classification) && !escaped {
                if let Some(entity) = self.entities.get_mut(key) {
                    entity.set_classification(classification);
                }
                continue;
            }

            self.detach(key);
            self.shrink(node_key);
            let root = self.root;
            self.add_object(root, key);
        }
        Ok(())
    }

    /// Explicit full resync, for hosts that do not update every frame.
    pub fn rebuild<S>(&mut self, host: &S) -> Result<()>
    where
        S: EntitySource<K> + ?Sized,
    {
        self.update(host)
    }

    /// Drop every entity and reset to a single root of `initial_radius`
    pub fn clear(&mut self) {
        let keys: Vec<NodeKey> = self.nodes.keys().collect();
        for key in keys {
            self.destroy_node(key);
        }
        self.entities.clear();
        self.registry.clear();
        self.pending.clear();
        self.root = self.create_root();
        octree_info!(LOG_SOURCE, "cleared, root radius {}", self.config.initial_radius);
    }

    // ===== INTROSPECTION =====

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Key of the current root. Expand and contract replace the root, so
    /// never hold on to this across a mutation.
    pub fn root_key(&self) -> NodeKey {
        self.root
    }

    pub fn root(&self) -> Option<&OctreeNode> {
        self.nodes.get(self.root)
    }

    pub fn node(&self, key: NodeKey) -> Option<&OctreeNode> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &OctreeNode)> {
        self.nodes.iter()
    }

    pub fn entity(&self, key: EntityKey) -> Option<&EntityDescriptor<K>> {
        self.entities.get(key)
    }

    /// Descriptors tracked for `source`, empty if it is not tracked
    pub fn entities_of(&self, source: K) -> &[EntityKey] {
        self.registry.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, source: K) -> bool {
        self.registry.contains_key(&source)
    }

    /// Depth of the deepest node (root = 0)
    pub fn depth(&self) -> u32 {
        self.nodes.values().map(OctreeNode::depth).max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Descriptors currently placed in a node
    pub fn object_count(&self) -> usize {
        self.entities.len() - self.pending.len()
    }

    /// Tracked source objects
    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Indented structural dump, one line per node, children in octant order
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            let slot = node.octant.map_or_else(|| "root".to_string(), |o| format!("octant {}", o.index()));
            let c = node.bounds.center;
            out.push_str(&format!(
                "{}node {} [{}] depth {} center ({:.3}, {:.3}, {:.3}) radius {:.3} overlap {:.3} objects {}\n",
                "  ".repeat(node.depth as usize),
                node.id,
                slot,
                node.depth,
                c.x,
                c.y,
                c.z,
                node.bounds.radius,
                node.bounds.overlap,
                node.objects.len(),
            ));
            let children: Vec<NodeKey> = node.children().map(|(_, child)| child).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    // ===== VISUALIZATION =====

    /// Attach a visualizer. Every live node is reported as created first.
    pub fn set_visualizer(&mut self, mut visualizer: Box<dyn NodeVisualizer>) {
        for node in self.nodes.values() {
            visualizer.on_node_created(&node_event(node));
        }
        self.visualizer = Some(visualizer);
    }

    pub fn take_visualizer(&mut self) -> Option<Box<dyn NodeVisualizer>> {
        self.visualizer.take()
    }

    // ===== NODE ARENA =====

    pub(super) fn create_node(&mut self, bounds: NodeBounds, depth: u32) -> NodeKey {
        let id = self.next_node_id;
        self.next_node_id += 1;
        let node = OctreeNode::new(id, bounds, depth);
        if let Some(visualizer) = self.visualizer.as_mut() {
            visualizer.on_node_created(&node_event(&node));
        }
        self.nodes.insert(node)
    }

    pub(super) fn destroy_node(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.remove(key) {
            if let Some(visualizer) = self.visualizer.as_mut() {
                visualizer.on_node_destroyed(&node_event(&node));
            }
        }
    }

    /// Unlink a descriptor from its node. Returns the node it left.
    pub(super) fn detach(&mut self, key: EntityKey) -> Option<NodeKey> {
        let entity = self.entities.get_mut(key)?;
        let node_key = entity.node.take()?;
        entity.classification = None;
        if let Some(node) = self.nodes.get_mut(node_key) {
            if let Some(index) = node.objects.iter().position(|object| *object == key) {
                node.objects.remove(index);
            }
        }
        Some(node_key)
    }
}

fn node_event(node: &OctreeNode) -> NodeEvent {
    NodeEvent {
        id: node.id,
        center: node.bounds.center,
        extent: node.bounds.effective_radius(),
    }
}

/// Read one part's sphere from the host, rejecting anything that would
/// poison the tree geometry.
fn locate<K, S>(host: &S, source: K, part: Part) -> Result<BoundingSphere>
where
    K: SourceKey,
    S: EntitySource<K> + ?Sized,
{
    let Some(sphere) = host.bounds(source, part) else {
        octree_error!(LOG_SOURCE, "no position for {:?} ({:?})", source, part);
        return Err(Error::PositionUnavailable(format!("{:?} ({:?})", source, part)));
    };
    if !sphere.is_valid() {
        return Err(octree_err!(
            LOG_SOURCE,
            "{:?} ({:?}) has invalid bounds: center {:?}, radius {}",
            source,
            part,
            sphere.center,
            sphere.radius
        ));
    }
    Ok(sphere)
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
