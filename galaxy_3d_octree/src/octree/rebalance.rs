//! Growth and shrink state machine
//!
//! How a descriptor is handled depends on its classification against the
//! node it reaches:
//!
//! | Classification            | Action                                          |
//! |---------------------------|-------------------------------------------------|
//! | inside, node has children | descend (creating the child slot if missing)    |
//! | inside, leaf node         | store here, split later if the node overflows   |
//! | straddle                  | store here                                      |
//! | outside, node has parent  | hand over to the parent                         |
//! | outside, root             | store here and grow a new root (expand)         |
//!
//! Removal runs the reverse: the vacated node checks whether its subtree can
//! fold into an ancestor (merge) and the root checks whether it can hand the
//! root role to its heaviest child (contract).

use crate::geometry::{classify, growth_octant, Classification, DirectionFlags, NodeBounds, Octant};
use crate::{octree_debug, octree_trace};
use super::entity::EntityKey;
use super::node::NodeKey;
use super::octree::{Octree, LOG_SOURCE};
use super::source::SourceKey;

/// Nodes whose radius falls under this fraction of their coordinate
/// magnitude stop splitting: their children would be indistinguishable in f32.
const SPLIT_PRECISION: f32 = f32::EPSILON * 64.0;

impl<K: SourceKey> Octree<K> {
    // ===== INSERTION =====

    /// Insert a placed-or-pending descriptor starting the walk at `start`,
    /// then let the receiving node react (split or expand).
    pub(super) fn add_object(&mut self, start: NodeKey, entity: EntityKey) {
        let Some((target, classification)) = self.place(start, entity) else {
            return;
        };
        if target == self.root && classification.is_outside() {
            self.expand_root();
        } else {
            self.grow_check(target);
        }
    }

    /// Walk from `start` to the node that should hold `entity` and attach it
    /// there. Creates missing child slots on the way down.
    ///
    /// The walk only descends into a child whose real bounds hold the
    /// entity, so it can never bounce between a node and its parent.
    pub(super) fn place(&mut self, start: NodeKey, entity: EntityKey) -> Option<(NodeKey, Classification)> {
        let (position, radius) = {
            let descriptor = self.entities.get(entity)?;
            (descriptor.position(), descriptor.radius())
        };

        let mut current = start;
        loop {
            let node = self.nodes.get(current)?;
            let classification = classify(&node.bounds, position, radius);

            match classification {
                Classification::Inside(octant)
                    if node.has_children() && self.config.can_split_at(node.depth) =>
                {
                    let child_bounds = self.child_bounds(current, octant)?;
                    if !classify(&child_bounds, position, radius).is_outside() {
                        current = self.branch(current, octant)?;
                        continue;
                    }
                }
                Classification::Outside(_) => {
                    if let Some(parent) = node.parent {
                        current = parent;
                        continue;
                    }
                }
                _ => {}
            }

            self.attach(current, entity, classification);
            return Some((current, classification));
        }
    }

    /// Push `entity` into `node`'s direct objects
    fn attach(&mut self, node: NodeKey, entity: EntityKey, classification: Classification) {
        let Some(target) = self.nodes.get_mut(node) else { return };
        let Some(descriptor) = self.entities.get_mut(entity) else { return };
        target.objects.push(entity);
        descriptor.node = Some(node);
        descriptor.set_classification(classification);
    }

    /// Attach without any walk, classifying against `node` for the cache
    fn attach_flat(&mut self, node: NodeKey, entity: EntityKey) {
        let (Some(target), Some(descriptor)) = (self.nodes.get(node), self.entities.get(entity)) else {
            return;
        };
        let classification = classify(&target.bounds, descriptor.position(), descriptor.radius());
        self.attach(node, entity, classification);
    }

    /// Bounds of the child at `octant`, whether or not it exists yet
    fn child_bounds(&self, parent: NodeKey, octant: Octant) -> Option<NodeBounds> {
        let node = self.nodes.get(parent)?;
        match node.child(octant).and_then(|child| self.nodes.get(child)) {
            Some(child) => Some(child.bounds),
            None => Some(node.bounds.child(octant, self.config.overlap_pct)),
        }
    }

    /// Child of `parent` at `octant`, created on demand
    fn branch(&mut self, parent: NodeKey, octant: Octant) -> Option<NodeKey> {
        let node = self.nodes.get(parent)?;
        if let Some(child) = node.child(octant) {
            return Some(child);
        }

        let bounds = node.bounds.child(octant, self.config.overlap_pct);
        let depth = node.depth + 1;
        let parent_id = node.id;

        let child = self.create_node(bounds, depth);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.octant = Some(octant);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children[octant.index()] = Some(child);
        }
        octree_trace!(LOG_SOURCE, "branch node {} octant {} at depth {}", parent_id, octant.index(), depth);
        Some(child)
    }

    // ===== GROWTH =====

    fn grow_check(&mut self, node: NodeKey) {
        self.grow_check_with(node, true);
    }

    fn grow_check_with(&mut self, node: NodeKey, allow_expand: bool) {
        let threshold = self.config.objects_threshold;
        let Some(target) = self.nodes.get(node) else { return };
        if threshold > 0 && target.objects.len() > threshold {
            self.grow(node, allow_expand);
        }
    }

    /// Sort an overfull node's objects into the ones that fit a child, the
    /// ones outside the node and the straddlers, then split and expand.
    fn grow(&mut self, key: NodeKey, allow_expand: bool) {
        let Some(node) = self.nodes.get_mut(key) else { return };
        let objects = std::mem::take(&mut node.objects);
        let bounds = node.bounds;
        let parent = node.parent;

        let mut inside = Vec::new();
        let mut outside = Vec::new();
        let mut straddle = Vec::new();
        for entity in objects {
            let Some(descriptor) = self.entities.get_mut(entity) else { continue };
            let classification = classify(&bounds, descriptor.position(), descriptor.radius());
            match classification {
                Classification::Inside(_) => inside.push(entity),
                Classification::Outside(_) => outside.push(entity),
                Classification::Straddle => {
                    descriptor.set_classification(classification);
                    straddle.push(entity);
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.objects = straddle;
        }

        let mut expanded_root = None;
        let handed_up = parent.is_some() && !outside.is_empty();
        if !outside.is_empty() {
            match parent {
                Some(parent) => {
                    for entity in outside {
                        self.add_object(parent, entity);
                    }
                }
                None if allow_expand => {
                    let receivers = self.expand(outside);
                    expanded_root = Some(self.root);
                    self.settle(receivers);
                }
                None => {
                    for entity in outside {
                        self.attach_flat(key, entity);
                    }
                }
            }
        }

        let (leftover, receivers) = self.split(key, inside);
        for entity in leftover {
            self.attach_flat(key, entity);
        }
        let receivers = receivers
            .into_iter()
            .filter(|receiver| Some(*receiver) != expanded_root)
            .collect();
        self.settle(receivers);

        // An expanded root's old self keeps its children even when light
        if handed_up {
            self.merge_check(key);
        }
    }

    /// Grow-check every node that just received objects. The root never
    /// expands again from here: the caller just grew it.
    fn settle(&mut self, mut receivers: Vec<NodeKey>) {
        receivers.sort_unstable();
        receivers.dedup();
        for receiver in receivers {
            let allow_expand = receiver != self.root;
            self.grow_check_with(receiver, allow_expand);
        }
    }

    /// Move objects that fit a child octant down one level. Returns the
    /// objects that stay here and the nodes that received the others.
    fn split(&mut self, key: NodeKey, objects: Vec<EntityKey>) -> (Vec<EntityKey>, Vec<NodeKey>) {
        let Some(node) = self.nodes.get(key) else {
            return (objects, Vec::new());
        };
        if objects.is_empty() || !self.config.can_split_at(node.depth) || !splittable(&node.bounds) {
            return (objects, Vec::new());
        }

        let bounds = node.bounds;
        let id = node.id;
        let depth = node.depth;

        let mut leftover = Vec::new();
        let mut receivers = Vec::new();
        for entity in objects {
            let Some(descriptor) = self.entities.get(entity) else { continue };
            let (position, radius) = (descriptor.position(), descriptor.radius());

            let Classification::Inside(octant) = classify(&bounds, position, radius) else {
                leftover.push(entity);
                continue;
            };
            let fits = self
                .child_bounds(key, octant)
                .is_some_and(|child| !classify(&child, position, radius).is_outside());
            if !fits {
                leftover.push(entity);
                continue;
            }

            match self.branch(key, octant).and_then(|child| self.place(child, entity)) {
                Some((target, _)) => receivers.push(target),
                None => leftover.push(entity),
            }
        }

        octree_trace!(
            LOG_SOURCE,
            "split node {} at depth {}: {} moved down, {} stay",
            id,
            depth,
            receivers.len(),
            leftover.len()
        );
        (leftover, receivers)
    }

    /// An entity reached the root from outside: pull every outside object
    /// off the root and grow one level toward them.
    fn expand_root(&mut self) {
        let root = self.root;
        let Some(node) = self.nodes.get_mut(root) else { return };
        let objects = std::mem::take(&mut node.objects);

        let (outside, staying): (Vec<EntityKey>, Vec<EntityKey>) = objects.into_iter().partition(|entity| {
            self.entities
                .get(*entity)
                .and_then(|descriptor| descriptor.classification)
                .is_some_and(|classification| classification.is_outside())
        });
        node.objects = staying;

        let receivers = self.expand(outside);
        self.settle(receivers);
    }

    /// Install a new root one level up, grown toward where `objects` push,
    /// and reinsert them from it. Returns the nodes that received them.
    ///
    /// Refused when the extra level would exceed `max_depth` or the new
    /// radius overflows; the objects then stay at the current root.
    fn expand(&mut self, objects: Vec<EntityKey>) -> Vec<NodeKey> {
        let old_root = self.root;
        let Some(root) = self.nodes.get(old_root) else { return Vec::new() };
        let bounds = root.bounds;
        let old_id = root.id;

        let mut counts = [0usize; 6];
        for entity in &objects {
            let Some(descriptor) = self.entities.get(*entity) else { continue };
            if let Classification::Outside(flags) = classify(&bounds, descriptor.position(), descriptor.radius()) {
                // classify sets at most one side per axis
                for axis in 0..3 {
                    if flags.contains(DirectionFlags::outward(axis, true)) {
                        counts[axis * 2] += 1;
                    } else if flags.contains(DirectionFlags::outward(axis, false)) {
                        counts[axis * 2 + 1] += 1;
                    }
                }
            }
        }
        let growth = growth_octant(&counts);
        let parent_bounds = bounds.parent(growth, self.config.overlap_pct);

        let too_deep = self.config.max_depth.is_some_and(|max| self.depth() >= max);
        if too_deep || !parent_bounds.radius.is_finite() || !parent_bounds.center.is_finite() {
            for entity in objects {
                self.attach_flat(old_root, entity);
            }
            return vec![old_root];
        }

        let new_root = self.create_node(parent_bounds, 0);
        let slot = growth.inverse();
        if let Some(node) = self.nodes.get_mut(new_root) {
            node.children[slot.index()] = Some(old_root);
        }
        if let Some(node) = self.nodes.get_mut(old_root) {
            node.parent = Some(new_root);
            node.octant = Some(slot);
        }
        self.root = new_root;
        self.recompute_depths(new_root);

        octree_debug!(
            LOG_SOURCE,
            "expand: node {} becomes octant {} of new root (radius {:.3}, {} objects outside)",
            old_id,
            slot.index(),
            parent_bounds.radius,
            objects.len()
        );

        objects
            .into_iter()
            .filter_map(|entity| self.place(new_root, entity).map(|(target, _)| target))
            .collect()
    }

    // ===== SHRINK =====

    /// React to `node` losing objects
    pub(super) fn shrink(&mut self, node: NodeKey) {
        self.merge_check(node);
        self.contract_check();
    }

    /// Walk up while the subtree stays under the threshold and fold the
    /// last such subtree into the ancestor above it.
    fn merge_check(&mut self, node: NodeKey) {
        let threshold = self.config.objects_threshold;
        let mut current = node;
        let mut merged = None;
        loop {
            let Some(parent) = self.nodes.get(current).and_then(|n| n.parent) else { break };
            if self.subtree_object_count(current) >= threshold {
                break;
            }
            merged = Some(current);
            current = parent;
        }

        if let Some(merged) = merged {
            self.merge(current, merged);
        }
    }

    /// Pull every object in `merged`'s subtree into `target` and drop the subtree
    fn merge(&mut self, target: NodeKey, merged: NodeKey) {
        debug_assert!(self.nodes.get(merged).is_some_and(|n| n.parent.is_some()));

        let objects = self.collect_subtree_objects(merged);
        let count = objects.len();
        self.unlink(merged);
        self.destroy_subtree(merged);
        for entity in objects {
            self.attach_flat(target, entity);
        }

        if let Some(node) = self.nodes.get(target) {
            octree_debug!(LOG_SOURCE, "merge {} objects into node {} at depth {}", count, node.id, node.depth);
        }
        self.merge_check(target);
    }

    /// Hand the root role to the heaviest child when everything else would
    /// fit under the threshold.
    fn contract_check(&mut self) {
        let threshold = self.config.objects_threshold;
        let Some(root) = self.nodes.get(self.root) else { return };
        let children: Vec<NodeKey> = root.children().map(|(_, child)| child).collect();
        let mut rest = root.objects.len();

        let mut heaviest: Option<(NodeKey, usize)> = None;
        for child in children {
            let count = self.subtree_object_count(child);
            rest += count;
            if heaviest.map_or(true, |(_, best)| count > best) {
                heaviest = Some((child, count));
            }
        }

        if let Some((child, count)) = heaviest {
            if rest - count < threshold {
                self.contract(child);
            }
        }
    }

    /// Make `new_root` the root, folding every sibling subtree and the old
    /// root's own objects into it.
    fn contract(&mut self, new_root: NodeKey) {
        let old_root = self.root;
        let Some(root) = self.nodes.get_mut(old_root) else { return };
        let mut objects = std::mem::take(&mut root.objects);
        let siblings: Vec<NodeKey> = root
            .children()
            .map(|(_, child)| child)
            .filter(|child| *child != new_root)
            .collect();

        for sibling in siblings {
            objects.extend(self.collect_subtree_objects(sibling));
            self.destroy_subtree(sibling);
        }

        if let Some(node) = self.nodes.get_mut(new_root) {
            node.parent = None;
            node.octant = None;
        }
        self.destroy_node(old_root);
        self.root = new_root;
        self.recompute_depths(new_root);

        let count = objects.len();
        for entity in objects {
            self.attach_flat(new_root, entity);
        }
        octree_debug!(LOG_SOURCE, "contract: {} objects folded into new root", count);

        self.contract_check();
    }

    // ===== SUBTREE HELPERS =====

    /// Reset depths below `top` after it was re-parented
    fn recompute_depths(&mut self, top: NodeKey) {
        let Some(node) = self.nodes.get_mut(top) else { return };
        if node.parent.is_none() {
            node.depth = 0;
        }

        let mut stack = vec![top];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            let depth = node.depth + 1;
            let children: Vec<NodeKey> = node.children().map(|(_, child)| child).collect();
            for child in children {
                if let Some(child_node) = self.nodes.get_mut(child) {
                    child_node.depth = depth;
                    stack.push(child);
                }
            }
        }
    }

    /// Objects in `top`'s whole subtree
    pub(super) fn subtree_object_count(&self, top: NodeKey) -> usize {
        let mut count = 0;
        let mut stack = vec![top];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            count += node.objects.len();
            stack.extend(node.children().map(|(_, child)| child));
        }
        count
    }

    /// Objects in `top`'s subtree, each node's objects before its children's
    fn collect_subtree_objects(&self, top: NodeKey) -> Vec<EntityKey> {
        let mut objects = Vec::new();
        let mut stack = vec![top];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            objects.extend_from_slice(&node.objects);
            let children: Vec<NodeKey> = node.children().map(|(_, child)| child).collect();
            stack.extend(children.into_iter().rev());
        }
        objects
    }

    /// Remove `key` from its parent's child slots
    fn unlink(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else { return };
        let (Some(parent), Some(octant)) = (node.parent, node.octant) else { return };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children[octant.index()] = None;
        }
    }

    /// Drop `top` and all its descendants from the arena
    fn destroy_subtree(&mut self, top: NodeKey) {
        let mut stack = vec![top];
        let mut doomed = Vec::new();
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            stack.extend(node.children().map(|(_, child)| child));
            doomed.push(key);
        }
        for key in doomed {
            self.destroy_node(key);
        }
    }
}

fn splittable(bounds: &NodeBounds) -> bool {
    let scale = 1.0 + bounds.center.abs().max_element();
    bounds.radius > scale * SPLIT_PRECISION
}

#[cfg(test)]
#[path = "rebalance_tests.rs"]
mod tests;
