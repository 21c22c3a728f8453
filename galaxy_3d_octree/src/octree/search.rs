/// Spatial queries and result assembly.
///
/// Searches never mutate the tree. Sphere queries return exactly the
/// entities whose bounding sphere touches the query sphere. Ray queries
/// return every entity of every node the ray may cross, so callers are
/// expected to run their own narrow phase on the hits.

use glam::Vec3;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::geometry::{ray_intersects_bounds, sphere_intersects_bounds, BoundingSphere, NodeBounds};
use crate::octree_err;
use super::entity::EntityKey;
use super::node::NodeKey;
use super::octree::Octree;
use super::source::{Part, SourceKey};

const LOG_SOURCE: &str = "galaxy3d::Search";

// ===== QUERY =====

/// A sphere or ray query.
///
/// In ray mode `radius` is the maximum distance along `direction`; zero or
/// infinity mean an unbounded ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchQuery {
    pub origin: Vec3,
    pub radius: f32,
    pub direction: Option<Vec3>,
    /// Aggregate hits per source object instead of returning them flat
    pub group_by_entity: bool,
}

impl SearchQuery {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self {
            origin: center,
            radius,
            direction: None,
            group_by_entity: false,
        }
    }

    pub fn ray(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            radius: max_distance,
            direction: Some(direction),
            group_by_entity: false,
        }
    }

    pub fn grouped(mut self) -> Self {
        self.group_by_entity = true;
        self
    }
}

/// Validated query shape
enum Probe {
    Sphere(BoundingSphere),
    Ray { origin: Vec3, direction: Vec3, max_distance: f32 },
}

impl Probe {
    fn from_query(query: &SearchQuery) -> Result<Self> {
        if !query.origin.is_finite() {
            return Err(octree_err!(LOG_SOURCE, "query origin is not finite: {:?}", query.origin));
        }

        match query.direction {
            None => {
                if !(query.radius.is_finite() && query.radius >= 0.0) {
                    return Err(octree_err!(LOG_SOURCE, "sphere radius must be finite and >= 0, got {}", query.radius));
                }
                Ok(Probe::Sphere(BoundingSphere::new(query.origin, query.radius)))
            }
            Some(direction) => {
                if query.radius.is_nan() || query.radius < 0.0 {
                    return Err(octree_err!(LOG_SOURCE, "ray distance must be >= 0, got {}", query.radius));
                }
                if !direction.is_finite() || direction.length_squared() == 0.0 {
                    return Err(octree_err!(LOG_SOURCE, "ray direction must be finite and non-zero, got {:?}", direction));
                }
                Ok(Probe::Ray {
                    origin: query.origin,
                    direction: direction.normalize(),
                    max_distance: query.radius,
                })
            }
        }
    }

    fn reaches(&self, bounds: &NodeBounds) -> bool {
        match self {
            Probe::Sphere(sphere) => sphere_intersects_bounds(bounds, sphere.center, sphere.radius),
            Probe::Ray { origin, direction, max_distance } => {
                ray_intersects_bounds(bounds, *origin, *direction, *max_distance)
            }
        }
    }

    fn accepts(&self, sphere: &BoundingSphere) -> bool {
        match self {
            Probe::Sphere(query) => query.intersects(sphere),
            Probe::Ray { .. } => true,
        }
    }
}

// ===== RESULTS =====

/// One matched descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<K> {
    pub key: EntityKey,
    pub source: K,
    pub part: Part,
    pub sphere: BoundingSphere,
}

/// All hits of one source object
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHits<K> {
    pub source: K,
    /// The whole object matched
    pub whole: bool,
    /// Matched face indices, in hit order
    pub faces: Vec<u32>,
    /// Matched vertex indices, in hit order
    pub vertices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults<K> {
    Flat(Vec<SearchHit<K>>),
    Grouped(Vec<EntityHits<K>>),
}

impl<K> SearchResults<K> {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Flat(hits) => hits.len(),
            SearchResults::Grouped(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_flat(self) -> Option<Vec<SearchHit<K>>> {
        match self {
            SearchResults::Flat(hits) => Some(hits),
            SearchResults::Grouped(_) => None,
        }
    }

    pub fn into_grouped(self) -> Option<Vec<EntityHits<K>>> {
        match self {
            SearchResults::Grouped(groups) => Some(groups),
            SearchResults::Flat(_) => None,
        }
    }
}

/// Fold flat hits into per-source groups, sources in first-hit order
pub fn group_hits<K: SourceKey>(hits: &[SearchHit<K>]) -> Vec<EntityHits<K>> {
    let mut index: FxHashMap<K, usize> = FxHashMap::default();
    let mut groups: Vec<EntityHits<K>> = Vec::new();

    for hit in hits {
        let slot = *index.entry(hit.source).or_insert_with(|| {
            groups.push(EntityHits {
                source: hit.source,
                whole: false,
                faces: Vec::new(),
                vertices: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        match hit.part {
            Part::Whole => group.whole = true,
            Part::Face(face) => group.faces.push(face),
            Part::Vertex(vertex) => group.vertices.push(vertex),
        }
    }
    groups
}

// ===== TRAVERSAL =====

impl<K: SourceKey> Octree<K> {
    /// Candidates for `query`.
    ///
    /// Root objects are always considered; below the root only nodes the
    /// query reaches are visited. No ordering is guaranteed.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults<K>> {
        let probe = Probe::from_query(query)?;
        let hits = self.collect_hits(&probe);
        if query.group_by_entity {
            Ok(SearchResults::Grouped(group_hits(&hits)))
        } else {
            Ok(SearchResults::Flat(hits))
        }
    }

    /// Entities whose bounding sphere touches the sphere `(center, radius)`
    pub fn search_sphere(&self, center: Vec3, radius: f32) -> Result<Vec<SearchHit<K>>> {
        let probe = Probe::from_query(&SearchQuery::sphere(center, radius))?;
        Ok(self.collect_hits(&probe))
    }

    /// Entities in every node the ray may cross
    pub fn search_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Result<Vec<SearchHit<K>>> {
        let probe = Probe::from_query(&SearchQuery::ray(origin, direction, max_distance))?;
        Ok(self.collect_hits(&probe))
    }

    fn collect_hits(&self, probe: &Probe) -> Vec<SearchHit<K>> {
        let mut hits = Vec::new();
        let Some(root) = self.nodes.get(self.root) else {
            return hits;
        };

        self.push_hits(root.objects(), probe, &mut hits);
        let mut stack: Vec<NodeKey> = root.children().map(|(_, child)| child).collect();
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            if !probe.reaches(&node.bounds) {
                continue;
            }
            self.push_hits(node.objects(), probe, &mut hits);
            stack.extend(node.children().map(|(_, child)| child));
        }
        hits
    }

    fn push_hits(&self, objects: &[EntityKey], probe: &Probe, hits: &mut Vec<SearchHit<K>>) {
        for key in objects {
            let Some(entity) = self.entities.get(*key) else { continue };
            let sphere = entity.sphere();
            if probe.accepts(&sphere) {
                hits.push(SearchHit {
                    key: *key,
                    source: entity.source(),
                    part: entity.part(),
                    sphere,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
