//! Dynamic loose octree
//!
//! Provides the tree handle, its configuration, the host interface it reads
//! positions through, and the queries it answers.

mod config;
mod entity;
mod node;
mod octree;
mod rebalance;
mod search;
mod source;
mod visualizer;

pub use config::OctreeConfig;
pub use entity::{EntityDescriptor, EntityKey};
pub use node::{NodeKey, OctreeNode};
pub use octree::Octree;
pub use search::{group_hits, EntityHits, SearchHit, SearchQuery, SearchResults};
pub use source::{Decomposition, EntitySource, Part, SourceKey};
pub use visualizer::{NodeEvent, NodeVisualizer};
