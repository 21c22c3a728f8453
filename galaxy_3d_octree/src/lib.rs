/*!
# Galaxy 3D Octree

Dynamic sparse loose octree for the Galaxy 3D engine.

Tracks moving entities (whole objects, or the faces / vertices of a mesh)
as bounding spheres and answers sphere and ray proximity queries. The tree
reshapes itself as entities are added, moved and removed.

## Architecture

- **Geometry**: bounding volumes, octant classification, sphere/ray tests
- **Octree**: tree handle owning the node and entity arenas
- **EntitySource**: host trait the tree reads world positions through
- **NodeVisualizer**: optional sink for node created/destroyed events

Results are candidates: narrow-phase testing stays with the caller.
*/

// Internal modules
mod error;
pub mod log;
pub mod geometry;
pub mod octree;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Tree handle and its companions
    pub use crate::octree::{
        Decomposition, EntityDescriptor, EntityHits, EntityKey, EntitySource, NodeEvent,
        NodeKey, NodeVisualizer, Octree, OctreeConfig, OctreeNode, Part, SearchHit,
        SearchQuery, SearchResults, SourceKey,
    };

    // Logging sub-module (types and global controls, NOT macros)
    pub mod log {
        pub use crate::log::{
            reset_logger, set_logger, set_min_severity, min_severity,
            DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }

    // Geometry sub-module
    pub mod geometry {
        pub use crate::geometry::*;
    }
}

// Re-export math library at crate root
pub use glam;
