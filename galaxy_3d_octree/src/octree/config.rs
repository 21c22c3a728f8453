/// Octree construction options.
///
/// Values are read once by `Octree::new`. Malformed numbers are replaced by
/// the defaults with a warning instead of surfacing an error.

use crate::octree_warn;

const DEFAULT_INITIAL_RADIUS: f32 = 1.0;
const DEFAULT_OBJECTS_THRESHOLD: usize = 8;
const DEFAULT_OVERLAP_PCT: f32 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct OctreeConfig {
    /// Starting half-extent of the root; the tree grows and shrinks from there
    pub initial_radius: f32,
    /// Deepest level nodes may split to (root = 0), `None` for unbounded
    pub max_depth: Option<u32>,
    /// Direct objects a node holds before it splits; below it subtrees merge.
    /// Zero disables splitting.
    pub objects_threshold: usize,
    /// Fraction of a node's radius used as the overlap band
    pub overlap_pct: f32,
    /// Queue added entities until the next `update()`
    pub defer_insertion: bool,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            initial_radius: DEFAULT_INITIAL_RADIUS,
            max_depth: None,
            objects_threshold: DEFAULT_OBJECTS_THRESHOLD,
            overlap_pct: DEFAULT_OVERLAP_PCT,
            defer_insertion: false,
        }
    }
}

impl OctreeConfig {
    pub fn with_initial_radius(mut self, radius: f32) -> Self {
        self.initial_radius = radius;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_objects_threshold(mut self, threshold: usize) -> Self {
        self.objects_threshold = threshold;
        self
    }

    pub fn with_overlap_pct(mut self, pct: f32) -> Self {
        self.overlap_pct = pct;
        self
    }

    pub fn with_defer_insertion(mut self, defer: bool) -> Self {
        self.defer_insertion = defer;
        self
    }

    /// Whether a node at `depth` may still create children
    pub(crate) fn can_split_at(&self, depth: u32) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    /// Copy with every malformed value replaced by its default.
    ///
    /// An overlap of 1 or more would make a parent no bigger than its child,
    /// so expansion could never make progress.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        if !(config.initial_radius.is_finite() && config.initial_radius > 0.0) {
            octree_warn!(
                "galaxy3d::OctreeConfig",
                "initial_radius {} is invalid, using {}",
                config.initial_radius,
                DEFAULT_INITIAL_RADIUS
            );
            config.initial_radius = DEFAULT_INITIAL_RADIUS;
        }

        if !(config.overlap_pct.is_finite() && (0.0..1.0).contains(&config.overlap_pct)) {
            octree_warn!(
                "galaxy3d::OctreeConfig",
                "overlap_pct {} is outside [0, 1), using {}",
                config.overlap_pct,
                DEFAULT_OVERLAP_PCT
            );
            config.overlap_pct = DEFAULT_OVERLAP_PCT;
        }

        config
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
