//! Galaxy3D octree demo
//!
//! Scatters spheres in a box, lets them drift for a few frames and keeps
//! the octree in sync, printing the tree shape and a few queries.
//!
//! Pass `--debug` to see expand / merge / contract events.

use galaxy_3d_octree::galaxy3d::geometry::BoundingSphere;
use galaxy_3d_octree::galaxy3d::log::{self, LogSeverity};
use galaxy_3d_octree::galaxy3d::{
    Decomposition, NodeEvent, NodeVisualizer, Octree, OctreeConfig, Result,
};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const ENTITY_COUNT: u32 = 500;
const FRAMES: u32 = 20;
const WORLD_EXTENT: f32 = 200.0;

/// Counts node churn so each frame can report it
#[derive(Default)]
struct NodeCounter {
    created: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
}

impl NodeVisualizer for NodeCounter {
    fn on_node_created(&mut self, _event: &NodeEvent) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    fn on_node_destroyed(&mut self, _event: &NodeEvent) {
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

struct Body {
    velocity: Vec3,
}

fn random_vec(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.random_range(-extent..extent),
        rng.random_range(-extent..extent),
        rng.random_range(-extent..extent),
    )
}

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--debug") {
        log::set_min_severity(LogSeverity::Debug);
    }

    let mut rng = StdRng::seed_from_u64(2024);
    let mut scene: FxHashMap<u32, BoundingSphere> = FxHashMap::default();
    let mut bodies: FxHashMap<u32, Body> = FxHashMap::default();
    for id in 0..ENTITY_COUNT {
        let center = random_vec(&mut rng, WORLD_EXTENT);
        scene.insert(id, BoundingSphere::new(center, rng.random_range(0.5..3.0)));
        bodies.insert(id, Body { velocity: random_vec(&mut rng, 4.0) });
    }

    let counter = NodeCounter::default();
    let created = counter.created.clone();
    let destroyed = counter.destroyed.clone();

    let mut tree = Octree::new(
        OctreeConfig::default()
            .with_initial_radius(50.0)
            .with_objects_threshold(8),
    );
    tree.set_visualizer(Box::new(counter));

    for id in 0..ENTITY_COUNT {
        tree.add(id, Decomposition::Whole, &scene)?;
    }
    println!(
        "inserted {} entities: {} nodes, depth {}",
        tree.entity_count(),
        tree.node_count(),
        tree.depth()
    );

    for frame in 0..FRAMES {
        for (id, sphere) in scene.iter_mut() {
            let Some(body) = bodies.get_mut(id) else { continue };
            sphere.center += body.velocity;
            for axis in 0..3 {
                if sphere.center[axis].abs() > WORLD_EXTENT {
                    body.velocity[axis] = -body.velocity[axis];
                }
            }
        }

        created.store(0, Ordering::Relaxed);
        destroyed.store(0, Ordering::Relaxed);
        tree.update(&scene)?;

        let near_origin = tree.search_sphere(Vec3::ZERO, 25.0)?;
        println!(
            "frame {:2}: {:4} nodes (+{} / -{}), depth {}, {} near origin",
            frame,
            tree.node_count(),
            created.load(Ordering::Relaxed),
            destroyed.load(Ordering::Relaxed),
            tree.depth(),
            near_origin.len()
        );
    }

    let ray = tree.search_ray(Vec3::new(-WORLD_EXTENT, 0.0, 0.0), Vec3::X, 0.0)?;
    println!("ray along +X: {} candidates", ray.len());

    for id in 0..ENTITY_COUNT - 10 {
        tree.remove(id);
    }
    println!("after removing most entities:");
    print!("{}", tree.dump());

    Ok(())
}
