//! Streaming convergence: after any sequence of camera moves and drains, the
//! registry ends up holding exactly the window around the final position.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use terrastream::render::{ChunkMesh, ChunkRegistry, MeshBackend, registry_channel};
use terrastream::streaming::{PendingAdds, StreamingController, StreamingWindow};
use terrastream::voxel::{ChunkCoord, World};

#[derive(Default)]
struct CountingBackend {
    live: HashSet<ChunkCoord>,
}

impl MeshBackend for CountingBackend {
    type Mesh = usize;

    fn create_mesh(&mut self, coord: ChunkCoord, mesh: &ChunkMesh) -> usize {
        self.live.insert(coord);
        mesh.face_count()
    }

    fn destroy_mesh(&mut self, coord: ChunkCoord, _mesh: usize) {
        self.live.remove(&coord);
    }

    fn draw_mesh(&mut self, _coord: ChunkCoord, _mesh: &usize) {}
}

struct Harness {
    world: Arc<World>,
    controller: StreamingController,
    pending: Arc<PendingAdds>,
    registry: ChunkRegistry<CountingBackend>,
}

impl Harness {
    fn new(radius: i32, camera: Vec3) -> Self {
        let (queue, receiver) = registry_channel();
        let pending = Arc::new(PendingAdds::new(queue));
        let mut controller = StreamingController::new(radius, pending.clone());
        let world = Arc::new(World::new(2024));
        controller.on_scene_changed(Some(&world), camera);

        Self {
            world,
            controller,
            pending,
            registry: ChunkRegistry::new(CountingBackend::default(), receiver),
        }
    }

    fn drain(&self, batch_limit: Option<usize>) {
        self.pending.drain(&self.world, self.pending.epoch(), batch_limit);
    }

    fn settle(&mut self) {
        while self.pending.stats().pending > 0 {
            self.drain(None);
        }
        self.registry.process_queue();
    }

    fn expected(&self) -> HashSet<ChunkCoord> {
        let window = self.controller.window().expect("no active window");
        window.coords().into_iter().collect()
    }

    fn resident(&self) -> HashSet<ChunkCoord> {
        self.registry.resident_coords().into_iter().collect()
    }
}

/// Small deterministic generator so move sequences are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn range(&mut self, span: i64) -> f32 {
        (self.next() as i64 % (2 * span + 1) - span) as f32
    }
}

#[test]
fn test_initial_window_becomes_resident() {
    let mut harness = Harness::new(2, Vec3::new(8.0, 8.0, 270.0));
    harness.settle();
    assert_eq!(harness.resident(), harness.expected());
    assert_eq!(harness.resident().len(), 25);
    assert_eq!(harness.registry.backend().live, harness.resident());
}

#[test]
fn test_random_walk_converges() {
    let mut harness = Harness::new(2, Vec3::ZERO);
    let mut rng = Lcg(7);
    let mut camera = Vec3::ZERO;

    for step in 0..200 {
        camera += Vec3::new(rng.range(24), rng.range(24), 0.0);
        harness.controller.update(camera);

        if step % 3 == 0 {
            harness.drain(Some(4));
        }
        harness.registry.process_queue();

        // Nothing outside the current window is ever left resident
        let expected = harness.expected();
        assert!(
            harness.resident().is_subset(&expected),
            "step {}: stale chunks resident",
            step
        );
    }

    harness.settle();
    assert_eq!(harness.resident(), harness.expected());
}

#[test]
fn test_jumps_larger_than_window() {
    let mut harness = Harness::new(3, Vec3::ZERO);
    harness.settle();

    let targets = [
        Vec3::new(10_000.0, 0.0, 0.0),
        Vec3::new(-10_000.0, 5_000.0, 0.0),
        Vec3::new(-10_010.0, 5_000.0, 0.0),
        Vec3::new(0.0, 0.0, 0.0),
    ];
    for target in targets {
        harness.controller.update(target);
        harness.drain(Some(7));
        harness.registry.process_queue();
        assert!(harness.resident().is_subset(&harness.expected()));
    }

    harness.settle();
    assert_eq!(harness.resident(), harness.expected());
    assert_eq!(harness.resident().len(), 49);
}

#[test]
fn test_leaving_chunks_never_added() {
    let mut harness = Harness::new(1, Vec3::ZERO);

    // Move away before anything was drained: the old window must never
    // reach the registry.
    harness.controller.update(Vec3::new(160.0, 0.0, 0.0));
    harness.settle();

    let old: HashSet<_> = StreamingWindow::new(ChunkCoord::new(0, 0), 1).coords().into_iter().collect();
    assert!(harness.resident().is_disjoint(&old));
    assert_eq!(harness.resident(), harness.expected());
    for coord in &old {
        assert!(!harness.world.contains(*coord), "{:?} was generated", coord);
    }
}

#[test]
fn test_scene_switch_discards_old_world() {
    let mut harness = Harness::new(1, Vec3::ZERO);
    harness.settle();
    assert_eq!(harness.resident().len(), 9);

    let other = Arc::new(World::new(99));
    harness.controller.on_scene_changed(Some(&other), Vec3::new(1000.0, 0.0, 0.0));
    harness.world = other;
    harness.settle();

    assert_eq!(harness.resident(), harness.expected());
    assert!(harness.resident().iter().all(|c| harness.world.contains(*c)));

    harness.controller.on_scene_changed(None, Vec3::ZERO);
    harness.registry.process_queue();
    assert!(harness.registry.is_empty());
}

#[test]
fn test_concurrent_drain_converges() {
    let mut harness = Harness::new(2, Vec3::ZERO);
    let stop = AtomicBool::new(false);
    let pending = harness.pending.clone();
    let world = harness.world.clone();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            while !stop.load(Ordering::Acquire) {
                pending.drain(&world, pending.epoch(), Some(3));
                std::thread::yield_now();
            }
        });

        let mut rng = Lcg(42);
        let mut camera = Vec3::ZERO;
        for _ in 0..300 {
            camera += Vec3::new(rng.range(20), rng.range(20), 0.0);
            harness.controller.update(camera);
            harness.registry.process_queue();
            std::thread::yield_now();
        }
        stop.store(true, Ordering::Release);
    });

    harness.settle();
    assert_eq!(harness.resident(), harness.expected());
}
