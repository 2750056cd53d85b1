//! GPU chunk registry and the ordered op queue that feeds it
//!
//! The registry lives on the render thread and is the only owner of GPU chunk
//! meshes. Other threads can only push ops through a [`RegistryQueue`]; the
//! registry applies them in order when the render loop calls
//! [`ChunkRegistry::process_queue`]. Backends are not required to be `Send`,
//! so GPU resources cannot leak to another thread.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::render::mesher::ChunkMesh;
use crate::voxel::chunk::ChunkCoord;

/// Graphics-side operations the registry needs. Implemented by the renderer.
pub trait MeshBackend {
    /// GPU handle for one uploaded chunk mesh
    type Mesh;

    fn create_mesh(&mut self, coord: ChunkCoord, mesh: &ChunkMesh) -> Self::Mesh;

    fn destroy_mesh(&mut self, coord: ChunkCoord, mesh: Self::Mesh);

    fn draw_mesh(&mut self, coord: ChunkCoord, mesh: &Self::Mesh);
}

/// A change to the resident set
#[derive(Debug)]
pub enum RegistryOp {
    /// Make a chunk resident (replacing any existing mesh)
    Add { coord: ChunkCoord, mesh: ChunkMesh },
    /// Drop a chunk's mesh if resident
    Remove(ChunkCoord),
    /// Drop every mesh (scene switch)
    Clear,
}

/// Create a connected queue/receiver pair
pub fn registry_channel() -> (RegistryQueue, RegistryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RegistryQueue { tx }, RegistryReceiver { rx })
}

/// Sending side of the registry op queue. Cheap to clone, usable from any
/// thread, never blocks.
#[derive(Clone, Debug)]
pub struct RegistryQueue {
    tx: UnboundedSender<RegistryOp>,
}

impl RegistryQueue {
    /// Returns false once the registry has shut down
    pub fn enqueue_add(&self, coord: ChunkCoord, mesh: ChunkMesh) -> bool {
        self.send(RegistryOp::Add { coord, mesh })
    }

    pub fn enqueue_remove(&self, coord: ChunkCoord) -> bool {
        self.send(RegistryOp::Remove(coord))
    }

    pub fn enqueue_clear(&self) -> bool {
        self.send(RegistryOp::Clear)
    }

    /// True once the receiving registry has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, op: RegistryOp) -> bool {
        match self.tx.send(op) {
            Ok(()) => true,
            Err(err) => {
                log::trace!("Registry gone, dropping {:?}", err.0);
                false
            }
        }
    }
}

/// Receiving side, moved onto the render thread to build the registry
#[derive(Debug)]
pub struct RegistryReceiver {
    rx: UnboundedReceiver<RegistryOp>,
}

impl RegistryReceiver {
    /// Take the next pending op without waiting
    pub fn try_next(&mut self) -> Option<RegistryOp> {
        match self.rx.try_recv() {
            Ok(op) => Some(op),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Ops waiting to be applied
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Counts from one [`ChunkRegistry::process_queue`] call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessedOps {
    pub added: usize,
    pub removed: usize,
    pub cleared: bool,
}

struct GpuChunk<M> {
    mesh: M,
    faces: usize,
}

/// Render-thread map of resident chunk meshes
pub struct ChunkRegistry<B: MeshBackend> {
    backend: B,
    receiver: RegistryReceiver,
    resident: HashMap<ChunkCoord, GpuChunk<B::Mesh>>,
    max_uploads_per_frame: Option<usize>,
}

impl<B: MeshBackend> ChunkRegistry<B> {
    pub fn new(backend: B, receiver: RegistryReceiver) -> Self {
        Self {
            backend,
            receiver,
            resident: HashMap::new(),
            max_uploads_per_frame: None,
        }
    }

    /// Limit mesh creations per [`process_queue`](Self::process_queue) call.
    /// Ops past the limit stay queued, in order.
    pub fn with_upload_budget(mut self, max_uploads_per_frame: Option<usize>) -> Self {
        self.max_uploads_per_frame = max_uploads_per_frame;
        self
    }

    /// Apply queued ops. Call once per frame from the render loop.
    pub fn process_queue(&mut self) -> ProcessedOps {
        let mut processed = ProcessedOps::default();
        let budget = self.max_uploads_per_frame.unwrap_or(usize::MAX);

        while processed.added < budget {
            let Some(op) = self.receiver.try_next() else {
                break;
            };

            match op {
                RegistryOp::Add { coord, mesh } => {
                    let uploaded = GpuChunk {
                        mesh: self.backend.create_mesh(coord, &mesh),
                        faces: mesh.face_count(),
                    };
                    if let Some(old) = self.resident.insert(coord, uploaded) {
                        self.backend.destroy_mesh(coord, old.mesh);
                    }
                    log::trace!("Chunk {:?} resident", coord);
                    processed.added += 1;
                }
                RegistryOp::Remove(coord) => {
                    if let Some(old) = self.resident.remove(&coord) {
                        self.backend.destroy_mesh(coord, old.mesh);
                        log::trace!("Chunk {:?} released", coord);
                        processed.removed += 1;
                    }
                }
                RegistryOp::Clear => {
                    processed.removed += self.release_all();
                    processed.cleared = true;
                }
            }
        }

        if processed.added > 0 || processed.removed > 0 {
            log::debug!(
                "Registry: +{} -{} chunks, {} resident",
                processed.added,
                processed.removed,
                self.resident.len()
            );
        }
        processed
    }

    /// Issue a draw for every resident chunk
    pub fn draw(&mut self) {
        for (coord, chunk) in &self.resident {
            self.backend.draw_mesh(*coord, &chunk.mesh);
        }
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.resident.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Resident coordinates, sorted
    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.resident.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Total visible faces across resident meshes
    pub fn face_count(&self) -> usize {
        self.resident.values().map(|c| c.faces).sum()
    }

    /// Ops still waiting in the queue
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn release_all(&mut self) -> usize {
        let count = self.resident.len();
        for (coord, chunk) in self.resident.drain() {
            self.backend.destroy_mesh(coord, chunk.mesh);
        }
        count
    }
}

impl<B: MeshBackend> Drop for ChunkRegistry<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mesher::mesh_chunk;
    use crate::voxel::chunk::Chunk;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingBackend {
        live: HashSet<ChunkCoord>,
        created: usize,
        destroyed: usize,
        drawn: Vec<ChunkCoord>,
    }

    impl MeshBackend for RecordingBackend {
        type Mesh = ChunkCoord;

        fn create_mesh(&mut self, coord: ChunkCoord, _mesh: &ChunkMesh) -> ChunkCoord {
            self.created += 1;
            self.live.insert(coord);
            coord
        }

        fn destroy_mesh(&mut self, coord: ChunkCoord, mesh: ChunkCoord) {
            assert_eq!(coord, mesh);
            self.destroyed += 1;
            self.live.remove(&coord);
        }

        fn draw_mesh(&mut self, coord: ChunkCoord, _mesh: &ChunkCoord) {
            self.drawn.push(coord);
        }
    }

    fn add(queue: &RegistryQueue, x: i32, y: i32) {
        let mut chunk = Chunk::new();
        chunk.set_block(0, 0, 0, 1);
        let mesh = mesh_chunk(&chunk);
        assert!(queue.enqueue_add(ChunkCoord::new(x, y), mesh));
    }

    #[test]
    fn test_ops_apply_in_order() {
        let (queue, receiver) = registry_channel();
        let mut registry = ChunkRegistry::new(RecordingBackend::default(), receiver);

        add(&queue, 0, 0);
        add(&queue, 1, 0);
        queue.enqueue_remove(ChunkCoord::new(0, 0));
        add(&queue, 0, 0);
        queue.enqueue_remove(ChunkCoord::new(1, 0));

        let processed = registry.process_queue();
        assert_eq!(processed.added, 3);
        assert_eq!(processed.removed, 2);
        assert_eq!(registry.resident_coords(), vec![ChunkCoord::new(0, 0)]);
        assert_eq!(registry.face_count(), 6);
    }

    #[test]
    fn test_nothing_applied_until_processed() {
        let (queue, receiver) = registry_channel();
        let mut registry = ChunkRegistry::new(RecordingBackend::default(), receiver);

        add(&queue, 2, 2);
        assert!(registry.is_empty());
        assert_eq!(registry.queued(), 1);

        registry.process_queue();
        assert!(registry.contains(ChunkCoord::new(2, 2)));
        assert_eq!(registry.queued(), 0);
    }

    #[test]
    fn test_readd_replaces_mesh() {
        let (queue, receiver) = registry_channel();
        let mut registry = ChunkRegistry::new(RecordingBackend::default(), receiver);

        add(&queue, 0, 0);
        add(&queue, 0, 0);
        registry.process_queue();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.backend().created, 2);
        assert_eq!(registry.backend().destroyed, 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (queue, receiver) = registry_channel();
        let mut registry = ChunkRegistry::new(RecordingBackend::default(), receiver);

        queue.enqueue_remove(ChunkCoord::new(9, 9));
        assert_eq!(registry.process_queue(), ProcessedOps::default());
    }

    #[test]
    fn test_clear_releases_everything() {
        let (queue, receiver) = registry_channel();
        let mut registry = ChunkRegistry::new(RecordingBackend::default(), receiver);

        add(&queue, 0, 0);
        add(&queue, 0, 1);
        queue.enqueue_clear();
        add(&queue, 5, 5);

        let processed = registry.process_queue();
        assert!(processed.cleared);
        assert_eq!(registry.resident_coords(), vec![ChunkCoord::new(5, 5)]);
        assert_eq!(registry.backend().live.len(), 1);
    }

    #[test]
    fn test_upload_budget_keeps_order() {
        let (queue, receiver) = registry_channel();
        let mut registry =
            ChunkRegistry::new(RecordingBackend::default(), receiver).with_upload_budget(Some(2));

        add(&queue, 0, 0);
        add(&queue, 1, 0);
        add(&queue, 2, 0);
        queue.enqueue_remove(ChunkCoord::new(0, 0));

        assert_eq!(registry.process_queue().added, 2);
        assert_eq!(registry.len(), 2);

        let processed = registry.process_queue();
        assert_eq!(processed.added, 1);
        assert_eq!(processed.removed, 1);
        assert_eq!(registry.resident_coords(), vec![ChunkCoord::new(1, 0), ChunkCoord::new(2, 0)]);
    }

    #[test]
    fn test_draw_visits_every_resident_chunk() {
        let (queue, receiver) = registry_channel();
        let mut registry = ChunkRegistry::new(RecordingBackend::default(), receiver);

        add(&queue, 0, 0);
        add(&queue, -1, 3);
        registry.process_queue();
        registry.draw();

        let mut drawn = registry.backend().drawn.clone();
        drawn.sort_unstable();
        assert_eq!(drawn, vec![ChunkCoord::new(-1, 3), ChunkCoord::new(0, 0)]);
    }

    #[test]
    fn test_queue_reports_closed_registry() {
        let (queue, receiver) = registry_channel();
        let registry = ChunkRegistry::new(RecordingBackend::default(), receiver);
        drop(registry);

        assert!(queue.is_closed());
        assert!(!queue.enqueue_remove(ChunkCoord::new(0, 0)));
    }
}
