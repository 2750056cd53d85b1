//! Streaming controller: keeps the resident set matched to the viewpoint

use std::sync::Arc;

use glam::Vec3;

use crate::streaming::pending::{PendingAdds, StreamingStats};
use crate::streaming::window::{MAX_WINDOW_RADIUS, StreamingWindow, diff_windows};
use crate::voxel::chunk::ChunkCoord;
use crate::voxel::world::World;

/// Decides which chunks should be resident around the camera.
///
/// Owned by the simulation thread. It never touches the world or the GPU:
/// entering chunks go to the shared [`PendingAdds`] for the drain loop,
/// leaving chunks are removed straight away.
pub struct StreamingController {
    radius: i32,
    window: Option<StreamingWindow>,
    pending: Arc<PendingAdds>,
}

impl StreamingController {
    pub fn new(radius: i32, pending: Arc<PendingAdds>) -> Self {
        Self {
            radius: radius.clamp(0, MAX_WINDOW_RADIUS),
            window: None,
            pending,
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Current window, `None` while no world is active
    pub fn window(&self) -> Option<StreamingWindow> {
        self.window
    }

    pub fn pending(&self) -> &Arc<PendingAdds> {
        &self.pending
    }

    pub fn stats(&self) -> StreamingStats {
        self.pending.stats()
    }

    /// Recenter on the camera. Cheap when the camera stays in the same chunk.
    ///
    /// Returns true if the window moved.
    pub fn update(&mut self, camera_position: Vec3) -> bool {
        let Some(old) = self.window else {
            return false;
        };

        let center = ChunkCoord::from_world_pos(camera_position);
        if center == old.center {
            return false;
        }

        let new = StreamingWindow::new(center, self.radius);
        let (entering, leaving) = diff_windows(&old, &new);

        self.pending.cancel(leaving.iter().copied());
        let queued = self.pending.request(entering);
        self.window = Some(new);

        log::debug!(
            "Streaming window moved {:?} -> {:?}: {} queued, {} removed",
            old.center,
            center,
            queued,
            leaving.len()
        );
        true
    }

    /// Start over for a new scene. With a world, the whole window around the
    /// camera is queued; without one the controller idles.
    pub fn on_scene_changed(&mut self, world: Option<&Arc<World>>, camera_position: Vec3) {
        match world {
            Some(world) => {
                let window = StreamingWindow::new(ChunkCoord::from_world_pos(camera_position), self.radius);
                let epoch = self.pending.reset(window.coords());
                self.window = Some(window);
                log::info!(
                    "Streaming world (seed {}) around {:?}, radius {}, epoch {}",
                    world.seed(),
                    window.center,
                    self.radius,
                    epoch
                );
            }
            None => {
                let epoch = self.pending.reset(std::iter::empty());
                self.window = None;
                log::info!("Streaming idle, epoch {}", epoch);
            }
        }
    }
}
