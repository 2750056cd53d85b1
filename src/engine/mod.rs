//! Engine: shared state and the three tick loops
//!
//! ```text
//! render thread      process_queue -> draw -> UI -> present   (free running)
//! simulation thread  scene switch -> input -> camera -> controller.update   (simulation_hz)
//! drain thread       active world -> PendingAdds::drain   (drain_hz)
//! ```
//!
//! The simulation loop runs on the thread calling [`Engine::run`]; the other
//! two are spawned and joined before `run` returns.

pub mod platform;
mod loops;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use glam::Vec3;

use crate::core::{CancellationToken, EngineConfig, Error, Result};
use crate::render::registry::{RegistryReceiver, registry_channel};
use crate::scene::{Scene, SceneCell, UiAction};
use crate::streaming::{PendingAdds, StreamingStats, load_world, save_world};
use crate::voxel::world::World;

pub use platform::{Camera, CursorMode, InputSource, Key, RenderTarget};

/// State shared by all loops
struct Shared {
    config: EngineConfig,
    scene: SceneCell,
    camera: Mutex<Camera>,
    pending: Arc<PendingAdds>,
    token: CancellationToken,
}

/// Cloneable access to a running (or not yet started) engine
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn scene(&self) -> &SceneCell {
        &self.shared.scene
    }

    /// Queue a scene switch for the next simulation tick
    pub fn request_scene(&self, scene: Scene) {
        self.shared.scene.request(scene);
    }

    pub fn camera(&self) -> Camera {
        *self.lock_camera()
    }

    pub fn streaming_stats(&self) -> StreamingStats {
        self.shared.pending.stats()
    }

    /// Stop every loop
    pub fn cancel(&self) {
        self.shared.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    fn lock_camera(&self) -> MutexGuard<'_, Camera> {
        self.shared.camera.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Carry out a UI button action
    pub fn handle_action(&self, action: UiAction) -> Result<()> {
        let config = &self.shared.config;
        match action {
            UiAction::CreateWorld => {
                let world = World::with_random_seed(config.terrain.clone());
                self.request_scene(Scene::world(Arc::new(world)));
            }
            UiAction::LoadWorld => match load_world(&config.save_dir, &config.terrain, config.legacy_compat)? {
                Some(world) => self.request_scene(Scene::world(Arc::new(world))),
                None => log::warn!("No saved world in {}", config.save_dir.display()),
            },
            UiAction::SaveWorld => match self.shared.scene.active_world() {
                Some(world) => {
                    save_world(&config.save_dir, &world, config.compress_chunks)?;
                }
                None => log::warn!("Save requested without an active world"),
            },
        }
        Ok(())
    }
}

/// Owns the shared state until [`run`](Engine::run) hands it to the loops
pub struct Engine {
    handle: EngineHandle,
    receiver: RegistryReceiver,
}

impl Engine {
    /// Create an engine showing the main menu
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create an engine whose first simulation tick switches to `scene`
    pub fn with_scene(config: EngineConfig, scene: Scene) -> Result<Self> {
        Self::build(config, Some(scene))
    }

    fn build(config: EngineConfig, first_scene: Option<Scene>) -> Result<Self> {
        config.validate()?;

        let (queue, receiver) = registry_channel();
        let camera = Camera::new(Vec3::from(config.initial_camera_position));
        let scene = SceneCell::new(Scene::main_menu());
        if let Some(first_scene) = first_scene {
            scene.request(first_scene);
        }

        let shared = Shared {
            config,
            scene,
            camera: Mutex::new(camera),
            pending: Arc::new(PendingAdds::new(queue)),
            token: CancellationToken::new(),
        };

        Ok(Self {
            handle: EngineHandle {
                shared: Arc::new(shared),
            },
            receiver,
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Run until cancelled (Escape, window close, or [`EngineHandle::cancel`]).
    ///
    /// `render_factory` is called on the render thread to build the render
    /// target; if it fails the engine shuts down and the error is returned.
    pub fn run<I, R, F>(self, mut input: I, render_factory: F) -> Result<()>
    where
        I: InputSource,
        R: RenderTarget,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let Engine { handle, receiver } = self;
        log::info!("Engine starting");

        let render = {
            let handle = handle.clone();
            thread::Builder::new()
                .name("render".into())
                .spawn(move || loops::render_thread(&handle, receiver, render_factory))?
        };

        let drain = {
            let handle = handle.clone();
            thread::Builder::new()
                .name("drain".into())
                .spawn(move || loops::drain_loop(&handle))
        };
        let drain = match drain {
            Ok(drain) => drain,
            Err(e) => {
                handle.cancel();
                let _ = render.join();
                return Err(e.into());
            }
        };

        loops::simulation_loop(&handle, &mut input);
        handle.cancel();

        let drain_result = drain.join();
        let render_result = render.join();
        log::info!("Engine stopped");

        if drain_result.is_err() {
            return Err(Error::Streaming("drain thread panicked".into()));
        }
        render_result.map_err(|_| Error::Window("render thread panicked".into()))?
    }
}
