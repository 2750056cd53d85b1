use glam::Vec3;

use crate::core::{FixedRateLoop, FrameTimer, Result};
use crate::render::registry::{ChunkRegistry, RegistryReceiver};
use crate::scene::{UiContext, draw_ui};
use crate::streaming::StreamingController;

use super::EngineHandle;
use super::platform::{InputSource, Key, RenderTarget};

/// Fixed-rate input, camera and streaming updates. Returns when cancelled.
pub(super) fn simulation_loop<I: InputSource>(handle: &EngineHandle, input: &mut I) {
    let shared = &handle.shared;
    let config = &shared.config;
    let mut controller = StreamingController::new(config.streaming_radius, shared.pending.clone());

    FixedRateLoop::from_hz("simulation", config.simulation_hz)
        .with_max_lag(config.max_lag_periods)
        .run(&shared.token, |tick| {
            shared.scene.apply_requested(|scene| {
                let mut camera = handle.lock_camera();
                if scene.has_world() {
                    camera.position = Vec3::from(config.initial_camera_position);
                }
                controller.on_scene_changed(scene.world.as_ref(), camera.position);
            });

            input.poll_events();
            if input.should_close() {
                log::info!("Window closed");
                shared.token.cancel();
                return;
            }
            if input.key_just_pressed(Key::Escape) {
                log::info!("Escape pressed, shutting down");
                shared.token.cancel();
                return;
            }
            if input.key_just_pressed(Key::L) {
                let mode = input.cursor_mode().toggled();
                input.set_cursor_mode(mode);
                log::debug!("Cursor mode {:?}", mode);
            }

            let position = {
                let mut camera = handle.lock_camera();
                input.update_camera(&mut camera, tick.delta);
                camera.position
            };
            controller.update(position);
        });
}

/// Fixed-rate resolution of pending chunk adds for the active world
pub(super) fn drain_loop(handle: &EngineHandle) {
    let shared = &handle.shared;
    let config = &shared.config;

    FixedRateLoop::from_hz("drain", config.drain_hz)
        .with_max_lag(config.max_lag_periods)
        .run(&shared.token, |_| {
            // World and epoch are read together so a scene switch cannot
            // slip between them.
            let target = shared
                .scene
                .with_active(|scene| scene.world.clone().map(|world| (world, shared.pending.epoch())));

            if let Some((world, epoch)) = target {
                shared.pending.drain(&world, epoch, config.drain_batch_limit);
            }
        });
}

/// Build the render target on this thread, then render until cancelled
pub(super) fn render_thread<R, F>(handle: &EngineHandle, receiver: RegistryReceiver, factory: F) -> Result<()>
where
    R: RenderTarget,
    F: FnOnce() -> Result<R>,
{
    let target = match factory() {
        Ok(target) => target,
        Err(e) => {
            log::error!("Failed to create render target: {}", e);
            handle.cancel();
            return Err(e);
        }
    };

    let mut registry =
        ChunkRegistry::new(target, receiver).with_upload_budget(handle.shared.config.max_uploads_per_frame);
    render_loop(handle, &mut registry);
    Ok(())
}

/// Free-running frame loop. The only place GPU meshes change.
fn render_loop<R: RenderTarget>(handle: &EngineHandle, registry: &mut ChunkRegistry<R>) {
    let shared = &handle.shared;
    let mut timer = FrameTimer::new();

    while !shared.token.is_cancelled() {
        registry.process_queue();
        registry.draw();

        let scene = shared.scene.active();
        let camera = handle.camera();
        let ctx = UiContext {
            frame_time_ms: timer.frame_time_ms(),
            fps: timer.fps(),
            camera_position: camera.position,
            camera_direction: camera.forward,
            seed: scene.world.as_ref().map(|world| world.seed()),
        };

        let actions = draw_ui(registry.backend_mut(), &scene.ui, &ctx);
        for action in actions {
            if let Err(e) = handle.handle_action(action) {
                log::error!("{:?} failed: {}", action, e);
            }
        }

        registry.backend_mut().present();
        timer.tick();
    }

    log::debug!(
        "Render loop stopped after {} frames, {} chunks resident",
        timer.frame_count(),
        registry.len()
    );
}
