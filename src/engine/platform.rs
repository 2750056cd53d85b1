//! Collaborators supplied by the windowing and graphics layer

use glam::Vec3;

use crate::math::Ray;
use crate::render::registry::MeshBackend;
use crate::scene::ui::UiRenderer;

/// Viewpoint used for streaming and picking
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction
    pub forward: Vec3,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::X,
        }
    }

    /// Point the camera at `direction`; zero-length directions are ignored
    pub fn look_in(&mut self, direction: Vec3) {
        if let Some(forward) = direction.try_normalize() {
            self.forward = forward;
        }
    }

    /// Picking ray from the eye along the view direction
    pub fn look_ray(&self) -> Ray {
        Ray::new(self.position, self.forward)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Keys the engine itself reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Quit
    Escape,
    /// Toggle cursor capture
    L,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorMode {
    #[default]
    Normal,
    /// Hidden and captured for mouse-look
    Disabled,
}

impl CursorMode {
    pub fn toggled(self) -> Self {
        match self {
            CursorMode::Normal => CursorMode::Disabled,
            CursorMode::Disabled => CursorMode::Normal,
        }
    }
}

/// Window events and camera control, driven from the simulation loop
pub trait InputSource {
    /// Pump pending platform events
    fn poll_events(&mut self);

    /// True once the user asked to close the window
    fn should_close(&self) -> bool;

    /// True if `key` went down since the previous poll
    fn key_just_pressed(&self, key: Key) -> bool;

    fn cursor_mode(&self) -> CursorMode;

    fn set_cursor_mode(&mut self, mode: CursorMode);

    /// Apply movement and mouse-look for one simulation step of `dt` seconds
    fn update_camera(&mut self, camera: &mut Camera, dt: f32);
}

/// Everything the render thread draws to. Built on the render thread by the
/// factory passed to [`Engine::run`](crate::engine::Engine::run), so it does
/// not need to be `Send`.
pub trait RenderTarget: MeshBackend + UiRenderer {
    /// Finish the frame
    fn present(&mut self);
}
