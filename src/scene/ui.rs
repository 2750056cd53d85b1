//! Immediate-mode UI description
//!
//! Scenes describe their windows as data; a [`UiRenderer`] supplied by the
//! platform layer draws them each frame and reports which buttons were
//! clicked.

use glam::Vec3;

/// Something a button asks the engine to do
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UiAction {
    CreateWorld,
    LoadWorld,
    SaveWorld,
}

/// Live text fields, filled in from [`UiContext`] when drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiText {
    FrameTime,
    CameraPosition,
    CameraDirection,
    Seed,
}

/// Values the live text fields read from
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UiContext {
    pub frame_time_ms: f32,
    pub fps: f32,
    pub camera_position: Vec3,
    pub camera_direction: Vec3,
    /// Seed of the active world, if any
    pub seed: Option<u32>,
}

impl UiText {
    pub fn render(&self, ctx: &UiContext) -> String {
        match self {
            UiText::FrameTime => format!("Frame time: {:.2} ms ({:.0} FPS)", ctx.frame_time_ms, ctx.fps),
            UiText::CameraPosition => {
                let p = ctx.camera_position;
                format!("Camera position: {:.2} {:.2} {:.2}", p.x, p.y, p.z)
            }
            UiText::CameraDirection => {
                let d = ctx.camera_direction;
                format!("Camera direction: {:.2} {:.2} {:.2}", d.x, d.y, d.z)
            }
            UiText::Seed => match ctx.seed {
                Some(seed) => format!("Map seed: {}", seed),
                None => "Map seed: -".to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UiElement {
    Button { label: String, action: UiAction },
    Text(UiText),
}

/// A titled window with its elements in draw order
#[derive(Clone, Debug, PartialEq)]
pub struct UiWindow {
    pub title: String,
    pub elements: Vec<UiElement>,
}

impl UiWindow {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    pub fn button(mut self, label: impl Into<String>, action: UiAction) -> Self {
        self.elements.push(UiElement::Button {
            label: label.into(),
            action,
        });
        self
    }

    pub fn text(mut self, text: UiText) -> Self {
        self.elements.push(UiElement::Text(text));
        self
    }

    /// Actions reachable from this window's buttons
    pub fn actions(&self) -> impl Iterator<Item = UiAction> + '_ {
        self.elements.iter().filter_map(|e| match e {
            UiElement::Button { action, .. } => Some(*action),
            UiElement::Text(_) => None,
        })
    }
}

/// Platform UI toolkit binding
pub trait UiRenderer {
    /// Draw one window. Returns the actions of buttons clicked this frame.
    fn draw_window(&mut self, window: &UiWindow, ctx: &UiContext) -> Vec<UiAction>;
}

/// Draw every window and collect clicked actions in window order
pub fn draw_ui<R: UiRenderer + ?Sized>(renderer: &mut R, windows: &[UiWindow], ctx: &UiContext) -> Vec<UiAction> {
    windows
        .iter()
        .flat_map(|window| renderer.draw_window(window, ctx))
        .collect()
}
