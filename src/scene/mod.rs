//! Scenes, the shared scene slot and the UI model

pub mod cell;
pub mod ui;

pub use cell::{Scene, SceneCell};
pub use ui::{UiAction, UiContext, UiElement, UiRenderer, UiText, UiWindow, draw_ui};
