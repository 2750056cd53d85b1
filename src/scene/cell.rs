//! Scenes and the shared active/requested scene slot

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::scene::ui::{UiAction, UiText, UiWindow};
use crate::voxel::world::World;

/// What is on screen: an optional world plus the UI drawn over it
#[derive(Clone, Debug)]
pub struct Scene {
    pub world: Option<Arc<World>>,
    pub ui: Vec<UiWindow>,
}

impl Scene {
    /// Start screen with no world loaded
    pub fn main_menu() -> Self {
        Self {
            world: None,
            ui: vec![
                UiWindow::new("Main menu")
                    .button("Create new world", UiAction::CreateWorld)
                    .button("Load world", UiAction::LoadWorld),
            ],
        }
    }

    /// In-game scene for `world` with the statistics overlay
    pub fn world(world: Arc<World>) -> Self {
        Self {
            world: Some(world),
            ui: vec![
                UiWindow::new("Statistics")
                    .text(UiText::FrameTime)
                    .text(UiText::CameraPosition)
                    .text(UiText::CameraDirection)
                    .text(UiText::Seed)
                    .button("Save world", UiAction::SaveWorld),
            ],
        }
    }

    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }
}

struct SceneSlots {
    active: Arc<Scene>,
    requested: Option<Arc<Scene>>,
}

/// Active scene plus at most one requested replacement, behind one lock.
///
/// Any thread may request a scene; the simulation loop applies it on its next
/// tick. Lock order: the scene lock is taken before the pending-add lock,
/// never after.
pub struct SceneCell {
    slots: Mutex<SceneSlots>,
}

impl SceneCell {
    pub fn new(initial: Scene) -> Self {
        Self {
            slots: Mutex::new(SceneSlots {
                active: Arc::new(initial),
                requested: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SceneSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask for `scene` to become active. A newer request replaces an older
    /// one that has not been applied yet.
    pub fn request(&self, scene: Scene) {
        self.lock().requested = Some(Arc::new(scene));
    }

    pub fn has_request(&self) -> bool {
        self.lock().requested.is_some()
    }

    pub fn active(&self) -> Arc<Scene> {
        self.lock().active.clone()
    }

    pub fn active_world(&self) -> Option<Arc<World>> {
        self.lock().active.world.clone()
    }

    /// Run `f` on the active scene with the scene lock held
    pub fn with_active<T>(&self, f: impl FnOnce(&Scene) -> T) -> T {
        f(&self.lock().active)
    }

    /// Swap in the requested scene, if any, and run `notify` on it while the
    /// lock is still held. Returns true if a swap happened.
    pub fn apply_requested(&self, notify: impl FnOnce(&Scene)) -> bool {
        let mut slots = self.lock();
        let Some(next) = slots.requested.take() else {
            return false;
        };
        slots.active = next;
        notify(&slots.active);
        true
    }
}

impl Default for SceneCell {
    fn default() -> Self {
        Self::new(Scene::main_menu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_layout() {
        let scene = Scene::main_menu();
        assert!(!scene.has_world());
        assert_eq!(scene.ui.len(), 1);
        assert_eq!(scene.ui[0].title, "Main menu");
        let actions: Vec<_> = scene.ui[0].actions().collect();
        assert_eq!(actions, vec![UiAction::CreateWorld, UiAction::LoadWorld]);
    }

    #[test]
    fn test_world_scene_layout() {
        let scene = Scene::world(Arc::new(World::new(9)));
        assert!(scene.has_world());
        assert_eq!(scene.ui[0].title, "Statistics");
        let actions: Vec<_> = scene.ui[0].actions().collect();
        assert_eq!(actions, vec![UiAction::SaveWorld]);
    }

    #[test]
    fn test_request_applied_once() {
        let cell = SceneCell::default();
        assert!(cell.active_world().is_none());

        cell.request(Scene::world(Arc::new(World::new(5))));
        assert!(cell.has_request());
        assert!(cell.active_world().is_none());

        let mut seen = None;
        assert!(cell.apply_requested(|scene| seen = scene.world.as_ref().map(|w| w.seed())));
        assert_eq!(seen, Some(5));
        assert_eq!(cell.active_world().map(|w| w.seed()), Some(5));

        assert!(!cell.apply_requested(|_| panic!("no request pending")));
    }

    #[test]
    fn test_latest_request_wins() {
        let cell = SceneCell::default();
        cell.request(Scene::world(Arc::new(World::new(1))));
        cell.request(Scene::world(Arc::new(World::new(2))));
        cell.apply_requested(|_| {});
        assert_eq!(cell.active_world().map(|w| w.seed()), Some(2));
    }
}
