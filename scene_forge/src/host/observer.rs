/// Scene observers.
///
/// An observer is told about scene lifecycle events and recorded frames.
/// Debug overlays and frame statistics collectors plug in here.

use crate::graphics_device::Extent2D;
use crate::host::SceneKey;
use crate::scene::{CompiledScene, FrameStats};

/// Hooks called by the scene host
///
/// Every method has an empty default, so implementations override only what
/// they need.
pub trait SceneObserver {
    /// A scene finished compiling
    fn on_scene_compiled(&mut self, _key: SceneKey, _scene: &CompiledScene) {}

    /// A frame was recorded and presented
    fn on_frame(&mut self, _key: SceneKey, _image_index: u32, _stats: &FrameStats) {}

    /// The output was resized and render caches rebuilt
    fn on_resize(&mut self, _extent: Extent2D) {}

    /// A scene was released
    fn on_scene_freed(&mut self, _key: SceneKey) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl NoopObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObserver for NoopObserver {}
