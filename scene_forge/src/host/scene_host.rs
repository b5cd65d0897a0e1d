//! Scene host - owns the device, the presentation chain and every scene.
//!
//! Scenes are addressed by [`SceneKey`] handles. A scene starts `Pending`
//! (editable description) and becomes `Compiled` exactly once; shader
//! grouping, pipelines and descriptors are computed on that transition.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::{Arc, Mutex};
//! # use scene_forge::sceneforge::{Config, SceneHost};
//! # use scene_forge::scene::SceneDescription;
//! # fn run(
//! #     device: Arc<Mutex<dyn scene_forge::graphics_device::GraphicsDevice>>,
//! #     swapchain: Arc<Mutex<dyn scene_forge::graphics_device::Swapchain>>,
//! # ) -> scene_forge::sceneforge::Result<()> {
//! let mut host = SceneHost::new(device, swapchain, Config::default())?;
//! let key = host.load(SceneDescription::new())?;
//! host.render(key)?;
//! host.resize(1280, 720)?;
//! host.free(key)?;
//! host.shutdown()
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use crate::config::Config;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, Swapchain};
use crate::host::{NoopObserver, SceneObserver};
use crate::scene::{CompiledScene, FrameStats, SceneCompiler, SceneDescription, SetupChannel};
use crate::{engine_bail, engine_err, engine_info, engine_warn};

new_key_type! {
    /// Stable handle to a scene owned by a [`SceneHost`]
    pub struct SceneKey;
}

/// Lifecycle of one scene
pub enum SceneState {
    /// Description still editable; nothing created on the device
    Pending(SceneDescription),
    /// Frozen GPU-resident plan
    Compiled(CompiledScene),
}

impl SceneState {
    pub fn is_compiled(&self) -> bool {
        matches!(self, SceneState::Compiled(_))
    }
}

pub struct SceneHost {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    swapchain: Arc<Mutex<dyn Swapchain>>,
    /// `None` once the host is shut down
    setup: Option<SetupChannel>,
    config: Config,
    scenes: SlotMap<SceneKey, SceneState>,
    observer: Box<dyn SceneObserver>,
}

fn lock<'a, T: ?Sized>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| engine_err!(InvalidState, "sceneforge::host", "{} lock poisoned", what))
}

impl SceneHost {
    /// Create a host and its setup submission channel
    pub fn new(
        device: Arc<Mutex<dyn GraphicsDevice>>,
        swapchain: Arc<Mutex<dyn Swapchain>>,
        config: Config,
    ) -> Result<Self> {
        let setup = SetupChannel::create(&mut *lock(&device, "Graphics device")?)?;
        engine_info!("sceneforge::host", "Scene host '{}' ready", config.app_name);
        Ok(Self {
            device,
            swapchain,
            setup: Some(setup),
            config,
            scenes: SlotMap::with_key(),
            observer: Box::new(NoopObserver::new()),
        })
    }

    /// Replace the observer (a [`NoopObserver`] by default)
    pub fn with_observer(mut self, observer: Box<dyn SceneObserver>) -> Self {
        self.observer = observer;
        self
    }

    // ===== LIFECYCLE =====

    /// Register a pending scene
    pub fn create_scene(&mut self, desc: SceneDescription) -> SceneKey {
        self.scenes.insert(SceneState::Pending(desc))
    }

    /// Edit a scene that has not been compiled yet
    pub fn scene_description_mut(&mut self, key: SceneKey) -> Result<&mut SceneDescription> {
        match self.scenes.get_mut(key) {
            Some(SceneState::Pending(desc)) => Ok(desc),
            Some(SceneState::Compiled(_)) => engine_bail!(InvalidState, "sceneforge::host",
                "Scene {:?} is compiled; its description is frozen", key),
            None => engine_bail!(InvalidResource, "sceneforge::host", "Unknown scene {:?}", key),
        }
    }

    /// Move a pending scene to the compiled state
    ///
    /// On failure the scene is removed from the host; every native object
    /// created for it has already been released.
    pub fn compile(&mut self, key: SceneKey) -> Result<()> {
        let setup = match &self.setup {
            Some(setup) => setup,
            None => engine_bail!(InvalidState, "sceneforge::host", "Scene host is shut down"),
        };

        let result = {
            let mut device = lock(&self.device, "Graphics device")?;
            let swapchain = lock(&self.swapchain, "Swapchain")?;
            // Taken only once both locks are held
            let desc = match self.scenes.get_mut(key) {
                Some(SceneState::Pending(desc)) => std::mem::take(desc),
                Some(SceneState::Compiled(_)) => engine_bail!(InvalidState, "sceneforge::host",
                    "Scene {:?} is already compiled", key),
                None => engine_bail!(InvalidResource, "sceneforge::host", "Unknown scene {:?}", key),
            };
            SceneCompiler::new(&mut *device, setup, &*swapchain, &self.config).compile(desc)
        };

        match result {
            Ok(scene) => {
                self.observer.on_scene_compiled(key, &scene);
                if let Some(state) = self.scenes.get_mut(key) {
                    *state = SceneState::Compiled(scene);
                }
                Ok(())
            }
            Err(e) => {
                self.scenes.remove(key);
                engine_warn!("sceneforge::host", "Scene {:?} removed after failed compile", key);
                Err(e)
            }
        }
    }

    /// Create and compile a scene in one step
    pub fn load(&mut self, desc: SceneDescription) -> Result<SceneKey> {
        let key = self.create_scene(desc);
        self.compile(key)?;
        Ok(key)
    }

    /// Release a scene, pending or compiled
    ///
    /// The scene stays registered if the device cannot be idled, so the call
    /// can be retried.
    pub fn free(&mut self, key: SceneKey) -> Result<()> {
        let compiled = match self.scenes.get(key) {
            Some(state) => state.is_compiled(),
            None => engine_bail!(InvalidResource, "sceneforge::host", "Unknown scene {:?}", key),
        };
        if compiled {
            let mut device = lock(&self.device, "Graphics device")?;
            device.wait_idle()?;
            if let Some(SceneState::Compiled(scene)) = self.scenes.remove(key) {
                scene.free(&mut *device);
            }
        } else {
            self.scenes.remove(key);
        }
        self.observer.on_scene_freed(key);
        Ok(())
    }

    /// Release every scene and the setup channel
    ///
    /// Safe to call more than once. Nothing is released until the device is
    /// idle; after a failure the host is left intact.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.setup.is_none() {
            return Ok(());
        }

        let mut device = lock(&self.device, "Graphics device")?;
        device.wait_idle()?;
        for (_, state) in self.scenes.drain() {
            if let SceneState::Compiled(scene) = state {
                scene.free(&mut *device);
            }
        }
        if let Some(setup) = self.setup.take() {
            setup.destroy(&mut *device);
        }
        engine_info!("sceneforge::host", "Scene host '{}' shut down", self.config.app_name);
        Ok(())
    }

    // ===== FRAMES =====

    /// Re-record the command buffer of one framebuffer
    pub fn record(&mut self, key: SceneKey, framebuffer_index: usize) -> Result<FrameStats> {
        let scene = self.compiled(key)?;
        let mut device = lock(&self.device, "Graphics device")?;
        scene.record(&mut *device, framebuffer_index)
    }

    /// Acquire an image, record the scene into it and present
    pub fn render(&mut self, key: SceneKey) -> Result<FrameStats> {
        let scene = self.compiled(key)?;
        // Device before swapchain, like every other path
        let mut device = lock(&self.device, "Graphics device")?;
        let mut swapchain = lock(&self.swapchain, "Swapchain")?;
        let image_index = swapchain.acquire_next_image()?;

        let stats = scene.record(&mut *device, image_index as usize)?;
        let cmd = match scene.command_buffer(image_index as usize) {
            Some(cmd) => cmd,
            None => engine_bail!(InvalidState, "sceneforge::host",
                "Scene {:?} has no command buffer for image {}", key, image_index),
        };
        swapchain.present(image_index, &[cmd])?;
        drop(swapchain);
        drop(device);

        self.observer.on_frame(key, image_index, &stats);
        Ok(stats)
    }

    /// Rebuild surface-dependent state after an output-size change
    ///
    /// Buffers, pipelines and descriptor sets are kept; pipelines keep the
    /// viewport they were baked with.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let extent = {
            let mut device = lock(&self.device, "Graphics device")?;
            device.wait_idle()?;
            let mut swapchain = lock(&self.swapchain, "Swapchain")?;
            swapchain.recreate(width, height)?;

            for state in self.scenes.values_mut() {
                if let SceneState::Compiled(scene) = state {
                    scene.rebuild_render_cache(&*swapchain);
                }
            }
            swapchain.extent()
        };

        engine_info!("sceneforge::host", "Resized to {}x{}", extent.width, extent.height);
        self.observer.on_resize(extent);
        Ok(())
    }

    // ===== UNIFORM UPDATES =====

    /// Write raw bytes at the start of an object's uniform block
    pub fn update(&mut self, key: SceneKey, object: usize, uniform: &str, bytes: &[u8]) -> Result<()> {
        let scene = self.compiled(key)?;
        let mut device = lock(&self.device, "Graphics device")?;
        scene.write_uniform(&mut *device, object, uniform, bytes)
    }

    /// Write raw bytes into one field of an object's uniform block
    pub fn update_field(
        &mut self,
        key: SceneKey,
        object: usize,
        uniform: &str,
        field: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let scene = self.compiled(key)?;
        let mut device = lock(&self.device, "Graphics device")?;
        scene.write_uniform_field(&mut *device, object, uniform, field, bytes)
    }

    /// Write a matrix at the start of an object's uniform block
    pub fn write_mat4(&mut self, key: SceneKey, object: usize, uniform: &str, matrix: &Mat4) -> Result<()> {
        self.update(key, object, uniform, bytemuck::bytes_of(matrix))
    }

    // ===== ACCESSORS =====

    fn compiled(&self, key: SceneKey) -> Result<&CompiledScene> {
        match self.scenes.get(key) {
            Some(SceneState::Compiled(scene)) => Ok(scene),
            Some(SceneState::Pending(_)) => engine_bail!(InvalidState, "sceneforge::host",
                "Scene {:?} is not compiled", key),
            None => engine_bail!(InvalidResource, "sceneforge::host", "Unknown scene {:?}", key),
        }
    }

    /// Compiled scene behind `key`
    pub fn compiled_scene(&self, key: SceneKey) -> Result<&CompiledScene> {
        self.compiled(key)
    }

    pub fn scene_state(&self, key: SceneKey) -> Option<&SceneState> {
        self.scenes.get(key)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graphics_device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.device
    }

    pub fn swapchain(&self) -> &Arc<Mutex<dyn Swapchain>> {
        &self.swapchain
    }
}

impl Drop for SceneHost {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            engine_warn!("sceneforge::host", "Shutdown on drop failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "scene_host_tests.rs"]
mod tests;
