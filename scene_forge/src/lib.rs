/*!
# SceneForge

Scene compiler and frame recorder for explicit graphics APIs.

A [`scene::SceneDescription`] lists shaders, meshes and game objects. The
[`scene::SceneCompiler`] turns it into a [`scene::CompiledScene`]: one packed
mesh buffer, one pipeline per shader, one descriptor pool, one uniform
buffer and a command buffer per framebuffer. The compiled scene is replayed
every frame without further allocation.

## Architecture

- **GraphicsDevice**: object-safe contract over the native API (buffers,
  memory, descriptors, pipelines, commands)
- **Swapchain**: presentation chain provided by the application
- **Shader**: reflection parsing, uniform layout and set layout description
- **Scene**: description, compiler, compiled scene and frame recorder
- **SceneHost**: lifecycle of keyed scenes, resize and per-frame rendering

Backends (Vulkan) live in separate crates and implement `GraphicsDevice`.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod shader;
pub mod scene;
pub mod host;

// Main sceneforge namespace module
pub mod sceneforge {
    // Error types
    pub use crate::error::{Error, Result};

    // Global logging entry point
    pub use crate::engine::Engine;

    pub use crate::config::Config;
    pub use crate::host::{SceneHost, SceneKey};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }
}

// Re-export math library at crate root
pub use glam;
