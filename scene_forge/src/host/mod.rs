//! Scene host
//!
//! Owns the graphics device, the presentation chain and a set of scenes
//! addressed by stable keys.

mod scene_host;
mod observer;

pub use scene_host::{SceneHost, SceneKey, SceneState};
pub use observer::{NoopObserver, SceneObserver};
