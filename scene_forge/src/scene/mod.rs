//! Scene module
//!
//! Scene descriptions, the resource compiler that turns them into GPU-resident
//! compiled scenes, and the frame recorder that replays them.

mod scene_description;
mod mesh_packer;
mod shader_groups;
mod descriptor_plan;
mod setup_channel;
mod compiled_scene;
mod scene_compiler;
mod frame_recorder;

pub use scene_description::{
    GameObjectDescriptor, MeshAttribute, MeshBuilder, MeshDescriptor, MeshId, SceneDescription,
};
pub use mesh_packer::{MeshPacking, PackedMesh};
pub use shader_groups::{group_by_shader, ShaderGroup};
pub use descriptor_plan::{object_writes, DescriptorPoolPlan, ObjectWrites, UniformRange};
pub use setup_channel::SetupChannel;
pub use compiled_scene::{CompiledObject, CompiledScene, DrawCommand};
pub use scene_compiler::SceneCompiler;
pub use frame_recorder::{FrameStats, RenderCache};

#[cfg(test)]
pub(crate) mod test_fixtures;
