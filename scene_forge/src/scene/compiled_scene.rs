//! GPU-resident execution plan of one scene.
//!
//! A `CompiledScene` exclusively owns every native object built for it:
//! shaders, the packed mesh buffer, pipelines, the descriptor pool, the
//! uniform buffer and the per-framebuffer command buffers. Fields start null
//! or empty so a partially built scene can always be released with
//! [`CompiledScene::free`].

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    Allocation, BufferHandle, CommandBufferHandle, CommandPoolHandle, DescriptorPoolHandle,
    DescriptorSetHandle, GraphicsDevice, IndexType, PipelineCacheHandle, PipelineHandle,
    WriteDescriptorSet,
};
use crate::scene::{RenderCache, ShaderGroup, UniformRange};
use crate::shader::CompiledShader;

/// Index and vertex buffer bindings of one mesh draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    /// Offset of the indices inside the shared mesh buffer
    pub index_offset: u64,
    pub index_type: IndexType,
    pub index_count: u32,
    /// One offset per shader attribute, in vertex binding order
    pub vertex_offsets: Vec<u64>,
}

/// An object after compilation
///
/// Pipeline and descriptor fields are frozen once the scene is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledObject {
    pub shader: usize,
    /// Index into the scene pipelines (the object's shader group)
    pub pipeline: usize,
    /// One set per set layout of the shader, in set order
    pub descriptor_sets: Vec<DescriptorSetHandle>,
    pub writes: Vec<WriteDescriptorSet>,
    /// Where the object's uniform blocks live in the uniform buffer
    pub uniforms: Vec<UniformRange>,
    /// `None` for objects without a mesh
    pub draw: Option<DrawCommand>,
}

pub struct CompiledScene {
    pub(crate) shaders: Vec<CompiledShader>,
    pub(crate) groups: Vec<ShaderGroup>,
    pub(crate) objects: Vec<CompiledObject>,

    pub(crate) mesh_buffer: BufferHandle,
    pub(crate) mesh_allocation: Option<Allocation>,
    pub(crate) mesh_buffer_size: u64,

    pub(crate) pipeline_cache: PipelineCacheHandle,
    pub(crate) pipelines: Vec<PipelineHandle>,

    pub(crate) descriptor_pool: DescriptorPoolHandle,

    pub(crate) uniform_buffer: BufferHandle,
    pub(crate) uniform_allocation: Option<Allocation>,
    pub(crate) uniform_buffer_size: u64,

    pub(crate) command_pool: CommandPoolHandle,
    pub(crate) command_buffers: Vec<CommandBufferHandle>,

    pub(crate) render_cache: RenderCache,
}

impl CompiledScene {
    /// Scene with no native objects yet
    pub(crate) fn empty(render_cache: RenderCache) -> Self {
        Self {
            shaders: Vec::new(),
            groups: Vec::new(),
            objects: Vec::new(),
            mesh_buffer: BufferHandle::NULL,
            mesh_allocation: None,
            mesh_buffer_size: 0,
            pipeline_cache: PipelineCacheHandle::NULL,
            pipelines: Vec::new(),
            descriptor_pool: DescriptorPoolHandle::NULL,
            uniform_buffer: BufferHandle::NULL,
            uniform_allocation: None,
            uniform_buffer_size: 0,
            command_pool: CommandPoolHandle::NULL,
            command_buffers: Vec::new(),
            render_cache,
        }
    }

    /// Release every native object owned by the scene
    ///
    /// The device must be idle with respect to this scene's command buffers.
    pub fn free(self, device: &mut dyn GraphicsDevice) {
        if !self.command_pool.is_null() {
            device.destroy_command_pool(self.command_pool);
        }
        if !self.descriptor_pool.is_null() {
            device.destroy_descriptor_pool(self.descriptor_pool);
        }
        for pipeline in self.pipelines.iter().rev() {
            device.destroy_pipeline(*pipeline);
        }
        if !self.pipeline_cache.is_null() {
            device.destroy_pipeline_cache(self.pipeline_cache);
        }

        if !self.uniform_buffer.is_null() {
            device.destroy_buffer(self.uniform_buffer);
        }
        if let Some(allocation) = self.uniform_allocation {
            device.memory().free(allocation);
        }
        if !self.mesh_buffer.is_null() {
            device.destroy_buffer(self.mesh_buffer);
        }
        if let Some(allocation) = self.mesh_allocation {
            device.memory().free(allocation);
        }

        for shader in self.shaders.into_iter().rev() {
            shader.free(device);
        }
    }

    // ===== UNIFORM UPDATES =====

    /// Overwrite the start of one of an object's uniform blocks
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the object or block does not exist, or if `bytes`
    /// is larger than the block.
    pub fn write_uniform(
        &self,
        device: &mut dyn GraphicsDevice,
        object: usize,
        uniform: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let range = self.uniform_range(object, uniform)?;
        self.write_range(device, range.offset, range.size, bytes)
    }

    /// Overwrite one field of an object's uniform block
    pub fn write_uniform_field(
        &self,
        device: &mut dyn GraphicsDevice,
        object: usize,
        uniform: &str,
        field: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let range = self.uniform_range(object, uniform)?;
        let shader = self.objects[object].shader;
        let block = self.shaders[shader]
            .set_layouts()
            .iter()
            .filter(|l| l.set == range.set)
            .flat_map(|l| l.blocks.iter())
            .find(|b| b.binding == range.binding);
        let member = match block.and_then(|b| b.field(field)) {
            Some(member) => member,
            None => engine_bail!(InvalidResource, "sceneforge::scene",
                "Uniform '{}' has no field '{}'", uniform, field),
        };
        self.write_range(device, range.offset + member.offset, member.size, bytes)
    }

    fn uniform_range(&self, object: usize, uniform: &str) -> Result<&UniformRange> {
        let compiled = match self.objects.get(object) {
            Some(o) => o,
            None => engine_bail!(InvalidResource, "sceneforge::scene",
                "Object index {} out of range ({} objects)", object, self.objects.len()),
        };
        match compiled.uniforms.iter().find(|u| u.name == uniform) {
            Some(range) => Ok(range),
            None => engine_bail!(InvalidResource, "sceneforge::scene",
                "Object {} has no uniform block '{}'", object, uniform),
        }
    }

    fn write_range(&self, device: &mut dyn GraphicsDevice, offset: u64, capacity: u64, bytes: &[u8]) -> Result<()> {
        if bytes.len() as u64 > capacity {
            engine_bail!(InvalidResource, "sceneforge::scene",
                "Uniform write of {} bytes exceeds range of {} bytes", bytes.len(), capacity);
        }
        let allocation = match &self.uniform_allocation {
            Some(a) => a,
            None => engine_bail!(InvalidState, "sceneforge::scene", "Scene has no uniform buffer"),
        };
        let mut region = device.memory().map(allocation)?;
        region.write_bytes(offset, bytes)
    }

    // ===== ACCESSORS =====

    pub fn objects(&self) -> &[CompiledObject] {
        &self.objects
    }

    pub fn shaders(&self) -> &[CompiledShader] {
        &self.shaders
    }

    pub fn shader_groups(&self) -> &[ShaderGroup] {
        &self.groups
    }

    pub fn pipelines(&self) -> &[PipelineHandle] {
        &self.pipelines
    }

    pub fn pipeline_cache(&self) -> PipelineCacheHandle {
        self.pipeline_cache
    }

    pub fn descriptor_pool(&self) -> DescriptorPoolHandle {
        self.descriptor_pool
    }

    /// Shared device-local vertex/index buffer (null for a mesh-less scene)
    pub fn mesh_buffer(&self) -> BufferHandle {
        self.mesh_buffer
    }

    pub fn mesh_buffer_size(&self) -> u64 {
        self.mesh_buffer_size
    }

    pub fn uniform_buffer(&self) -> BufferHandle {
        self.uniform_buffer
    }

    pub fn uniform_buffer_size(&self) -> u64 {
        self.uniform_buffer_size
    }

    pub fn command_buffers(&self) -> &[CommandBufferHandle] {
        &self.command_buffers
    }

    pub fn render_cache(&self) -> &RenderCache {
        &self.render_cache
    }

    /// Total descriptor sets allocated for the scene
    pub fn descriptor_set_count(&self) -> usize {
        self.objects.iter().map(|o| o.descriptor_sets.len()).sum()
    }
}

#[cfg(test)]
#[path = "compiled_scene_tests.rs"]
mod tests;
