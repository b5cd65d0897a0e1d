//! Scene resource compiler.
//!
//! Turns a [`SceneDescription`] into a [`CompiledScene`] in one pass:
//!
//! 1. compile every shader
//! 2. pack referenced meshes into a staging buffer and copy them into one
//!    device-local vertex/index buffer through the setup channel
//! 3. group objects by shader (computed once, here)
//! 4. build one pipeline per group in a single batched call
//! 5. size and create the descriptor pool
//! 6. allocate descriptor sets and the zeroed uniform buffer
//! 7. write uniform buffer bindings, one update call per object
//! 8. allocate one command buffer per framebuffer
//!
//! Compilation is all-or-nothing: on any failure the partially built scene is
//! released and the error returned.

use crate::config::Config;
use crate::error::Result;
use crate::graphics_device::{
    BufferHandle, BufferUsageFlags, GraphicsDevice, GraphicsPipelineDesc, MemoryPropertyFlags,
    MemoryResource, Rect2D, Swapchain, Viewport,
};
use crate::scene::{
    group_by_shader, object_writes, CompiledObject, CompiledScene, DescriptorPoolPlan,
    DrawCommand, MeshPacking, RenderCache, SceneDescription, SetupChannel,
};
use crate::shader::{CompiledShader, DescriptorSetLayout};
use crate::{engine_bail, engine_info};

/// Borrowed collaborators of one compilation
pub struct SceneCompiler<'a> {
    device: &'a mut dyn GraphicsDevice,
    setup: &'a SetupChannel,
    target: &'a dyn Swapchain,
    config: &'a Config,
}

impl<'a> SceneCompiler<'a> {
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        setup: &'a SetupChannel,
        target: &'a dyn Swapchain,
        config: &'a Config,
    ) -> Self {
        Self { device, setup, target, config }
    }

    /// Compile a scene description, consuming it
    pub fn compile(mut self, desc: SceneDescription) -> Result<CompiledScene> {
        desc.validate()?;

        let mut scene = CompiledScene::empty(RenderCache::new(self.target, self.config));
        match self.build(&mut scene, &desc) {
            Ok(()) => {
                engine_info!("sceneforge::compiler",
                    "Compiled scene: {} objects, {} pipelines, {} descriptor sets, {} mesh bytes, {} uniform bytes",
                    scene.objects.len(), scene.pipelines.len(), scene.descriptor_set_count(),
                    scene.mesh_buffer_size, scene.uniform_buffer_size);
                Ok(scene)
            }
            Err(e) => {
                scene.free(self.device);
                Err(e)
            }
        }
    }

    fn build(&mut self, scene: &mut CompiledScene, desc: &SceneDescription) -> Result<()> {
        for shader in &desc.shaders {
            scene.shaders.push(CompiledShader::compile(self.device, shader)?);
        }

        let packing = MeshPacking::plan(desc)?;
        self.upload_meshes(scene, desc, &packing)?;

        scene.groups = group_by_shader(&desc.objects);
        let objects = describe_objects(scene, desc, &packing)?;
        scene.objects = objects;

        self.create_pipelines(scene)?;
        self.create_descriptor_pool(scene)?;
        self.create_uniform_buffer(scene)?;
        self.allocate_descriptor_sets(scene)?;
        self.write_descriptor_sets(scene)?;
        self.create_command_buffers(scene)
    }

    // ===== MESHES =====

    fn upload_meshes(&mut self, scene: &mut CompiledScene, desc: &SceneDescription, packing: &MeshPacking) -> Result<()> {
        let size = packing.total_size();
        if size == 0 {
            return Ok(());
        }

        let staging = self.device.create_buffer(size, BufferUsageFlags::TRANSFER_SRC)?;
        let staging_allocation = match self.device.memory().allocate(
            MemoryResource::Buffer(staging),
            MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT,
        ) {
            Ok(allocation) => allocation,
            Err(e) => {
                self.device.destroy_buffer(staging);
                return Err(e);
            }
        };

        let staged = match self.device.memory().map(&staging_allocation) {
            Ok(mut region) => packing.write(desc, &mut region),
            Err(e) => Err(e),
        };
        let result = staged.and_then(|()| self.copy_to_device(scene, staging, size));

        self.device.destroy_buffer(staging);
        self.device.memory().free(staging_allocation);
        result
    }

    fn copy_to_device(&mut self, scene: &mut CompiledScene, staging: BufferHandle, size: u64) -> Result<()> {
        scene.mesh_buffer = self.device.create_buffer(
            size,
            BufferUsageFlags::VERTEX_BUFFER | BufferUsageFlags::INDEX_BUFFER | BufferUsageFlags::TRANSFER_DST,
        )?;
        scene.mesh_buffer_size = size;
        scene.mesh_allocation = Some(self.device.memory().allocate(
            MemoryResource::Buffer(scene.mesh_buffer),
            MemoryPropertyFlags::DEVICE_LOCAL,
        )?);

        let cmd = self.setup.command_buffer();
        self.device.begin_command_buffer(cmd)?;
        self.device.cmd_copy_buffer(cmd, staging, scene.mesh_buffer, size);
        self.device.end_command_buffer(cmd)?;
        self.setup.submit_and_wait(self.device)
    }

    // ===== PIPELINES =====

    fn create_pipelines(&mut self, scene: &mut CompiledScene) -> Result<()> {
        if scene.groups.is_empty() {
            return Ok(());
        }

        let extent = self.target.extent();
        let descs: Vec<GraphicsPipelineDesc> = scene
            .groups
            .iter()
            .map(|group| {
                let shader = &scene.shaders[group.shader];
                GraphicsPipelineDesc {
                    stages: shader.stages(&self.config.entry_point),
                    vertex_input: shader.vertex_input().clone(),
                    topology: self.config.topology,
                    viewport: Viewport::from_extent(extent),
                    scissor: Rect2D::from_extent(extent),
                    rasterization: self.config.rasterization,
                    multisample: self.config.multisample,
                    depth_stencil: self.config.depth_stencil,
                    color_blend: self.config.color_blend,
                    layout: shader.pipeline_layout(),
                    render_pass: self.target.render_pass(),
                }
            })
            .collect();

        scene.pipeline_cache = self.device.create_pipeline_cache()?;
        scene.pipelines = self.device.create_graphics_pipelines(scene.pipeline_cache, &descs)?;
        if scene.pipelines.len() != descs.len() {
            engine_bail!("sceneforge::compiler",
                "Expected {} pipelines, device created {}", descs.len(), scene.pipelines.len());
        }
        Ok(())
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(&mut self, scene: &mut CompiledScene) -> Result<()> {
        let set_layouts: Vec<&[DescriptorSetLayout]> = scene.shaders.iter().map(|s| s.set_layouts()).collect();
        let plan = DescriptorPoolPlan::plan(&scene.groups, &set_layouts);
        if plan.is_empty() {
            return Ok(());
        }
        scene.descriptor_pool = self.device.create_descriptor_pool(plan.max_sets, &plan.pool_sizes)?;
        Ok(())
    }

    fn create_uniform_buffer(&mut self, scene: &mut CompiledScene) -> Result<()> {
        let size: u64 = scene
            .objects
            .iter()
            .map(|o| scene.shaders[o.shader].uniform_bytes_per_object())
            .sum();
        if size == 0 {
            return Ok(());
        }

        scene.uniform_buffer = self.device.create_buffer(size, BufferUsageFlags::UNIFORM_BUFFER)?;
        scene.uniform_buffer_size = size;
        let allocation = self.device.memory().allocate(
            MemoryResource::Buffer(scene.uniform_buffer),
            MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT,
        )?;
        let allocation = scene.uniform_allocation.insert(allocation);
        self.device.memory().map(allocation)?.fill(0);
        Ok(())
    }

    /// One allocation call per group; each object takes a contiguous slice
    fn allocate_descriptor_sets(&mut self, scene: &mut CompiledScene) -> Result<()> {
        for group in &scene.groups {
            let shader = &scene.shaders[group.shader];
            let per_object = shader.set_layout_count();
            if per_object == 0 {
                continue;
            }

            let handles = shader.set_layout_handles();
            let layouts: Vec<_> = std::iter::repeat(handles.as_slice())
                .take(group.object_count())
                .flatten()
                .copied()
                .collect();
            let sets = self.device.allocate_descriptor_sets(scene.descriptor_pool, &layouts)?;
            if sets.len() != layouts.len() {
                engine_bail!("sceneforge::compiler",
                    "Expected {} descriptor sets, device allocated {}", layouts.len(), sets.len());
            }

            for (&object, chunk) in group.objects.iter().zip(sets.chunks(per_object)) {
                scene.objects[object].descriptor_sets = chunk.to_vec();
            }
        }
        Ok(())
    }

    /// Walk the uniform buffer group by group, one update call per object
    fn write_descriptor_sets(&mut self, scene: &mut CompiledScene) -> Result<()> {
        let mut cursor = 0u64;
        for group in &scene.groups {
            let layouts = scene.shaders[group.shader].set_layouts();
            for &index in &group.objects {
                let object = &mut scene.objects[index];
                let writes = object_writes(&object.descriptor_sets, layouts, scene.uniform_buffer, &mut cursor)?;
                if !writes.writes.is_empty() {
                    self.device.update_descriptor_sets(&writes.writes);
                }
                object.writes = writes.writes;
                object.uniforms = writes.uniforms;
            }
        }

        if cursor != scene.uniform_buffer_size {
            engine_bail!(InvalidState, "sceneforge::compiler",
                "Uniform writes cover {} bytes, buffer holds {}", cursor, scene.uniform_buffer_size);
        }
        Ok(())
    }

    // ===== COMMANDS =====

    fn create_command_buffers(&mut self, scene: &mut CompiledScene) -> Result<()> {
        scene.command_pool = self.device.create_command_pool()?;
        let count = self.target.framebuffer_count() as u32;
        scene.command_buffers = self.device.allocate_command_buffers(scene.command_pool, count)?;
        Ok(())
    }
}

/// Back-reference group indices and resolve draw offsets
fn describe_objects(scene: &CompiledScene, desc: &SceneDescription, packing: &MeshPacking) -> Result<Vec<CompiledObject>> {
    let mut pipeline_of = vec![0; desc.objects.len()];
    for (group_index, group) in scene.groups.iter().enumerate() {
        for &object in &group.objects {
            pipeline_of[object] = group_index;
        }
    }

    let mut objects = Vec::with_capacity(desc.objects.len());
    for (index, object) in desc.objects.iter().enumerate() {
        let draw = match object.mesh {
            Some(mesh_id) => {
                let (mesh, base) = match (desc.mesh(mesh_id), packing.base_offset(mesh_id)) {
                    (Some(mesh), Some(base)) => (mesh, base),
                    _ => engine_bail!(InvalidResource, "sceneforge::compiler",
                        "Mesh {} of object {} was not packed", mesh_id.0, index),
                };
                let mut vertex_offsets = Vec::new();
                for name in scene.shaders[object.shader].ordered_attribute_names() {
                    match mesh.attribute_offset(name) {
                        Some(offset) => vertex_offsets.push(base + offset),
                        None => engine_bail!(InvalidResource, "sceneforge::compiler",
                            "Mesh {} lacks attribute '{}'", mesh_id.0, name),
                    }
                }
                Some(DrawCommand {
                    index_offset: base + mesh.indices_offset(),
                    index_type: mesh.index_type(),
                    index_count: mesh.index_count(),
                    vertex_offsets,
                })
            }
            None => None,
        };

        objects.push(CompiledObject {
            shader: object.shader,
            pipeline: pipeline_of[index],
            descriptor_sets: Vec::new(),
            writes: Vec::new(),
            uniforms: Vec::new(),
            draw,
        });
    }
    Ok(objects)
}

#[cfg(test)]
#[path = "scene_compiler_tests.rs"]
mod tests;
