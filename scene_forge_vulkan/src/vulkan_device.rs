/// VulkanDevice - GraphicsDevice implementation over ash

use ash::vk;
use scene_forge::graphics_device::{
    BufferHandle, BufferUsageFlags, CommandBufferHandle, CommandPoolHandle, DescriptorPoolHandle,
    DescriptorPoolSize, DescriptorSetHandle, DescriptorSetLayoutBinding, DescriptorSetLayoutHandle,
    FenceHandle, GraphicsDevice, GraphicsPipelineDesc, IndexType, MemoryAllocator,
    PipelineCacheHandle, PipelineHandle, PipelineLayoutHandle, RenderPassBegin, ShaderModuleHandle,
    ShaderStage, WriteDescriptorSet,
};
use scene_forge::sceneforge::Result;
use scene_forge::{engine_bail, engine_debug, engine_err};
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::*;
use crate::vulkan_memory::VulkanMemory;

/// Vulkan graphics device
///
/// Every scene_forge handle carries the raw value of the matching Vulkan
/// handle. The device does not track object lifetimes: callers destroy what
/// they create.
pub struct VulkanDevice {
    ctx: Arc<VulkanContext>,
    memory: VulkanMemory,
}

impl VulkanDevice {
    pub fn new(ctx: Arc<VulkanContext>) -> Self {
        let memory = VulkanMemory::new(Arc::clone(&ctx));
        Self { ctx, memory }
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.ctx
    }

    fn device(&self) -> &ash::Device {
        &self.ctx.device
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        self.memory.free_all();
    }
}

// ===== PIPELINE STATE =====

/// Arrays referenced by one pipeline create info
struct PipelineArrays {
    entry_points: Vec<CString>,
    stages: Vec<(vk::ShaderStageFlags, vk::ShaderModule)>,
    bindings: Vec<vk::VertexInputBindingDescription>,
    attributes: Vec<vk::VertexInputAttributeDescription>,
    viewport: vk::Viewport,
    scissor: vk::Rect2D,
    color_blend_attachment: vk::PipelineColorBlendAttachmentState,
}

impl PipelineArrays {
    fn new(desc: &GraphicsPipelineDesc) -> Result<Self> {
        let mut entry_points = Vec::with_capacity(desc.stages.len());
        let mut stages = Vec::with_capacity(desc.stages.len());
        for stage in &desc.stages {
            let name = CString::new(stage.entry_point.as_str()).map_err(|_| {
                engine_err!(InvalidResource, "sceneforge::vulkan",
                    "Entry point '{}' contains a NUL byte", stage.entry_point)
            })?;
            entry_points.push(name);
            stages.push((shader_stage_to_vk(stage.stage), from_raw(stage.module.0)));
        }

        let bindings = desc.vertex_input.bindings
            .iter()
            .map(|b| vk::VertexInputBindingDescription {
                binding: b.binding,
                stride: b.stride,
                input_rate: input_rate_to_vk(b.input_rate),
            })
            .collect();
        let attributes = desc.vertex_input.attributes
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: a.binding,
                format: buffer_format_to_vk(a.format),
                offset: a.offset,
            })
            .collect();

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(desc.color_blend.blend_enable);

        Ok(Self {
            entry_points,
            stages,
            bindings,
            attributes,
            viewport: viewport_to_vk(&desc.viewport),
            scissor: rect_to_vk(&desc.scissor),
            color_blend_attachment,
        })
    }
}

/// State create infos borrowing one [`PipelineArrays`]
struct PipelineStates<'a> {
    stages: Vec<vk::PipelineShaderStageCreateInfo<'a>>,
    vertex_input: vk::PipelineVertexInputStateCreateInfo<'a>,
    input_assembly: vk::PipelineInputAssemblyStateCreateInfo<'a>,
    viewport: vk::PipelineViewportStateCreateInfo<'a>,
    rasterization: vk::PipelineRasterizationStateCreateInfo<'a>,
    multisample: vk::PipelineMultisampleStateCreateInfo<'a>,
    depth_stencil: vk::PipelineDepthStencilStateCreateInfo<'a>,
    color_blend: vk::PipelineColorBlendStateCreateInfo<'a>,
    layout: vk::PipelineLayout,
    render_pass: vk::RenderPass,
}

impl<'a> PipelineStates<'a> {
    fn new(arrays: &'a PipelineArrays, desc: &GraphicsPipelineDesc) -> Self {
        let stages = arrays.stages
            .iter()
            .zip(&arrays.entry_points)
            .map(|(&(stage, module), name)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(stage)
                    .module(module)
                    .name(name.as_c_str())
            })
            .collect();

        Self {
            stages,
            vertex_input: vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&arrays.bindings)
                .vertex_attribute_descriptions(&arrays.attributes),
            input_assembly: vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(topology_to_vk(desc.topology))
                .primitive_restart_enable(false),
            // Static viewport and scissor, baked at creation
            viewport: vk::PipelineViewportStateCreateInfo::default()
                .viewports(std::slice::from_ref(&arrays.viewport))
                .scissors(std::slice::from_ref(&arrays.scissor)),
            rasterization: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(polygon_mode_to_vk(desc.rasterization.polygon_mode))
                .line_width(desc.rasterization.line_width)
                .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
                .front_face(front_face_to_vk(desc.rasterization.front_face))
                .depth_bias_enable(false),
            multisample: vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(sample_count_to_vk(desc.multisample.sample_count)),
            depth_stencil: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(desc.depth_stencil.depth_test_enable)
                .depth_write_enable(desc.depth_stencil.depth_write_enable)
                .depth_compare_op(compare_op_to_vk(desc.depth_stencil.depth_compare_op))
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false),
            color_blend: vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&arrays.color_blend_attachment)),
            layout: from_raw(desc.layout.0),
            render_pass: from_raw(desc.render_pass.0),
        }
    }

    fn create_info(&self) -> vk::GraphicsPipelineCreateInfo<'_> {
        vk::GraphicsPipelineCreateInfo::default()
            .stages(&self.stages)
            .vertex_input_state(&self.vertex_input)
            .input_assembly_state(&self.input_assembly)
            .viewport_state(&self.viewport)
            .rasterization_state(&self.rasterization)
            .multisample_state(&self.multisample)
            .depth_stencil_state(&self.depth_stencil)
            .color_blend_state(&self.color_blend)
            .layout(self.layout)
            .render_pass(self.render_pass)
            .subpass(0)
    }
}

// ===== GRAPHICS DEVICE =====

impl GraphicsDevice for VulkanDevice {
    // ===== SHADERS / LAYOUTS =====

    fn create_shader_module(&mut self, stage: ShaderStage, code: &[u8]) -> Result<ShaderModuleHandle> {
        // SPIR-V words must be u32-aligned; read_spv copies and validates the magic number
        let words = ash::util::read_spv(&mut std::io::Cursor::new(code)).map_err(|e| {
            engine_err!(InvalidResource, "sceneforge::vulkan",
                "Invalid SPIR-V for {:?} stage ({} bytes): {}", stage, code.len(), e)
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe { self.device().create_shader_module(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create shader module: {:?}", e))?;
        Ok(ShaderModuleHandle(raw(module)))
    }

    fn destroy_shader_module(&mut self, module: ShaderModuleHandle) {
        unsafe { self.device().destroy_shader_module(from_raw(module.0), None) }
    }

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutHandle> {
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_type_to_vk(b.descriptor_type))
                    .descriptor_count(b.descriptor_count)
                    .stage_flags(stage_flags_to_vk(b.stage_flags))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);
        let layout = unsafe { self.device().create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create descriptor set layout: {:?}", e))?;
        Ok(DescriptorSetLayoutHandle(raw(layout)))
    }

    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutHandle) {
        unsafe { self.device().destroy_descriptor_set_layout(from_raw(layout.0), None) }
    }

    fn create_pipeline_layout(
        &mut self,
        set_layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<PipelineLayoutHandle> {
        let vk_layouts: Vec<vk::DescriptorSetLayout> = set_layouts.iter().map(|l| from_raw(l.0)).collect();
        let create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&vk_layouts);
        let layout = unsafe { self.device().create_pipeline_layout(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create pipeline layout: {:?}", e))?;
        Ok(PipelineLayoutHandle(raw(layout)))
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutHandle) {
        unsafe { self.device().destroy_pipeline_layout(from_raw(layout.0), None) }
    }

    // ===== PIPELINES =====

    fn create_pipeline_cache(&mut self) -> Result<PipelineCacheHandle> {
        let create_info = vk::PipelineCacheCreateInfo::default();
        let cache = unsafe { self.device().create_pipeline_cache(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create pipeline cache: {:?}", e))?;
        Ok(PipelineCacheHandle(raw(cache)))
    }

    fn destroy_pipeline_cache(&mut self, cache: PipelineCacheHandle) {
        unsafe { self.device().destroy_pipeline_cache(from_raw(cache.0), None) }
    }

    fn create_graphics_pipelines(
        &mut self,
        cache: PipelineCacheHandle,
        descs: &[GraphicsPipelineDesc],
    ) -> Result<Vec<PipelineHandle>> {
        let arrays = descs.iter().map(PipelineArrays::new).collect::<Result<Vec<_>>>()?;
        let states: Vec<PipelineStates<'_>> = arrays
            .iter()
            .zip(descs)
            .map(|(arrays, desc)| PipelineStates::new(arrays, desc))
            .collect();
        let create_infos: Vec<vk::GraphicsPipelineCreateInfo<'_>> =
            states.iter().map(|s| s.create_info()).collect();

        let created = unsafe {
            self.device().create_graphics_pipelines(from_raw(cache.0), &create_infos, None)
        };
        match created {
            Ok(pipelines) => {
                engine_debug!("sceneforge::vulkan", "Created {} graphics pipelines", pipelines.len());
                Ok(pipelines.into_iter().map(|p| PipelineHandle(raw(p))).collect())
            }
            Err((partial, e)) => {
                for pipeline in partial.into_iter().filter(|p| *p != vk::Pipeline::null()) {
                    unsafe { self.device().destroy_pipeline(pipeline, None) }
                }
                Err(engine_err!("sceneforge::vulkan", "Failed to create graphics pipelines: {:?}", e))
            }
        }
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        unsafe { self.device().destroy_pipeline(from_raw(pipeline.0), None) }
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(
        &mut self,
        max_sets: u32,
        pool_sizes: &[DescriptorPoolSize],
    ) -> Result<DescriptorPoolHandle> {
        let vk_sizes: Vec<vk::DescriptorPoolSize> = pool_sizes
            .iter()
            .map(|s| vk::DescriptorPoolSize {
                ty: descriptor_type_to_vk(s.descriptor_type),
                descriptor_count: s.descriptor_count,
            })
            .collect();

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(&vk_sizes);
        let pool = unsafe { self.device().create_descriptor_pool(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan",
                "Failed to create descriptor pool ({} sets): {:?}", max_sets, e))?;
        Ok(DescriptorPoolHandle(raw(pool)))
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle) {
        unsafe { self.device().destroy_descriptor_pool(from_raw(pool.0), None) }
    }

    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        let vk_layouts: Vec<vk::DescriptorSetLayout> = layouts.iter().map(|l| from_raw(l.0)).collect();
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(from_raw(pool.0))
            .set_layouts(&vk_layouts);

        let sets = unsafe { self.device().allocate_descriptor_sets(&allocate_info) }
            .map_err(|e| engine_err!("sceneforge::vulkan",
                "Failed to allocate {} descriptor sets: {:?}", layouts.len(), e))?;
        Ok(sets.into_iter().map(|s| DescriptorSetHandle(raw(s))).collect())
    }

    fn update_descriptor_sets(&mut self, writes: &[WriteDescriptorSet]) {
        let buffer_infos: Vec<vk::DescriptorBufferInfo> = writes
            .iter()
            .map(|w| vk::DescriptorBufferInfo {
                buffer: from_raw(w.buffer.0),
                offset: w.offset,
                range: w.range,
            })
            .collect();
        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(&buffer_infos)
            .map(|(w, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(from_raw(w.dst_set.0))
                    .dst_binding(w.dst_binding)
                    .dst_array_element(0)
                    .descriptor_type(descriptor_type_to_vk(w.descriptor_type))
                    .buffer_info(std::slice::from_ref(info))
            })
            .collect();

        unsafe { self.device().update_descriptor_sets(&vk_writes, &[]) }
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, size: u64, usage: BufferUsageFlags) -> Result<BufferHandle> {
        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(buffer_usage_to_vk(usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.device().create_buffer(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create buffer of size {} bytes: {:?}", size, e))?;
        let handle = BufferHandle(raw(buffer));
        self.memory.register_buffer(handle, size);
        Ok(handle)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.memory.forget_buffer(buffer);
        unsafe { self.device().destroy_buffer(from_raw(buffer.0), None) }
    }

    fn memory(&mut self) -> &mut dyn MemoryAllocator {
        &mut self.memory
    }

    // ===== COMMANDS =====

    fn create_command_pool(&mut self) -> Result<CommandPoolHandle> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(self.ctx.graphics_queue_family);
        let pool = unsafe { self.device().create_command_pool(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create command pool: {:?}", e))?;
        Ok(CommandPoolHandle(raw(pool)))
    }

    fn destroy_command_pool(&mut self, pool: CommandPoolHandle) {
        unsafe { self.device().destroy_command_pool(from_raw(pool.0), None) }
    }

    fn allocate_command_buffers(
        &mut self,
        pool: CommandPoolHandle,
        count: u32,
    ) -> Result<Vec<CommandBufferHandle>> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(from_raw(pool.0))
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        let buffers = unsafe { self.device().allocate_command_buffers(&allocate_info) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to allocate {} command buffers: {:?}", count, e))?;
        Ok(buffers.into_iter().map(|b| CommandBufferHandle(raw(b))).collect())
    }

    fn begin_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()> {
        // Pool has RESET_COMMAND_BUFFER, so begin resets implicitly
        let begin_info = vk::CommandBufferBeginInfo::default();
        unsafe { self.device().begin_command_buffer(from_raw(cmd.0), &begin_info) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to begin command buffer: {:?}", e))
    }

    fn end_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()> {
        unsafe { self.device().end_command_buffer(from_raw(cmd.0)) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to end command buffer: {:?}", e))
    }

    fn cmd_copy_buffer(&mut self, cmd: CommandBufferHandle, src: BufferHandle, dst: BufferHandle, size: u64) {
        let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
        unsafe {
            self.device().cmd_copy_buffer(from_raw(cmd.0), from_raw(src.0), from_raw(dst.0), &[region])
        }
    }

    fn cmd_begin_render_pass(&mut self, cmd: CommandBufferHandle, begin: &RenderPassBegin) {
        let clear_values: Vec<vk::ClearValue> = begin.clear_values.iter().map(clear_value_to_vk).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(from_raw(begin.render_pass.0))
            .framebuffer(from_raw(begin.framebuffer.0))
            .render_area(rect_to_vk(&begin.render_area))
            .clear_values(&clear_values);
        unsafe {
            self.device().cmd_begin_render_pass(from_raw(cmd.0), &begin_info, vk::SubpassContents::INLINE)
        }
    }

    fn cmd_end_render_pass(&mut self, cmd: CommandBufferHandle) {
        unsafe { self.device().cmd_end_render_pass(from_raw(cmd.0)) }
    }

    fn cmd_bind_pipeline(&mut self, cmd: CommandBufferHandle, pipeline: PipelineHandle) {
        unsafe {
            self.device().cmd_bind_pipeline(from_raw(cmd.0), vk::PipelineBindPoint::GRAPHICS, from_raw(pipeline.0))
        }
    }

    fn cmd_bind_descriptor_sets(
        &mut self,
        cmd: CommandBufferHandle,
        layout: PipelineLayoutHandle,
        sets: &[DescriptorSetHandle],
    ) {
        let vk_sets: Vec<vk::DescriptorSet> = sets.iter().map(|s| from_raw(s.0)).collect();
        unsafe {
            self.device().cmd_bind_descriptor_sets(
                from_raw(cmd.0),
                vk::PipelineBindPoint::GRAPHICS,
                from_raw(layout.0),
                0,
                &vk_sets,
                &[],
            )
        }
    }

    fn cmd_bind_index_buffer(
        &mut self,
        cmd: CommandBufferHandle,
        buffer: BufferHandle,
        offset: u64,
        index_type: IndexType,
    ) {
        unsafe {
            self.device().cmd_bind_index_buffer(
                from_raw(cmd.0),
                from_raw(buffer.0),
                offset,
                index_type_to_vk(index_type),
            )
        }
    }

    fn cmd_bind_vertex_buffers(
        &mut self,
        cmd: CommandBufferHandle,
        first_binding: u32,
        buffers: &[BufferHandle],
        offsets: &[u64],
    ) {
        let vk_buffers: Vec<vk::Buffer> = buffers.iter().map(|b| from_raw(b.0)).collect();
        unsafe { self.device().cmd_bind_vertex_buffers(from_raw(cmd.0), first_binding, &vk_buffers, offsets) }
    }

    fn cmd_draw_indexed(&mut self, cmd: CommandBufferHandle, index_count: u32) {
        unsafe { self.device().cmd_draw_indexed(from_raw(cmd.0), index_count, 1, 0, 0, 0) }
    }

    // ===== SUBMISSION CHANNEL =====

    fn create_fence(&mut self) -> Result<FenceHandle> {
        let create_info = vk::FenceCreateInfo::default();
        let fence = unsafe { self.device().create_fence(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create fence: {:?}", e))?;
        Ok(FenceHandle(raw(fence)))
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        unsafe { self.device().destroy_fence(from_raw(fence.0), None) }
    }

    fn submit(&mut self, commands: &[CommandBufferHandle], fence: Option<FenceHandle>) -> Result<()> {
        if commands.is_empty() {
            engine_bail!(InvalidResource, "sceneforge::vulkan", "Submit with no command buffers");
        }
        let vk_commands: Vec<vk::CommandBuffer> = commands.iter().map(|c| from_raw(c.0)).collect();
        let submit_info = vk::SubmitInfo::default().command_buffers(&vk_commands);
        let vk_fence = fence.map(|f| from_raw(f.0)).unwrap_or_else(vk::Fence::null);

        unsafe { self.device().queue_submit(self.ctx.graphics_queue, &[submit_info], vk_fence) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to submit commands to GPU queue: {:?}", e))
    }

    fn wait_for_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let fences = [from_raw::<vk::Fence>(fence.0)];
        unsafe { self.device().wait_for_fences(&fences, true, u64::MAX) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to wait for fence: {:?}", e))
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let fences = [from_raw::<vk::Fence>(fence.0)];
        unsafe { self.device().reset_fences(&fences) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to reset fence: {:?}", e))
    }

    fn wait_idle(&mut self) -> Result<()> {
        unsafe { self.device().device_wait_idle() }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to wait for device idle: {:?}", e))
    }
}
