/// GraphicsDevice trait - native object factory, command recorder and
/// submission channel

use crate::error::Result;
use crate::graphics_device::{
    BufferHandle, BufferUsageFlags, CommandBufferHandle, CommandPoolHandle,
    DescriptorPoolHandle, DescriptorPoolSize, DescriptorSetHandle, DescriptorSetLayoutBinding,
    DescriptorSetLayoutHandle, FenceHandle, GraphicsPipelineDesc, IndexType, MemoryAllocator,
    PipelineCacheHandle, PipelineHandle, PipelineLayoutHandle, RenderPassBegin, ShaderModuleHandle,
    ShaderStage, WriteDescriptorSet,
};

/// Logical device as seen by the scene compiler
///
/// Instance creation, physical-device selection and queue setup happen
/// outside this crate; a backend wraps an already created device. Every
/// `create_*` has a matching `destroy_*` and the caller owns the handle.
///
/// Recording methods (`cmd_*`) are only valid between
/// [`begin_command_buffer`](Self::begin_command_buffer) and
/// [`end_command_buffer`](Self::end_command_buffer).
pub trait GraphicsDevice {
    // ===== SHADERS / LAYOUTS =====

    /// Create a stage object from SPIR-V bytecode
    fn create_shader_module(&mut self, stage: ShaderStage, code: &[u8]) -> Result<ShaderModuleHandle>;
    fn destroy_shader_module(&mut self, module: ShaderModuleHandle);

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutHandle>;
    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutHandle);

    /// Create a pipeline layout; `set_layouts` may be empty
    fn create_pipeline_layout(
        &mut self,
        set_layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<PipelineLayoutHandle>;
    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutHandle);

    // ===== PIPELINES =====

    fn create_pipeline_cache(&mut self) -> Result<PipelineCacheHandle>;
    fn destroy_pipeline_cache(&mut self, cache: PipelineCacheHandle);

    /// Create all pipelines in one batched call
    ///
    /// Returns one handle per descriptor, in order.
    fn create_graphics_pipelines(
        &mut self,
        cache: PipelineCacheHandle,
        descs: &[GraphicsPipelineDesc],
    ) -> Result<Vec<PipelineHandle>>;
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(
        &mut self,
        max_sets: u32,
        pool_sizes: &[DescriptorPoolSize],
    ) -> Result<DescriptorPoolHandle>;

    /// Destroy the pool and implicitly free every set allocated from it
    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle);

    /// Allocate one set per entry of `layouts`
    ///
    /// # Errors
    ///
    /// `ResourceCreationFailure` when the pool capacity is exceeded.
    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>>;

    fn update_descriptor_sets(&mut self, writes: &[WriteDescriptorSet]);

    // ===== BUFFERS =====

    /// Create an unbound buffer; memory comes from [`MemoryAllocator::allocate`]
    fn create_buffer(&mut self, size: u64, usage: BufferUsageFlags) -> Result<BufferHandle>;
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Memory allocator backing this device
    fn memory(&mut self) -> &mut dyn MemoryAllocator;

    // ===== COMMANDS =====

    /// Create a pool whose buffers can be reset individually
    fn create_command_pool(&mut self) -> Result<CommandPoolHandle>;

    /// Destroy the pool and every buffer allocated from it
    fn destroy_command_pool(&mut self, pool: CommandPoolHandle);

    /// Allocate `count` primary command buffers
    fn allocate_command_buffers(
        &mut self,
        pool: CommandPoolHandle,
        count: u32,
    ) -> Result<Vec<CommandBufferHandle>>;

    fn begin_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()>;
    fn end_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()>;

    fn cmd_copy_buffer(&mut self, cmd: CommandBufferHandle, src: BufferHandle, dst: BufferHandle, size: u64);
    fn cmd_begin_render_pass(&mut self, cmd: CommandBufferHandle, begin: &RenderPassBegin);
    fn cmd_end_render_pass(&mut self, cmd: CommandBufferHandle);
    fn cmd_bind_pipeline(&mut self, cmd: CommandBufferHandle, pipeline: PipelineHandle);

    /// Bind sets starting at set 0
    fn cmd_bind_descriptor_sets(
        &mut self,
        cmd: CommandBufferHandle,
        layout: PipelineLayoutHandle,
        sets: &[DescriptorSetHandle],
    );
    fn cmd_bind_index_buffer(
        &mut self,
        cmd: CommandBufferHandle,
        buffer: BufferHandle,
        offset: u64,
        index_type: IndexType,
    );

    /// Bind `buffers[i]` at `offsets[i]` to binding `first_binding + i`
    fn cmd_bind_vertex_buffers(
        &mut self,
        cmd: CommandBufferHandle,
        first_binding: u32,
        buffers: &[BufferHandle],
        offsets: &[u64],
    );
    fn cmd_draw_indexed(&mut self, cmd: CommandBufferHandle, index_count: u32);

    // ===== SUBMISSION CHANNEL =====

    fn create_fence(&mut self) -> Result<FenceHandle>;
    fn destroy_fence(&mut self, fence: FenceHandle);

    /// Submit command buffers to the graphics queue, optionally signaling `fence`
    fn submit(&mut self, commands: &[CommandBufferHandle], fence: Option<FenceHandle>) -> Result<()>;

    /// Block until `fence` is signaled (no timeout)
    fn wait_for_fence(&mut self, fence: FenceHandle) -> Result<()>;
    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&mut self) -> Result<()>;
}
