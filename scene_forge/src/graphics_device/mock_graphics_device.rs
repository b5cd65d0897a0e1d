//! Mock graphics device for unit tests (no GPU required)
//!
//! Every native object gets a unique non-null handle. Creations, destructions
//! and recorded commands are logged as strings so tests can assert on call
//! order. Memory is real host memory: staging copies are executed on submit so
//! buffer contents can be inspected byte-for-byte.

use std::collections::BTreeMap;
use rustc_hash::FxHashMap;
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    Allocation, BufferHandle, BufferUsageFlags, CommandBufferHandle, CommandPoolHandle,
    DescriptorPoolHandle, DescriptorPoolSize, DescriptorSetHandle, DescriptorSetLayoutBinding,
    DescriptorSetLayoutHandle, DescriptorType, Extent2D, FenceHandle, FramebufferHandle,
    GraphicsDevice, GraphicsPipelineDesc, IndexType, MappedRegion, MemoryAllocator,
    MemoryPropertyFlags, MemoryResource, PipelineCacheHandle, PipelineHandle,
    PipelineLayoutHandle, RenderPassBegin, RenderPassHandle, ShaderModuleHandle, ShaderStage,
    Swapchain, WriteDescriptorSet,
};

/// Fill pattern for freshly allocated memory, so zeroing is observable
pub const UNINITIALIZED_BYTE: u8 = 0xCD;

// ============================================================================
// MockGraphicsDevice
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockBuffer {
    pub size: u64,
    pub usage: BufferUsageFlags,
    pub allocation: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MockAllocation {
    pub buffer: BufferHandle,
    pub flags: MemoryPropertyFlags,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MockDescriptorPool {
    pub max_sets: u32,
    pub sets_allocated: u32,
    pub remaining: FxHashMap<DescriptorType, u32>,
}

/// A command recorded into a command buffer
#[derive(Debug, Clone, PartialEq)]
pub struct MockCommand {
    pub cmd: CommandBufferHandle,
    pub name: &'static str,
    pub detail: String,
}

pub struct MockGraphicsDevice {
    next_handle: u64,

    /// Live native objects: handle value -> kind
    pub live: BTreeMap<u64, &'static str>,
    /// "kind:handle" in creation order
    pub created: Vec<String>,
    /// "kind:handle" in destruction order
    pub destroyed: Vec<String>,

    pub buffers: FxHashMap<u64, MockBuffer>,
    pub allocations: FxHashMap<u64, MockAllocation>,
    pub set_layouts: FxHashMap<u64, Vec<DescriptorSetLayoutBinding>>,
    pub pipeline_layouts: FxHashMap<u64, Vec<DescriptorSetLayoutHandle>>,
    pub descriptor_pools: FxHashMap<u64, MockDescriptorPool>,
    pub fences: FxHashMap<u64, bool>,

    /// Descriptors passed to every `create_graphics_pipelines` call
    pub pipeline_batches: Vec<Vec<GraphicsPipelineDesc>>,
    pub descriptor_set_allocations: Vec<usize>,
    pub descriptor_update_calls: Vec<Vec<WriteDescriptorSet>>,
    pub commands: Vec<MockCommand>,
    pub render_pass_begins: Vec<RenderPassBegin>,
    pub submissions: Vec<Vec<CommandBufferHandle>>,
    pub wait_idle_count: usize,

    /// Copies recorded per command buffer, executed on submit
    pending_copies: FxHashMap<u64, Vec<(BufferHandle, BufferHandle, u64)>>,

    /// Name of the trait method that must fail (e.g. "create_graphics_pipelines")
    pub fail_on: Option<&'static str>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            live: BTreeMap::new(),
            created: Vec::new(),
            destroyed: Vec::new(),
            buffers: FxHashMap::default(),
            allocations: FxHashMap::default(),
            set_layouts: FxHashMap::default(),
            pipeline_layouts: FxHashMap::default(),
            descriptor_pools: FxHashMap::default(),
            fences: FxHashMap::default(),
            pipeline_batches: Vec::new(),
            descriptor_set_allocations: Vec::new(),
            descriptor_update_calls: Vec::new(),
            commands: Vec::new(),
            render_pass_begins: Vec::new(),
            submissions: Vec::new(),
            wait_idle_count: 0,
            pending_copies: FxHashMap::default(),
            fail_on: None,
        }
    }

    pub fn failing_on(op: &'static str) -> Self {
        Self { fail_on: Some(op), ..Self::new() }
    }

    fn check(&self, op: &'static str) -> Result<()> {
        if self.fail_on == Some(op) {
            engine_bail!("sceneforge::mock", "{}: injected failure", op);
        }
        Ok(())
    }

    fn create(&mut self, kind: &'static str) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.insert(handle, kind);
        self.created.push(format!("{}:{}", kind, handle));
        handle
    }

    fn destroy(&mut self, kind: &'static str, handle: u64) {
        if handle == 0 {
            return;
        }
        let removed = self.live.remove(&handle);
        assert_eq!(removed, Some(kind), "destroying unknown or mismatched {} {}", kind, handle);
        self.destroyed.push(format!("{}:{}", kind, handle));
    }

    fn record(&mut self, cmd: CommandBufferHandle, name: &'static str, detail: String) {
        self.commands.push(MockCommand { cmd, name, detail });
    }

    /// Number of live objects of one kind
    pub fn live_count(&self, kind: &str) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }

    pub fn created_count(&self, kind: &str) -> usize {
        let prefix = format!("{}:", kind);
        self.created.iter().filter(|c| c.starts_with(&prefix)).count()
    }

    /// Command names recorded into `cmd`, in order
    pub fn command_names(&self, cmd: CommandBufferHandle) -> Vec<&'static str> {
        self.commands.iter().filter(|c| c.cmd == cmd).map(|c| c.name).collect()
    }

    /// Contents of the memory bound to `buffer`
    pub fn buffer_bytes(&self, buffer: BufferHandle) -> Option<&[u8]> {
        let allocation = self.buffers.get(&buffer.0)?.allocation?;
        self.allocations.get(&allocation).map(|a| a.bytes.as_slice())
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAllocator for MockGraphicsDevice {
    fn allocate(&mut self, resource: MemoryResource, flags: MemoryPropertyFlags) -> Result<Allocation> {
        self.check("allocate")?;
        let MemoryResource::Buffer(buffer) = resource;
        let size = match self.buffers.get(&buffer.0) {
            Some(b) => b.size,
            None => engine_bail!(InvalidResource, "sceneforge::mock", "allocate: unknown buffer {:?}", buffer),
        };
        let id = self.create("allocation");
        self.allocations.insert(id, MockAllocation {
            buffer,
            flags,
            bytes: vec![UNINITIALIZED_BYTE; size as usize],
        });
        if let Some(b) = self.buffers.get_mut(&buffer.0) {
            b.allocation = Some(id);
        }
        Ok(Allocation { id, offset: 0, size })
    }

    fn map(&mut self, allocation: &Allocation) -> Result<MappedRegion<'_>> {
        self.check("map")?;
        match self.allocations.get_mut(&allocation.id) {
            Some(a) if a.flags.contains(MemoryPropertyFlags::HOST_VISIBLE) => {
                Ok(MappedRegion::new(&mut a.bytes))
            }
            Some(_) => engine_bail!(InvalidResource, "sceneforge::mock", "map: allocation {} is not host visible", allocation.id),
            None => engine_bail!(InvalidResource, "sceneforge::mock", "map: unknown allocation {}", allocation.id),
        }
    }

    fn free(&mut self, allocation: Allocation) {
        if let Some(a) = self.allocations.remove(&allocation.id) {
            if let Some(b) = self.buffers.get_mut(&a.buffer.0) {
                b.allocation = None;
            }
        }
        self.destroy("allocation", allocation.id);
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_shader_module(&mut self, _stage: ShaderStage, code: &[u8]) -> Result<ShaderModuleHandle> {
        self.check("create_shader_module")?;
        if code.is_empty() || code.len() % 4 != 0 {
            engine_bail!("sceneforge::mock", "create_shader_module: invalid bytecode size {}", code.len());
        }
        Ok(ShaderModuleHandle(self.create("shader_module")))
    }

    fn destroy_shader_module(&mut self, module: ShaderModuleHandle) {
        self.destroy("shader_module", module.0);
    }

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<DescriptorSetLayoutHandle> {
        self.check("create_descriptor_set_layout")?;
        let handle = self.create("descriptor_set_layout");
        self.set_layouts.insert(handle, bindings.to_vec());
        Ok(DescriptorSetLayoutHandle(handle))
    }

    fn destroy_descriptor_set_layout(&mut self, layout: DescriptorSetLayoutHandle) {
        self.set_layouts.remove(&layout.0);
        self.destroy("descriptor_set_layout", layout.0);
    }

    fn create_pipeline_layout(&mut self, set_layouts: &[DescriptorSetLayoutHandle]) -> Result<PipelineLayoutHandle> {
        self.check("create_pipeline_layout")?;
        let handle = self.create("pipeline_layout");
        self.pipeline_layouts.insert(handle, set_layouts.to_vec());
        Ok(PipelineLayoutHandle(handle))
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayoutHandle) {
        self.pipeline_layouts.remove(&layout.0);
        self.destroy("pipeline_layout", layout.0);
    }

    fn create_pipeline_cache(&mut self) -> Result<PipelineCacheHandle> {
        self.check("create_pipeline_cache")?;
        Ok(PipelineCacheHandle(self.create("pipeline_cache")))
    }

    fn destroy_pipeline_cache(&mut self, cache: PipelineCacheHandle) {
        self.destroy("pipeline_cache", cache.0);
    }

    fn create_graphics_pipelines(
        &mut self,
        _cache: PipelineCacheHandle,
        descs: &[GraphicsPipelineDesc],
    ) -> Result<Vec<PipelineHandle>> {
        self.check("create_graphics_pipelines")?;
        self.pipeline_batches.push(descs.to_vec());
        Ok(descs.iter().map(|_| PipelineHandle(self.create("pipeline"))).collect())
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.destroy("pipeline", pipeline.0);
    }

    fn create_descriptor_pool(&mut self, max_sets: u32, pool_sizes: &[DescriptorPoolSize]) -> Result<DescriptorPoolHandle> {
        self.check("create_descriptor_pool")?;
        let mut remaining = FxHashMap::default();
        for size in pool_sizes {
            *remaining.entry(size.descriptor_type).or_insert(0) += size.descriptor_count;
        }
        let handle = self.create("descriptor_pool");
        self.descriptor_pools.insert(handle, MockDescriptorPool { max_sets, sets_allocated: 0, remaining });
        Ok(DescriptorPoolHandle(handle))
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle) {
        self.descriptor_pools.remove(&pool.0);
        self.destroy("descriptor_pool", pool.0);
    }

    fn allocate_descriptor_sets(
        &mut self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        self.check("allocate_descriptor_sets")?;

        // Total descriptors requested per type
        let mut needed: FxHashMap<DescriptorType, u32> = FxHashMap::default();
        for layout in layouts {
            let bindings = match self.set_layouts.get(&layout.0) {
                Some(b) => b,
                None => engine_bail!(InvalidResource, "sceneforge::mock", "unknown set layout {:?}", layout),
            };
            for b in bindings {
                *needed.entry(b.descriptor_type).or_insert(0) += b.descriptor_count;
            }
        }

        let state = match self.descriptor_pools.get_mut(&pool.0) {
            Some(p) => p,
            None => engine_bail!(InvalidResource, "sceneforge::mock", "unknown descriptor pool {:?}", pool),
        };
        if state.sets_allocated + layouts.len() as u32 > state.max_sets {
            engine_bail!("sceneforge::mock",
                "allocate_descriptor_sets: out of pool memory ({} + {} > max_sets {})",
                state.sets_allocated, layouts.len(), state.max_sets);
        }
        for (ty, count) in &needed {
            let available = state.remaining.get(ty).copied().unwrap_or(0);
            if *count > available {
                engine_bail!("sceneforge::mock",
                    "allocate_descriptor_sets: out of pool memory for {:?} ({} > {})",
                    ty, count, available);
            }
        }
        for (ty, count) in needed {
            if let Some(left) = state.remaining.get_mut(&ty) {
                *left -= count;
            }
        }
        state.sets_allocated += layouts.len() as u32;

        self.descriptor_set_allocations.push(layouts.len());
        // Sets are owned by the pool, not tracked as live objects
        let first = self.next_handle;
        self.next_handle += layouts.len() as u64;
        Ok((0..layouts.len() as u64).map(|i| DescriptorSetHandle(first + i)).collect())
    }

    fn update_descriptor_sets(&mut self, writes: &[WriteDescriptorSet]) {
        self.descriptor_update_calls.push(writes.to_vec());
    }

    fn create_buffer(&mut self, size: u64, usage: BufferUsageFlags) -> Result<BufferHandle> {
        self.check("create_buffer")?;
        if size == 0 {
            engine_bail!("sceneforge::mock", "create_buffer: size must be greater than zero");
        }
        let handle = self.create("buffer");
        self.buffers.insert(handle, MockBuffer { size, usage, allocation: None });
        Ok(BufferHandle(handle))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
        self.destroy("buffer", buffer.0);
    }

    fn memory(&mut self) -> &mut dyn MemoryAllocator {
        self
    }

    fn create_command_pool(&mut self) -> Result<CommandPoolHandle> {
        self.check("create_command_pool")?;
        Ok(CommandPoolHandle(self.create("command_pool")))
    }

    fn destroy_command_pool(&mut self, pool: CommandPoolHandle) {
        self.destroy("command_pool", pool.0);
    }

    fn allocate_command_buffers(&mut self, _pool: CommandPoolHandle, count: u32) -> Result<Vec<CommandBufferHandle>> {
        self.check("allocate_command_buffers")?;
        let first = self.next_handle;
        self.next_handle += count as u64;
        Ok((0..count as u64).map(|i| CommandBufferHandle(first + i)).collect())
    }

    fn begin_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()> {
        self.check("begin_command_buffer")?;
        self.pending_copies.remove(&cmd.0);
        self.record(cmd, "begin", String::new());
        Ok(())
    }

    fn end_command_buffer(&mut self, cmd: CommandBufferHandle) -> Result<()> {
        self.record(cmd, "end", String::new());
        Ok(())
    }

    fn cmd_copy_buffer(&mut self, cmd: CommandBufferHandle, src: BufferHandle, dst: BufferHandle, size: u64) {
        self.pending_copies.entry(cmd.0).or_default().push((src, dst, size));
        self.record(cmd, "copy_buffer", format!("{} -> {} ({} bytes)", src.0, dst.0, size));
    }

    fn cmd_begin_render_pass(&mut self, cmd: CommandBufferHandle, begin: &RenderPassBegin) {
        self.render_pass_begins.push(begin.clone());
        self.record(cmd, "begin_render_pass", format!("{}x{}", begin.render_area.width, begin.render_area.height));
    }

    fn cmd_end_render_pass(&mut self, cmd: CommandBufferHandle) {
        self.record(cmd, "end_render_pass", String::new());
    }

    fn cmd_bind_pipeline(&mut self, cmd: CommandBufferHandle, pipeline: PipelineHandle) {
        self.record(cmd, "bind_pipeline", pipeline.0.to_string());
    }

    fn cmd_bind_descriptor_sets(&mut self, cmd: CommandBufferHandle, layout: PipelineLayoutHandle, sets: &[DescriptorSetHandle]) {
        let ids: Vec<u64> = sets.iter().map(|s| s.0).collect();
        self.record(cmd, "bind_descriptor_sets", format!("layout {} sets {:?}", layout.0, ids));
    }

    fn cmd_bind_index_buffer(&mut self, cmd: CommandBufferHandle, buffer: BufferHandle, offset: u64, index_type: IndexType) {
        self.record(cmd, "bind_index_buffer", format!("{} @ {} {:?}", buffer.0, offset, index_type));
    }

    fn cmd_bind_vertex_buffers(&mut self, cmd: CommandBufferHandle, first_binding: u32, buffers: &[BufferHandle], offsets: &[u64]) {
        assert_eq!(buffers.len(), offsets.len(), "vertex buffers and offsets must have equal length");
        self.record(cmd, "bind_vertex_buffers", format!("first {} offsets {:?}", first_binding, offsets));
    }

    fn cmd_draw_indexed(&mut self, cmd: CommandBufferHandle, index_count: u32) {
        self.record(cmd, "draw_indexed", index_count.to_string());
    }

    fn create_fence(&mut self) -> Result<FenceHandle> {
        self.check("create_fence")?;
        let handle = self.create("fence");
        self.fences.insert(handle, false);
        Ok(FenceHandle(handle))
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        self.fences.remove(&fence.0);
        self.destroy("fence", fence.0);
    }

    fn submit(&mut self, commands: &[CommandBufferHandle], fence: Option<FenceHandle>) -> Result<()> {
        self.check("submit")?;
        for cmd in commands {
            for (src, dst, size) in self.pending_copies.remove(&cmd.0).unwrap_or_default() {
                let data = match self.buffer_bytes(src) {
                    Some(bytes) => bytes[..size as usize].to_vec(),
                    None => engine_bail!(InvalidResource, "sceneforge::mock", "copy from unbound buffer {:?}", src),
                };
                let allocation = self.buffers.get(&dst.0).and_then(|b| b.allocation);
                match allocation.and_then(|id| self.allocations.get_mut(&id)) {
                    Some(a) => a.bytes[..size as usize].copy_from_slice(&data),
                    None => engine_bail!(InvalidResource, "sceneforge::mock", "copy into unbound buffer {:?}", dst),
                }
            }
        }
        self.submissions.push(commands.to_vec());
        if let Some(fence) = fence {
            self.fences.insert(fence.0, true);
        }
        Ok(())
    }

    fn wait_for_fence(&mut self, fence: FenceHandle) -> Result<()> {
        match self.fences.get(&fence.0) {
            Some(true) => Ok(()),
            // A real device would block forever here
            _ => engine_bail!(InvalidState, "sceneforge::mock", "wait_for_fence: fence {} never signaled", fence.0),
        }
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        self.fences.insert(fence.0, false);
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.check("wait_idle")?;
        self.wait_idle_count += 1;
        Ok(())
    }
}

// ============================================================================
// MockSwapchain
// ============================================================================

pub struct MockSwapchain {
    pub extent: Extent2D,
    pub render_pass: RenderPassHandle,
    pub framebuffers: Vec<FramebufferHandle>,
    pub next_image: u32,
    pub presented: Vec<(u32, Vec<CommandBufferHandle>)>,
    pub recreate_calls: Vec<(u32, u32)>,
    generation: u64,
}

impl MockSwapchain {
    /// Handles start high so they never collide with device handles in asserts
    pub fn new(width: u32, height: u32, image_count: usize) -> Self {
        let mut swapchain = Self {
            extent: Extent2D::new(width, height),
            render_pass: RenderPassHandle::NULL,
            framebuffers: Vec::new(),
            next_image: 0,
            presented: Vec::new(),
            recreate_calls: Vec::new(),
            generation: 0,
        };
        swapchain.build_targets(image_count);
        swapchain
    }

    fn build_targets(&mut self, image_count: usize) {
        self.generation += 1;
        let base = 1_000_000 * self.generation;
        self.render_pass = RenderPassHandle(base);
        self.framebuffers = (1..=image_count as u64).map(|i| FramebufferHandle(base + i)).collect();
    }
}

impl Swapchain for MockSwapchain {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn render_pass(&self) -> RenderPassHandle {
        self.render_pass
    }

    fn framebuffers(&self) -> &[FramebufferHandle] {
        &self.framebuffers
    }

    fn acquire_next_image(&mut self) -> Result<u32> {
        let image = self.next_image;
        self.next_image = (self.next_image + 1) % self.framebuffers.len() as u32;
        Ok(image)
    }

    fn present(&mut self, image_index: u32, commands: &[CommandBufferHandle]) -> Result<()> {
        self.presented.push((image_index, commands.to_vec()));
        Ok(())
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.recreate_calls.push((width, height));
        self.extent = Extent2D::new(width, height);
        let count = self.framebuffers.len();
        self.build_targets(count);
        self.next_image = 0;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
