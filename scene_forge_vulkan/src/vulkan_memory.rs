/// VulkanMemory - MemoryAllocator backed by gpu-allocator

use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme};
use rustc_hash::FxHashMap;
use scene_forge::graphics_device::{
    Allocation, BufferHandle, MappedRegion, MemoryAllocator, MemoryPropertyFlags, MemoryResource,
};
use scene_forge::sceneforge::{Error, Result};
use scene_forge::{engine_bail, engine_err, engine_error, engine_warn};
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{from_raw, memory_location};

/// One live gpu-allocator allocation
struct LiveAllocation {
    allocation: gpu_allocator::vulkan::Allocation,
    /// Requested resource size (the mapped view is clamped to it)
    size: u64,
}

/// GPU memory for buffers created by [`crate::VulkanDevice`]
pub struct VulkanMemory {
    ctx: Arc<VulkanContext>,
    /// Creation size of each live buffer
    buffer_sizes: FxHashMap<u64, u64>,
    allocations: FxHashMap<u64, LiveAllocation>,
    next_id: u64,
}

impl VulkanMemory {
    pub(crate) fn new(ctx: Arc<VulkanContext>) -> Self {
        Self {
            ctx,
            buffer_sizes: FxHashMap::default(),
            allocations: FxHashMap::default(),
            next_id: 1,
        }
    }

    pub(crate) fn register_buffer(&mut self, buffer: BufferHandle, size: u64) {
        self.buffer_sizes.insert(buffer.0, size);
    }

    pub(crate) fn forget_buffer(&mut self, buffer: BufferHandle) {
        self.buffer_sizes.remove(&buffer.0);
    }

    /// Number of allocations not yet freed
    pub fn live_allocations(&self) -> usize {
        self.allocations.len()
    }

    /// Release every remaining allocation
    pub(crate) fn free_all(&mut self) {
        if self.allocations.is_empty() {
            return;
        }
        engine_warn!("sceneforge::vulkan", "Releasing {} leaked allocations", self.allocations.len());
        let ids: Vec<u64> = self.allocations.keys().copied().collect();
        for id in ids {
            self.free(Allocation { id, offset: 0, size: 0 });
        }
    }
}

impl MemoryAllocator for VulkanMemory {
    fn allocate(&mut self, resource: MemoryResource, flags: MemoryPropertyFlags) -> Result<Allocation> {
        let buffer = match resource {
            MemoryResource::Buffer(buffer) => buffer,
            other => engine_bail!(InvalidResource, "sceneforge::vulkan",
                "Unsupported memory resource {:?}", other),
        };
        let size = match self.buffer_sizes.get(&buffer.0) {
            Some(&size) => size,
            None => engine_bail!(InvalidResource, "sceneforge::vulkan",
                "Cannot allocate memory for unknown buffer {}", buffer.0),
        };

        let vk_buffer: vk::Buffer = from_raw(buffer.0);
        let requirements = unsafe { self.ctx.device.get_buffer_memory_requirements(vk_buffer) };

        let allocation = self.ctx.allocator()?
            .allocate(&AllocationCreateDesc {
                name: "scene buffer",
                requirements,
                location: memory_location(flags),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("sceneforge::vulkan", "Out of GPU memory for buffer (required: {:.2} MB): {:?}", size_mb, e);
                Error::OutOfMemory
            })?;

        let bound = unsafe {
            self.ctx.device.bind_buffer_memory(vk_buffer, allocation.memory(), allocation.offset())
        };
        if let Err(e) = bound {
            // Don't leak the block when binding fails
            if let Ok(mut allocator) = self.ctx.allocator() {
                allocator.free(allocation).ok();
            }
            engine_bail!("sceneforge::vulkan", "Failed to bind buffer memory: {:?}", e);
        }

        let id = self.next_id;
        self.next_id += 1;
        let offset = allocation.offset();
        self.allocations.insert(id, LiveAllocation { allocation, size });
        Ok(Allocation { id, offset, size })
    }

    fn map(&mut self, allocation: &Allocation) -> Result<MappedRegion<'_>> {
        let live = match self.allocations.get_mut(&allocation.id) {
            Some(live) => live,
            None => engine_bail!(InvalidResource, "sceneforge::vulkan", "Unknown allocation {}", allocation.id),
        };
        let size = live.size as usize;
        match live.allocation.mapped_slice_mut() {
            Some(bytes) if bytes.len() >= size => Ok(MappedRegion::new(&mut bytes[..size])),
            Some(_) => Err(engine_err!("sceneforge::vulkan",
                "Mapped range of allocation {} is smaller than its buffer", allocation.id)),
            None => Err(engine_err!(InvalidState, "sceneforge::vulkan",
                "Allocation {} is not host-visible", allocation.id)),
        }
    }

    fn free(&mut self, allocation: Allocation) {
        let Some(live) = self.allocations.remove(&allocation.id) else {
            engine_warn!("sceneforge::vulkan", "Free of unknown allocation {}", allocation.id);
            return;
        };
        // Don't panic if lock fails - the block is reclaimed with the allocator
        if let Ok(mut allocator) = self.ctx.allocator() {
            if let Err(e) = allocator.free(live.allocation) {
                engine_warn!("sceneforge::vulkan", "Failed to free allocation {}: {:?}", allocation.id, e);
            }
        }
    }
}
