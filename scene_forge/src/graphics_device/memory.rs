/// Memory allocator capability
///
/// The pooling strategy is owned by the backend. The scene compiler only
/// allocates memory for a resource, writes through a scoped mapping and frees
/// the allocation at teardown.

use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::BufferHandle;

bitflags! {
    /// Required memory properties
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryPropertyFlags: u32 {
        const DEVICE_LOCAL = 0x01;
        const HOST_VISIBLE = 0x02;
        const HOST_COHERENT = 0x04;
    }
}

/// Resource that receives memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MemoryResource {
    Buffer(BufferHandle),
}

/// A live allocation bound to one resource
///
/// Not `Clone`: handing it to [`MemoryAllocator::free`] consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Backend bookkeeping key
    pub id: u64,
    /// Offset inside the backing memory block
    pub offset: u64,
    /// Usable size in bytes (the size requested by the resource)
    pub size: u64,
}

/// Scoped writable view of a host-visible allocation
///
/// The view ends when the region is dropped.
pub struct MappedRegion<'a> {
    bytes: &'a mut [u8],
}

impl<'a> MappedRegion<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy `data` into the region at `offset`
    pub fn write_bytes(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let start = offset as usize;
        let end = start.checked_add(data.len()).unwrap_or(usize::MAX);
        if end > self.bytes.len() {
            crate::engine_bail!(InvalidResource, "sceneforge::memory",
                "Mapped write out of range: {}..{} (region size {})",
                start, end, self.bytes.len());
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    pub fn fill(&mut self, value: u8) {
        self.bytes.fill(value);
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes
    }
}

/// Allocate, map and free GPU memory
pub trait MemoryAllocator {
    /// Allocate memory with `flags` and bind it to `resource`
    ///
    /// # Errors
    ///
    /// `OutOfMemory` when no heap satisfies the request, `ResourceCreationFailure`
    /// when binding fails.
    fn allocate(&mut self, resource: MemoryResource, flags: MemoryPropertyFlags) -> Result<Allocation>;

    /// Map a host-visible allocation for writing
    fn map(&mut self, allocation: &Allocation) -> Result<MappedRegion<'_>>;

    /// Release an allocation
    fn free(&mut self, allocation: Allocation);
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
