/// Descriptor types, set layout bindings, pool sizes and write sets

use serde::{Deserialize, Serialize};
use crate::graphics_device::{BufferHandle, DescriptorSetHandle, ShaderStageFlags};

/// Kind of resource a descriptor binding refers to
///
/// Deserialized from reflection mappings in snake case, e.g. `"uniform_buffer"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

/// One binding slot in a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    /// Binding number (`layout(binding = N)` in GLSL)
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stage_flags: ShaderStageFlags,
}

/// Capacity of one descriptor type inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
}

/// Binds a byte range of a buffer to one binding of a descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteDescriptorSet {
    pub dst_set: DescriptorSetHandle,
    pub dst_binding: u32,
    pub descriptor_type: DescriptorType,
    pub buffer: BufferHandle,
    pub offset: u64,
    pub range: u64,
}
