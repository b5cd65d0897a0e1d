//! Unit tests for vulkan_convert.rs
//!
//! Pure conversions, no GPU required.

use super::*;
use ash::vk::Handle;

// ============================================================================
// HANDLES
// ============================================================================

#[test]
fn test_handle_raw_roundtrip() {
    let buffer = vk::Buffer::from_raw(0xDEAD_BEEF);
    assert_eq!(raw(buffer), 0xDEAD_BEEF);
    assert_eq!(from_raw::<vk::Buffer>(raw(buffer)), buffer);
    assert_eq!(raw(vk::Pipeline::null()), 0);
}

// ============================================================================
// FORMATS
// ============================================================================

#[test]
fn test_buffer_format_float_formats() {
    assert_eq!(buffer_format_to_vk(BufferFormat::R32_SFLOAT), vk::Format::R32_SFLOAT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32_SFLOAT), vk::Format::R32G32_SFLOAT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32B32_SFLOAT), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32B32A32_SFLOAT), vk::Format::R32G32B32A32_SFLOAT);
}

#[test]
fn test_buffer_format_integer_formats() {
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32_SINT), vk::Format::R32G32_SINT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32B32A32_UINT), vk::Format::R32G32B32A32_UINT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R16G16B16A16_SINT), vk::Format::R16G16B16A16_SINT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
}

#[test]
fn test_index_types() {
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

// ============================================================================
// BUFFERS / MEMORY
// ============================================================================

#[test]
fn test_buffer_usage_combined() {
    let usage = BufferUsageFlags::VERTEX_BUFFER | BufferUsageFlags::INDEX_BUFFER | BufferUsageFlags::TRANSFER_DST;
    assert_eq!(
        buffer_usage_to_vk(usage),
        vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
    );
    assert_eq!(buffer_usage_to_vk(BufferUsageFlags::empty()), vk::BufferUsageFlags::empty());
}

#[test]
fn test_memory_location() {
    use gpu_allocator::MemoryLocation;

    assert_eq!(
        memory_location(MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT),
        MemoryLocation::CpuToGpu
    );
    assert_eq!(memory_location(MemoryPropertyFlags::DEVICE_LOCAL), MemoryLocation::GpuOnly);
}

// ============================================================================
// DESCRIPTORS / STAGES
// ============================================================================

#[test]
fn test_descriptor_types() {
    assert_eq!(descriptor_type_to_vk(DescriptorType::UniformBuffer), vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::CombinedImageSampler),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::StorageBufferDynamic),
        vk::DescriptorType::STORAGE_BUFFER_DYNAMIC
    );
}

#[test]
fn test_stage_flags() {
    assert_eq!(shader_stage_to_vk(ShaderStage::Fragment), vk::ShaderStageFlags::FRAGMENT);
    assert_eq!(
        stage_flags_to_vk(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    );
}

// ============================================================================
// PIPELINE STATE
// ============================================================================

#[test]
fn test_fixed_function_state() {
    assert_eq!(topology_to_vk(PrimitiveTopology::TriangleList), vk::PrimitiveTopology::TRIANGLE_LIST);
    assert_eq!(input_rate_to_vk(VertexInputRate::Instance), vk::VertexInputRate::INSTANCE);
    assert_eq!(cull_mode_to_vk(CullMode::Back), vk::CullModeFlags::BACK);
    assert_eq!(front_face_to_vk(FrontFace::Clockwise), vk::FrontFace::CLOCKWISE);
    assert_eq!(polygon_mode_to_vk(PolygonMode::Line), vk::PolygonMode::LINE);
    assert_eq!(compare_op_to_vk(CompareOp::LessOrEqual), vk::CompareOp::LESS_OR_EQUAL);
    assert_eq!(sample_count_to_vk(SampleCount::S4), vk::SampleCountFlags::TYPE_4);
}

#[test]
fn test_viewport_and_scissor() {
    use scene_forge::graphics_device::Extent2D;

    let extent = Extent2D::new(800, 600);
    let viewport = viewport_to_vk(&Viewport::from_extent(extent));
    assert_eq!((viewport.width, viewport.height, viewport.max_depth), (800.0, 600.0, 1.0));

    let scissor = rect_to_vk(&Rect2D::from_extent(extent));
    assert_eq!(scissor.offset, vk::Offset2D { x: 0, y: 0 });
    assert_eq!(scissor.extent, vk::Extent2D { width: 800, height: 600 });
}

#[test]
fn test_clear_values() {
    let color = clear_value_to_vk(&ClearValue::Color([0.1, 0.2, 0.3, 1.0]));
    let depth = clear_value_to_vk(&ClearValue::DepthStencil { depth: 1.0, stencil: 7 });

    unsafe {
        assert_eq!(color.color.float32, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(depth.depth_stencil.depth, 1.0);
        assert_eq!(depth.depth_stencil.stencil, 7);
    }
}
