//! Unit tests for buffer.rs
//!
//! Tests BufferFormat sizes and naming, IndexType sizes and usage flag sets.

use crate::graphics_device::{BufferFormat, BufferUsageFlags, IndexType};

// ============================================================================
// BUFFER FORMAT TESTS
// ============================================================================

#[test]
fn test_buffer_format_sizes() {
    assert_eq!(BufferFormat::R32_SFLOAT.size_bytes(), 4);
    assert_eq!(BufferFormat::R32G32_SFLOAT.size_bytes(), 8);
    assert_eq!(BufferFormat::R32G32B32_SFLOAT.size_bytes(), 12);
    assert_eq!(BufferFormat::R32G32B32A32_SFLOAT.size_bytes(), 16);
    assert_eq!(BufferFormat::R16G16B16A16_UINT.size_bytes(), 8);
    assert_eq!(BufferFormat::R8G8B8A8_UNORM.size_bytes(), 4);
}

#[test]
fn test_buffer_format_deserializes_by_name() {
    let format: BufferFormat = serde_json::from_str("\"R32G32B32_SFLOAT\"").unwrap();
    assert_eq!(format, BufferFormat::R32G32B32_SFLOAT);

    let unknown = serde_json::from_str::<BufferFormat>("\"R64_SFLOAT\"");
    assert!(unknown.is_err());
}

// ============================================================================
// INDEX TYPE TESTS
// ============================================================================

#[test]
fn test_index_type_size_bytes() {
    assert_eq!(IndexType::U16.size_bytes(), 2);
    assert_eq!(IndexType::U32.size_bytes(), 4);
}

#[test]
fn test_index_type_size_calculations() {
    let index_count = 36u32;
    assert_eq!(index_count * IndexType::U16.size_bytes(), 72);
    assert_eq!(index_count * IndexType::U32.size_bytes(), 144);
}

// ============================================================================
// USAGE FLAGS TESTS
// ============================================================================

#[test]
fn test_mesh_buffer_usage_combination() {
    let usage = BufferUsageFlags::VERTEX_BUFFER
        | BufferUsageFlags::INDEX_BUFFER
        | BufferUsageFlags::TRANSFER_DST;
    assert!(usage.contains(BufferUsageFlags::VERTEX_BUFFER));
    assert!(usage.contains(BufferUsageFlags::INDEX_BUFFER));
    assert!(!usage.contains(BufferUsageFlags::TRANSFER_SRC));
}
