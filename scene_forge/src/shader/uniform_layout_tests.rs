//! Unit tests for uniform_layout.rs

use crate::error::Error;
use crate::graphics_device::{DescriptorType, ShaderStageFlags};
use crate::shader::{align_up, ReflectedField, ReflectedUniform, UniformBlockLayout, UniformMemberType};

fn uniform(fields: &[(&str, u32, u32)]) -> ReflectedUniform {
    ReflectedUniform {
        name: "Transforms".to_string(),
        set: 0,
        binding: 0,
        descriptor_type: DescriptorType::UniformBuffer,
        count: 1,
        stage: ShaderStageFlags::VERTEX,
        fields: fields
            .iter()
            .map(|(name, type_code, count)| ReflectedField {
                name: name.to_string(),
                type_code: *type_code,
                count: *count,
            })
            .collect(),
    }
}

// ============================================================================
// MEMBER TYPES
// ============================================================================

#[test]
fn test_matrix_float_counts() {
    assert_eq!(UniformMemberType::from_code(0, "a").unwrap().float_count(), 4);
    assert_eq!(UniformMemberType::from_code(1, "b").unwrap().float_count(), 9);
    assert_eq!(UniformMemberType::from_code(2, "c").unwrap().float_count(), 16);
}

#[test]
fn test_unknown_type_code_is_invalid_uniform_type() {
    let result = UniformMemberType::from_code(3, "light_dir");
    match result {
        Err(Error::InvalidUniformType(msg)) => assert!(msg.contains("light_dir")),
        other => panic!("unexpected result: {:?}", other),
    }
}

// ============================================================================
// PACKING
// ============================================================================

#[test]
fn test_align_up() {
    assert_eq!(align_up(0, 16), 0);
    assert_eq!(align_up(1, 16), 16);
    assert_eq!(align_up(64, 16), 64);
    assert_eq!(align_up(100, 16), 112);
}

#[test]
fn test_single_mat4_block_is_64_bytes() {
    let block = UniformBlockLayout::pack(&uniform(&[("mvp", 2, 1)])).unwrap();
    assert_eq!(block.size, 64);
    assert_eq!(block.fields[0].offset, 0);
}

#[test]
fn test_fields_are_packed_back_to_back() {
    let block = UniformBlockLayout::pack(&uniform(&[("model", 2, 1), ("normal", 1, 1), ("bones", 0, 3)])).unwrap();
    let normal = block.field("normal").unwrap();
    let bones = block.field("bones").unwrap();

    assert_eq!(normal.offset, 64);
    assert_eq!(normal.size, 36);
    assert_eq!(bones.offset, 100);
    assert_eq!(bones.size, 48);
    // 148 rounded up to 16
    assert_eq!(block.size, 160);
}

#[test]
fn test_mat3_block_is_rounded_to_alignment() {
    let block = UniformBlockLayout::pack(&uniform(&[("rot", 1, 1)])).unwrap();
    assert_eq!(block.size, 48);
}

#[test]
fn test_block_without_fields_is_empty() {
    let block = UniformBlockLayout::pack(&uniform(&[])).unwrap();
    assert_eq!(block.size, 0);
    assert!(block.field("anything").is_none());
}

#[test]
fn test_invalid_field_aborts_packing() {
    let result = UniformBlockLayout::pack(&uniform(&[("mvp", 2, 1), ("color", 9, 1)]));
    assert!(matches!(result, Err(Error::InvalidUniformType(_))));
}
