//! Unit tests for scene_description.rs

use crate::error::Error;
use crate::graphics_device::IndexType;
use crate::scene::{GameObjectDescriptor, MeshDescriptor, MeshId, SceneDescription};
use crate::shader::ShaderDescriptor;

const POS_ONLY: &str = r#"{
    "bindings": [{ "id": 0, "stride": 12 }],
    "attributes": [{ "name": "pos", "location": 0, "binding": 0, "format": "R32G32B32_SFLOAT" }]
}"#;

fn triangle() -> MeshDescriptor {
    MeshDescriptor::builder()
        .attribute("pos", &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
        .indices_u16(&[0, 1, 2])
        .build()
        .unwrap()
}

// ============================================================================
// MESH BUILDER
// ============================================================================

#[test]
fn test_builder_lays_out_attributes_then_indices() {
    let mesh = MeshDescriptor::builder()
        .attribute("pos", &[[0.0f32; 3]; 3])
        .attribute("uv", &[[0.5f32; 2]; 3])
        .indices_u32(&[0, 1, 2])
        .build()
        .unwrap();

    assert_eq!(mesh.attribute_offset("pos"), Some(0));
    assert_eq!(mesh.attribute_offset("uv"), Some(36));
    assert_eq!(mesh.indices_offset(), 60);
    assert_eq!(mesh.size(), 72);
    assert_eq!(mesh.index_type(), IndexType::U32);
    assert_eq!(mesh.index_count(), 3);
    assert_eq!(mesh.attribute_offset("normal"), None);
}

#[test]
fn test_index_offset_is_aligned() {
    let mesh = MeshDescriptor::builder()
        .attribute("id", &[1u8, 2, 3])
        .indices_u16(&[0, 1, 2])
        .build()
        .unwrap();

    assert_eq!(mesh.indices_offset(), 4);
    assert_eq!(mesh.bytes()[3], 0);
    assert_eq!(mesh.bytes()[4..6], 0u16.to_ne_bytes());
}

#[test]
fn test_builder_requires_indices() {
    let result = MeshDescriptor::builder().attribute("pos", &[0.0f32; 9]).build();
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_builder_rejects_duplicate_attribute() {
    let result = MeshDescriptor::builder()
        .attribute("pos", &[0.0f32; 3])
        .attribute("pos", &[1.0f32; 3])
        .indices_u16(&[0])
        .build();
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// SCENE DESCRIPTION
// ============================================================================

#[test]
fn test_add_returns_indices() {
    let mut desc = SceneDescription::new();
    let shader = desc.add_shader(ShaderDescriptor::from_json("flat", vec![0; 4], vec![0; 4], POS_ONLY).unwrap());
    let mesh = desc.add_mesh(triangle());
    let first = desc.add_object(GameObjectDescriptor::new(shader, mesh));
    let second = desc.add_object(GameObjectDescriptor::without_mesh(shader));

    assert_eq!((shader, mesh, first, second), (0, MeshId(0), 0, 1));
    assert!(desc.validate().is_ok());
}

#[test]
fn test_validate_unknown_shader() {
    let mut desc = SceneDescription::new();
    desc.add_object(GameObjectDescriptor::without_mesh(4));
    assert!(matches!(desc.validate(), Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_unknown_mesh() {
    let mut desc = SceneDescription::new();
    let shader = desc.add_shader(ShaderDescriptor::from_json("flat", vec![0; 4], vec![0; 4], POS_ONLY).unwrap());
    desc.add_object(GameObjectDescriptor::new(shader, MeshId(9)));
    assert!(matches!(desc.validate(), Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_missing_attribute() {
    let mut desc = SceneDescription::new();
    let shader = desc.add_shader(ShaderDescriptor::from_json("flat", vec![0; 4], vec![0; 4], POS_ONLY).unwrap());
    let mesh = desc.add_mesh(
        MeshDescriptor::builder()
            .attribute("position", &[0.0f32; 9])
            .indices_u16(&[0, 1, 2])
            .build()
            .unwrap(),
    );
    desc.add_object(GameObjectDescriptor::new(shader, mesh));

    match desc.validate() {
        Err(Error::InvalidResource(msg)) => assert!(msg.contains("'pos'")),
        other => panic!("unexpected result: {:?}", other),
    }
}
