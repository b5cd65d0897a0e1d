//! Declarative scene content: shaders, meshes and game objects.
//!
//! A `SceneDescription` is plain data. It can be edited freely until the
//! host compiles it, after which its content moves into a `CompiledScene`.

use bytemuck::Pod;
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::IndexType;
use crate::shader::{align_up, ShaderDescriptor};

/// Index buffer offsets must be a multiple of this
const INDEX_ALIGNMENT: u64 = 4;

// ============================================================================
// MESH
// ============================================================================

/// Identifies a mesh inside one scene description
///
/// Mesh dedup during packing is keyed on this id: two objects with the same
/// `MeshId` share one packed copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// Named vertex attribute stream inside a mesh byte image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshAttribute {
    pub name: String,
    /// Offset from the start of the mesh bytes
    pub offset: u64,
    pub size: u64,
}

/// Source geometry: attribute streams followed by indices, in one byte image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshDescriptor {
    bytes: Vec<u8>,
    attributes: Vec<MeshAttribute>,
    index_type: IndexType,
    index_count: u32,
    indices_offset: u64,
}

impl MeshDescriptor {
    pub fn builder() -> MeshBuilder {
        MeshBuilder::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn attributes(&self) -> &[MeshAttribute] {
        &self.attributes
    }

    /// Offset of a named attribute stream inside the mesh bytes
    pub fn attribute_offset(&self, name: &str) -> Option<u64> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.offset)
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn indices_offset(&self) -> u64 {
        self.indices_offset
    }
}

/// Builder for [`MeshDescriptor`]
///
/// ```no_run
/// # use scene_forge::scene::MeshDescriptor;
/// let mesh = MeshDescriptor::builder()
///     .attribute("pos", &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
///     .indices_u16(&[0, 1, 2])
///     .build()?;
/// # Ok::<(), scene_forge::sceneforge::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MeshBuilder {
    attributes: Vec<(String, Vec<u8>)>,
    indices: Option<(IndexType, Vec<u8>, u32)>,
}

impl MeshBuilder {
    /// Append a named attribute stream
    pub fn attribute<T: Pod>(mut self, name: impl Into<String>, data: &[T]) -> Self {
        self.attributes.push((name.into(), bytemuck::cast_slice(data).to_vec()));
        self
    }

    pub fn indices_u16(mut self, indices: &[u16]) -> Self {
        self.indices = Some((IndexType::U16, bytemuck::cast_slice(indices).to_vec(), indices.len() as u32));
        self
    }

    pub fn indices_u32(mut self, indices: &[u32]) -> Self {
        self.indices = Some((IndexType::U32, bytemuck::cast_slice(indices).to_vec(), indices.len() as u32));
        self
    }

    /// Lay attributes out back to back, then the indices at an aligned offset
    pub fn build(self) -> Result<MeshDescriptor> {
        let (index_type, index_bytes, index_count) = match self.indices {
            Some(indices) => indices,
            None => engine_bail!(InvalidResource, "sceneforge::mesh", "Mesh has no index data"),
        };

        let mut bytes = Vec::new();
        let mut attributes: Vec<MeshAttribute> = Vec::with_capacity(self.attributes.len());
        for (name, data) in self.attributes {
            if attributes.iter().any(|a| a.name == name) {
                engine_bail!(InvalidResource, "sceneforge::mesh", "Duplicate mesh attribute '{}'", name);
            }
            attributes.push(MeshAttribute {
                name,
                offset: bytes.len() as u64,
                size: data.len() as u64,
            });
            bytes.extend_from_slice(&data);
        }

        let indices_offset = align_up(bytes.len() as u64, INDEX_ALIGNMENT);
        bytes.resize(indices_offset as usize, 0);
        bytes.extend_from_slice(&index_bytes);

        Ok(MeshDescriptor {
            bytes,
            attributes,
            index_type,
            index_count,
            indices_offset,
        })
    }
}

// ============================================================================
// GAME OBJECT
// ============================================================================

/// One drawable entity: a shader and an optional mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameObjectDescriptor {
    /// Index into [`SceneDescription::shaders`]
    pub shader: usize,
    /// Objects without a mesh bind their pipeline and sets but issue no draw
    pub mesh: Option<MeshId>,
}

impl GameObjectDescriptor {
    pub fn new(shader: usize, mesh: MeshId) -> Self {
        Self { shader, mesh: Some(mesh) }
    }

    pub fn without_mesh(shader: usize) -> Self {
        Self { shader, mesh: None }
    }
}

// ============================================================================
// SCENE DESCRIPTION
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SceneDescription {
    pub shaders: Vec<ShaderDescriptor>,
    pub meshes: Vec<MeshDescriptor>,
    /// Objects in declaration order, which is also draw order
    pub objects: Vec<GameObjectDescriptor>,
}

impl SceneDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shader and return its index
    pub fn add_shader(&mut self, shader: ShaderDescriptor) -> usize {
        self.shaders.push(shader);
        self.shaders.len() - 1
    }

    pub fn add_mesh(&mut self, mesh: MeshDescriptor) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Add an object and return its index
    pub fn add_object(&mut self, object: GameObjectDescriptor) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshDescriptor> {
        self.meshes.get(id.0)
    }

    /// Check every object reference before any native object is created
    pub fn validate(&self) -> Result<()> {
        for (index, object) in self.objects.iter().enumerate() {
            let shader = match self.shaders.get(object.shader) {
                Some(s) => s,
                None => engine_bail!(InvalidResource, "sceneforge::scene",
                    "Object {} references unknown shader {}", index, object.shader),
            };
            let Some(mesh_id) = object.mesh else { continue };
            let mesh = match self.mesh(mesh_id) {
                Some(m) => m,
                None => engine_bail!(InvalidResource, "sceneforge::scene",
                    "Object {} references unknown mesh {}", index, mesh_id.0),
            };
            for attribute in &shader.reflection.attributes {
                if mesh.attribute_offset(&attribute.name).is_none() {
                    engine_bail!(InvalidResource, "sceneforge::scene",
                        "Mesh {} lacks attribute '{}' required by shader '{}'",
                        mesh_id.0, attribute.name, shader.name);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scene_description_tests.rs"]
mod tests;
