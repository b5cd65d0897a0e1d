/// Mesh packing - one shared byte image for every referenced mesh

use rustc_hash::FxHashMap;
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::MappedRegion;
use crate::scene::{MeshId, SceneDescription};
use crate::shader::align_up;

/// Packed mesh base offsets are aligned to this
const MESH_ALIGNMENT: u64 = 4;

/// A mesh placed in the shared device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedMesh {
    pub mesh: MeshId,
    pub base_offset: u64,
}

/// Placement of every referenced mesh
///
/// Meshes are placed in first-reference order over the object list. A mesh
/// referenced by N objects is placed once; unreferenced meshes are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshPacking {
    slots: FxHashMap<MeshId, usize>,
    packed: Vec<PackedMesh>,
    total_size: u64,
}

impl MeshPacking {
    pub fn plan(desc: &SceneDescription) -> Result<Self> {
        let mut packing = Self::default();

        for object in &desc.objects {
            let Some(mesh_id) = object.mesh else { continue };
            if packing.slots.contains_key(&mesh_id) {
                continue;
            }
            let mesh = match desc.mesh(mesh_id) {
                Some(m) => m,
                None => engine_bail!(InvalidResource, "sceneforge::packer", "Unknown mesh {}", mesh_id.0),
            };

            let base_offset = align_up(packing.total_size, MESH_ALIGNMENT);
            packing.slots.insert(mesh_id, packing.packed.len());
            packing.packed.push(PackedMesh { mesh: mesh_id, base_offset });
            packing.total_size = base_offset + mesh.size();
        }

        Ok(packing)
    }

    /// Total bytes of the packed image (0 when no object has a mesh)
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn packed(&self) -> &[PackedMesh] {
        &self.packed
    }

    pub fn base_offset(&self, mesh: MeshId) -> Option<u64> {
        self.slots.get(&mesh).map(|&slot| self.packed[slot].base_offset)
    }

    /// Copy every placed mesh into a mapped staging region
    pub fn write(&self, desc: &SceneDescription, region: &mut MappedRegion<'_>) -> Result<()> {
        for placed in &self.packed {
            let mesh = match desc.mesh(placed.mesh) {
                Some(m) => m,
                None => engine_bail!(InvalidResource, "sceneforge::packer", "Unknown mesh {}", placed.mesh.0),
            };
            region.write_bytes(placed.base_offset, mesh.bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mesh_packer_tests.rs"]
mod tests;
