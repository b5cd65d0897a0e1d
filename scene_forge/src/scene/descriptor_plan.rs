/// Descriptor pool sizing and uniform write-set generation

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    BufferHandle, DescriptorPoolSize, DescriptorSetHandle, DescriptorType, WriteDescriptorSet,
};
use crate::scene::ShaderGroup;
use crate::shader::DescriptorSetLayout;

// ============================================================================
// POOL SIZING
// ============================================================================

/// Capacity of the single descriptor pool of a scene
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorPoolPlan {
    /// Σ object_count × set_layout_count over all groups
    pub max_sets: u32,
    /// Per type: Σ count × object_count, in first-encounter order
    pub pool_sizes: Vec<DescriptorPoolSize>,
}

impl DescriptorPoolPlan {
    /// `set_layouts[shader]` lists the set layouts of each shader
    pub fn plan(groups: &[ShaderGroup], set_layouts: &[&[DescriptorSetLayout]]) -> Self {
        let mut plan = Self::default();

        for group in groups {
            let layouts = set_layouts.get(group.shader).copied().unwrap_or(&[]);
            let object_count = group.object_count() as u32;
            plan.max_sets += object_count * layouts.len() as u32;

            for layout in layouts {
                for size in &layout.pool_size_counts {
                    plan.add(size.descriptor_type, size.descriptor_count * object_count);
                }
            }
        }

        plan
    }

    fn add(&mut self, descriptor_type: DescriptorType, count: u32) {
        match self.pool_sizes.iter_mut().find(|p| p.descriptor_type == descriptor_type) {
            Some(size) => size.descriptor_count += count,
            None => self.pool_sizes.push(DescriptorPoolSize { descriptor_type, descriptor_count: count }),
        }
    }

    /// No pool is needed when no object has a descriptor set
    pub fn is_empty(&self) -> bool {
        self.max_sets == 0
    }
}

// ============================================================================
// WRITE SETS
// ============================================================================

/// Byte range of one uniform block inside the scene uniform buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformRange {
    /// Uniform block name from the reflection mapping
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub offset: u64,
    pub size: u64,
}

/// Writes and uniform ranges for one object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectWrites {
    pub writes: Vec<WriteDescriptorSet>,
    pub uniforms: Vec<UniformRange>,
}

/// Generate the writes of one object's sets, advancing `cursor` through the
/// uniform buffer
///
/// `sets[i]` is the object's handle for `layouts[i]`.
pub fn object_writes(
    sets: &[DescriptorSetHandle],
    layouts: &[DescriptorSetLayout],
    uniform_buffer: BufferHandle,
    cursor: &mut u64,
) -> Result<ObjectWrites> {
    let mut out = ObjectWrites::default();

    for (&set, layout) in sets.iter().zip(layouts) {
        for (template, block) in layout.write_set_templates.iter().zip(&layout.blocks) {
            if template.descriptor_type != DescriptorType::UniformBuffer {
                engine_bail!(UnsupportedDescriptorType, "sceneforge::descriptors",
                    "Cannot generate a write for {:?} at set {} binding {}",
                    template.descriptor_type, layout.set, template.binding);
            }

            out.writes.push(WriteDescriptorSet {
                dst_set: set,
                dst_binding: template.binding,
                descriptor_type: template.descriptor_type,
                buffer: uniform_buffer,
                offset: *cursor,
                range: template.range,
            });
            out.uniforms.push(UniformRange {
                name: block.name.clone(),
                set: layout.set,
                binding: template.binding,
                offset: *cursor,
                size: template.range,
            });
            *cursor += template.range;
        }
    }

    Ok(out)
}

#[cfg(test)]
#[path = "descriptor_plan_tests.rs"]
mod tests;
