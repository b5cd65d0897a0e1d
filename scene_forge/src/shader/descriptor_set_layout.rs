/// Per-set descriptor layout derived from uniform declarations

use std::collections::BTreeMap;
use crate::error::Result;
use crate::graphics_device::{
    DescriptorPoolSize, DescriptorSetLayoutBinding, DescriptorSetLayoutHandle, DescriptorType,
};
use crate::shader::{ReflectedUniform, ShaderReflection, UniformBlockLayout};

/// Recipe for binding a byte range of the shared uniform buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSetTemplate {
    pub descriptor_type: DescriptorType,
    pub range: u64,
    pub binding: u32,
}

/// Layout of one descriptor set of a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayout {
    /// Set index (`layout(set = N)`)
    pub set: u32,
    /// Native layout, null until created by the shader compiler
    pub handle: DescriptorSetLayoutHandle,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
    /// Descriptor count per type, in first-encounter order
    pub pool_size_counts: Vec<DescriptorPoolSize>,
    pub blocks: Vec<UniformBlockLayout>,
    /// Sum of the packed block sizes
    pub struct_map_size_bytes: u64,
    pub write_set_templates: Vec<WriteSetTemplate>,
}

impl DescriptorSetLayout {
    fn describe(set: u32, uniforms: &[&ReflectedUniform]) -> Result<Self> {
        let mut layout = Self {
            set,
            handle: DescriptorSetLayoutHandle::NULL,
            bindings: Vec::with_capacity(uniforms.len()),
            pool_size_counts: Vec::new(),
            blocks: Vec::with_capacity(uniforms.len()),
            struct_map_size_bytes: 0,
            write_set_templates: Vec::with_capacity(uniforms.len()),
        };

        for uniform in uniforms {
            layout.bindings.push(DescriptorSetLayoutBinding {
                binding: uniform.binding,
                descriptor_type: uniform.descriptor_type,
                descriptor_count: uniform.count,
                stage_flags: uniform.stage,
            });

            match layout.pool_size_counts.iter_mut().find(|p| p.descriptor_type == uniform.descriptor_type) {
                Some(pool_size) => pool_size.descriptor_count += uniform.count,
                None => layout.pool_size_counts.push(DescriptorPoolSize {
                    descriptor_type: uniform.descriptor_type,
                    descriptor_count: uniform.count,
                }),
            }

            let block = UniformBlockLayout::pack(uniform)?;
            layout.struct_map_size_bytes += block.size;
            layout.write_set_templates.push(WriteSetTemplate {
                descriptor_type: uniform.descriptor_type,
                range: block.size,
                binding: uniform.binding,
            });
            layout.blocks.push(block);
        }

        Ok(layout)
    }

    /// Count of a descriptor type inside this set
    pub fn descriptor_count(&self, descriptor_type: DescriptorType) -> u32 {
        self.pool_size_counts
            .iter()
            .find(|p| p.descriptor_type == descriptor_type)
            .map_or(0, |p| p.descriptor_count)
    }
}

/// Group uniforms by set index (ascending) and describe every set
///
/// Bindings keep declaration order inside a set. Handles are left null.
pub fn describe_set_layouts(reflection: &ShaderReflection) -> Result<Vec<DescriptorSetLayout>> {
    let mut by_set: BTreeMap<u32, Vec<&ReflectedUniform>> = BTreeMap::new();
    for uniform in &reflection.uniforms {
        by_set.entry(uniform.set).or_default().push(uniform);
    }

    by_set
        .into_iter()
        .map(|(set, uniforms)| DescriptorSetLayout::describe(set, &uniforms))
        .collect()
}

#[cfg(test)]
#[path = "descriptor_set_layout_tests.rs"]
mod tests;
