/// CompiledShader - native objects built from one ShaderDescriptor
///
/// Holds the two stage modules, the vertex input layout, one
/// DescriptorSetLayout per referenced set and the aggregate pipeline layout.
/// Immutable after compilation; released with [`CompiledShader::free`].

use crate::engine_debug;
use crate::error::Result;
use crate::graphics_device::{
    DescriptorSetLayoutHandle, GraphicsDevice, PipelineLayoutHandle, ShaderModuleHandle,
    ShaderStage, ShaderStageDesc, VertexAttribute, VertexBinding, VertexInputLayout,
    VertexInputRate,
};
use crate::shader::{describe_set_layouts, DescriptorSetLayout, ShaderDescriptor, ShaderReflection};

#[derive(Debug)]
pub struct CompiledShader {
    name: String,
    vertex_module: ShaderModuleHandle,
    fragment_module: ShaderModuleHandle,
    vertex_input: VertexInputLayout,
    ordered_attribute_names: Vec<String>,
    set_layouts: Vec<DescriptorSetLayout>,
    pipeline_layout: PipelineLayoutHandle,
}

impl CompiledShader {
    /// Compile a shader descriptor into native objects
    ///
    /// On failure every object created so far is destroyed before the error
    /// is returned.
    pub fn compile(device: &mut dyn GraphicsDevice, desc: &ShaderDescriptor) -> Result<Self> {
        let mut shader = Self {
            name: desc.name.clone(),
            vertex_module: ShaderModuleHandle::NULL,
            fragment_module: ShaderModuleHandle::NULL,
            vertex_input: vertex_input_layout(&desc.reflection),
            ordered_attribute_names: desc.reflection.ordered_attribute_names(),
            set_layouts: Vec::new(),
            pipeline_layout: PipelineLayoutHandle::NULL,
        };

        match shader.create_native_objects(device, desc) {
            Ok(()) => {
                engine_debug!("sceneforge::shader",
                    "Compiled shader '{}' ({} set layouts, {} attributes)",
                    shader.name, shader.set_layouts.len(), shader.ordered_attribute_names.len());
                Ok(shader)
            }
            Err(e) => {
                shader.free(device);
                Err(e)
            }
        }
    }

    fn create_native_objects(&mut self, device: &mut dyn GraphicsDevice, desc: &ShaderDescriptor) -> Result<()> {
        self.vertex_module = device.create_shader_module(ShaderStage::Vertex, &desc.vertex_code)?;
        self.fragment_module = device.create_shader_module(ShaderStage::Fragment, &desc.fragment_code)?;

        // Describe everything before creating layouts so a bad member type
        // leaves no half-built set behind
        let described = describe_set_layouts(&desc.reflection)?;
        for mut layout in described {
            layout.handle = device.create_descriptor_set_layout(&layout.bindings)?;
            self.set_layouts.push(layout);
        }

        let handles: Vec<DescriptorSetLayoutHandle> = self.set_layouts.iter().map(|l| l.handle).collect();
        self.pipeline_layout = device.create_pipeline_layout(&handles)?;
        Ok(())
    }

    /// Destroy pipeline layout, then set layouts, then stage modules
    ///
    /// Null handles are skipped, so a partially compiled shader can be freed.
    pub fn free(self, device: &mut dyn GraphicsDevice) {
        if !self.pipeline_layout.is_null() {
            device.destroy_pipeline_layout(self.pipeline_layout);
        }
        for layout in self.set_layouts.iter().rev() {
            device.destroy_descriptor_set_layout(layout.handle);
        }
        if !self.fragment_module.is_null() {
            device.destroy_shader_module(self.fragment_module);
        }
        if !self.vertex_module.is_null() {
            device.destroy_shader_module(self.vertex_module);
        }
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage descriptions for pipeline creation
    pub fn stages(&self, entry_point: &str) -> Vec<ShaderStageDesc> {
        vec![
            ShaderStageDesc {
                stage: ShaderStage::Vertex,
                module: self.vertex_module,
                entry_point: entry_point.to_string(),
            },
            ShaderStageDesc {
                stage: ShaderStage::Fragment,
                module: self.fragment_module,
                entry_point: entry_point.to_string(),
            },
        ]
    }

    pub fn vertex_input(&self) -> &VertexInputLayout {
        &self.vertex_input
    }

    /// Vertex attribute names in vertex binding order
    pub fn ordered_attribute_names(&self) -> &[String] {
        &self.ordered_attribute_names
    }

    pub fn set_layouts(&self) -> &[DescriptorSetLayout] {
        &self.set_layouts
    }

    pub fn set_layout_count(&self) -> usize {
        self.set_layouts.len()
    }

    pub fn set_layout_handles(&self) -> Vec<DescriptorSetLayoutHandle> {
        self.set_layouts.iter().map(|l| l.handle).collect()
    }

    pub fn pipeline_layout(&self) -> PipelineLayoutHandle {
        self.pipeline_layout
    }

    /// Uniform bytes one object of this shader needs
    pub fn uniform_bytes_per_object(&self) -> u64 {
        self.set_layouts.iter().map(|l| l.struct_map_size_bytes).sum()
    }
}

/// Build the vertex input layout from reflected bindings and attributes
pub fn vertex_input_layout(reflection: &ShaderReflection) -> VertexInputLayout {
    VertexInputLayout {
        bindings: reflection
            .bindings
            .iter()
            .map(|b| VertexBinding {
                binding: b.id,
                stride: b.stride,
                input_rate: VertexInputRate::Vertex,
            })
            .collect(),
        attributes: reflection
            .attributes
            .iter()
            .map(|a| VertexAttribute {
                location: a.location,
                binding: a.binding,
                format: a.format,
                offset: a.offset,
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "compiled_shader_tests.rs"]
mod tests;
