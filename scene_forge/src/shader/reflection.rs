//! Shader reflection mapping
//!
//! Produced upstream next to the SPIR-V bytecode. Schema:
//!
//! ```json
//! {
//!   "bindings":   [{ "id": 0, "stride": 12 }],
//!   "attributes": [{ "name": "pos", "location": 0, "binding": 0, "format": "R32G32B32_SFLOAT", "offset": 0 }],
//!   "uniforms":   [{ "name": "View", "set": 0, "binding": 0, "type": "uniform_buffer", "count": 1,
//!                    "stage": "VERTEX", "fields": [{ "name": "mvp", "type": 2, "count": 1 }] }]
//! }
//! ```
//!
//! Field `type` is a numeric matrix code, see [`super::UniformMemberType`].

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{BufferFormat, DescriptorType, ShaderStageFlags};

fn one() -> u32 {
    1
}

/// Vertex buffer binding declared by the vertex stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectedBinding {
    pub id: u32,
    pub stride: u32,
}

/// Vertex attribute declared by the vertex stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectedAttribute {
    /// Attribute name, matched against mesh attribute names
    pub name: String,
    pub location: u32,
    pub binding: u32,
    pub format: BufferFormat,
    #[serde(default)]
    pub offset: u32,
}

/// One member of a uniform block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectedField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_code: u32,
    #[serde(default = "one")]
    pub count: u32,
}

/// Uniform declaration (one descriptor binding)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectedUniform {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    #[serde(rename = "type")]
    pub descriptor_type: DescriptorType,
    #[serde(default = "one")]
    pub count: u32,
    pub stage: ShaderStageFlags,
    #[serde(default)]
    pub fields: Vec<ReflectedField>,
}

/// Full reflection mapping of one shader program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderReflection {
    #[serde(default)]
    pub bindings: Vec<ReflectedBinding>,
    #[serde(default)]
    pub attributes: Vec<ReflectedAttribute>,
    #[serde(default)]
    pub uniforms: Vec<ReflectedUniform>,
}

impl ShaderReflection {
    /// Parse and validate a JSON reflection mapping
    pub fn from_json(text: &str) -> Result<Self> {
        let reflection: ShaderReflection = serde_json::from_str(text)?;
        reflection.validate()?;
        Ok(reflection)
    }

    /// Check cross references inside the mapping
    ///
    /// - every attribute uses a declared vertex binding
    /// - attribute names and `(set, binding)` pairs are unique
    /// - set indices are contiguous from 0 (set layouts are bound densely)
    pub fn validate(&self) -> Result<()> {
        let declared: FxHashSet<u32> = self.bindings.iter().map(|b| b.id).collect();

        let mut names = FxHashSet::default();
        for attribute in &self.attributes {
            if !declared.contains(&attribute.binding) {
                engine_bail!(InvalidReflection, "sceneforge::reflection",
                    "Attribute '{}' uses undeclared vertex binding {}",
                    attribute.name, attribute.binding);
            }
            if !names.insert(attribute.name.as_str()) {
                engine_bail!(InvalidReflection, "sceneforge::reflection",
                    "Duplicate attribute name '{}'", attribute.name);
            }
        }

        let mut slots = FxHashSet::default();
        for uniform in &self.uniforms {
            if !slots.insert((uniform.set, uniform.binding)) {
                engine_bail!(InvalidReflection, "sceneforge::reflection",
                    "Uniform '{}' reuses set {} binding {}",
                    uniform.name, uniform.set, uniform.binding);
            }
        }

        let mut sets: Vec<u32> = self.uniforms.iter().map(|u| u.set).collect();
        sets.sort_unstable();
        sets.dedup();
        for (expected, &set) in (0u32..).zip(&sets) {
            if set != expected {
                engine_bail!(InvalidReflection, "sceneforge::reflection",
                    "Descriptor set {} declared without set {}", set, expected);
            }
        }
        Ok(())
    }

    /// Attribute names sorted by vertex binding (stable)
    pub fn ordered_attribute_names(&self) -> Vec<String> {
        let mut attributes: Vec<&ReflectedAttribute> = self.attributes.iter().collect();
        attributes.sort_by_key(|a| a.binding);
        attributes.into_iter().map(|a| a.name.clone()).collect()
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
