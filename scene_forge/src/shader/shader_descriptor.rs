/// ShaderDescriptor - bytecode and reflection mapping of one shader program

use std::fs;
use std::path::Path;
use crate::engine_err;
use crate::error::Result;
use crate::shader::ShaderReflection;

/// Source of one shader program, consumed by the shader compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    pub name: String,
    /// SPIR-V bytecode of the vertex stage
    pub vertex_code: Vec<u8>,
    /// SPIR-V bytecode of the fragment stage
    pub fragment_code: Vec<u8>,
    pub reflection: ShaderReflection,
}

impl ShaderDescriptor {
    pub fn new(
        name: impl Into<String>,
        vertex_code: Vec<u8>,
        fragment_code: Vec<u8>,
        reflection: ShaderReflection,
    ) -> Self {
        Self {
            name: name.into(),
            vertex_code,
            fragment_code,
            reflection,
        }
    }

    /// Build from bytecode and a JSON reflection mapping
    pub fn from_json(
        name: impl Into<String>,
        vertex_code: Vec<u8>,
        fragment_code: Vec<u8>,
        mapping_json: &str,
    ) -> Result<Self> {
        let reflection = ShaderReflection::from_json(mapping_json)?;
        Ok(Self::new(name, vertex_code, fragment_code, reflection))
    }

    /// Load `<name>.vert.spv`, `<name>.frag.spv` and `<name>.map.json` from `dir`
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |file: String| {
            let path = dir.join(&file);
            fs::read(&path).map_err(|e| {
                engine_err!(Io, "sceneforge::shader", "Cannot read '{}': {}", path.display(), e)
            })
        };

        let vertex_code = read(format!("{}.vert.spv", name))?;
        let fragment_code = read(format!("{}.frag.spv", name))?;
        let mapping = read(format!("{}.map.json", name))?;
        let mapping = String::from_utf8(mapping).map_err(|e| {
            engine_err!(InvalidReflection, "sceneforge::shader",
                "Mapping of shader '{}' is not UTF-8: {}", name, e)
        })?;

        Self::from_json(name, vertex_code, fragment_code, &mapping)
    }
}

#[cfg(test)]
#[path = "shader_descriptor_tests.rs"]
mod tests;
