/// Packed byte layout of uniform blocks

use crate::engine_bail;
use crate::error::Result;
use crate::shader::ReflectedUniform;

/// Uniform block sizes are rounded up to this boundary
pub const UNIFORM_ALIGNMENT: u64 = 16;

const FLOAT_SIZE: u64 = 4;

/// Round `value` up to a multiple of `alignment` (power of two)
pub fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}

/// Matrix member types understood by the packer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformMemberType {
    Mat2,
    Mat3,
    Mat4,
}

impl UniformMemberType {
    pub const MAT2_CODE: u32 = 0;
    pub const MAT3_CODE: u32 = 1;
    pub const MAT4_CODE: u32 = 2;

    /// Map a reflection type code, failing with `InvalidUniformType`
    pub fn from_code(code: u32, field: &str) -> Result<Self> {
        match code {
            Self::MAT2_CODE => Ok(UniformMemberType::Mat2),
            Self::MAT3_CODE => Ok(UniformMemberType::Mat3),
            Self::MAT4_CODE => Ok(UniformMemberType::Mat4),
            _ => engine_bail!(InvalidUniformType, "sceneforge::shader",
                "Field '{}' has unsupported uniform type code {}", field, code),
        }
    }

    /// Number of floats in one element
    pub fn float_count(&self) -> u64 {
        match self {
            UniformMemberType::Mat2 => 4,
            UniformMemberType::Mat3 => 9,
            UniformMemberType::Mat4 => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformFieldLayout {
    pub name: String,
    pub member_type: UniformMemberType,
    pub count: u32,
    /// Offset from the start of the block
    pub offset: u64,
    pub size: u64,
}

/// Packed layout of one uniform declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockLayout {
    pub name: String,
    pub binding: u32,
    pub fields: Vec<UniformFieldLayout>,
    /// Total size, aligned to [`UNIFORM_ALIGNMENT`]
    pub size: u64,
}

impl UniformBlockLayout {
    /// Lay fields out back to back: each takes `count * floats * 4` bytes
    pub fn pack(uniform: &ReflectedUniform) -> Result<Self> {
        let mut fields = Vec::with_capacity(uniform.fields.len());
        let mut cursor = 0u64;

        for field in &uniform.fields {
            let member_type = UniformMemberType::from_code(field.type_code, &field.name)?;
            let size = field.count as u64 * member_type.float_count() * FLOAT_SIZE;
            fields.push(UniformFieldLayout {
                name: field.name.clone(),
                member_type,
                count: field.count,
                offset: cursor,
                size,
            });
            cursor += size;
        }

        Ok(Self {
            name: uniform.name.clone(),
            binding: uniform.binding,
            fields,
            size: align_up(cursor, UNIFORM_ALIGNMENT),
        })
    }

    pub fn field(&self, name: &str) -> Option<&UniformFieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
#[path = "uniform_layout_tests.rs"]
mod tests;
