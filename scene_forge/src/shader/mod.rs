/// Shader module - reflection parsing, uniform packing and shader compilation

pub mod reflection;
pub mod uniform_layout;
pub mod descriptor_set_layout;
pub mod shader_descriptor;
pub mod compiled_shader;

pub use reflection::*;
pub use uniform_layout::*;
pub use descriptor_set_layout::*;
pub use shader_descriptor::*;
pub use compiled_shader::*;
