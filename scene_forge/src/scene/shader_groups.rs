/// Partition of scene objects by shader

use crate::scene::GameObjectDescriptor;

/// Objects sharing one shader, and therefore one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderGroup {
    pub shader: usize,
    /// Object indices in declaration order
    pub objects: Vec<usize>,
}

impl ShaderGroup {
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// Group objects by shader index, groups in first-encounter order
///
/// Pure function of the object list; the group index doubles as the
/// pipeline index of every object in the group.
pub fn group_by_shader(objects: &[GameObjectDescriptor]) -> Vec<ShaderGroup> {
    let mut groups: Vec<ShaderGroup> = Vec::new();
    for (index, object) in objects.iter().enumerate() {
        match groups.iter_mut().find(|g| g.shader == object.shader) {
            Some(group) => group.objects.push(index),
            None => groups.push(ShaderGroup { shader: object.shader, objects: vec![index] }),
        }
    }
    groups
}

#[cfg(test)]
#[path = "shader_groups_tests.rs"]
mod tests;
