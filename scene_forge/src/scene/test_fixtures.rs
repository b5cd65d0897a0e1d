//! Shared fixtures for scene tests (mock device, mock swapchain, small scenes)

use crate::config::Config;
use crate::error::Result;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockSwapchain};
use crate::scene::{CompiledScene, GameObjectDescriptor, MeshDescriptor, SceneCompiler, SceneDescription, SetupChannel};
use crate::shader::ShaderDescriptor;

/// Position-only vertex input and one `mat4` uniform block
pub const MVP_SHADER: &str = r#"{
    "bindings": [{ "id": 0, "stride": 12 }],
    "attributes": [{ "name": "pos", "location": 0, "binding": 0, "format": "R32G32B32_SFLOAT" }],
    "uniforms": [{ "name": "Mvp", "set": 0, "binding": 0, "type": "uniform_buffer", "stage": "VERTEX",
                   "fields": [{ "name": "mvp", "type": 2 }] }]
}"#;

/// Position + color streams, two sets (view then model)
pub const LIT_SHADER: &str = r#"{
    "bindings": [{ "id": 0, "stride": 12 }, { "id": 1, "stride": 16 }],
    "attributes": [
        { "name": "color", "location": 1, "binding": 1, "format": "R32G32B32A32_SFLOAT" },
        { "name": "pos", "location": 0, "binding": 0, "format": "R32G32B32_SFLOAT" }
    ],
    "uniforms": [
        { "name": "View", "set": 0, "binding": 0, "type": "uniform_buffer", "stage": "VERTEX",
          "fields": [{ "name": "view_proj", "type": 2 }] },
        { "name": "Model", "set": 1, "binding": 0, "type": "uniform_buffer", "stage": "VERTEX",
          "fields": [{ "name": "model", "type": 2 }, { "name": "normal", "type": 1 }] }
    ]
}"#;

/// Position-only vertex input, no uniforms
pub const UNLIT_SHADER: &str = r#"{
    "bindings": [{ "id": 0, "stride": 12 }],
    "attributes": [{ "name": "pos", "location": 0, "binding": 0, "format": "R32G32B32_SFLOAT" }]
}"#;

pub fn shader(name: &str, mapping: &str) -> ShaderDescriptor {
    ShaderDescriptor::from_json(name, vec![0; 16], vec![0; 16], mapping).unwrap()
}

pub fn triangle() -> MeshDescriptor {
    MeshDescriptor::builder()
        .attribute("pos", &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
        .attribute("color", &[[1.0f32, 0.0, 0.0, 1.0]; 3])
        .indices_u16(&[0, 1, 2])
        .build()
        .unwrap()
}

pub fn quad() -> MeshDescriptor {
    MeshDescriptor::builder()
        .attribute("pos", &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
        .attribute("color", &[[0.0f32, 1.0, 0.0, 1.0]; 4])
        .indices_u32(&[0, 1, 2, 2, 3, 0])
        .build()
        .unwrap()
}

/// Two objects, one `mat4` shader, one shared mesh
pub fn two_object_scene() -> SceneDescription {
    let mut desc = SceneDescription::new();
    let shader = desc.add_shader(shader("mvp", MVP_SHADER));
    let mesh = desc.add_mesh(triangle());
    desc.add_object(GameObjectDescriptor::new(shader, mesh));
    desc.add_object(GameObjectDescriptor::new(shader, mesh));
    desc
}

/// Mock device, mock swapchain and a setup channel
pub struct Harness {
    pub device: MockGraphicsDevice,
    pub swapchain: MockSwapchain,
    pub setup: SetupChannel,
    pub config: Config,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_device(MockGraphicsDevice::new())
    }

    pub fn with_device(mut device: MockGraphicsDevice) -> Self {
        let setup = SetupChannel::create(&mut device).unwrap();
        Self {
            device,
            swapchain: MockSwapchain::new(800, 600, 3),
            setup,
            config: Config::default(),
        }
    }

    pub fn compile(&mut self, desc: SceneDescription) -> Result<CompiledScene> {
        SceneCompiler::new(&mut self.device, &self.setup, &self.swapchain, &self.config).compile(desc)
    }

    /// Destroy the setup channel and return the device for leak checks
    pub fn teardown(mut self) -> MockGraphicsDevice {
        self.setup.destroy(&mut self.device);
        self.device
    }
}
