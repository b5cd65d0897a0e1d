/// Scene host configuration

use crate::graphics_device::{
    ColorBlendState, DepthStencilState, MultisampleState, PrimitiveTopology, RasterizationState,
};

/// Settings shared by every scene a host compiles
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// RGBA clear color of the color attachment
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: u32,
    /// Fixed-function state baked into every scene pipeline
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    /// Entry point of both shader stages
    pub entry_point: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "SceneForge Application".to_string(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
            clear_depth: 1.0,
            clear_stencil: 0,
            topology: PrimitiveTopology::TriangleList,
            rasterization: RasterizationState::default(),
            multisample: MultisampleState::default(),
            depth_stencil: DepthStencilState::default(),
            color_blend: ColorBlendState::default(),
            entry_point: "main".to_string(),
        }
    }
}
