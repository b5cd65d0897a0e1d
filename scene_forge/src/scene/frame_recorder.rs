/// Frame recording - render-pass template and per-framebuffer draw commands

use crate::error::Result;
use crate::graphics_device::{
    ClearValue, CommandBufferHandle, Extent2D, FramebufferHandle, GraphicsDevice, Rect2D, RenderPassBegin,
    RenderPassHandle, Swapchain,
};
use crate::scene::CompiledScene;
use crate::config::Config;
use crate::{engine_bail, engine_trace};

/// Surface-dependent state of a compiled scene
///
/// Rebuilt on resize; everything else in the scene is not.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCache {
    render_pass: RenderPassHandle,
    framebuffers: Vec<FramebufferHandle>,
    extent: Extent2D,
    /// Color clear, then depth/stencil clear
    clear_values: Vec<ClearValue>,
}

impl RenderCache {
    pub fn new(target: &dyn Swapchain, config: &Config) -> Self {
        Self {
            render_pass: target.render_pass(),
            framebuffers: target.framebuffers().to_vec(),
            extent: target.extent(),
            clear_values: vec![
                ClearValue::Color(config.clear_color),
                ClearValue::DepthStencil { depth: config.clear_depth, stencil: config.clear_stencil },
            ],
        }
    }

    /// Pick up the render pass, framebuffers and extent of a recreated target
    pub fn rebuild(&mut self, target: &dyn Swapchain) {
        self.render_pass = target.render_pass();
        self.framebuffers = target.framebuffers().to_vec();
        self.extent = target.extent();
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn render_pass(&self) -> RenderPassHandle {
        self.render_pass
    }

    pub fn clear_values(&self) -> &[ClearValue] {
        &self.clear_values
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Render-pass begin for one framebuffer
    pub fn begin_info(&self, framebuffer_index: usize) -> Result<RenderPassBegin> {
        let framebuffer = match self.framebuffers.get(framebuffer_index) {
            Some(f) => *f,
            None => engine_bail!(InvalidResource, "sceneforge::recorder",
                "Framebuffer index {} out of range ({} framebuffers)",
                framebuffer_index, self.framebuffers.len()),
        };
        Ok(RenderPassBegin {
            render_pass: self.render_pass,
            framebuffer,
            render_area: Rect2D::from_extent(self.extent),
            clear_values: self.clear_values.clone(),
        })
    }
}

/// Counters of one recorded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub pipeline_binds: u32,
    pub descriptor_binds: u32,
    pub draw_calls: u32,
}

impl CompiledScene {
    /// Re-record the command buffer of one framebuffer
    ///
    /// Objects are drawn in compiled order. A pipeline is bound only when it
    /// differs from the previous object's.
    pub fn record(&self, device: &mut dyn GraphicsDevice, framebuffer_index: usize) -> Result<FrameStats> {
        let cmd = match self.command_buffers.get(framebuffer_index) {
            Some(c) => *c,
            None => engine_bail!(InvalidResource, "sceneforge::recorder",
                "No command buffer for framebuffer {} ({} recorded)",
                framebuffer_index, self.command_buffers.len()),
        };
        let begin = self.render_cache.begin_info(framebuffer_index)?;

        let mut stats = FrameStats::default();
        device.begin_command_buffer(cmd)?;
        device.cmd_begin_render_pass(cmd, &begin);

        let mut bound_pipeline: Option<usize> = None;
        for object in &self.objects {
            if bound_pipeline != Some(object.pipeline) {
                device.cmd_bind_pipeline(cmd, self.pipelines[object.pipeline]);
                bound_pipeline = Some(object.pipeline);
                stats.pipeline_binds += 1;
            }

            if !object.descriptor_sets.is_empty() {
                let layout = self.shaders[object.shader].pipeline_layout();
                device.cmd_bind_descriptor_sets(cmd, layout, &object.descriptor_sets);
                stats.descriptor_binds += 1;
            }

            if let Some(draw) = &object.draw {
                device.cmd_bind_index_buffer(cmd, self.mesh_buffer, draw.index_offset, draw.index_type);
                let buffers = vec![self.mesh_buffer; draw.vertex_offsets.len()];
                device.cmd_bind_vertex_buffers(cmd, 0, &buffers, &draw.vertex_offsets);
                device.cmd_draw_indexed(cmd, draw.index_count);
                stats.draw_calls += 1;
            }
        }

        device.cmd_end_render_pass(cmd);
        device.end_command_buffer(cmd)?;

        engine_trace!("sceneforge::recorder",
            "Recorded framebuffer {}: {} pipeline binds, {} descriptor binds, {} draws",
            framebuffer_index, stats.pipeline_binds, stats.descriptor_binds, stats.draw_calls);
        Ok(stats)
    }

    /// Refresh the render-pass template after the target was recreated
    pub fn rebuild_render_cache(&mut self, target: &dyn Swapchain) {
        self.render_cache.rebuild(target);
    }

    /// Command buffer recorded for `framebuffer_index`
    pub fn command_buffer(&self, framebuffer_index: usize) -> Option<CommandBufferHandle> {
        self.command_buffers.get(framebuffer_index).copied()
    }
}

#[cfg(test)]
#[path = "frame_recorder_tests.rs"]
mod tests;
