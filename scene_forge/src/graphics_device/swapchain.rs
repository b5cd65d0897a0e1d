/// Swapchain trait - presentation chain owned by the host application

use crate::error::Result;
use crate::graphics_device::{CommandBufferHandle, Extent2D, FramebufferHandle, RenderPassHandle};

/// Presentation chain the scenes render into
///
/// Creation is external: the host builds it alongside the surface. Scenes
/// only read the render pass, framebuffers and extent, and the scene host
/// drives acquire/present/recreate.
pub trait Swapchain {
    /// Current image dimensions in pixels
    fn extent(&self) -> Extent2D;

    /// Render pass compatible with every framebuffer
    fn render_pass(&self) -> RenderPassHandle;

    /// One framebuffer per swapchain image
    fn framebuffers(&self) -> &[FramebufferHandle];

    /// Acquire the next available image index
    fn acquire_next_image(&mut self) -> Result<u32>;

    /// Submit the recorded commands for `image_index` and present it
    ///
    /// The swapchain owns the semaphores that order acquire, render and present.
    fn present(&mut self, image_index: u32, commands: &[CommandBufferHandle]) -> Result<()>;

    /// Recreate the chain for a new output size
    ///
    /// # Arguments
    ///
    /// * `width` - New width in pixels
    /// * `height` - New height in pixels
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;

    fn framebuffer_count(&self) -> usize {
        self.framebuffers().len()
    }
}
