/// VulkanSwapchain - presentation chain implementing the scene_forge Swapchain trait
///
/// Owns the swapchain images, a depth attachment, a render pass compatible
/// with every framebuffer, and the semaphores and fences that order
/// acquire, render and present.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use scene_forge::graphics_device::{
    CommandBufferHandle, Extent2D, FramebufferHandle, RenderPassHandle, Swapchain,
};
use scene_forge::sceneforge::{Error, Result};
use scene_forge::{engine_bail, engine_err, engine_error, engine_info};
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{from_raw, raw};

/// Number of frames that can be processed concurrently
const MAX_FRAMES_IN_FLIGHT: usize = 2;

const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Depth attachment shared by every framebuffer
struct DepthTarget {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

/// Vulkan swapchain implementation
pub struct VulkanSwapchain {
    ctx: Arc<VulkanContext>,

    /// Surface (owned, destroyed on drop)
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,

    depth: Option<DepthTarget>,
    /// Created once; the color format does not change on recreate
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    framebuffer_handles: Vec<FramebufferHandle>,

    /// One semaphore per frame in flight (for acquire)
    image_available_semaphores: Vec<vk::Semaphore>,
    /// One semaphore per swapchain image (for present)
    render_finished_semaphores: Vec<vk::Semaphore>,
    /// One fence per frame in flight, signaled by the frame submit
    in_flight_fences: Vec<vk::Fence>,
    /// Fence of the frame currently using each image (null when free)
    images_in_flight: Vec<vk::Fence>,
    current_frame: usize,
}

impl VulkanSwapchain {
    /// Create a swapchain for an application-created surface
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared Vulkan context
    /// * `surface_loader` - Surface extension loader
    /// * `surface` - Window surface, owned by the swapchain from now on
    /// * `width` - Initial width, used when the surface does not dictate one
    /// * `height` - Initial height
    pub fn new(
        ctx: Arc<VulkanContext>,
        surface_loader: ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(ctx.physical_device, surface)
        }
        .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to query surface formats: {:?}", e))?;
        let format = match formats
            .iter()
            .find(|f| f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB)
            .or_else(|| formats.first())
        {
            Some(format) => *format,
            None => engine_bail!("sceneforge::vulkan", "Surface reports no formats"),
        };

        let mut chain = Self {
            ctx,
            surface,
            surface_loader,
            swapchain: vk::SwapchainKHR::null(),
            swapchain_loader,
            images: Vec::new(),
            image_views: Vec::new(),
            format,
            extent: vk::Extent2D { width, height },
            depth: None,
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            framebuffer_handles: Vec::new(),
            image_available_semaphores: Vec::new(),
            render_finished_semaphores: Vec::new(),
            in_flight_fences: Vec::new(),
            images_in_flight: Vec::new(),
            current_frame: 0,
        };

        // On error, Drop releases whatever was created so far
        chain.render_pass = chain.create_render_pass()?;
        chain.create_chain(width, height)?;
        chain.create_frame_sync()?;
        chain.create_targets()?;

        engine_info!("sceneforge::vulkan", "Swapchain created: {}x{}, {} images",
            chain.extent.width, chain.extent.height, chain.images.len());
        Ok(chain)
    }

    fn device(&self) -> &ash::Device {
        &self.ctx.device
    }

    /// Color attachment presented at the end, depth attachment discarded
    fn create_render_pass(&self) -> Result<vk::RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(self.format.format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(DEPTH_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_ref))
            .depth_stencil_attachment(&depth_ref);

        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stages)
            .dst_stage_mask(stages)
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        unsafe { self.device().create_render_pass(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create render pass: {:?}", e))
    }

    /// (Re)create the swapchain and its image views, retiring the old chain
    fn create_chain(&mut self, width: u32, height: u32) -> Result<()> {
        let capabilities = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
        }
        .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to get surface capabilities: {:?}", e))?;

        // Choose extent
        let extent = if capabilities.current_extent.width != u32::MAX {
            capabilities.current_extent
        } else {
            vk::Extent2D {
                width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
            }
        };

        let image_count = capabilities.min_image_count + 1;
        let image_count = if capabilities.max_image_count > 0 {
            image_count.min(capabilities.max_image_count)
        } else {
            image_count
        };

        let old_swapchain = self.swapchain;
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(image_count)
            .image_format(self.format.format)
            .image_color_space(self.format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { self.swapchain_loader.create_swapchain(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create swapchain: {:?}", e))?;
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(old_swapchain, None) }
        }
        self.swapchain = swapchain;
        self.extent = extent;

        self.images = unsafe { self.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to get swapchain images: {:?}", e))?;

        for i in 0..self.images.len() {
            let view = self.create_view(self.images[i], self.format.format, vk::ImageAspectFlags::COLOR)?;
            self.image_views.push(view);
        }
        Ok(())
    }

    fn create_view(&self, image: vk::Image, format: vk::Format, aspect: vk::ImageAspectFlags) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        unsafe { self.device().create_image_view(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create image view: {:?}", e))
    }

    /// Semaphores and fences; render-finished semaphores follow the image count
    fn create_frame_sync(&mut self) -> Result<()> {
        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

        while self.image_available_semaphores.len() < MAX_FRAMES_IN_FLIGHT {
            let semaphore = unsafe { self.device().create_semaphore(&semaphore_info, None) }
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create image-available semaphore: {:?}", e))?;
            self.image_available_semaphores.push(semaphore);
        }
        while self.in_flight_fences.len() < MAX_FRAMES_IN_FLIGHT {
            let fence = unsafe { self.device().create_fence(&fence_info, None) }
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create in-flight fence: {:?}", e))?;
            self.in_flight_fences.push(fence);
        }
        while self.render_finished_semaphores.len() < self.images.len() {
            let semaphore = unsafe { self.device().create_semaphore(&semaphore_info, None) }
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create render-finished semaphore: {:?}", e))?;
            self.render_finished_semaphores.push(semaphore);
        }
        self.images_in_flight = vec![vk::Fence::null(); self.images.len()];
        Ok(())
    }

    /// Depth attachment and one framebuffer per image
    fn create_targets(&mut self) -> Result<()> {
        let depth = self.create_depth()?;
        let depth_view = depth.view;
        self.depth = Some(depth);

        for i in 0..self.image_views.len() {
            let attachments = [self.image_views[i], depth_view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&attachments)
                .width(self.extent.width)
                .height(self.extent.height)
                .layers(1);
            let framebuffer = unsafe { self.device().create_framebuffer(&create_info, None) }
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create framebuffer {}: {:?}", i, e))?;
            self.framebuffers.push(framebuffer);
            self.framebuffer_handles.push(FramebufferHandle(raw(framebuffer)));
        }
        Ok(())
    }

    fn create_depth(&self) -> Result<DepthTarget> {
        let create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .extent(vk::Extent3D { width: self.extent.width, height: self.extent.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { self.device().create_image(&create_info, None) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create depth image: {:?}", e))?;
        let mut depth = DepthTarget { image, view: vk::ImageView::null(), allocation: None };

        let requirements = unsafe { self.device().get_image_memory_requirements(image) };
        let allocated = self.ctx.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name: "depth attachment",
                    requirements,
                    location: gpu_allocator::MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    engine_error!("sceneforge::vulkan", "Out of GPU memory for depth attachment: {:?}", e);
                    Error::OutOfMemory
                })
        });
        let allocation = match allocated {
            Ok(allocation) => allocation,
            Err(e) => {
                self.destroy_depth(depth);
                return Err(e);
            }
        };
        let (memory, offset) = (unsafe { allocation.memory() }, allocation.offset());
        depth.allocation = Some(allocation);

        let bound = unsafe { self.device().bind_image_memory(image, memory, offset) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to bind depth image memory: {:?}", e))
            .and_then(|_| self.create_view(image, DEPTH_FORMAT, vk::ImageAspectFlags::DEPTH));
        match bound {
            Ok(view) => {
                depth.view = view;
                Ok(depth)
            }
            Err(e) => {
                self.destroy_depth(depth);
                Err(e)
            }
        }
    }

    fn destroy_depth(&self, depth: DepthTarget) {
        unsafe {
            if depth.view != vk::ImageView::null() {
                self.device().destroy_image_view(depth.view, None);
            }
            self.device().destroy_image(depth.image, None);
        }
        if let Some(allocation) = depth.allocation {
            if let Ok(mut allocator) = self.ctx.allocator() {
                allocator.free(allocation).ok();
            }
        }
    }

    /// Framebuffers, depth attachment and image views
    fn destroy_targets(&mut self) {
        for framebuffer in self.framebuffers.drain(..) {
            unsafe { self.ctx.device.destroy_framebuffer(framebuffer, None) }
        }
        self.framebuffer_handles.clear();
        if let Some(depth) = self.depth.take() {
            self.destroy_depth(depth);
        }
        for view in self.image_views.drain(..) {
            unsafe { self.ctx.device.destroy_image_view(view, None) }
        }
    }

    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Swapchain for VulkanSwapchain {
    fn extent(&self) -> Extent2D {
        Extent2D::new(self.extent.width, self.extent.height)
    }

    fn render_pass(&self) -> RenderPassHandle {
        RenderPassHandle(raw(self.render_pass))
    }

    fn framebuffers(&self) -> &[FramebufferHandle] {
        &self.framebuffer_handles
    }

    fn acquire_next_image(&mut self) -> Result<u32> {
        let frame_fence = self.in_flight_fences[self.current_frame];
        unsafe { self.device().wait_for_fences(&[frame_fence], true, u64::MAX) }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to wait for frame fence: {:?}", e))?;

        let (image_index, _is_suboptimal) = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available_semaphores[self.current_frame],
                vk::Fence::null(),
            )
        }
        .map_err(|e| {
            if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                engine_err!(InvalidState, "sceneforge::vulkan", "Swapchain out of date during acquire")
            } else {
                engine_err!("sceneforge::vulkan", "Failed to acquire next swapchain image: {:?}", e)
            }
        })?;

        // The image's command buffer is re-recorded next: wait for its previous frame
        let image_fence = self.images_in_flight[image_index as usize];
        if image_fence != vk::Fence::null() && image_fence != frame_fence {
            unsafe { self.device().wait_for_fences(&[image_fence], true, u64::MAX) }
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to wait for image fence: {:?}", e))?;
        }
        self.images_in_flight[image_index as usize] = frame_fence;
        Ok(image_index)
    }

    fn present(&mut self, image_index: u32, commands: &[CommandBufferHandle]) -> Result<()> {
        if image_index as usize >= self.images.len() {
            engine_bail!(InvalidResource, "sceneforge::vulkan",
                "present: image_index {} out of range (count: {})", image_index, self.images.len());
        }

        let frame_fence = self.in_flight_fences[self.current_frame];
        let wait_semaphores = [self.image_available_semaphores[self.current_frame]];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished_semaphores[image_index as usize]];
        let command_buffers: Vec<vk::CommandBuffer> = commands.iter().map(|c| from_raw(c.0)).collect();

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device().reset_fences(&[frame_fence])
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to reset frame fence: {:?}", e))?;
            self.device().queue_submit(self.ctx.graphics_queue, &[submit_info], frame_fence)
                .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to submit frame: {:?}", e))?;
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe { self.swapchain_loader.queue_present(self.ctx.graphics_queue, &present_info) };
        // Move to next frame
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
        match presented {
            Ok(_) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(()),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                Err(engine_err!(InvalidState, "sceneforge::vulkan", "Swapchain out of date during present"))
            }
            Err(e) => Err(engine_err!("sceneforge::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe { self.device().device_wait_idle() }
            .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to wait idle before swapchain recreate: {:?}", e))?;

        self.destroy_targets();
        self.create_chain(width, height)?;
        self.create_frame_sync()?;
        self.create_targets()?;

        engine_info!("sceneforge::vulkan", "Swapchain recreated: {}x{}", self.extent.width, self.extent.height);
        Ok(())
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.ctx.device.device_wait_idle().ok();
        }
        self.destroy_targets();
        unsafe {
            let device = &self.ctx.device;
            for &semaphore in self.image_available_semaphores.iter().chain(&self.render_finished_semaphores) {
                device.destroy_semaphore(semaphore, None);
            }
            for &fence in &self.in_flight_fences {
                device.destroy_fence(fence, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
            }
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
