/*!
# SceneForge - Vulkan Backend

Vulkan implementation of the scene_forge `GraphicsDevice` and `Swapchain`
contracts, using the Ash library for Vulkan bindings and gpu-allocator for
memory management.

Instance, physical device, logical device, queue and surface are created by
the application; [`VulkanContext`] wraps them and owns the allocator.

## Example

```no_run
use std::sync::{Arc, Mutex};
use scene_forge::sceneforge::{Config, SceneHost};
use scene_forge_vulkan::{VulkanContext, VulkanDevice, VulkanSwapchain};
# use ash::vk;
# fn run(
#     instance: ash::Instance,
#     physical_device: vk::PhysicalDevice,
#     device: ash::Device,
#     queue: vk::Queue,
#     queue_family: u32,
#     surface_loader: ash::khr::surface::Instance,
#     surface: vk::SurfaceKHR,
# ) -> scene_forge::sceneforge::Result<()> {
let ctx = VulkanContext::new(instance, physical_device, device, queue, queue_family)?;
let swapchain = VulkanSwapchain::new(ctx.clone(), surface_loader, surface, 1280, 720)?;
let device = VulkanDevice::new(ctx);

let mut host = SceneHost::new(
    Arc::new(Mutex::new(device)),
    Arc::new(Mutex::new(swapchain)),
    Config::default(),
)?;
# host.shutdown()
# }
```
*/

mod vulkan_context;
mod vulkan_convert;
mod vulkan_memory;
mod vulkan_device;
mod vulkan_swapchain;

pub use vulkan_context::VulkanContext;
pub use vulkan_memory::VulkanMemory;
pub use vulkan_device::VulkanDevice;
pub use vulkan_swapchain::VulkanSwapchain;
