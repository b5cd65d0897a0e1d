/// VulkanContext - device handles shared by the device, memory and swapchain
///
/// Instance, physical device, logical device and queue are created by the
/// application and only borrowed here: the context never destroys them. It
/// owns the gpu-allocator instance, which must be dropped before the
/// application destroys the device.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use gpu_allocator::AllocatorDebugSettings;
use scene_forge::sceneforge::Result;
use scene_forge::{engine_err, engine_info};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared Vulkan context
pub struct VulkanContext {
    /// Vulkan instance (owned by the application)
    pub instance: ash::Instance,

    pub physical_device: vk::PhysicalDevice,

    /// Vulkan logical device (owned by the application)
    pub device: ash::Device,

    /// Queue used for setup submissions and frame submissions
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is released in `Drop`, before the device goes away
    allocator: ManuallyDrop<Mutex<Allocator>>,
}

impl VulkanContext {
    /// Wrap application-created handles
    ///
    /// # Arguments
    ///
    /// * `instance` - Vulkan instance
    /// * `physical_device` - Physical device the logical device was created from
    /// * `device` - Vulkan logical device
    /// * `graphics_queue` - Queue with graphics capability
    /// * `graphics_queue_family` - Family index of `graphics_queue`
    pub fn new(
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
    ) -> Result<Arc<Self>> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: AllocatorDebugSettings::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| engine_err!("sceneforge::vulkan", "Failed to create GPU allocator: {:?}", e))?;

        engine_info!("sceneforge::vulkan", "Vulkan context ready (queue family {})", graphics_queue_family);

        Ok(Arc::new(Self {
            instance,
            physical_device,
            device,
            graphics_queue,
            graphics_queue_family,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
        }))
    }

    /// Lock the allocator
    pub(crate) fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!(InvalidState, "sceneforge::vulkan", "GPU allocator lock poisoned"))
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        // Frees every VkDeviceMemory block; the application destroys the device afterwards
        unsafe {
            ManuallyDrop::drop(&mut self.allocator);
        }
    }
}
