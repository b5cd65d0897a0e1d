/// Graphics device module - native objects, memory and presentation contracts

pub mod graphics_device;
pub mod handles;
pub mod buffer;
pub mod memory;
pub mod descriptor;
pub mod pipeline;
pub mod command;
pub mod swapchain;

pub use graphics_device::*;
pub use handles::*;
pub use buffer::*;
pub use memory::*;
pub use descriptor::*;
pub use pipeline::*;
pub use command::*;
pub use swapchain::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
