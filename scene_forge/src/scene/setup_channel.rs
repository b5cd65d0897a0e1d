/// Setup submission channel - one command buffer and one fence for uploads

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{CommandBufferHandle, CommandPoolHandle, FenceHandle, GraphicsDevice};

/// Shared by every scene compile of a host; at most one upload is in flight
#[derive(Debug)]
pub struct SetupChannel {
    pool: CommandPoolHandle,
    cmd: CommandBufferHandle,
    fence: FenceHandle,
}

impl SetupChannel {
    pub fn create(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let pool = device.create_command_pool()?;
        let cmd = match device.allocate_command_buffers(pool, 1).map(|b| b.first().copied()) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => {
                device.destroy_command_pool(pool);
                engine_bail!("sceneforge::setup", "Device returned no setup command buffer");
            }
            Err(e) => {
                device.destroy_command_pool(pool);
                return Err(e);
            }
        };
        let fence = match device.create_fence() {
            Ok(fence) => fence,
            Err(e) => {
                device.destroy_command_pool(pool);
                return Err(e);
            }
        };
        Ok(Self { pool, cmd, fence })
    }

    pub fn command_buffer(&self) -> CommandBufferHandle {
        self.cmd
    }

    pub fn fence(&self) -> FenceHandle {
        self.fence
    }

    /// Submit the recorded setup commands, wait on the fence and reset it
    pub fn submit_and_wait(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        device.submit(&[self.cmd], Some(self.fence))?;
        device.wait_for_fence(self.fence)?;
        device.reset_fence(self.fence)
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_fence(self.fence);
        device.destroy_command_pool(self.pool);
    }
}
