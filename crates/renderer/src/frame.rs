//! Per-frame-slot resources.
//!
//! A [`FrameSlot`] is one of the rotating bundles behind the frames-in-
//! flight scheme: a command buffer plus the synchronization trio. Slots are
//! created once at startup and reused round-robin; their count never
//! changes, regardless of how many images the swapchain holds.

use std::sync::Arc;

use tracing::debug;

use prism_rhi::RhiResult;
use prism_rhi::command::{CommandBuffer, CommandPool};
use prism_rhi::device::Device;
use prism_rhi::sync::FrameSync;

/// One frame slot: command buffer + sync primitives.
pub struct FrameSlot {
    /// Command buffer recorded by this slot each time it comes around.
    command_buffer: CommandBuffer,
    /// Image-available / render-finished semaphores and in-flight fence.
    sync: FrameSync,
}

impl FrameSlot {
    /// Creates a single slot, allocating its command buffer from `pool`.
    pub fn new(device: Arc<Device>, pool: &CommandPool) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), pool)?;
        let sync = FrameSync::new(device)?;
        Ok(Self {
            command_buffer,
            sync,
        })
    }

    /// Creates the full rotating set of `count` slots.
    pub fn create_set(
        device: &Arc<Device>,
        pool: &CommandPool,
        count: usize,
    ) -> RhiResult<Vec<Self>> {
        let mut slots = Vec::with_capacity(count);
        for i in 0..count {
            slots.push(Self::new(device.clone(), pool)?);
            debug!("Created frame slot {}", i);
        }
        Ok(slots)
    }

    /// Returns the slot's command buffer.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Returns the slot's synchronization primitives.
    #[inline]
    pub fn sync(&self) -> &FrameSync {
        &self.sync
    }
}
