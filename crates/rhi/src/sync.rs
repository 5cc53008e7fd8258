//! Synchronization primitives.
//!
//! - [`Semaphore`] - GPU-to-GPU ordering between queue operations
//! - [`Fence`] - GPU-to-CPU completion signaling
//! - [`FrameSync`] - the per-frame-slot trio (image available, render
//!   finished, in-flight)
//!
//! Fence waits always take a finite [`Duration`]; running past the deadline
//! returns [`RhiError::Timeout`] instead of hanging forever. A wedged GPU
//! therefore surfaces as a reportable error rather than a silent freeze.

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan semaphore wrapper.
///
/// Typical uses: signaled by swapchain acquire when an image is ready;
/// signaled by a submit when rendering finished, gating presentation.
pub struct Semaphore {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan semaphore handle.
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new semaphore in the unsignaled state.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };
        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Vulkan fence wrapper.
///
/// Used by the host to wait for GPU completion, e.g. before reusing a frame
/// slot's command buffer.
pub struct Fence {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan fence handle.
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// `signaled` creates the fence pre-signaled, for fences waited on
    /// before the first submission that would signal them.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Waits for the fence to signal, up to `timeout`.
    ///
    /// # Errors
    ///
    /// [`RhiError::Timeout`] if the deadline passes before the fence
    /// signals; any other failure is returned as a Vulkan error.
    pub fn wait(&self, timeout: Duration) -> Result<(), RhiError> {
        let timeout_ns = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        let fences = [self.fence];
        let result = unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout_ns)
        };
        match result {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(RhiError::Timeout(timeout)),
            Err(e) => Err(e.into()),
        }
    }

    /// Resets the fence to unsignaled.
    ///
    /// Must not be called while the fence is in use by a queue submission.
    pub fn reset(&self) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }

    /// Non-blocking check whether the fence is signaled.
    pub fn is_signaled(&self) -> bool {
        let result = unsafe { self.device.handle().get_fence_status(self.fence) };
        matches!(result, Ok(true))
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
    }
}

/// Per-frame-slot synchronization primitives.
///
/// Usage per frame:
/// 1. Wait on `in_flight` (bounds how far the CPU runs ahead)
/// 2. Acquire an image, signaling `image_available`
/// 3. Submit waiting on `image_available`, signaling `render_finished`
///    and `in_flight`
/// 4. Present waiting on `render_finished`
pub struct FrameSync {
    /// Signaled when the acquired swapchain image is ready.
    image_available: Semaphore,
    /// Signaled when rendering to the image has finished.
    render_finished: Semaphore,
    /// Signaled when the slot's submission completes on the GPU.
    in_flight: Fence,
}

impl FrameSync {
    /// Creates the trio for one frame slot.
    ///
    /// The in-flight fence starts signaled so the first wait returns
    /// immediately.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        debug!("Frame synchronization primitives created");

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Returns the image-available semaphore.
    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Returns the render-finished semaphore.
    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    /// Returns the in-flight fence.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
        assert_send_sync::<Fence>();
        assert_send_sync::<FrameSync>();
    }
}
