//! Depth buffer for depth-tested rendering.

use std::sync::Arc;

use ash::vk;

use prism_rhi::RhiResult;
use prism_rhi::device::Device;
use prism_rhi::image::Image2D;

/// Default depth format (32-bit float).
pub const DEFAULT_DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Depth attachment matching the swapchain extent.
///
/// Recreated together with the swapchain on every rebuild; a single depth
/// image is shared by all framebuffers since only one frame renders into
/// it at a time within a render pass instance.
pub struct DepthBuffer {
    image: Image2D,
}

impl DepthBuffer {
    /// Creates a depth buffer with the default format.
    pub fn new(device: Arc<Device>, width: u32, height: u32) -> RhiResult<Self> {
        let image = Image2D::new(
            device,
            width,
            height,
            DEFAULT_DEPTH_FORMAT,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::ImageAspectFlags::DEPTH,
        )?;
        Ok(Self { image })
    }

    /// Returns the depth image view for framebuffer attachment.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Returns the depth format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    /// Returns the depth buffer extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}
