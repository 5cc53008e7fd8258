//! Framebuffer management.
//!
//! One [`Framebuffer`] is created per swapchain image view, sharing the
//! depth view when the render pass has a depth attachment. Framebuffers are
//! tied to a swapchain generation: on resize the whole set is dropped and
//! rebuilt after the swapchain.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;
use crate::render_pass::RenderPass;

/// Vulkan framebuffer wrapper.
pub struct Framebuffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan framebuffer handle.
    framebuffer: vk::Framebuffer,
    /// Framebuffer extent.
    extent: vk::Extent2D,
}

impl Framebuffer {
    /// Creates a framebuffer binding the given attachments to a render pass.
    ///
    /// Attachment order must match the render pass: color first, then depth.
    ///
    /// # Errors
    ///
    /// Returns an error if framebuffer creation fails.
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.handle())
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };

        Ok(Self {
            device,
            framebuffer,
            extent,
        })
    }

    /// Creates one framebuffer per swapchain image view.
    ///
    /// `depth_view`, when present, is attached to every framebuffer after
    /// the color view.
    pub fn for_swapchain(
        device: &Arc<Device>,
        render_pass: &RenderPass,
        image_views: &[vk::ImageView],
        depth_view: Option<vk::ImageView>,
        extent: vk::Extent2D,
    ) -> RhiResult<Vec<Self>> {
        let mut framebuffers = Vec::with_capacity(image_views.len());

        for &color_view in image_views {
            let mut attachments = vec![color_view];
            if let Some(depth) = depth_view {
                attachments.push(depth);
            }
            framebuffers.push(Self::new(
                device.clone(),
                render_pass,
                &attachments,
                extent,
            )?);
        }

        debug!(
            "Created {} framebuffers at {}x{}",
            framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(framebuffers)
    }

    /// Returns the Vulkan framebuffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Returns the framebuffer extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_framebuffer(self.framebuffer, None);
        }
    }
}
