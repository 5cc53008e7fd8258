//! Renderer orchestration.
//!
//! [`Renderer`] assembles the ownership chain - instance -> surface ->
//! device -> swapchain generation - and drives the frame-pacing loop. There
//! is no global context: everything reaches the graphics state through a
//! `&Renderer` or a cloned `Arc<Device>` handle.

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use tracing::{debug, info};

use prism_platform::{Surface, Window};
use prism_rhi::device::{Device, DeviceBuilder};
use prism_rhi::instance::{Instance, InstanceBuilder};
use prism_rhi::physical_device::select_physical_device;
use prism_rhi::render_pass::RenderPass;
use prism_rhi::{RhiError, RhiResult};

use crate::backend::{RecordContext, VulkanBackend};
use crate::pacing::{
    DEFAULT_SLOT_TIMEOUT, FrameBackend, FrameError, FrameOutcome, FramePacer, FrameSource,
};
use crate::MAX_FRAMES_IN_FLIGHT;

/// Renderer construction options.
#[derive(Clone, Debug)]
pub struct RendererOptions {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Enable validation layers.
    pub validation: bool,
    /// Force FIFO presentation.
    pub vsync: bool,
    /// Background clear color (linear RGBA).
    pub clear_color: [f32; 4],
    /// Deadline for in-flight fence waits.
    pub frame_timeout: Duration,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            app_name: "Prism".to_string(),
            validation: cfg!(debug_assertions),
            vsync: true,
            clear_color: [0.05, 0.05, 0.08, 1.0],
            frame_timeout: DEFAULT_SLOT_TIMEOUT,
        }
    }
}

/// Window-side pacing state: current drawable size plus the resize flag
/// the pacing loop consumes.
struct WindowState {
    width: u32,
    height: u32,
    resized: bool,
}

impl FrameSource for WindowState {
    fn drawable_extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    fn take_resize_observed(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }
}

/// Top-level renderer.
///
/// Field order doubles as destruction order: the pacing state first, then
/// the swapchain generation and slots (backend), then the surface, the
/// device, and finally the instance.
pub struct Renderer {
    pacer: FramePacer,
    window_state: WindowState,
    backend: VulkanBackend,
    surface: Surface,
    device: Arc<Device>,
    instance: Arc<Instance>,
}

impl Renderer {
    /// Creates a renderer targeting `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of the ownership chain fails: instance
    /// creation, surface creation, device selection, or swapchain setup.
    pub fn new(window: &Window, options: &RendererOptions) -> RhiResult<Self> {
        let width = window.width();
        let height = window.height();

        info!("Initializing renderer ({}x{})", width, height);

        let instance = Arc::new(
            InstanceBuilder::new()
                .application_name(&options.app_name)
                .validation(options.validation)
                .build()?,
        );

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = DeviceBuilder::new(&instance, &physical_device).build()?;

        let backend = VulkanBackend::new(
            instance.clone(),
            device.clone(),
            surface.handle(),
            width,
            height,
            options.vsync,
            options.clear_color,
            options.frame_timeout,
        )?;

        let pacer = FramePacer::new(MAX_FRAMES_IN_FLIGHT, backend.image_count())
            .with_timeout(options.frame_timeout);

        info!(
            "Renderer initialized: {} frames in flight over {} swapchain images",
            MAX_FRAMES_IN_FLIGHT,
            backend.image_count()
        );

        Ok(Self {
            pacer,
            window_state: WindowState {
                width,
                height,
                resized: false,
            },
            backend,
            surface,
            device,
            instance,
        })
    }

    /// Notifies the renderer of a window resize. The swapchain rebuild
    /// happens inside the next frame iteration.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.window_state.width && height == self.window_state.height {
            return;
        }
        debug!(
            "Resize observed: {}x{} -> {}x{}",
            self.window_state.width, self.window_state.height, width, height
        );
        self.window_state.width = width;
        self.window_state.height = height;
        self.window_state.resized = true;
    }

    /// Runs one frame iteration, invoking `draw` with the open recording
    /// context.
    ///
    /// Stale swapchain conditions are handled internally; only fatal
    /// errors surface. See [`FrameError`].
    pub fn render_frame<F>(&mut self, draw: F) -> Result<FrameOutcome, FrameError>
    where
        F: FnOnce(&mut RecordContext),
    {
        self.pacer
            .run_frame(&mut self.backend, &mut self.window_state, draw)
    }

    /// Returns the logical device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the render pass pipelines must target.
    #[inline]
    pub fn render_pass(&self) -> &RenderPass {
        self.backend.render_pass()
    }

    /// Returns the current swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.backend.extent()
    }

    /// Current aspect ratio of the swapchain.
    pub fn aspect_ratio(&self) -> f32 {
        let extent = self.backend.extent();
        if extent.height == 0 {
            1.0
        } else {
            extent.width as f32 / extent.height as f32
        }
    }

    /// Returns the command pool used for one-time uploads.
    #[inline]
    pub fn upload_pool(&self) -> &prism_rhi::command::CommandPool {
        self.backend.command_pool()
    }

    /// Blocks until the GPU has finished all submitted work. Call before
    /// destroying resources referenced by in-flight frames.
    pub fn wait_idle(&self) -> RhiResult<()> {
        self.device.wait_idle()
    }

    /// The instance handle (kept alive for the full renderer lifetime).
    #[inline]
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Members drop in field order (backend -> surface -> device ->
        // instance); the idle wait here guarantees no in-flight frame
        // outlives any of them.
        if let Err(e) = self.device.wait_idle() {
            tracing::error!("wait_idle failed during renderer drop: {:?}", e);
        }
        info!("Renderer shut down");
    }
}
