//! Vulkan implementation of the frame-pacing backend.
//!
//! [`VulkanBackend`] owns the swapchain generation - swapchain, depth
//! buffer, render pass, per-image framebuffers - plus the rotating frame
//! slots, and translates the [`FrameBackend`](crate::pacing::FrameBackend)
//! protocol into queue and swapchain calls. Rebuilding replaces the whole
//! generation atomically after a device wait-idle; the render pass itself
//! survives because the surface format does not change with the extent.

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use tracing::{debug, info};

use prism_rhi::RhiError;
use prism_rhi::command::{CommandBuffer, CommandPool};
use prism_rhi::device::Device;
use prism_rhi::framebuffer::Framebuffer;
use prism_rhi::instance::Instance;
use prism_rhi::render_pass::{RenderPass, RenderPassBuilder};
use prism_rhi::swapchain::{Swapchain, SwapchainBuilder};

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::depth_buffer::{DEFAULT_DEPTH_FORMAT, DepthBuffer};
use crate::frame::FrameSlot;
use crate::pacing::{AcquireOutcome, FrameBackend, PresentOutcome};

/// Recording context handed to draw callbacks.
///
/// The render pass is already open and viewport/scissor are set when the
/// callback runs; the callback only binds pipelines and issues draws.
pub struct RecordContext {
    cmd: CommandBuffer,
    slot: usize,
    image_index: u32,
    extent: vk::Extent2D,
}

impl RecordContext {
    /// The open command buffer.
    #[inline]
    pub fn cmd(&self) -> &CommandBuffer {
        &self.cmd
    }

    /// The frame slot recording this frame, for indexing per-slot
    /// resources (uniform buffers, descriptor sets).
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The swapchain image being rendered to.
    #[inline]
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// The current swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

/// Frame-pacing backend over the Vulkan swapchain.
pub struct VulkanBackend {
    device: Arc<Device>,
    instance: Arc<Instance>,
    surface: vk::SurfaceKHR,
    command_pool: CommandPool,
    slots: Vec<FrameSlot>,
    render_pass: RenderPass,
    // Swapchain generation; replaced wholesale on rebuild.
    swapchain: Swapchain,
    depth_buffer: DepthBuffer,
    framebuffers: Vec<Framebuffer>,
    clear_color: [f32; 4],
    acquire_timeout: Duration,
}

impl VulkanBackend {
    /// Creates the backend: swapchain, render pass, depth buffer,
    /// framebuffers, and [`MAX_FRAMES_IN_FLIGHT`] frame slots.
    pub fn new(
        instance: Arc<Instance>,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        vsync: bool,
        clear_color: [f32; 4],
        acquire_timeout: Duration,
    ) -> Result<Self, RhiError> {
        let swapchain = SwapchainBuilder::new(width, height)
            .vsync(vsync)
            .build(&instance, device.clone(), surface)?;

        let render_pass = RenderPassBuilder::new()
            .color_format(swapchain.format())
            .depth_format(DEFAULT_DEPTH_FORMAT)
            .build(device.clone())?;

        let extent = swapchain.extent();
        let depth_buffer = DepthBuffer::new(device.clone(), extent.width, extent.height)?;

        let framebuffers = Framebuffer::for_swapchain(
            &device,
            &render_pass,
            swapchain.image_views(),
            Some(depth_buffer.view()),
            extent,
        )?;

        let graphics_family = device.queue_families().graphics_family.unwrap();
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let slots = FrameSlot::create_set(&device, &command_pool, MAX_FRAMES_IN_FLIGHT)?;

        info!(
            "Frame backend ready: {} slots over {} swapchain images",
            slots.len(),
            swapchain.image_count()
        );

        Ok(Self {
            device,
            instance,
            surface,
            command_pool,
            slots,
            render_pass,
            swapchain,
            depth_buffer,
            framebuffers,
            clear_color,
            acquire_timeout,
        })
    }

    /// Returns the render pass demo pipelines are built against.
    #[inline]
    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// Returns the swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn swapchain_format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// Returns the command pool, for one-time transfer work such as
    /// texture uploads.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }
}

impl FrameBackend for VulkanBackend {
    type Recorder = RecordContext;

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    fn wait_slot(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError> {
        self.slots[slot].sync().in_flight().wait(timeout)
    }

    fn wait_image_owner(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError> {
        // Same fence as the slot-reuse gate; the pacing layer keeps the two
        // call sites distinct.
        self.slots[slot].sync().in_flight().wait(timeout)
    }

    fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, RhiError> {
        let semaphore = self.slots[slot].sync().image_available().handle();
        let timeout_ns = u64::try_from(self.acquire_timeout.as_nanos()).unwrap_or(u64::MAX);

        match self.swapchain.acquire_next_image(semaphore, timeout_ns) {
            Ok((image, suboptimal)) => Ok(AcquireOutcome::Ready { image, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(vk::Result::TIMEOUT) => Err(RhiError::Timeout(self.acquire_timeout)),
            Err(e) => Err(e.into()),
        }
    }

    fn begin_recording(&mut self, slot: usize, image: u32) -> Result<Self::Recorder, RhiError> {
        let extent = self.swapchain.extent();
        let cmd = self.slots[slot].command_buffer();

        cmd.reset()?;
        cmd.begin()?;

        let clear_values = self.render_pass.clear_values(self.clear_color);
        cmd.begin_render_pass(
            &self.render_pass,
            &self.framebuffers[image as usize],
            &clear_values,
        );
        cmd.set_viewport(extent);
        cmd.set_scissor(extent);

        Ok(RecordContext {
            cmd: CommandBuffer::from_handle(self.device.clone(), cmd.handle()),
            slot,
            image_index: image,
            extent,
        })
    }

    fn finish_recording(&mut self, slot: usize, recorder: Self::Recorder) -> Result<(), RhiError> {
        drop(recorder);
        let cmd = self.slots[slot].command_buffer();
        cmd.end_render_pass();
        cmd.end()?;
        Ok(())
    }

    fn submit(&mut self, slot: usize, _image: u32) -> Result<(), RhiError> {
        let frame = &self.slots[slot];

        // The fence is reset only now that a submission is certain to
        // re-arm it; resetting earlier could deadlock a retried iteration.
        frame.sync().in_flight().reset()?;

        let wait_semaphores = [frame.sync().image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.sync().render_finished().handle()];
        let command_buffers = [frame.command_buffer().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .submit_graphics(&[submit_info], frame.sync().in_flight().handle())?;
        }

        Ok(())
    }

    fn present(&mut self, slot: usize, image: u32) -> Result<PresentOutcome, RhiError> {
        let semaphore = self.slots[slot].sync().render_finished().handle();

        match self
            .swapchain
            .present(self.device.present_queue(), image, semaphore)
        {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => Ok(PresentOutcome::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
            Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentOutcome::Suboptimal),
            Err(e) => Err(e.into()),
        }
    }

    fn rebuild(&mut self, extent: vk::Extent2D) -> Result<usize, RhiError> {
        debug!(
            "Rebuilding swapchain generation at {}x{}",
            extent.width, extent.height
        );

        // Nothing may reference the old generation while it is torn down.
        self.device.wait_idle()?;

        // Framebuffers reference the old image views; they go first.
        self.framebuffers.clear();

        self.swapchain
            .recreate(&self.instance, self.surface, extent.width, extent.height)?;

        let new_extent = self.swapchain.extent();
        self.depth_buffer =
            DepthBuffer::new(self.device.clone(), new_extent.width, new_extent.height)?;

        self.framebuffers = Framebuffer::for_swapchain(
            &self.device,
            &self.render_pass,
            self.swapchain.image_views(),
            Some(self.depth_buffer.view()),
            new_extent,
        )?;

        Ok(self.swapchain.image_count())
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        // Frame slots may still be in flight; settle the GPU before any
        // member Drop runs.
        if let Err(e) = self.device.wait_idle() {
            tracing::error!("wait_idle failed during backend drop: {:?}", e);
        }
    }
}
