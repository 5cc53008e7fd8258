//! Frame pacing and rendering orchestration for Prism.
//!
//! The centerpiece is [`pacing::FramePacer`], the state machine driving the
//! acquire/record/submit/present/recreate cycle over rotating frame slots.
//! [`backend::VulkanBackend`] implements its device-side collaborator over
//! the rhi types, and [`renderer::Renderer`] assembles the full ownership
//! chain. The `triangle` and `sphere` modules are the demo renderers.

pub mod backend;
pub mod depth_buffer;
pub mod frame;
pub mod mesh;
pub mod pacing;
pub mod renderer;
pub mod sphere;
pub mod triangle;
pub mod ubo;

pub use backend::{RecordContext, VulkanBackend};
pub use pacing::{FrameError, FrameOutcome, FramePacer};
pub use renderer::{Renderer, RendererOptions};
pub use sphere::SphereRenderer;
pub use triangle::TriangleRenderer;

/// Number of frame slots rotating through the frame loop.
///
/// Fixed and independent of the swapchain image count: two slots let the
/// CPU prepare one frame while the GPU renders the previous one.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
