//! Safe Vulkan abstraction layer for Prism.
//!
//! This crate wraps the raw Vulkan API (via `ash`) in RAII types with
//! builder-style construction. It covers:
//! - Instance and device creation
//! - Swapchain management
//! - Render passes and framebuffers
//! - Graphics pipelines
//! - Command recording
//! - Buffers, images, and textures
//! - Synchronization primitives
//!
//! Construction always returns a `Result`; validation problems are error
//! values the caller handles, never panics.

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod framebuffer;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users of this crate routinely need.
pub use ash::vk;
