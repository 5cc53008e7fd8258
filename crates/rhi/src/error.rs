//! RHI-specific error types.

use std::time::Duration;

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocator(#[from] gpu_allocator::AllocationError),

    /// A fence wait exceeded its deadline
    #[error("Fence wait timed out after {0:?}")]
    Timeout(Duration),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Surface creation error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    Swapchain(String),

    /// Pipeline or render pass construction error
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Invalid argument or handle
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RhiError {
    /// Whether this error indicates the logical device was lost.
    ///
    /// Device loss is never recoverable; callers should tear down rather
    /// than retry.
    pub fn is_device_lost(&self) -> bool {
        matches!(self, RhiError::Vulkan(ash::vk::Result::ERROR_DEVICE_LOST))
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_lost_is_classified() {
        let err = RhiError::from(ash::vk::Result::ERROR_DEVICE_LOST);
        assert!(err.is_device_lost());

        let err = RhiError::from(ash::vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        assert!(!err.is_device_lost());

        let err = RhiError::Timeout(Duration::from_secs(5));
        assert!(!err.is_device_lost());
    }
}
