//! Vulkan logical device and queue management.
//!
//! [`DeviceBuilder`] creates the logical device from a selected physical
//! device, retrieves the graphics and present queues, and initializes the
//! gpu-allocator instance that backs every buffer and image in this crate.

use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, info};

use crate::error::RhiError;
use crate::instance::Instance;
use crate::physical_device::{PhysicalDeviceInfo, QueueFamilyIndices};

/// Vulkan logical device wrapper.
///
/// Shared across the renderer as `Arc<Device>`; the ownership chain is
/// instance -> device -> everything else, enforced by each resource holding
/// its own `Arc<Device>`. The allocator sits behind a `Mutex` so buffer and
/// image creation is thread-safe.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// GPU memory allocator. ManuallyDrop so it can be torn down before
    /// the device handle it allocates from.
    allocator: ManuallyDrop<Mutex<Allocator>>,
    /// Graphics queue handle.
    graphics_queue: vk::Queue,
    /// Presentation queue handle (may equal the graphics queue).
    present_queue: vk::Queue,
    /// Queue family indices.
    queue_families: QueueFamilyIndices,
}

/// Builder for [`Device`].
pub struct DeviceBuilder<'a> {
    instance: &'a Instance,
    physical_device: &'a PhysicalDeviceInfo,
    anisotropy: bool,
}

impl<'a> DeviceBuilder<'a> {
    /// Creates a builder for the given physical device.
    pub fn new(instance: &'a Instance, physical_device: &'a PhysicalDeviceInfo) -> Self {
        Self {
            instance,
            physical_device,
            anisotropy: true,
        }
    }

    /// Enables or disables the sampler anisotropy feature.
    ///
    /// Requested only if the physical device supports it.
    pub fn anisotropy(mut self, enable: bool) -> Self {
        self.anisotropy = enable;
        self
    }

    /// Creates the logical device and allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue families are incomplete, device
    /// creation fails, or the allocator cannot be initialized.
    pub fn build(self) -> Result<Arc<Device>, RhiError> {
        let queue_families = self.physical_device.queue_families;
        if !queue_families.is_complete() {
            return Err(RhiError::InvalidArgument(
                "physical device is missing graphics or present queue family".to_string(),
            ));
        }

        let unique_families = queue_families.unique_families();
        let queue_priorities = [1.0f32];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families {:?}",
            queue_create_infos.len(),
            unique_families
        );

        let supports_anisotropy =
            self.physical_device.features.sampler_anisotropy == vk::TRUE;
        let features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(self.anisotropy && supports_anisotropy);

        let extension_names = [ash::khr::swapchain::NAME.as_ptr()];

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            self.instance
                .handle()
                .create_device(self.physical_device.device, &create_info, None)?
        };

        info!("Logical device created");

        let graphics_family = queue_families.graphics_family.unwrap();
        let present_family = queue_families.present_family.unwrap();
        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family, 0) };
        debug!(
            "Queues retrieved (graphics family {}, present family {})",
            graphics_family, present_family
        );

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: self.instance.handle().clone(),
            device: device.clone(),
            physical_device: self.physical_device.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        info!("GPU memory allocator initialized");

        Ok(Arc::new(Device {
            device,
            physical_device: self.physical_device.device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            present_queue,
            queue_families,
        }))
    }
}

impl Device {
    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the graphics queue handle.
    #[inline]
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Returns the presentation queue handle.
    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Returns the queue family indices.
    #[inline]
    pub fn queue_families(&self) -> &QueueFamilyIndices {
        &self.queue_families
    }

    /// Returns the GPU memory allocator.
    #[inline]
    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.allocator
    }

    /// Blocks until all outstanding work on every queue has completed.
    ///
    /// Required before destroying any swapchain-dependent resource and at
    /// shutdown.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits command buffers to the graphics queue.
    ///
    /// # Safety
    ///
    /// All command buffers must be fully recorded, synchronization must be
    /// expressed through the submit info, and `fence` (if non-null) must
    /// not be in use.
    pub unsafe fn submit_graphics(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> Result<(), RhiError> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("device_wait_idle failed during drop: {:?}", e);
            }
            // The allocator frees its memory blocks through the device, so
            // it must go first. All allocations must be returned by now.
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: ash::Device is Send+Sync, queue and physical-device handles are
// plain Copy handles, and the allocator is behind a Mutex.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
