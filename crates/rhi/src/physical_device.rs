//! Physical device (GPU) selection.
//!
//! GPU selection checks each device for the required queue families
//! (graphics + present), swapchain support on the target surface, and the
//! features the renderer enables, preferring discrete GPUs.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// Queue family indices for the queue types the renderer uses.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueFamilyIndices {
    /// Index of the queue family supporting graphics operations.
    pub graphics_family: Option<u32>,
    /// Index of the queue family supporting presentation to the surface.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Whether the minimum required queue families were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// The unique family indices, for device queue creation.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);
        if let Some(graphics) = self.graphics_family {
            families.push(graphics);
        }
        if let Some(present) = self.present_family {
            if !families.contains(&present) {
                families.push(present);
            }
        }
        families
    }
}

/// Information about a selected physical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version).
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features.
    pub features: vk::PhysicalDeviceFeatures,
    /// Queue family indices.
    pub queue_families: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Device name as a string.
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    /// Human-readable device type.
    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Selects the most suitable physical device for rendering to `surface`.
///
/// Candidates must provide graphics and present queue families, the
/// swapchain extension, and at least one surface format and present mode.
/// Discrete GPUs win over integrated ones.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if nothing qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<PhysicalDeviceInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };
    if devices.is_empty() {
        warn!("No Vulkan-capable devices found");
        return Err(RhiError::NoSuitableGpu);
    }

    debug!("Found {} physical device(s)", devices.len());

    let mut best: Option<(u32, PhysicalDeviceInfo)> = None;

    for device in devices {
        let Some(info) = evaluate_device(instance, device, surface, surface_loader)? else {
            continue;
        };

        let score = score_device(&info);
        debug!(
            "Candidate '{}' ({}) scored {}",
            info.device_name(),
            info.device_type_name(),
            score
        );

        if best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, info));
        }
    }

    match best {
        Some((_, info)) => {
            info!(
                "Selected GPU: {} ({})",
                info.device_name(),
                info.device_type_name()
            );
            Ok(info)
        }
        None => Err(RhiError::NoSuitableGpu),
    }
}

/// Checks a single device and returns its info if it qualifies.
fn evaluate_device(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<Option<PhysicalDeviceInfo>, RhiError> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let features = unsafe { instance.get_physical_device_features(device) };

    let queue_families = find_queue_families(instance, device, surface, surface_loader)?;
    if !queue_families.is_complete() {
        return Ok(None);
    }

    if !supports_swapchain_extension(instance, device)? {
        return Ok(None);
    }

    // The surface must expose at least one format and present mode,
    // otherwise swapchain creation cannot succeed.
    let format_count = unsafe {
        surface_loader
            .get_physical_device_surface_formats(device, surface)?
            .len()
    };
    let present_mode_count = unsafe {
        surface_loader
            .get_physical_device_surface_present_modes(device, surface)?
            .len()
    };
    if format_count == 0 || present_mode_count == 0 {
        return Ok(None);
    }

    Ok(Some(PhysicalDeviceInfo {
        device,
        properties,
        features,
        queue_families,
    }))
}

fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<QueueFamilyIndices, RhiError> {
    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let mut indices = QueueFamilyIndices::default();

    for (i, family) in families.iter().enumerate() {
        let index = i as u32;

        if indices.graphics_family.is_none()
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            indices.graphics_family = Some(index);
        }

        if indices.present_family.is_none() {
            let present_support = unsafe {
                surface_loader.get_physical_device_surface_support(device, index, surface)?
            };
            if present_support {
                indices.present_family = Some(index);
            }
        }

        if indices.is_complete() {
            break;
        }
    }

    Ok(indices)
}

fn supports_swapchain_extension(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> Result<bool, RhiError> {
    let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };

    let wanted = ash::khr::swapchain::NAME.to_bytes_with_nul();
    let found = extensions.iter().any(|ext| {
        let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
        name.to_bytes_with_nul() == wanted
    });

    Ok(found)
}

/// Ranks a qualified device. Discrete > integrated > everything else.
fn score_device(info: &PhysicalDeviceInfo) -> u32 {
    let mut score = match info.properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 1_000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
        _ => 10,
    };

    if info.features.sampler_anisotropy == vk::TRUE {
        score += 1;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_indices_are_reported() {
        let indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());

        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: None,
        };
        assert!(!indices.is_complete());

        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(1),
        };
        assert!(indices.is_complete());
    }

    #[test]
    fn unique_families_deduplicates() {
        let shared = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        assert_eq!(shared.unique_families(), vec![0]);

        let split = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert_eq!(split.unique_families(), vec![0, 2]);
    }

    #[test]
    fn discrete_gpu_outranks_integrated() {
        let mut discrete_props = vk::PhysicalDeviceProperties::default();
        discrete_props.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;

        let mut integrated_props = vk::PhysicalDeviceProperties::default();
        integrated_props.device_type = vk::PhysicalDeviceType::INTEGRATED_GPU;

        let discrete = PhysicalDeviceInfo {
            device: vk::PhysicalDevice::null(),
            properties: discrete_props,
            features: vk::PhysicalDeviceFeatures::default(),
            queue_families: QueueFamilyIndices::default(),
        };
        let integrated = PhysicalDeviceInfo {
            properties: integrated_props,
            ..discrete.clone()
        };

        assert!(score_device(&discrete) > score_device(&integrated));
    }
}
