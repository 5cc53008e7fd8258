//! Vulkan instance management.
//!
//! This module handles VkInstance creation, validation layers, and the debug
//! messenger. Instances are configured through [`InstanceBuilder`]:
//!
//! ```no_run
//! use prism_rhi::instance::InstanceBuilder;
//!
//! let instance = InstanceBuilder::new()
//!     .application_name("my app")
//!     .validation(cfg!(debug_assertions))
//!     .build()
//!     .expect("failed to create Vulkan instance");
//! ```

use std::ffi::{CStr, CString};

use ash::{Entry, vk};
use tracing::{error, info, warn};

use crate::error::RhiError;

/// The Khronos validation layer name.
const VALIDATION_LAYER_NAME: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan instance wrapper with optional validation layer support.
///
/// Owns the entry loader, the instance, and (when validation is enabled)
/// the debug messenger. Dropping the instance destroys both in the correct
/// order. Every device, surface, and swapchain created from this instance
/// must be dropped before it.
pub struct Instance {
    /// Vulkan entry point loader
    entry: Entry,
    /// Vulkan instance handle
    instance: ash::Instance,
    /// Debug utils loader, present only when validation is enabled
    debug_utils: Option<ash::ext::debug_utils::Instance>,
    /// Debug messenger handle, present only when validation is enabled
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

/// Builder for [`Instance`].
///
/// Validation defaults to off; the application name defaults to "Prism".
pub struct InstanceBuilder {
    application_name: String,
    enable_validation: bool,
}

impl Default for InstanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            application_name: "Prism".to_string(),
            enable_validation: false,
        }
    }

    /// Sets the application name reported to the driver.
    pub fn application_name(mut self, name: &str) -> Self {
        self.application_name = name.to_string();
        self
    }

    /// Enables or disables the Khronos validation layer and debug messenger.
    ///
    /// If the layer is requested but not installed, instance creation
    /// proceeds without it and logs a warning.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Creates the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the Vulkan library cannot be loaded, the
    /// application name contains a null byte, or instance creation fails.
    pub fn build(self) -> Result<Instance, RhiError> {
        let entry = unsafe { Entry::load()? };

        let validation_available =
            self.enable_validation && is_validation_layer_available(&entry)?;
        if self.enable_validation && !validation_available {
            warn!("Validation layer requested but not available, proceeding without it");
        }

        let app_name = CString::new(self.application_name.as_str())
            .map_err(|_| RhiError::InvalidArgument("application name contains NUL".to_string()))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"prism")
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_2);

        let mut extensions = required_surface_extensions();
        if validation_available {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let layers = if validation_available {
            vec![VALIDATION_LAYER_NAME.as_ptr()]
        } else {
            vec![]
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe { entry.create_instance(&create_info, None)? };

        info!(
            "Vulkan instance created for '{}' (validation: {})",
            self.application_name, validation_available
        );

        let (debug_utils, debug_messenger) = if validation_available {
            let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
            let messenger = create_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(messenger))
        } else {
            (None, None)
        };

        Ok(Instance {
            entry,
            instance,
            debug_utils,
            debug_messenger,
        })
    }
}

impl Instance {
    /// Returns the Vulkan instance handle.
    #[inline]
    pub fn handle(&self) -> &ash::Instance {
        &self.instance
    }

    /// Returns the Vulkan entry point loader.
    #[inline]
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Returns whether validation layers are active.
    #[inline]
    pub fn has_validation(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            // Messenger must go before the instance it was created from.
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        info!("Vulkan instance destroyed");
    }
}

/// Instance extensions needed to create surfaces on the current platform.
fn required_surface_extensions() -> Vec<*const i8> {
    let mut extensions = vec![ash::khr::surface::NAME.as_ptr()];

    #[cfg(target_os = "windows")]
    extensions.push(ash::khr::win32_surface::NAME.as_ptr());

    #[cfg(target_os = "linux")]
    {
        extensions.push(ash::khr::xlib_surface::NAME.as_ptr());
        extensions.push(ash::khr::wayland_surface::NAME.as_ptr());
    }

    #[cfg(target_os = "macos")]
    extensions.push(ash::ext::metal_surface::NAME.as_ptr());

    extensions
}

fn is_validation_layer_available(entry: &Entry) -> Result<bool, RhiError> {
    let available_layers = unsafe { entry.enumerate_instance_layer_properties()? };

    let wanted = VALIDATION_LAYER_NAME.to_bytes_with_nul();
    let found = available_layers.iter().any(|layer| {
        let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
        name.to_bytes_with_nul() == wanted
    });

    Ok(found)
}

fn create_debug_messenger(
    debug_utils: &ash::ext::debug_utils::Instance,
) -> Result<vk::DebugUtilsMessengerEXT, RhiError> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None)? };
    info!("Debug messenger created");
    Ok(messenger)
}

/// Validation layer callback. Routes messages into `tracing`.
///
/// # Safety
///
/// Called by the Vulkan driver; must follow the Vulkan spec for debug
/// callbacks.
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = unsafe { &*p_callback_data };
    let message = if callback_data.p_message.is_null() {
        std::borrow::Cow::Borrowed("(no message)")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let type_str = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "general",
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            error!("[vk {}] {}", type_str, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            warn!("[vk {}] {}", type_str, message);
        }
        _ => {
            tracing::info!("[vk {}] {}", type_str, message);
        }
    }

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_extensions_include_base_surface() {
        let extensions = required_surface_extensions();
        assert!(!extensions.is_empty());
        let first = unsafe { CStr::from_ptr(extensions[0]) };
        assert_eq!(first, ash::khr::surface::NAME);
    }

    #[test]
    fn builder_rejects_nul_in_name() {
        // Build would fail before touching the driver if Vulkan is absent,
        // so only the name validation path is exercised here.
        let builder = InstanceBuilder::new().application_name("bad\0name");
        match builder.build() {
            Err(RhiError::InvalidArgument(_)) | Err(RhiError::Loading(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
