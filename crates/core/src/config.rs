//! Application configuration.
//!
//! Configuration is loaded from an optional TOML file (`prism.toml` next to
//! the executable by convention). Every field has a default so the file can
//! be partial or absent entirely.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;

/// Which demo renderer the application should drive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demo {
    /// Flat shaded triangle, no vertex buffers.
    Triangle,
    /// Textured, depth-tested UV sphere with an orbit camera.
    #[default]
    Sphere,
}

/// Window configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial window width in physical pixels.
    pub width: u32,
    /// Initial window height in physical pixels.
    pub height: u32,
    /// Window title.
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Prism".to_string(),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window settings.
    pub window: WindowConfig,
    /// Which demo renderer to run.
    pub demo: Demo,
    /// Force FIFO presentation (vsync). When false, MAILBOX is preferred
    /// with FIFO as the fallback.
    pub vsync: bool,
    /// Enable Vulkan validation layers. Defaults to on in debug builds.
    pub validation: bool,
    /// How long a fence wait may block before it is reported as an error,
    /// in milliseconds.
    pub frame_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            demo: Demo::default(),
            vsync: true,
            validation: cfg!(debug_assertions),
            frame_timeout_ms: 5_000,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.demo, Demo::Sphere);
        assert!(config.vsync);
        assert_eq!(config.frame_timeout_ms, 5_000);
    }

    #[test]
    fn parses_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
            demo = "triangle"
            vsync = false

            [window]
            width = 640
            "#,
        )
        .unwrap();

        assert_eq!(config.demo, Demo::Triangle);
        assert!(!config.vsync);
        assert_eq!(config.window.width, 640);
        // Unspecified fields keep their defaults.
        assert_eq!(config.window.height, 720);
        assert_eq!(config.frame_timeout_ms, 5_000);
    }

    #[test]
    fn rejects_unknown_demo() {
        let result: std::result::Result<AppConfig, _> = toml::from_str(r#"demo = "teapot""#);
        assert!(result.is_err());
    }
}
