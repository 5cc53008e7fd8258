//! Core utilities shared across the Prism renderer.
//!
//! This crate provides the foundational pieces every other crate leans on:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Application configuration loading

mod config;
mod error;
mod logging;
mod timer;

pub use config::{AppConfig, Demo, WindowConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
