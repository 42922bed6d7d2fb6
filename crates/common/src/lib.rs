//! ScreenReel Common Utilities
//!
//! Shared infrastructure for all ScreenReel crates:
//! - Error types and result aliases
//! - Frame timing and delta-clamping utilities for playback loops
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod ticker;

pub use config::*;
pub use error::*;
pub use ticker::*;
