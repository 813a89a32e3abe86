//! # Burrow Core
//!
//! Shared foundations for the Burrow tunnel renderer:
//! - **Config**: tunnel resolution, camera placement and playback rate
//! - **Math**: glam re-exports and bounding volumes
//! - **Time**: fixed-step animation clock for driving per-tick mesh updates

pub mod math;
pub mod time;

pub use math::Aabb;
pub use time::{AnimationClock, DeltaTime, FixedTimeStep, Stopwatch};

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest number of vertices a ring can hold
pub const MIN_RADIAL_SEGMENTS: usize = 1;

/// Smallest number of rings; a single ring cannot form a strip
pub const MIN_DEPTH_SEGMENTS: usize = 2;

/// Upper bound on vertices addressable by 16-bit indices
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Check tunnel resolution against the mesh limits, returning the reason on failure
pub fn check_segments(radial_segments: usize, depth_segments: usize) -> Result<(), String> {
    if radial_segments < MIN_RADIAL_SEGMENTS {
        return Err(format!(
            "radial_segments must be at least {MIN_RADIAL_SEGMENTS}, got {radial_segments}"
        ));
    }
    if depth_segments < MIN_DEPTH_SEGMENTS {
        return Err(format!(
            "depth_segments must be at least {MIN_DEPTH_SEGMENTS}, got {depth_segments}"
        ));
    }
    match radial_segments.checked_mul(depth_segments) {
        Some(count) if count <= MAX_VERTICES => Ok(()),
        _ => Err(format!(
            "{radial_segments}x{depth_segments} vertices exceed the 16-bit index range ({MAX_VERTICES})"
        )),
    }
}

/// Tunnel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Vertices around each ring
    pub radial_segments: usize,
    /// Rings along the tunnel axis
    pub depth_segments: usize,
    /// Z translation applied when drawing
    pub camera_depth: f32,
    /// Animation ticks per second
    pub tick_rate_hz: f64,
    /// Maximum animation ticks run in a single display frame
    pub max_ticks_per_frame: u32,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            radial_segments: 16,
            depth_segments: 32,
            camera_depth: -3.0,
            tick_rate_hz: 30.0,
            max_ticks_per_frame: 8,
        }
    }
}

impl TunnelConfig {
    /// Parse a configuration from JSON text. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading tunnel config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> ConfigResult<()> {
        check_segments(self.radial_segments, self.depth_segments).map_err(ConfigError::Invalid)?;

        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate_hz must be positive, got {}",
                self.tick_rate_hz
            )));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ConfigError::Invalid("max_ticks_per_frame must be at least 1".into()));
        }
        if !self.camera_depth.is_finite() {
            return Err(ConfigError::Invalid("camera_depth must be finite".into()));
        }
        Ok(())
    }

    /// Fixed step derived from the tick rate
    pub fn time_step(&self) -> FixedTimeStep {
        FixedTimeStep::from_hz(self.tick_rate_hz).with_max_updates(self.max_ticks_per_frame)
    }
}
