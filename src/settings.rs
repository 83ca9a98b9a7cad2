//! Level configuration
//!
//! Loaded once at startup (JSON file natively, LocalStorage on the web) and
//! validated before the first level is generated. Missing fields fall back to
//! the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::KeyBindings;
use crate::sim::geometry::{GeometryError, GoalSampler, compute_line_extent};
use crate::sim::WinMode;

/// What a miss in meet mode does to the goal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissPolicy {
    /// Keep the goal range and retry
    #[default]
    RetrySameRange,
    /// Draw a fresh goal range as if the level had been cleared
    Regenerate,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dot speed must be finite and positive, got {0}")]
    InvalidSpeed(f32),
    #[error("resolve delay must be finite and non-negative, got {0}")]
    InvalidResolveDelay(f32),
    #[error("viewport half width must be finite and positive, got {0}")]
    InvalidViewport(f32),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Win-condition policy for the session
    pub mode: WinMode,
    /// Dot travel speed (world units per second)
    pub dot_speed: f32,

    // === Line ===
    /// Half of the visible world width
    pub viewport_half_width: f32,
    /// World x of the line's midpoint
    pub center_x: f32,
    /// Gap between each line end and the viewport edge
    pub side_margin: f32,

    // === Goal range ===
    pub goal_range_min_width: f32,
    pub goal_range_max_width: f32,
    /// Minimum distance between the goal range and the line ends
    pub goal_range_margin: f32,

    // === Flow ===
    pub miss_policy: MissPolicy,
    /// Seconds to hold the finished attempt on screen before moving on
    pub resolve_delay: f32,
    /// Fixed RNG seed; `None` picks one from the clock
    pub seed: Option<u64>,

    pub key_bindings: KeyBindings,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            mode: WinMode::MeetInsideRange,
            dot_speed: 3.0,

            // Line spans [-5, 5]
            viewport_half_width: 6.0,
            center_x: 0.0,
            side_margin: 1.0,

            goal_range_min_width: 0.5,
            goal_range_max_width: 2.0,
            goal_range_margin: 0.0,

            miss_policy: MissPolicy::RetrySameRange,
            resolve_delay: 0.0,
            seed: None,

            key_bindings: KeyBindings::default(),
        }
    }
}

impl LevelConfig {
    /// Check every numeric range and build the goal generator.
    ///
    /// # Errors
    /// Returns the first invalid setting found. Values are never clamped.
    pub fn validate(&self) -> Result<GoalSampler, ConfigError> {
        if !(self.dot_speed > 0.0) || !self.dot_speed.is_finite() {
            return Err(ConfigError::InvalidSpeed(self.dot_speed));
        }
        if !(self.resolve_delay >= 0.0) || !self.resolve_delay.is_finite() {
            return Err(ConfigError::InvalidResolveDelay(self.resolve_delay));
        }
        if !(self.viewport_half_width > 0.0) || !self.viewport_half_width.is_finite() {
            return Err(ConfigError::InvalidViewport(self.viewport_half_width));
        }
        let line = compute_line_extent(self.viewport_half_width, self.center_x, self.side_margin)?;
        let sampler = GoalSampler::new(
            line,
            self.goal_range_min_width,
            self.goal_range_max_width,
            self.goal_range_margin,
        )?;
        Ok(sampler)
    }

    /// Parse from JSON; missing fields take their defaults
    ///
    /// # Errors
    /// Malformed JSON or an invalid configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load from a JSON file
    ///
    /// # Errors
    /// I/O, parse or validation failures.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "dots_meet_config";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {}", e),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }
}
