//! Dots Meet - a two-dot reflex minigame
//!
//! Core modules:
//! - `sim`: Deterministic level state machine (geometry, launch, motion, win/loss)
//! - `settings`: Load-time configuration and validation
//! - `input`: Raw key/pointer signals to per-frame input batches
//! - `snapshot`: Read-only view handed to the renderer

pub mod input;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use settings::{ConfigError, LevelConfig, MissPolicy};
pub use snapshot::LevelSnapshot;

/// Game loop constants
pub mod consts {
    /// Longest frame delta fed to the tick (seconds); longer frames are clamped
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Frame delta for the headless driver (60 Hz)
    pub const HEADLESS_DT: f32 = 1.0 / 60.0;
}
