//! Deterministic level simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters through `tick`'s `dt`
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod geometry;
pub mod state;
pub mod tick;

pub use autopilot::Autopilot;
pub use geometry::{
    GeometryError, GoalRange, GoalSampler, Line, compute_line_extent, generate_goal_range,
};
pub use state::{
    Dot, LevelEvent, LevelPhase, LevelState, LevelStats, MissReason, Outcome, Pending, Side,
    Transition, WinMode,
};
pub use tick::{InputEvent, InputKind, TickInput, tick};
