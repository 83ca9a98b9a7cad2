//! Read-only view of a level for the renderer
//!
//! Taken after each tick. The renderer draws from it and never writes back.

use serde::{Deserialize, Serialize};

use crate::sim::geometry::Line;
use crate::sim::{Dot, LevelPhase, LevelState, LevelStats, WinMode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalSnapshot {
    pub goal_left: f32,
    pub goal_right: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotSnapshot {
    pub position: f32,
    pub launched: bool,
    pub confirmed: bool,
    /// Drawn in the highlight color once a valid confirmation registered
    pub highlighted: bool,
}

impl From<&Dot> for DotSnapshot {
    fn from(dot: &Dot) -> Self {
        Self {
            position: dot.position,
            launched: dot.launched,
            confirmed: dot.confirmed,
            highlighted: dot.confirmed,
        }
    }
}

/// Coarse phase for HUD text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseSnapshot {
    Active,
    Succeeded,
    Missed,
    Paused,
}

impl From<&LevelPhase> for PhaseSnapshot {
    fn from(phase: &LevelPhase) -> Self {
        match phase {
            LevelPhase::Active => PhaseSnapshot::Active,
            LevelPhase::Resolved(pending) if pending.outcome.is_success() => {
                PhaseSnapshot::Succeeded
            }
            LevelPhase::Resolved(_) => PhaseSnapshot::Missed,
            LevelPhase::Paused { .. } => PhaseSnapshot::Paused,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub mode: WinMode,
    pub phase: PhaseSnapshot,
    pub line: Line,
    pub goal: GoalSnapshot,
    pub left: DotSnapshot,
    pub right: DotSnapshot,
    pub level_index: u64,
    pub stats: LevelStats,
    /// Ticks simulated this session
    pub time_ticks: u64,
}

impl LevelSnapshot {
    pub fn capture(state: &LevelState) -> Self {
        Self {
            mode: state.mode,
            phase: PhaseSnapshot::from(&state.phase),
            line: state.line,
            goal: GoalSnapshot {
                goal_left: state.goal.goal_left(),
                goal_right: state.goal.goal_right(),
            },
            left: DotSnapshot::from(&state.left),
            right: DotSnapshot::from(&state.right),
            level_index: state.level_index,
            stats: state.stats,
            time_ticks: state.time_ticks,
        }
    }

    /// JSON for hosts outside Rust (the web page renderer)
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
