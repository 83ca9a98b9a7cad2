//! Level state and core simulation types
//!
//! Everything the tick reads or writes lives here, so a level can be
//! replayed from its seed and the same input sequence.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{GoalRange, GoalSampler, Line};
use crate::settings::{ConfigError, LevelConfig, MissPolicy};

/// Which input zone / which dot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Direction of travel along x (left dot moves right, right dot moves left)
    #[inline]
    pub fn direction(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Win-condition policy, fixed for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinMode {
    /// Dots travel until they cross; the meeting point must be inside the goal
    #[default]
    MeetInsideRange,
    /// Each dot must be confirmed with a second press while inside the goal
    ConfirmPressInsideRange,
}

/// One of the two moving markers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub side: Side,
    pub position: f32,
    pub launched: bool,
    /// Set once a confirmation landed inside the goal (confirm mode only)
    pub confirmed: bool,
}

impl Dot {
    /// A stationary dot at its home end of the line
    pub fn at_home(side: Side, line: &Line) -> Self {
        let position = match side {
            Side::Left => line.left_x,
            Side::Right => line.right_x,
        };
        Self {
            side,
            position,
            launched: false,
            confirmed: false,
        }
    }

    /// Advance toward the opposite end if launched
    pub fn advance(&mut self, speed: f32, dt: f32) {
        if self.launched {
            self.position += self.side.direction() * speed * dt;
        }
    }
}

/// Why an attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MissReason {
    /// Dots crossed outside the goal
    MetOutsideRange { meet_x: f32 },
    /// A dot travelled past the far edge of the goal before both were confirmed
    Overshot { side: Side },
}

/// Result of a finished attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Miss(MissReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// What happens to the level once an outcome is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// New goal range, dots back home
    Regenerate,
    /// Same goal range, dots back home
    Reset,
}

/// A finished attempt waiting out the resolve delay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pending {
    pub outcome: Outcome,
    pub transition: Transition,
    /// Seconds left before the transition is applied
    pub remaining: f32,
}

/// Current phase of the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Input and motion are applied
    Active,
    /// Attempt finished; dots frozen until the transition runs
    Resolved(Pending),
    /// Externally paused; `resume` holds an interrupted resolution, if any
    Paused { resume: Option<Pending> },
}

/// Notifications produced by a tick, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelEvent {
    Launched { side: Side },
    Confirmed { side: Side, position: f32 },
    /// Confirmation pressed while the dot was outside the goal; ignored
    ConfirmRejected { side: Side, position: f32 },
    Met { meet_x: f32 },
    Resolved { outcome: Outcome },
    Regenerated { level_index: u64 },
    Reset,
    Paused,
    Resumed,
}

/// Running tallies for the session (in memory only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub cleared: u32,
    pub misses: u32,
    /// Tries on the current goal range, including the one in progress
    pub attempts: u32,
    pub streak: u32,
    pub best_streak: u32,
}

impl LevelStats {
    pub fn record(&mut self, outcome: &Outcome) {
        if outcome.is_success() {
            self.cleared += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.misses += 1;
            self.streak = 0;
        }
    }
}

/// RNG seed wrapper; each level gets its own deterministic stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// RNG for the given level, mixed so neighbouring levels diverge
    pub fn level_rng(&self, level_index: u64) -> Pcg32 {
        Pcg32::seed_from_u64(
            level_index
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .wrapping_add(self.seed),
        )
    }
}

/// Complete level state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    pub mode: WinMode,
    pub phase: LevelPhase,
    pub line: Line,
    pub goal: GoalRange,
    pub left: Dot,
    pub right: Dot,
    /// Levels generated so far (the first level is 1)
    pub level_index: u64,
    pub stats: LevelStats,
    pub time_ticks: u64,
    pub dot_speed: f32,
    pub miss_policy: MissPolicy,
    pub resolve_delay: f32,
    rng_state: RngState,
    sampler: GoalSampler,
}

impl LevelState {
    /// Validate the configuration and generate the first level
    pub fn new(config: &LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        let sampler = config.validate()?;
        let line = sampler.line();
        let mut state = Self {
            mode: config.mode,
            phase: LevelPhase::Active,
            line,
            goal: GoalRange::new(line.midpoint(), 0.0),
            left: Dot::at_home(Side::Left, &line),
            right: Dot::at_home(Side::Right, &line),
            level_index: 0,
            stats: LevelStats::default(),
            time_ticks: 0,
            dot_speed: config.dot_speed,
            miss_policy: config.miss_policy,
            resolve_delay: config.resolve_delay,
            rng_state: RngState::new(seed),
            sampler,
        };
        state.regenerate();
        Ok(state)
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    /// Input and motion only apply while this is true
    pub fn is_active(&self) -> bool {
        matches!(self.phase, LevelPhase::Active)
    }

    pub fn dot(&self, side: Side) -> &Dot {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn dot_mut(&mut self, side: Side) -> &mut Dot {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// New goal range and dots back home; starts a fresh level
    pub fn regenerate(&mut self) {
        self.level_index += 1;
        let mut rng = self.rng_state.level_rng(self.level_index);
        self.goal = self.sampler.sample(&mut rng);
        self.stats.attempts = 0;
        self.reset_dots();
        log::info!(
            "Level {}: goal [{:.3}, {:.3}]",
            self.level_index,
            self.goal.goal_left(),
            self.goal.goal_right()
        );
    }

    /// Dots back home with flags cleared; the goal range is kept
    pub fn reset(&mut self) {
        self.reset_dots();
    }

    fn reset_dots(&mut self) {
        self.left = Dot::at_home(Side::Left, &self.line);
        self.right = Dot::at_home(Side::Right, &self.line);
        self.stats.attempts += 1;
        self.phase = LevelPhase::Active;
    }

    /// Transition that follows an outcome under the current policies
    pub fn transition_for(&self, outcome: &Outcome) -> Transition {
        match outcome {
            Outcome::Success => Transition::Regenerate,
            Outcome::Miss(MissReason::MetOutsideRange { .. }) => match self.miss_policy {
                MissPolicy::RetrySameRange => Transition::Reset,
                MissPolicy::Regenerate => Transition::Regenerate,
            },
            Outcome::Miss(MissReason::Overshot { .. }) => Transition::Reset,
        }
    }

    /// Apply a transition and report it
    pub fn apply(&mut self, transition: Transition) -> LevelEvent {
        match transition {
            Transition::Regenerate => {
                self.regenerate();
                LevelEvent::Regenerated {
                    level_index: self.level_index,
                }
            }
            Transition::Reset => {
                self.reset();
                LevelEvent::Reset
            }
        }
    }
}
