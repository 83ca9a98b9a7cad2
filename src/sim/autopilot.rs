//! Idle/demo player
//!
//! Plans press times for each level so both dots reach the goal center
//! together, then presses on schedule. Optional timing jitter makes it miss
//! now and then.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::geometry::GoalRange;
use super::state::{LevelState, Side, WinMode};
use super::tick::{InputEvent, TickInput};

/// Press times (seconds since the attempt started)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Plan {
    launch_left: f32,
    launch_right: f32,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    /// Max random offset added to each planned press (seconds)
    jitter: f32,
    plan: Option<Plan>,
    /// Attempt the current plan belongs to
    planned_for: (u64, u32),
    elapsed: f32,
}

impl Autopilot {
    pub fn new(seed: u64, jitter: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            jitter: jitter.max(0.0),
            plan: None,
            planned_for: (0, 0),
            elapsed: 0.0,
        }
    }

    /// Presses for the coming tick of length `dt`
    pub fn input_for(&mut self, state: &LevelState, dt: f32) -> TickInput {
        if !state.is_active() {
            return TickInput::default();
        }

        let attempt = (state.level_index, state.stats.attempts);
        if self.plan.is_none() || self.planned_for != attempt {
            self.plan = Some(self.make_plan(state));
            self.planned_for = attempt;
            self.elapsed = 0.0;
        }
        let Some(plan) = self.plan else {
            return TickInput::default();
        };

        let mut events = Vec::new();
        for side in Side::BOTH {
            let dot = state.dot(side);
            let launch_at = match side {
                Side::Left => plan.launch_left,
                Side::Right => plan.launch_right,
            };
            if !dot.launched {
                if self.elapsed >= launch_at {
                    events.push(InputEvent::launch(side));
                }
            } else if state.mode == WinMode::ConfirmPressInsideRange && !dot.confirmed {
                // Confirm once the dot reaches the (jittered) goal center
                let center = state.goal.center - side.direction() * self.jitter_offset(state);
                if (dot.position - center) * side.direction() >= 0.0 {
                    events.push(InputEvent::confirm(side));
                }
            }
        }

        self.elapsed += dt;
        TickInput::with_events(events)
    }

    fn jitter_offset(&self, state: &LevelState) -> f32 {
        // Stable per attempt so the confirm point does not wander tick to tick
        let (level, attempt) = self.planned_for;
        let phase = (level as f32 * 1.7 + attempt as f32 * 0.9).sin();
        phase * self.jitter * state.dot_speed
    }

    /// Launch times that bring both dots to the goal center at the same moment
    fn make_plan(&mut self, state: &LevelState) -> Plan {
        let Plan {
            launch_left,
            launch_right,
        } = plan_for(state.line.left_x, state.line.right_x, &state.goal, state.dot_speed);
        let mut jitter = || {
            if self.jitter > 0.0 {
                self.rng.random_range(-self.jitter..=self.jitter)
            } else {
                0.0
            }
        };
        let plan = Plan {
            launch_left: (launch_left + jitter()).max(0.0),
            launch_right: (launch_right + jitter()).max(0.0),
        };
        log::debug!(
            "Autopilot plan for level {}: left at {:.3}s, right at {:.3}s",
            state.level_index,
            plan.launch_left,
            plan.launch_right
        );
        plan
    }
}

/// Each dot is launched so its travel to the goal center ends at the same time
fn plan_for(left_x: f32, right_x: f32, goal: &GoalRange, speed: f32) -> Plan {
    let travel_left = (goal.center - left_x) / speed;
    let travel_right = (right_x - goal.center) / speed;
    let arrive = travel_left.max(travel_right);
    Plan {
        launch_left: arrive - travel_left,
        launch_right: arrive - travel_right,
    }
}
