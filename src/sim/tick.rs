//! Per-frame simulation tick
//!
//! Order within a tick: input, then motion, then evaluation. A resolution
//! applies its regenerate/reset last and nothing is re-evaluated afterwards.

use serde::{Deserialize, Serialize};

use super::state::{
    LevelEvent, LevelPhase, LevelState, MissReason, Outcome, Pending, Side, WinMode,
};

/// The collaborator's reading of a press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Launch,
    Confirm,
}

/// A normalized press on one input zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub side: Side,
    pub kind: InputKind,
}

impl InputEvent {
    pub fn launch(side: Side) -> Self {
        Self {
            side,
            kind: InputKind::Launch,
        }
    }

    pub fn confirm(side: Side) -> Self {
        Self {
            side,
            kind: InputKind::Confirm,
        }
    }
}

/// Input for a single tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Presses for this frame, already deduplicated
    pub events: Vec<InputEvent>,
    /// Jump to a fresh level
    pub skip_level: bool,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    pub fn with_events(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Add presses from a second source, skipping sides already pressed this frame
    pub fn merge_presses(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        for event in events {
            if !self.events.iter().any(|e| e.side == event.side) {
                self.events.push(event);
            }
        }
    }
}

/// Advance the level by `dt` seconds, returning what happened
pub fn tick(state: &mut LevelState, input: &TickInput, dt: f32) -> Vec<LevelEvent> {
    let mut events = Vec::new();

    // Handle pause toggle
    if input.pause {
        match state.phase {
            LevelPhase::Active => {
                state.phase = LevelPhase::Paused { resume: None };
                events.push(LevelEvent::Paused);
                return events;
            }
            LevelPhase::Resolved(pending) => {
                state.phase = LevelPhase::Paused {
                    resume: Some(pending),
                };
                events.push(LevelEvent::Paused);
                return events;
            }
            LevelPhase::Paused { resume } => {
                state.phase = match resume {
                    Some(pending) => LevelPhase::Resolved(pending),
                    None => LevelPhase::Active,
                };
                events.push(LevelEvent::Resumed);
            }
        }
    }

    if matches!(state.phase, LevelPhase::Paused { .. }) {
        return events;
    }

    if input.skip_level {
        log::info!("Level {} skipped", state.level_index);
        state.regenerate();
        events.push(LevelEvent::Regenerated {
            level_index: state.level_index,
        });
        return events;
    }

    state.time_ticks += 1;

    // A finished attempt waits out its delay; the transition ends the tick
    if let LevelPhase::Resolved(mut pending) = state.phase {
        pending.remaining -= dt;
        if pending.remaining <= 0.0 {
            events.push(state.apply(pending.transition));
        } else {
            state.phase = LevelPhase::Resolved(pending);
        }
        return events;
    }

    for event in &input.events {
        handle_press(state, event.side, &mut events);
    }

    let speed = state.dot_speed;
    state.left.advance(speed, dt);
    state.right.advance(speed, dt);

    if let Some(outcome) = evaluate(state, &mut events) {
        resolve(state, outcome, &mut events);
    }

    events
}

/// First press launches; later presses confirm in confirm mode and are
/// ignored in meet mode
fn handle_press(state: &mut LevelState, side: Side, events: &mut Vec<LevelEvent>) {
    let mode = state.mode;
    let goal = state.goal;
    let dot = state.dot_mut(side);

    if !dot.launched {
        dot.launched = true;
        log::debug!("{} dot launched", side.as_str());
        events.push(LevelEvent::Launched { side });
        return;
    }

    if mode != WinMode::ConfirmPressInsideRange || dot.confirmed {
        return;
    }

    let position = dot.position;
    if goal.contains(position) {
        dot.confirmed = true;
        log::debug!("{} dot confirmed at {:.3}", side.as_str(), position);
        events.push(LevelEvent::Confirmed { side, position });
    } else {
        events.push(LevelEvent::ConfirmRejected { side, position });
    }
}

/// Check the win/loss condition for the current mode
fn evaluate(state: &LevelState, events: &mut Vec<LevelEvent>) -> Option<Outcome> {
    match state.mode {
        WinMode::MeetInsideRange => {
            if state.left.position < state.right.position {
                return None;
            }
            let meet_x = (state.left.position + state.right.position) * 0.5;
            events.push(LevelEvent::Met { meet_x });
            if state.goal.contains(meet_x) {
                Some(Outcome::Success)
            } else {
                Some(Outcome::Miss(MissReason::MetOutsideRange { meet_x }))
            }
        }
        WinMode::ConfirmPressInsideRange => {
            if state.left.confirmed && state.right.confirmed {
                Some(Outcome::Success)
            } else if state.left.position > state.goal.goal_right() {
                Some(Outcome::Miss(MissReason::Overshot { side: Side::Left }))
            } else if state.right.position < state.goal.goal_left() {
                Some(Outcome::Miss(MissReason::Overshot { side: Side::Right }))
            } else {
                None
            }
        }
    }
}

/// Record the outcome and either transition now or freeze for the delay
fn resolve(state: &mut LevelState, outcome: Outcome, events: &mut Vec<LevelEvent>) {
    match outcome {
        Outcome::Success => log::info!("Level {} cleared", state.level_index),
        Outcome::Miss(reason) => log::info!("Level {} missed: {:?}", state.level_index, reason),
    }
    state.stats.record(&outcome);
    events.push(LevelEvent::Resolved { outcome });

    let transition = state.transition_for(&outcome);
    if state.resolve_delay > 0.0 {
        state.phase = LevelPhase::Resolved(Pending {
            outcome,
            transition,
            remaining: state.resolve_delay,
        });
    } else {
        events.push(state.apply(transition));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LevelConfig, MissPolicy};
    use crate::sim::geometry::GoalRange;
    use crate::sim::state::Transition;

    fn state_with(mode: WinMode, speed: f32) -> LevelState {
        let config = LevelConfig {
            mode,
            dot_speed: speed,
            ..Default::default()
        };
        let mut state = LevelState::new(&config, 12345).unwrap();
        state.goal = GoalRange::from_bounds(-1.0, 1.0);
        state
    }

    fn press(side: Side) -> TickInput {
        TickInput::with_events([InputEvent::launch(side)])
    }

    fn both() -> TickInput {
        TickInput::with_events([InputEvent::launch(Side::Left), InputEvent::launch(Side::Right)])
    }

    fn resolved(events: &[LevelEvent]) -> Option<Outcome> {
        events.iter().find_map(|e| match e {
            LevelEvent::Resolved { outcome } => Some(*outcome),
            _ => None,
        })
    }

    #[test]
    fn test_meet_at_center_end_to_end() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        assert_eq!((state.line.left_x, state.line.right_x), (-5.0, 5.0));

        let events = tick(&mut state, &both(), 0.5);
        assert!(events.contains(&LevelEvent::Launched { side: Side::Left }));
        assert!(events.contains(&LevelEvent::Launched { side: Side::Right }));

        for _ in 1..9 {
            let events = tick(&mut state, &TickInput::default(), 0.5);
            assert!(resolved(&events).is_none());
        }
        assert_eq!(state.left.position, -0.5);
        assert_eq!(state.right.position, 0.5);

        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert!(events.contains(&LevelEvent::Met { meet_x: 0.0 }));
        assert_eq!(resolved(&events), Some(Outcome::Success));
        assert!(events.contains(&LevelEvent::Regenerated { level_index: 2 }));

        // Fresh level, active immediately
        assert!(state.is_active());
        assert_eq!(state.left.position, -5.0);
        assert!(!state.left.launched && !state.right.launched);
        assert_eq!(state.stats.cleared, 1);
    }

    #[test]
    fn test_meet_boundaries_inclusive() {
        // Meets at x = -1 (left edge)
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        state.left.launched = true;
        state.right.launched = true;
        state.left.position = -1.5;
        state.right.position = -0.5;
        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert!(events.contains(&LevelEvent::Met { meet_x: -1.0 }));
        assert_eq!(resolved(&events), Some(Outcome::Success));

        // Meets at x = 1 (right edge)
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        state.left.launched = true;
        state.right.launched = true;
        state.left.position = 0.5;
        state.right.position = 1.5;
        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert!(events.contains(&LevelEvent::Met { meet_x: 1.0 }));
        assert_eq!(resolved(&events), Some(Outcome::Success));
    }

    #[test]
    fn test_meet_miss_keeps_goal() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        let goal = state.goal;
        // Only the left dot moves; it meets the right dot at the far end
        tick(&mut state, &press(Side::Left), 1.0);
        let mut outcome = None;
        for _ in 0..20 {
            let events = tick(&mut state, &TickInput::default(), 1.0);
            if let Some(o) = resolved(&events) {
                assert!(events.contains(&LevelEvent::Reset));
                outcome = Some(o);
                break;
            }
        }
        assert!(matches!(
            outcome,
            Some(Outcome::Miss(MissReason::MetOutsideRange { .. }))
        ));
        assert_eq!(state.goal, goal);
        assert_eq!(state.level_index, 1);
        assert_eq!(state.left.position, -5.0);
        assert!(!state.left.launched);
        assert!(state.is_active());
        assert_eq!(state.stats.attempts, 2);
    }

    #[test]
    fn test_meet_miss_regenerate_policy() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        state.miss_policy = MissPolicy::Regenerate;
        state.left.launched = true;
        state.right.launched = true;
        state.left.position = 2.5;
        state.right.position = 3.5;
        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert!(matches!(resolved(&events), Some(Outcome::Miss(_))));
        assert!(events.contains(&LevelEvent::Regenerated { level_index: 2 }));
        assert_ne!(state.goal, GoalRange::from_bounds(-1.0, 1.0));
    }

    #[test]
    fn test_second_press_ignored_in_meet_mode() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        tick(&mut state, &press(Side::Left), 0.5);
        state.left.position = 0.0;
        let events = tick(&mut state, &press(Side::Left), 0.5);
        assert!(events.is_empty());
        assert!(!state.left.confirmed);
        assert_eq!(state.left.position, 0.5);
    }

    #[test]
    fn test_confirm_outside_range_ignored() {
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        tick(&mut state, &press(Side::Left), 0.5);
        assert_eq!(state.left.position, -4.5);

        let confirm = TickInput::with_events([InputEvent::confirm(Side::Left)]);
        let events = tick(&mut state, &confirm, 0.5);
        assert!(events.contains(&LevelEvent::ConfirmRejected {
            side: Side::Left,
            position: -4.5
        }));
        assert!(!state.left.confirmed);
        let snap = crate::snapshot::LevelSnapshot::capture(&state);
        assert!(!snap.left.highlighted);
        // Still moving
        assert_eq!(state.left.position, -4.0);
    }

    #[test]
    fn test_confirm_inside_range_keeps_moving() {
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        state.left.launched = true;
        state.left.position = -0.5;
        let confirm = TickInput::with_events([InputEvent::confirm(Side::Left)]);
        let events = tick(&mut state, &confirm, 0.5);
        assert!(events.contains(&LevelEvent::Confirmed {
            side: Side::Left,
            position: -0.5
        }));
        assert!(state.left.confirmed);
        assert_eq!(state.left.position, 0.0);
    }

    #[test]
    fn test_confirm_on_goal_edges() {
        // Left dot sitting exactly on goal_left, right dot exactly on goal_right
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        state.left.launched = true;
        state.left.position = -1.0;
        state.right.launched = true;
        state.right.position = 1.0;
        let confirm = TickInput::with_events([
            InputEvent::confirm(Side::Left),
            InputEvent::confirm(Side::Right),
        ]);
        let events = tick(&mut state, &confirm, 0.1);
        assert!(events.contains(&LevelEvent::Confirmed {
            side: Side::Left,
            position: -1.0
        }));
        assert!(events.contains(&LevelEvent::Confirmed {
            side: Side::Right,
            position: 1.0
        }));
        assert_eq!(resolved(&events), Some(Outcome::Success));

        // Left dot on goal_right, right dot on goal_left
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        state.left.launched = true;
        state.left.position = 1.0;
        state.right.launched = true;
        state.right.position = -1.0;
        let events = tick(&mut state, &confirm, 0.0);
        assert!(events.contains(&LevelEvent::Confirmed {
            side: Side::Left,
            position: 1.0
        }));
        assert!(events.contains(&LevelEvent::Confirmed {
            side: Side::Right,
            position: -1.0
        }));
        assert_eq!(resolved(&events), Some(Outcome::Success));
    }

    #[test]
    fn test_merge_presses_one_per_side() {
        let mut input = TickInput::with_events([InputEvent::launch(Side::Left)]);
        input.merge_presses([InputEvent::launch(Side::Left), InputEvent::launch(Side::Right)]);
        assert_eq!(
            input.events,
            vec![InputEvent::launch(Side::Left), InputEvent::launch(Side::Right)]
        );

        // A merged duplicate launch must not turn into a rejected confirm
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        let events = tick(&mut state, &input, 0.5);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, LevelEvent::ConfirmRejected { .. }))
        );
        assert!(state.left.launched && state.right.launched);
    }

    #[test]
    fn test_overshoot_resets_even_if_confirmed() {
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        let goal = state.goal;
        state.left.launched = true;
        state.left.confirmed = true;
        state.left.position = 0.8;
        state.right.launched = true;
        state.right.position = 3.0;

        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert_eq!(
            resolved(&events),
            Some(Outcome::Miss(MissReason::Overshot { side: Side::Left }))
        );
        assert!(events.contains(&LevelEvent::Reset));
        assert_eq!(state.goal, goal);
        assert!(!state.left.confirmed && !state.right.confirmed);
        assert!(!state.left.launched && !state.right.launched);
        assert_eq!(state.stats.misses, 1);
    }

    #[test]
    fn test_right_overshoot() {
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        state.right.launched = true;
        state.right.position = -0.9;
        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert_eq!(
            resolved(&events),
            Some(Outcome::Miss(MissReason::Overshot { side: Side::Right }))
        );
    }

    #[test]
    fn test_both_confirmed_regenerates() {
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        state.left.launched = true;
        state.left.position = -0.5;
        state.right.launched = true;
        state.right.position = 0.5;
        let confirm = TickInput::with_events([
            InputEvent::confirm(Side::Left),
            InputEvent::confirm(Side::Right),
        ]);
        let events = tick(&mut state, &confirm, 0.1);
        assert_eq!(resolved(&events), Some(Outcome::Success));
        assert!(events.contains(&LevelEvent::Regenerated { level_index: 2 }));
        assert!(!state.left.confirmed);
        assert!(state.is_active());
    }

    #[test]
    fn test_resolve_delay_freezes_then_transitions() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        state.resolve_delay = 1.0;
        state.left.launched = true;
        state.right.launched = true;
        state.left.position = -0.25;
        state.right.position = 0.25;

        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert_eq!(resolved(&events), Some(Outcome::Success));
        assert!(!state.is_active());
        let frozen = state.left.position;

        // Presses are ignored while resolved
        let events = tick(&mut state, &press(Side::Left), 0.5);
        assert!(events.is_empty());
        assert_eq!(state.left.position, frozen);

        let events = tick(&mut state, &TickInput::default(), 0.5);
        assert_eq!(events, vec![LevelEvent::Regenerated { level_index: 2 }]);
        assert!(state.is_active());
        assert!(!state.left.launched);
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        tick(&mut state, &both(), 0.5);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut state, &pause, 0.5), vec![LevelEvent::Paused]);
        let position = state.left.position;
        tick(&mut state, &TickInput::default(), 0.5);
        assert_eq!(state.left.position, position);

        let events = tick(&mut state, &pause, 0.5);
        assert_eq!(events.first(), Some(&LevelEvent::Resumed));
        assert_eq!(state.left.position, position + 0.5);
    }

    #[test]
    fn test_pause_keeps_pending_resolution() {
        let mut state = state_with(WinMode::MeetInsideRange, 1.0);
        state.resolve_delay = 1.0;
        state.left.launched = true;
        state.right.launched = true;
        state.left.position = 4.0;
        state.right.position = 4.5;
        tick(&mut state, &TickInput::default(), 0.5);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, 0.5);
        tick(&mut state, &pause, 0.5);
        match state.phase {
            LevelPhase::Resolved(pending) => {
                assert_eq!(pending.transition, Transition::Reset);
                assert_eq!(pending.remaining, 0.5);
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn test_skip_level() {
        let mut state = state_with(WinMode::ConfirmPressInsideRange, 1.0);
        tick(&mut state, &both(), 0.5);
        let skip = TickInput {
            skip_level: true,
            ..Default::default()
        };
        let events = tick(&mut state, &skip, 0.5);
        assert_eq!(events, vec![LevelEvent::Regenerated { level_index: 2 }]);
        assert!(!state.left.launched);
        assert_eq!(state.stats.cleared, 0);
    }

    #[test]
    fn test_determinism() {
        let config = LevelConfig::default();
        let mut state1 = LevelState::new(&config, 99999).unwrap();
        let mut state2 = LevelState::new(&config, 99999).unwrap();

        let inputs = [both(), TickInput::default(), press(Side::Right)];
        for _ in 0..200 {
            for input in &inputs {
                let a = tick(&mut state1, input, 0.05);
                let b = tick(&mut state2, input, 0.05);
                assert_eq!(a, b);
            }
        }
        assert_eq!(state1.goal, state2.goal);
        assert_eq!(state1.level_index, state2.level_index);
        assert_eq!(state1.stats, state2.stats);
    }
}
