//! Raw input normalization
//!
//! Hosts feed key codes and pointer positions as they arrive; once per frame
//! `InputMapper::take_frame` turns them into a `TickInput` with at most one
//! press per side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{InputEvent, InputKind, LevelState, Side, TickInput};

/// Key codes (browser `KeyboardEvent.code` names) for each action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left: String,
    pub right: String,
    pub skip_level: String,
    pub pause: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: "KeyA".to_string(),
            right: "KeyL".to_string(),
            skip_level: "KeyN".to_string(),
            pause: "Escape".to_string(),
        }
    }
}

/// Orthographic camera mapping screen pixels to world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen size in pixels
    pub size: Vec2,
    /// World position at the center of the screen
    pub camera_center: Vec2,
    /// Half of the visible world height
    pub half_height: f32,
}

impl Viewport {
    pub fn new(size: Vec2, camera_center: Vec2, half_height: f32) -> Self {
        Self {
            size,
            camera_center,
            half_height,
        }
    }

    /// Fit the camera so `half_width` world units are visible either side
    pub fn fit_width(size: Vec2, camera_center: Vec2, half_width: f32) -> Self {
        let aspect = if size.y > 0.0 { size.x / size.y } else { 1.0 };
        Self::new(size, camera_center, half_width / aspect)
    }

    pub fn half_width(&self) -> f32 {
        let aspect = if self.size.y > 0.0 {
            self.size.x / self.size.y
        } else {
            1.0
        };
        self.half_height * aspect
    }

    /// Screen pixels (origin top-left, y down) to world units (y up)
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return self.camera_center;
        }
        let ndc = Vec2::new(
            screen.x / self.size.x * 2.0 - 1.0,
            1.0 - screen.y / self.size.y * 2.0,
        );
        self.camera_center + ndc * Vec2::new(self.half_width(), self.half_height)
    }
}

/// Side of the screen a world point falls on
pub fn side_for_world(world: Vec2, split_x: f32) -> Side {
    if world.x < split_x { Side::Left } else { Side::Right }
}

/// Collects raw signals for one frame
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    bindings: KeyBindings,
    /// World x dividing the left and right input zones
    split_x: f32,
    presses: Vec<Side>,
    skip_level: bool,
    pause: bool,
}

impl InputMapper {
    pub fn new(bindings: KeyBindings, split_x: f32) -> Self {
        Self {
            bindings,
            split_x,
            ..Default::default()
        }
    }

    /// Key pressed down; returns false for unbound keys
    pub fn key_down(&mut self, code: &str) -> bool {
        if code == self.bindings.left {
            self.press(Side::Left);
        } else if code == self.bindings.right {
            self.press(Side::Right);
        } else if code == self.bindings.skip_level {
            self.skip_level = true;
        } else if code == self.bindings.pause {
            self.pause = !self.pause;
        } else {
            return false;
        }
        true
    }

    /// Pointer or touch began at a world position
    pub fn pointer_down(&mut self, world: Vec2) {
        self.press(side_for_world(world, self.split_x));
    }

    /// Pointer or touch began at a screen position
    pub fn pointer_down_screen(&mut self, screen: Vec2, viewport: &Viewport) {
        self.pointer_down(viewport.screen_to_world(screen));
    }

    fn press(&mut self, side: Side) {
        if !self.presses.contains(&side) {
            self.presses.push(side);
        }
    }

    /// Drain this frame's signals; the kind hint comes from the dot's launch flag
    pub fn take_frame(&mut self, state: &LevelState) -> TickInput {
        let events = self
            .presses
            .drain(..)
            .map(|side| InputEvent {
                side,
                kind: if state.dot(side).launched {
                    InputKind::Confirm
                } else {
                    InputKind::Launch
                },
            })
            .collect();
        let input = TickInput {
            events,
            skip_level: self.skip_level,
            pause: self.pause,
        };
        self.skip_level = false;
        self.pause = false;
        input
    }
}
