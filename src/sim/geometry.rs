//! Line and goal range geometry
//!
//! Everything lives on the x axis:
//! - `Line`: the playable extent, fixed for a level
//! - `GoalRange`: the target sub-range the dots must meet (or stop) inside
//! - `GoalSampler`: validated generator parameters; sampling never fails

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid geometry parameters. These are configuration mistakes, never
/// gameplay outcomes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("line extent is degenerate: left_x ({left_x}) must be less than right_x ({right_x})")]
    DegenerateLine { left_x: f32, right_x: f32 },
    #[error("goal range widths must be finite and positive (min {min_width}, max {max_width})")]
    NonPositiveWidth { min_width: f32, max_width: f32 },
    #[error("goal range min width ({min_width}) exceeds max width ({max_width})")]
    InvertedWidths { min_width: f32, max_width: f32 },
    #[error("goal range margin must be finite and non-negative, got {0}")]
    InvalidMargin(f32),
    #[error(
        "no room for goal center: max width {max_width} plus 2 x margin {margin} must be less than line width {line_width}"
    )]
    NoRoomForCenter {
        max_width: f32,
        margin: f32,
        line_width: f32,
    },
}

/// The playable horizontal line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub left_x: f32,
    pub right_x: f32,
}

impl Line {
    /// Build a line, rejecting `left_x >= right_x`
    pub fn new(left_x: f32, right_x: f32) -> Result<Self, GeometryError> {
        // Written so NaN also fails
        if !(left_x < right_x) || !left_x.is_finite() || !right_x.is_finite() {
            return Err(GeometryError::DegenerateLine { left_x, right_x });
        }
        Ok(Self { left_x, right_x })
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right_x - self.left_x
    }

    #[inline]
    pub fn midpoint(&self) -> f32 {
        (self.left_x + self.right_x) * 0.5
    }
}

/// Compute the line from the visible half-width, shrunk by `margin` at both ends
pub fn compute_line_extent(
    viewport_half_width: f32,
    center_x: f32,
    margin: f32,
) -> Result<Line, GeometryError> {
    Line::new(
        center_x - viewport_half_width + margin,
        center_x + viewport_half_width - margin,
    )
}

/// The target sub-range of the line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalRange {
    pub center: f32,
    pub half_width: f32,
}

impl GoalRange {
    pub fn new(center: f32, half_width: f32) -> Self {
        Self { center, half_width }
    }

    /// Build from explicit bounds
    pub fn from_bounds(goal_left: f32, goal_right: f32) -> Self {
        Self {
            center: (goal_left + goal_right) * 0.5,
            half_width: (goal_right - goal_left) * 0.5,
        }
    }

    #[inline]
    pub fn goal_left(&self) -> f32 {
        self.center - self.half_width
    }

    #[inline]
    pub fn goal_right(&self) -> f32 {
        self.center + self.half_width
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    /// Inclusive at both ends
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.goal_left() && x <= self.goal_right()
    }
}

/// Goal generator parameters that have already passed validation.
///
/// Built once when the configuration is loaded, so regenerating a level in
/// the middle of a tick cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalSampler {
    line: Line,
    min_width: f32,
    max_width: f32,
    margin: f32,
}

impl GoalSampler {
    pub fn new(
        line: Line,
        min_width: f32,
        max_width: f32,
        margin: f32,
    ) -> Result<Self, GeometryError> {
        if !(min_width > 0.0 && max_width > 0.0) || !min_width.is_finite() || !max_width.is_finite()
        {
            return Err(GeometryError::NonPositiveWidth {
                min_width,
                max_width,
            });
        }
        if min_width > max_width {
            return Err(GeometryError::InvertedWidths {
                min_width,
                max_width,
            });
        }
        if !(margin >= 0.0) || !margin.is_finite() {
            return Err(GeometryError::InvalidMargin(margin));
        }
        let line_width = line.width();
        // Checked in f32 exactly as `sample` computes it; the widest range is the worst case
        let (lo, hi) = center_bounds(&line, margin, max_width);
        if max_width + 2.0 * margin >= line_width || !(hi > lo) {
            return Err(GeometryError::NoRoomForCenter {
                max_width,
                margin,
                line_width,
            });
        }
        Ok(Self {
            line,
            min_width,
            max_width,
            margin,
        })
    }

    pub fn line(&self) -> Line {
        self.line
    }

    /// Draw a width, then a center that keeps the whole range inside the margins
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GoalRange {
        let width = rng.random_range(self.min_width..=self.max_width);
        // lo only grows and hi only shrinks with width, so hi > lo held at max_width
        let (lo, hi) = center_bounds(&self.line, self.margin, width);
        let center = rng.random_range(lo..hi);
        GoalRange::new(center, width / 2.0)
    }
}

/// Range of centers that keeps a goal of `width` inside the margins
fn center_bounds(line: &Line, margin: f32, width: f32) -> (f32, f32) {
    (
        line.left_x + margin + width / 2.0,
        line.right_x - margin - width / 2.0,
    )
}

/// Validate the parameters and draw one goal range
pub fn generate_goal_range<R: Rng + ?Sized>(
    line: Line,
    min_width: f32,
    max_width: f32,
    margin: f32,
    rng: &mut R,
) -> Result<GoalRange, GeometryError> {
    Ok(GoalSampler::new(line, min_width, max_width, margin)?.sample(rng))
}
