//! Stroke configuration owned by the engine.

use crate::config::{Millimeters, StepLimits, StrokesPerMinute};
use crate::pattern::Pattern;

/// Shortest allowed stroke time in seconds.
pub const MIN_TIME_OF_STROKE: f32 = 0.01;

/// Longest allowed stroke time in seconds.
pub const MAX_TIME_OF_STROKE: f32 = 120.0;

/// Sensation range bound; values lie in `[-MAX_SENSATION, MAX_SENSATION]`.
pub const MAX_SENSATION: f32 = 100.0;

/// Step index before the first stroke; the stroking loop pre-increments it.
pub const INDEX_BEFORE_START: i32 = -1;

/// Snapshot of the stroke parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSettings {
    /// Seconds per full stroke, in `[0.01, 120]`.
    pub time_of_stroke: f32,
    /// Deepest position in steps, within the step limits.
    pub depth: i32,
    /// Stroke length in steps, within the step limits.
    pub stroke: i32,
    /// Shape bias in `[-100, 100]`.
    pub sensation: f32,
    /// Selected pattern index.
    pub pattern: usize,
    /// Current step index.
    pub index: i32,
}

impl StrokeSettings {
    /// Power-up defaults: full depth, a third of it as stroke, one stroke
    /// per second, neutral sensation, first pattern.
    pub fn new(limits: &StepLimits) -> Self {
        Self {
            time_of_stroke: 1.0,
            depth: limits.max_step,
            stroke: limits.max_step / 3,
            sensation: 0.0,
            pattern: 0,
            index: 0,
        }
    }

    /// Set the cadence, returning the clamped seconds per stroke.
    pub fn set_cadence(&mut self, cadence: StrokesPerMinute) -> f32 {
        self.time_of_stroke = clamp_time_of_stroke(cadence.seconds_per_stroke());
        self.time_of_stroke
    }

    /// Set the depth, returning the clamped step value.
    pub fn set_depth(&mut self, depth: Millimeters, spm: f32, limits: &StepLimits) -> i32 {
        self.depth = limits.clamp_position(depth.to_steps(spm).value());
        self.depth
    }

    /// Set the stroke length, returning the clamped step value.
    pub fn set_stroke(&mut self, stroke: Millimeters, spm: f32, limits: &StepLimits) -> i32 {
        self.stroke = limits.clamp_position(stroke.to_steps(spm).value());
        self.stroke
    }

    /// Set the sensation, returning the clamped value.
    pub fn set_sensation(&mut self, sensation: f32) -> f32 {
        self.sensation = if sensation.is_nan() {
            0.0
        } else {
            sensation.clamp(-MAX_SENSATION, MAX_SENSATION)
        };
        self.sensation
    }

    /// Push every stroke parameter into a pattern.
    pub fn inject(&self, pattern: &mut dyn Pattern) {
        pattern.set_time_of_stroke(self.time_of_stroke);
        pattern.set_depth(self.depth);
        pattern.set_stroke(self.stroke);
        pattern.set_sensation(self.sensation);
    }
}

fn clamp_time_of_stroke(seconds: f32) -> f32 {
    if seconds.is_nan() {
        return MAX_TIME_OF_STROKE;
    }
    seconds.clamp(MIN_TIME_OF_STROKE, MAX_TIME_OF_STROKE)
}
