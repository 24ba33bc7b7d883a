//! Motion target produced by patterns.

/// One trapezoidal move request: where to go, how fast, how hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionParameter {
    /// Absolute target position in steps.
    pub position: i32,
    /// Cruise speed in steps per second.
    pub speed: u32,
    /// Acceleration and deceleration in steps per second².
    pub acceleration: u32,
}

impl MotionParameter {
    /// Create a new motion target.
    #[inline]
    pub const fn new(position: i32, speed: u32, acceleration: u32) -> Self {
        Self {
            position,
            speed,
            acceleration,
        }
    }

    /// Same target with a different acceleration.
    #[inline]
    pub const fn with_acceleration(self, acceleration: u32) -> Self {
        Self {
            acceleration,
            ..self
        }
    }
}
