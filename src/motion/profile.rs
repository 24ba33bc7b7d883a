//! Trapezoidal motion profile kinematics.
//!
//! Time-parameterized accelerate/cruise/decelerate profile for a single move
//! starting and ending at rest. Used to model a step generator's carriage
//! position and speed over time.

use libm::sqrtf;

use super::collision::Direction;

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    /// Accelerating from rest toward cruise velocity.
    Accelerating,
    /// Moving at constant cruise velocity.
    Cruising,
    /// Decelerating from cruise velocity to rest.
    Decelerating,
    /// Motion complete.
    Complete,
}

/// Computed symmetric trapezoidal move.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapezoidalMove {
    /// Start position in steps.
    pub start: i32,

    /// Target position in steps.
    pub target: i32,

    /// Direction of motion.
    pub direction: Direction,

    /// Total distance in steps (absolute value).
    pub distance: f32,

    /// Peak speed actually reached in steps/sec.
    pub peak_speed: f32,

    /// Acceleration and deceleration rate in steps/sec².
    pub acceleration: f32,

    /// Duration of the acceleration phase (equal to deceleration) in seconds.
    pub accel_time: f32,

    /// Duration of the cruise phase in seconds.
    pub cruise_time: f32,
}

impl TrapezoidalMove {
    /// Plan a move from `start` to `target`.
    ///
    /// # Arguments
    ///
    /// * `max_speed` - Cruise speed limit in steps/sec
    /// * `acceleration` - Acceleration rate in steps/sec²
    pub fn new(start: i32, target: i32, max_speed: f32, acceleration: f32) -> Self {
        let delta = target as i64 - start as i64;
        let direction = if delta > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let distance = delta.unsigned_abs() as f32;

        if distance == 0.0 || !(max_speed > 0.0) || !(acceleration > 0.0) {
            return Self::at_rest(start);
        }

        // Distance covered while ramping up: d = v² / 2a
        let ramp_distance = max_speed * max_speed / (2.0 * acceleration);

        let (peak_speed, cruise_time) = if 2.0 * ramp_distance >= distance {
            // Triangle profile: can't reach max velocity
            (sqrtf(distance * acceleration), 0.0)
        } else {
            (max_speed, (distance - 2.0 * ramp_distance) / max_speed)
        };

        Self {
            start,
            target,
            direction,
            distance,
            peak_speed,
            acceleration,
            accel_time: peak_speed / acceleration,
            cruise_time,
        }
    }

    /// A move that has already completed at `position`.
    pub fn at_rest(position: i32) -> Self {
        Self {
            start: position,
            target: position,
            direction: Direction::Backward,
            distance: 0.0,
            peak_speed: 0.0,
            acceleration: 0.0,
            accel_time: 0.0,
            cruise_time: 0.0,
        }
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        2.0 * self.accel_time + self.cruise_time
    }

    /// Phase at `t` seconds after the start.
    pub fn phase_at(&self, t: f32) -> MotionPhase {
        if self.distance == 0.0 || t >= self.duration() {
            MotionPhase::Complete
        } else if t < self.accel_time {
            MotionPhase::Accelerating
        } else if t < self.accel_time + self.cruise_time {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Distance covered at `t` seconds after the start, in steps.
    pub fn traveled_at(&self, t: f32) -> f32 {
        let t = t.max(0.0);
        match self.phase_at(t) {
            MotionPhase::Complete => self.distance,
            MotionPhase::Accelerating => 0.5 * self.acceleration * t * t,
            MotionPhase::Cruising => {
                let ramp = 0.5 * self.acceleration * self.accel_time * self.accel_time;
                ramp + self.peak_speed * (t - self.accel_time)
            }
            MotionPhase::Decelerating => {
                let remaining = self.duration() - t;
                self.distance - 0.5 * self.acceleration * remaining * remaining
            }
        }
    }

    /// Position at `t` seconds after the start, in steps.
    pub fn position_at(&self, t: f32) -> i32 {
        if self.phase_at(t) == MotionPhase::Complete {
            return self.target;
        }
        let traveled = libm::roundf(self.traveled_at(t)) as i32;
        self.start + self.direction.sign() * traveled
    }

    /// Signed speed at `t` seconds after the start, in steps/sec.
    pub fn speed_at(&self, t: f32) -> f32 {
        let t = t.max(0.0);
        let magnitude = match self.phase_at(t) {
            MotionPhase::Complete => 0.0,
            MotionPhase::Accelerating => self.acceleration * t,
            MotionPhase::Cruising => self.peak_speed,
            MotionPhase::Decelerating => self.acceleration * (self.duration() - t),
        };
        magnitude * self.direction.sign() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trapezoidal_phases() {
        // 1000 steps at 1000 steps/s, 2000 steps/s²: 250 steps per ramp
        let m = TrapezoidalMove::new(0, 1000, 1000.0, 2000.0);

        assert!((m.accel_time - 0.5).abs() < 1e-6);
        assert!((m.cruise_time - 0.5).abs() < 1e-6);
        assert!((m.duration() - 1.5).abs() < 1e-6);

        assert_eq!(m.phase_at(0.25), MotionPhase::Accelerating);
        assert_eq!(m.phase_at(0.75), MotionPhase::Cruising);
        assert_eq!(m.phase_at(1.25), MotionPhase::Decelerating);
        assert_eq!(m.phase_at(1.5), MotionPhase::Complete);

        assert_eq!(m.position_at(0.5), 250);
        assert_eq!(m.position_at(1.0), 750);
        assert_eq!(m.position_at(2.0), 1000);
    }

    #[test]
    fn test_triangle_profile() {
        // Very short move that can't reach max velocity
        let m = TrapezoidalMove::new(0, 100, 10_000.0, 1000.0);

        assert_eq!(m.cruise_time, 0.0);
        assert!(m.peak_speed < 10_000.0);
        assert!((m.traveled_at(m.accel_time) - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_backward_move() {
        let m = TrapezoidalMove::new(500, -500, 1000.0, 2000.0);

        assert_eq!(m.direction, Direction::Backward);
        assert!(m.speed_at(0.75) < 0.0);
        assert_eq!(m.position_at(0.5), 250);
        assert_eq!(m.position_at(10.0), -500);
    }

    #[test]
    fn test_zero_move() {
        let m = TrapezoidalMove::new(42, 42, 1000.0, 2000.0);

        assert_eq!(m.duration(), 0.0);
        assert_eq!(m.phase_at(0.0), MotionPhase::Complete);
        assert_eq!(m.position_at(0.0), 42);
        assert_eq!(m.speed_at(0.0), 0.0);
    }
}
