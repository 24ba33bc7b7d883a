//! Collision-avoidance deceleration bound.
//!
//! Patterns are not trusted to respect the travel limits. Before a target is
//! dispatched, its acceleration is raised to at least the constant
//! deceleration that stops the carriage exactly at the limit it is heading
//! for: `a = v² / (2·d)`.

use crate::config::StepLimits;

use super::parameter::MotionParameter;

/// Direction of carriage motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward `max_step` (positive speed).
    Forward,
    /// Toward `min_step` (zero or negative speed).
    Backward,
}

impl Direction {
    /// Get direction from a signed speed.
    #[inline]
    pub fn from_speed(speed: i32) -> Self {
        if speed > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Steps left before the limit in the direction of travel.
///
/// Can be zero or negative when the carriage sits on or beyond the limit.
#[inline]
pub fn distance_to_limit(position: i32, direction: Direction, limits: &StepLimits) -> i32 {
    match direction {
        Direction::Forward => limits.max_step.saturating_sub(position),
        Direction::Backward => position.saturating_sub(limits.min_step),
    }
}

/// Deceleration needed to stop from `speed` within `distance` steps, rounded.
///
/// Distances below one step are treated as one step, which yields the
/// largest bound for the given speed.
pub fn required_deceleration(speed: i32, distance: i32) -> u32 {
    let distance = distance.max(1) as f32;
    let speed = speed as f32;
    // Float to int casts saturate.
    libm::roundf(speed * speed / (2.0 * distance)) as u32
}

/// Result of checking the carriage state against the travel limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionCheck {
    /// Direction derived from the current speed.
    pub direction: Direction,
    /// Steps to the limit ahead.
    pub distance_to_limit: i32,
    /// Minimum deceleration to stop before that limit.
    pub required_deceleration: u32,
}

impl CollisionCheck {
    /// Apply the bound: the pattern acceleration is only a floor.
    #[inline]
    pub fn enforce(&self, motion: MotionParameter) -> MotionParameter {
        motion.with_acceleration(motion.acceleration.max(self.required_deceleration))
    }

    /// Whether the bound overrides the given acceleration.
    #[inline]
    pub fn overrides(&self, acceleration: u32) -> bool {
        self.required_deceleration > acceleration
    }
}

/// Evaluate the collision bound for the current carriage state.
pub fn check(position: i32, speed: i32, limits: &StepLimits) -> CollisionCheck {
    let direction = Direction::from_speed(speed);
    let distance = distance_to_limit(position, direction, limits);

    CollisionCheck {
        direction,
        distance_to_limit: distance,
        required_deceleration: required_deceleration(speed, distance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_limits() -> StepLimits {
        StepLimits {
            min_step: 0,
            max_step: 10_000,
            max_step_per_second: 40_000,
            max_step_acceleration: 80_000,
            keepout_steps: 250,
            physical_travel_steps: 10_500,
        }
    }

    #[test]
    fn test_direction_from_speed() {
        assert_eq!(Direction::from_speed(5), Direction::Forward);
        assert_eq!(Direction::from_speed(0), Direction::Backward);
        assert_eq!(Direction::from_speed(-5), Direction::Backward);
    }

    #[test]
    fn test_distance_to_limit() {
        let limits = make_limits();

        assert_eq!(distance_to_limit(9_900, Direction::Forward, &limits), 100);
        assert_eq!(distance_to_limit(300, Direction::Backward, &limits), 300);
        assert_eq!(distance_to_limit(10_050, Direction::Forward, &limits), -50);
    }

    #[test]
    fn test_required_deceleration_example() {
        // 1000² / (2 * 100)
        assert_eq!(required_deceleration(1000, 100), 5000);
        assert_eq!(required_deceleration(-1000, 100), 5000);
        assert_eq!(required_deceleration(0, 100), 0);
    }

    #[test]
    fn test_required_deceleration_guards_zero_distance() {
        assert_eq!(required_deceleration(100, 0), 5000);
        assert_eq!(required_deceleration(100, -20), 5000);
    }

    #[test]
    fn test_bound_wins_over_pattern() {
        let limits = make_limits();
        let check = check(9_900, 1000, &limits);

        let motion = check.enforce(MotionParameter::new(10_000, 2000, 2000));
        assert_eq!(motion.acceleration, 5000);
        assert_eq!(motion.position, 10_000);
        assert!(check.overrides(2000));
    }

    #[test]
    fn test_pattern_wins_over_weaker_bound() {
        let limits = make_limits();
        let check = check(100, -100, &limits);

        // 100² / 200 = 50
        assert_eq!(check.required_deceleration, 50);
        let motion = check.enforce(MotionParameter::new(0, 500, 3000));
        assert_eq!(motion.acceleration, 3000);
        assert!(!check.overrides(3000));
    }

    proptest! {
        #[test]
        fn prop_dispatched_acceleration_stops_before_limit(
            speed in -40_000i32..40_000,
            position in 0i32..=10_000,
            requested in 0u32..100_000,
        ) {
            let limits = make_limits();
            let check = check(position, speed, &limits);
            let motion = check.enforce(MotionParameter::new(position, 1000, requested));

            prop_assert!(motion.acceleration >= requested);

            let d = check.distance_to_limit.max(1) as f64;
            let v = speed as f64;
            let bound = v * v / (2.0 * d);
            // Rounded to the nearest step/s² in single precision.
            prop_assert!(motion.acceleration as f64 + 0.5 + bound * 1e-6 >= bound);
        }
    }
}
