//! Unit types for physical quantities.
//!
//! Provides type-safe representations of travel, velocities, cadence and
//! motor steps to prevent unit confusion at compile time.

use core::ops::{Add, Mul, Sub};

use serde::Deserialize;

/// Linear distance in millimeters.
///
/// Used for configuration and user-facing API. Internally converted to [`Steps`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to steps, truncating toward zero.
    #[inline]
    pub fn to_steps(self, steps_per_millimeter: f32) -> Steps {
        Steps((self.0 * steps_per_millimeter) as i32)
    }
}

impl Add for Millimeters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f32> for Millimeters {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Linear velocity in millimeters per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MillimetersPerSec(pub f32);

impl MillimetersPerSec {
    /// Create a new MillimetersPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to a step rate, truncating toward zero. Negative speeds map to 0.
    #[inline]
    pub fn to_steps_per_sec(self, steps_per_millimeter: f32) -> u32 {
        (self.0 * steps_per_millimeter) as u32
    }
}

/// Stroke cadence in full strokes per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StrokesPerMinute(pub f32);

impl StrokesPerMinute {
    /// Create a new StrokesPerMinute value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Time one full stroke takes, in seconds (unclamped).
    ///
    /// Zero strokes per minute yields `f32::INFINITY`.
    #[inline]
    pub fn seconds_per_stroke(self) -> f32 {
        60.0 / self.0
    }
}

/// Actuator position in steps (absolute from the logical home).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i32);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Convert to millimeters using the steps per millimeter ratio.
    #[inline]
    pub fn to_millimeters(self, steps_per_millimeter: f32) -> Millimeters {
        Millimeters(self.0 as f32 / steps_per_millimeter)
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Millimeters.
    fn mm(self) -> Millimeters;
    /// Convert to MillimetersPerSec.
    fn mm_per_sec(self) -> MillimetersPerSec;
    /// Convert to StrokesPerMinute.
    fn strokes_per_minute(self) -> StrokesPerMinute;
}

impl UnitExt for f32 {
    #[inline]
    fn mm(self) -> Millimeters {
        Millimeters(self)
    }

    #[inline]
    fn mm_per_sec(self) -> MillimetersPerSec {
        MillimetersPerSec(self)
    }

    #[inline]
    fn strokes_per_minute(self) -> StrokesPerMinute {
        StrokesPerMinute(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millimeters_to_steps_truncates() {
        assert_eq!(Millimeters(10.0).to_steps(50.0), Steps(500));
        assert_eq!(Millimeters(0.019).to_steps(50.0), Steps(0));
        assert_eq!(Millimeters(-2.0).to_steps(50.0), Steps(-100));
    }

    #[test]
    fn test_steps_to_millimeters() {
        let mm = Steps(1250).to_millimeters(50.0);
        assert!((mm.value() - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_cadence_conversion() {
        assert!((StrokesPerMinute(60.0).seconds_per_stroke() - 1.0).abs() < 1e-6);
        assert!((StrokesPerMinute(30.0).seconds_per_stroke() - 2.0).abs() < 1e-6);
        assert!(StrokesPerMinute(0.0).seconds_per_stroke().is_infinite());
    }

    #[test]
    fn test_negative_speed_saturates() {
        assert_eq!(MillimetersPerSec(-5.0).to_steps_per_sec(50.0), 0);
        assert_eq!(MillimetersPerSec(5.0).to_steps_per_sec(50.0), 250);
    }

    #[test]
    fn test_unit_ext() {
        assert_eq!(12.5_f32.mm(), Millimeters(12.5));
        assert_eq!(3.0_f32.mm_per_sec(), MillimetersPerSec(3.0));
        assert_eq!(90.0_f32.strokes_per_minute(), StrokesPerMinute(90.0));
    }
}
