//! Step-domain limits derived from the machine description.

use super::machine::{MachineGeometry, MotorProperties};

/// Hardware limits in steps, computed once at initialization.
///
/// Every position, speed and acceleration sent to the driver is clamped
/// against these bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLimits {
    /// Lowest commandable position (logical home).
    pub min_step: i32,
    /// Highest commandable position.
    pub max_step: i32,
    /// Maximum step rate in steps per second.
    pub max_step_per_second: u32,
    /// Maximum acceleration in steps per second squared.
    pub max_step_acceleration: u32,
    /// Keep-out boundary in steps; the home switch sits at `-keepout_steps`.
    pub keepout_steps: i32,
    /// Full physical travel in steps.
    pub physical_travel_steps: i32,
}

impl StepLimits {
    /// Derive step limits from geometry and motor properties.
    pub fn from_machine(geometry: &MachineGeometry, motor: &MotorProperties) -> Self {
        let spm = motor.steps_per_millimeter;
        let max_step = libm::roundf(geometry.usable_travel().value() * spm) as i32;

        Self {
            min_step: 0,
            max_step: max_step.max(0),
            max_step_per_second: motor.max_step_per_second(),
            max_step_acceleration: motor.max_step_acceleration(),
            keepout_steps: (geometry.keepout_boundary.value() * spm) as i32,
            physical_travel_steps: (geometry.physical_travel.value() * spm) as i32,
        }
    }

    /// Clamp a position to `[min_step, max_step]`.
    #[inline]
    pub fn clamp_position(&self, steps: i32) -> i32 {
        steps.clamp(self.min_step, self.max_step)
    }

    /// Clamp a step rate to `[1, max_step_per_second]`.
    #[inline]
    pub fn clamp_speed(&self, speed: u32) -> u32 {
        speed.clamp(1, self.max_step_per_second.max(1))
    }

    /// Clamp an acceleration to `[1, max_step_acceleration]`.
    #[inline]
    pub fn clamp_acceleration(&self, acceleration: u32) -> u32 {
        acceleration.clamp(1, self.max_step_acceleration.max(1))
    }

    /// Acceleration used for manual jogs and homing: a tenth of the maximum.
    #[inline]
    pub fn safe_acceleration(&self) -> u32 {
        self.max_step_acceleration / 10
    }
}
