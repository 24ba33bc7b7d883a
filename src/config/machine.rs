//! Machine geometry and motor properties from TOML.

use serde::Deserialize;

use super::units::Millimeters;

/// Physical properties of the stroking machine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MachineGeometry {
    /// Maximum physical travel of the carriage.
    #[serde(rename = "physical_travel_mm")]
    pub physical_travel: Millimeters,

    /// Soft clearance reserved at each mechanical end.
    ///
    /// Subtracted twice from the physical travel. Must be large enough to
    /// drive completely clear of the homing switch.
    #[serde(rename = "keepout_boundary_mm")]
    pub keepout_boundary: Millimeters,
}

impl MachineGeometry {
    /// Create a new geometry description.
    pub const fn new(physical_travel: Millimeters, keepout_boundary: Millimeters) -> Self {
        Self {
            physical_travel,
            keepout_boundary,
        }
    }

    /// Travel left for normal motion once both keep-out zones are removed.
    #[inline]
    pub fn usable_travel(&self) -> Millimeters {
        self.physical_travel - self.keepout_boundary * 2.0
    }
}

/// STEP/DIR/ENA wiring of the motor driver.
///
/// Only carried through to the driver collaborator; the motion core never
/// touches pins directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PinAssignment {
    /// Pin connected to the STEP input.
    #[serde(default)]
    pub step: u8,
    /// Pin connected to the DIR input.
    #[serde(default)]
    pub direction: u8,
    /// Pin connected to the ENA input.
    #[serde(default)]
    pub enable: u8,
    /// Polarity of the enable signal. True for active low.
    #[serde(default)]
    pub enable_active_low: bool,
}

/// Motor (stepper or servo with STEP/DIR interface) and the drive train
/// translating its rotation into linear motion.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MotorProperties {
    /// Linear steps per millimeter of carriage travel.
    pub steps_per_millimeter: f32,

    /// Maximum motor speed in revolutions per minute.
    pub max_rpm: u32,

    /// Steps per motor revolution.
    pub steps_per_revolution: u32,

    /// Maximum angular acceleration in revolutions per second squared.
    #[serde(rename = "max_acceleration_rev_per_sec2")]
    pub max_acceleration: f32,

    /// Invert the direction signal.
    ///
    /// The home switch is expected at the end of a retraction move, so the
    /// machine homes away from the body.
    #[serde(default)]
    pub invert_direction: bool,

    /// Driver wiring.
    #[serde(default)]
    pub pins: PinAssignment,
}

impl MotorProperties {
    /// Maximum step rate in steps per second, rounded to the nearest step.
    pub fn max_step_per_second(&self) -> u32 {
        libm::roundf(self.max_rpm as f32 * self.steps_per_revolution as f32 / 60.0) as u32
    }

    /// Maximum step acceleration in steps per second squared.
    pub fn max_step_acceleration(&self) -> u32 {
        libm::roundf(self.max_acceleration * self.steps_per_revolution as f32) as u32
    }
}
