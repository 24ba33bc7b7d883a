//! Engine configuration - root configuration structure.

use serde::Deserialize;

use super::limits::StepLimits;
use super::machine::{MachineGeometry, MotorProperties};
use super::units::MillimetersPerSec;

/// Default homing speed (mm/s).
pub const DEFAULT_HOMING_SPEED: MillimetersPerSec = MillimetersPerSec(5.0);

/// Default speed for manual jogs (mm/s).
pub const DEFAULT_JOG_SPEED: MillimetersPerSec = MillimetersPerSec(10.0);

/// Root configuration structure from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Physical machine geometry.
    pub machine: MachineGeometry,

    /// Motor and drive train properties.
    pub motor: MotorProperties,

    /// Homing procedure timing.
    #[serde(default)]
    pub homing: HomingConfig,

    /// Stroking loop timing.
    #[serde(default)]
    pub stroking: StrokingConfig,
}

impl EngineConfig {
    /// Create a configuration with default homing and stroking timing.
    pub fn new(machine: MachineGeometry, motor: MotorProperties) -> Self {
        Self {
            machine,
            motor,
            homing: HomingConfig::default(),
            stroking: StrokingConfig::default(),
        }
    }

    /// Derive the step limits for this machine.
    pub fn limits(&self) -> StepLimits {
        StepLimits::from_machine(&self.machine, &self.motor)
    }
}

/// Homing procedure settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HomingConfig {
    /// Approach speed used by `StrokeEngine::enable_and_home_default`.
    #[serde(default = "default_homing_speed", rename = "speed_mm_per_sec")]
    pub speed: MillimetersPerSec,

    /// Interval between endstop polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,

    /// Interval between idle checks while backing off the switch.
    #[serde(default = "default_settle_interval_ms")]
    pub settle_interval_ms: u32,
}

fn default_homing_speed() -> MillimetersPerSec {
    DEFAULT_HOMING_SPEED
}

fn default_poll_interval_ms() -> u32 {
    20
}

fn default_settle_interval_ms() -> u32 {
    100
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            speed: default_homing_speed(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_interval_ms: default_settle_interval_ms(),
        }
    }
}

/// Stroking loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StrokingConfig {
    /// Control cycle period.
    #[serde(default = "default_period_ms")]
    pub period_ms: u32,
}

fn default_period_ms() -> u32 {
    10
}

impl Default for StrokingConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}
