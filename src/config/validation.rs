//! Configuration validation.

use crate::error::{ConfigError, Result};

use super::{EngineConfig, MachineGeometry, MotorProperties};

/// Validate an engine configuration.
///
/// Checks:
/// - Travel is positive and leaves room after both keep-out zones
/// - Motor conversion factors and limits are positive
/// - Homing speed and loop timings are positive
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    validate_geometry(&config.machine)?;
    validate_motor(&config.motor)?;

    if !(config.homing.speed.0 > 0.0) {
        return Err(ConfigError::InvalidHomingSpeed(config.homing.speed.0).into());
    }

    if config.homing.poll_interval_ms == 0 {
        return Err(ConfigError::InvalidInterval("homing.poll_interval_ms").into());
    }

    if config.homing.settle_interval_ms == 0 {
        return Err(ConfigError::InvalidInterval("homing.settle_interval_ms").into());
    }

    if config.stroking.period_ms == 0 {
        return Err(ConfigError::InvalidInterval("stroking.period_ms").into());
    }

    Ok(())
}

/// Validate machine geometry on its own.
pub fn validate_geometry(geometry: &MachineGeometry) -> Result<()> {
    let travel = geometry.physical_travel.0;
    let keepout = geometry.keepout_boundary.0;

    if !(travel > 0.0) {
        return Err(ConfigError::InvalidTravel(travel).into());
    }

    if !(keepout >= 0.0) || !(geometry.usable_travel().0 > 0.0) {
        return Err(ConfigError::InvalidKeepout { travel, keepout }.into());
    }

    Ok(())
}

/// Validate motor properties on their own.
pub fn validate_motor(motor: &MotorProperties) -> Result<()> {
    if !(motor.steps_per_millimeter > 0.0) {
        return Err(ConfigError::InvalidStepsPerMillimeter(motor.steps_per_millimeter).into());
    }

    if motor.max_rpm == 0 {
        return Err(ConfigError::InvalidMaxRpm(motor.max_rpm).into());
    }

    if motor.steps_per_revolution == 0 {
        return Err(ConfigError::InvalidStepsPerRevolution(motor.steps_per_revolution).into());
    }

    if !(motor.max_acceleration > 0.0) {
        return Err(ConfigError::InvalidMaxAcceleration(motor.max_acceleration).into());
    }

    Ok(())
}
