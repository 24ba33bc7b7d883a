//! Motion profile dispatch.

use crate::config::StepLimits;
use crate::driver::StepperDriver;

use super::parameter::MotionParameter;

/// Clamp a motion target to the hardware limits and issue it to the driver.
///
/// Speed and acceleration are set before the move is requested, since the
/// driver plans its ramp from the limits configured at that moment. Returns
/// the target actually sent.
///
/// Callers must hold exclusive access to the driver for the whole call so
/// no other command lands between the three driver calls.
pub fn apply_motion_profile<D>(
    driver: &mut D,
    limits: &StepLimits,
    motion: &MotionParameter,
) -> MotionParameter
where
    D: StepperDriver + ?Sized,
{
    let clamped = MotionParameter {
        position: limits.clamp_position(motion.position),
        speed: limits.clamp_speed(motion.speed),
        acceleration: limits.clamp_acceleration(motion.acceleration),
    };

    driver.set_speed(clamped.speed);
    driver.set_acceleration(clamped.acceleration);
    driver.move_to(clamped.position);

    clamped
}
