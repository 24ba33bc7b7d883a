//! Driver module for stroke-engine.
//!
//! Defines the interface of the step pulse generator the motion core
//! commands, and the endstop input used for homing.

mod endstop;
#[cfg(feature = "std")]
pub mod sim;

pub use endstop::Endstop;

/// Step pulse generator driving the actuator.
///
/// Implementations run the trapezoidal ramp on their own (timer, PIO, RMT,
/// ...). All positions are absolute steps in the driver's coordinate frame.
pub trait StepperDriver {
    /// Set the maximum speed for subsequent moves in steps per second.
    fn set_speed(&mut self, steps_per_second: u32);

    /// Set the acceleration/deceleration for subsequent moves in steps per second².
    fn set_acceleration(&mut self, steps_per_second2: u32);

    /// Start a move to an absolute position.
    fn move_to(&mut self, position: i32);

    /// Start a move relative to the current position.
    fn move_by(&mut self, steps: i32);

    /// Decelerate to a stop with the configured acceleration.
    fn stop_move(&mut self);

    /// Whether a move is in progress.
    fn is_running(&self) -> bool;

    /// Current position in steps.
    fn current_position(&self) -> i32;

    /// Current signed speed in steps per second (positive = forward).
    fn current_speed(&self) -> i32;

    /// Redefine the current position without moving.
    fn set_current_position(&mut self, position: i32);

    /// Stop immediately, without ramp, and redefine the position.
    fn force_stop_and_set_position(&mut self, position: i32);

    /// Energize the motor.
    fn enable_outputs(&mut self);

    /// De-energize the motor.
    fn disable_outputs(&mut self);
}

impl<D: StepperDriver + ?Sized> StepperDriver for &mut D {
    fn set_speed(&mut self, steps_per_second: u32) {
        (**self).set_speed(steps_per_second)
    }

    fn set_acceleration(&mut self, steps_per_second2: u32) {
        (**self).set_acceleration(steps_per_second2)
    }

    fn move_to(&mut self, position: i32) {
        (**self).move_to(position)
    }

    fn move_by(&mut self, steps: i32) {
        (**self).move_by(steps)
    }

    fn stop_move(&mut self) {
        (**self).stop_move()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn current_position(&self) -> i32 {
        (**self).current_position()
    }

    fn current_speed(&self) -> i32 {
        (**self).current_speed()
    }

    fn set_current_position(&mut self, position: i32) {
        (**self).set_current_position(position)
    }

    fn force_stop_and_set_position(&mut self, position: i32) {
        (**self).force_stop_and_set_position(position)
    }

    fn enable_outputs(&mut self) {
        (**self).enable_outputs()
    }

    fn disable_outputs(&mut self) {
        (**self).disable_outputs()
    }
}
