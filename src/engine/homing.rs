//! Homing procedure.
//!
//! Drives the carriage against the endstop, defines the switch position as
//! `-keepout` steps and parks at logical home. The routine may be aborted at
//! any await point; every driver command first checks that its homing token
//! is still the active one, so a superseded routine never touches the
//! driver or the state.

use std::time::Duration;

use embedded_hal::digital::InputPin;
use tokio::time::sleep;

use crate::driver::{Endstop, StepperDriver};
use crate::state::ServoState;

use super::controller::HomingCallback;
use super::shared::SharedRef;

/// Run `f` on the driver if `token` still owns homing, `None` otherwise.
fn locked<D, T>(shared: &SharedRef<D>, token: u64, f: impl FnOnce(&mut D) -> T) -> Option<T>
where
    D: StepperDriver,
{
    let mut inner = shared.lock();
    if !inner.owns_homing(token) {
        return None;
    }
    Some(f(&mut inner.driver))
}

/// Run the homing procedure at `speed` steps/sec and report the result.
pub(crate) async fn run<D, P>(
    shared: SharedRef<D>,
    mut endstop: Endstop<P>,
    speed: u32,
    token: u64,
    callback: Option<HomingCallback>,
) where
    D: StepperDriver + Send + 'static,
    P: InputPin + Send + 'static,
{
    let Some(found) = seek(&shared, &mut endstop, speed, token).await else {
        tracing::debug!("Homing routine {} superseded", token);
        return;
    };

    if !publish(&shared, token, found) {
        tracing::debug!("Homing routine {} superseded", token);
        return;
    }

    if let Some(callback) = callback {
        callback(found);
    }
}

/// Move toward the switch until it asserts or the move ends.
///
/// Returns `None` when the routine was revoked.
async fn seek<D, P>(
    shared: &SharedRef<D>,
    endstop: &mut Endstop<P>,
    speed: u32,
    token: u64,
) -> Option<bool>
where
    D: StepperDriver,
    P: InputPin,
{
    let limits = shared.limits;
    let poll = Duration::from_millis(u64::from(shared.config.homing.poll_interval_ms));
    let settle = Duration::from_millis(u64::from(shared.config.homing.settle_interval_ms));

    locked(shared, token, |driver| {
        driver.set_speed(speed);
        driver.set_acceleration(limits.safe_acceleration());
    })?;

    let asserted = match endstop.is_triggered() {
        Ok(asserted) => asserted,
        Err(e) => {
            tracing::warn!("Endstop read failed: {:?}", e);
            return Some(false);
        }
    };

    if asserted {
        // Back off, then approach again from the free side.
        tracing::debug!("Endstop already asserted, backing off");
        locked(shared, token, |driver| driver.move_by(2 * limits.keepout_steps))?;
        loop {
            sleep(settle).await;
            if !locked(shared, token, |driver| driver.is_running())? {
                break;
            }
        }
        locked(shared, token, |driver| driver.move_by(-4 * limits.keepout_steps))?;
    } else {
        locked(shared, token, |driver| driver.move_by(-limits.physical_travel_steps))?;
    }

    loop {
        match endstop.is_triggered() {
            Ok(true) => return Some(true),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Endstop read failed: {:?}", e);
                return Some(false);
            }
        }

        if !locked(shared, token, |driver| driver.is_running())? {
            return Some(false);
        }

        sleep(poll).await;
    }
}

/// Apply the homing result. Returns `false` when the routine was revoked.
fn publish<D: StepperDriver>(shared: &SharedRef<D>, token: u64, found: bool) -> bool {
    let limits = shared.limits;
    let mut inner = shared.lock();
    if !inner.owns_homing(token) {
        return false;
    }
    inner.homing_token = None;

    if found {
        inner.driver.force_stop_and_set_position(-limits.keepout_steps);
        inner.homed = true;
        inner.driver.move_to(limits.min_step);
        inner.transition(ServoState::Ready);
        tracing::info!("Homing succeeded");
    } else {
        inner.driver.disable_outputs();
        inner.homed = false;
        inner.transition(ServoState::Disabled);
        tracing::warn!("Homing failed: endstop not found");
    }
    true
}
