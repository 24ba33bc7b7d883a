//! State shared between the controller and its background routines.
//!
//! Everything mutable lives behind one mutex together with the driver, so
//! each driver command is issued while holding the same lock that guards
//! the servo state. A routine that checks the state and then commands the
//! driver can't be overtaken by `disable()` in between.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{EngineConfig, StepLimits};
use crate::driver::StepperDriver;
use crate::motion::{apply_motion_profile, collision, MotionParameter};
use crate::pattern::{Pattern, PatternRegistry};
use crate::state::ServoState;

use super::settings::StrokeSettings;

/// Immutable context plus the locked mutable state.
pub(crate) struct Shared<D> {
    pub(crate) config: EngineConfig,
    pub(crate) limits: StepLimits,
    inner: Mutex<Inner<D>>,
}

pub(crate) type SharedRef<D> = Arc<Shared<D>>;

impl<D> Shared<D> {
    pub(crate) fn new(config: EngineConfig, inner: Inner<D>) -> Self {
        Self {
            limits: config.limits(),
            config,
            inner: Mutex::new(inner),
        }
    }

    /// Lock the mutable state. A panic in another holder leaves the data
    /// consistent enough to keep disabling the machine, so poisoning is
    /// ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner<D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mutable engine state.
pub(crate) struct Inner<D> {
    pub(crate) driver: D,
    pub(crate) state: ServoState,
    pub(crate) homed: bool,
    pub(crate) settings: StrokeSettings,
    pub(crate) patterns: PatternRegistry,
    /// Bumped by every `start_motion`; a stroking loop only runs while its
    /// generation is current.
    pub(crate) run_generation: u64,
    /// Token of the homing routine allowed to publish its result.
    pub(crate) homing_token: Option<u64>,
    pub(crate) next_homing_token: u64,
}

impl<D: StepperDriver> Inner<D> {
    pub(crate) fn new(driver: D, patterns: PatternRegistry, settings: StrokeSettings) -> Self {
        Self {
            driver,
            state: ServoState::Disabled,
            homed: false,
            settings,
            patterns,
            run_generation: 0,
            homing_token: None,
            next_homing_token: 0,
        }
    }

    /// Move to `next` unless latched in the safe state.
    pub(crate) fn transition(&mut self, next: ServoState) -> bool {
        if self.state.is_terminal() {
            return next == self.state;
        }
        if self.state != next {
            tracing::info!("Servo state: {} -> {}", self.state, next);
        }
        self.state = next;
        true
    }

    pub(crate) fn active_pattern(&mut self) -> Option<&mut (dyn Pattern + 'static)> {
        self.patterns.get_mut(self.settings.pattern)
    }

    /// Forward every stroke parameter to the active pattern.
    pub(crate) fn inject_settings(&mut self) {
        let settings = self.settings;
        if let Some(pattern) = self.active_pattern() {
            settings.inject(pattern);
        }
    }

    /// Decelerate to a stop at the maximum allowed deceleration if moving.
    pub(crate) fn halt(&mut self, limits: &StepLimits) {
        if self.driver.is_running() {
            self.driver.set_acceleration(limits.max_step_acceleration);
            self.driver.stop_move();
        }
    }

    pub(crate) fn begin_homing(&mut self) -> u64 {
        let token = self.next_homing_token;
        self.next_homing_token = self.next_homing_token.wrapping_add(1);
        self.homing_token = Some(token);
        token
    }

    pub(crate) fn owns_homing(&self, token: u64) -> bool {
        self.homing_token == Some(token)
    }

    /// Query the active pattern at `index`, raise the acceleration to the
    /// collision bound and dispatch the result.
    pub(crate) fn dispatch_target(
        &mut self,
        index: i32,
        limits: &StepLimits,
    ) -> Option<MotionParameter> {
        let requested = self.active_pattern()?.next_target(index);

        let position = self.driver.current_position();
        let speed = self.driver.current_speed();
        let bound = collision::check(position, speed, limits);

        if bound.overrides(requested.acceleration) {
            tracing::debug!(
                "Collision bound raises acceleration {} -> {} ({} steps to limit at {} steps/s)",
                requested.acceleration,
                bound.required_deceleration,
                bound.distance_to_limit,
                speed
            );
        }

        let sent = apply_motion_profile(&mut self.driver, limits, &bound.enforce(requested));
        tracing::trace!(
            index,
            target = sent.position,
            speed = sent.speed,
            acceleration = sent.acceleration,
            current_speed = speed,
            distance_to_limit = bound.distance_to_limit,
            required_deceleration = bound.required_deceleration,
            "stroke dispatched"
        );
        Some(sent)
    }
}
