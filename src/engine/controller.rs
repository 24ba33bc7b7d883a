//! Stroke engine controller.
//!
//! Owns the stroke configuration, the servo state machine and the two
//! background routines (homing and stroking). All methods take `&self`; the
//! mutable state sits behind the lock in [`Shared`](super::shared::Shared).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::InputPin;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::{EngineConfig, Millimeters, MillimetersPerSec, StepLimits, StrokesPerMinute};
use crate::driver::{Endstop, StepperDriver};
use crate::error::{EngineError, Error, Result};
use crate::motion::{apply_motion_profile, MotionParameter};
use crate::pattern::{PatternInfo, PatternRegistry};
use crate::state::ServoState;

use super::builder::StrokeEngineBuilder;
use super::settings::{StrokeSettings, INDEX_BEFORE_START};
use super::shared::{Inner, Shared, SharedRef};
use super::{homing, stroking};

/// Completion callback for homing, called with `true` when home was found.
pub type HomingCallback = Box<dyn FnOnce(bool) + Send + 'static>;

type TaskSlot = Mutex<Option<JoinHandle<()>>>;

/// Collision-safe stroking controller for one linear actuator.
///
/// Built with [`StrokeEngine::builder`]. Background routines run on the
/// tokio runtime captured at build time.
///
/// # State machine
///
/// ```text
/// any*     --enable_and_home-------------> Disabled (homing)
/// homing   --endstop found---------------> Ready
/// homing   --endstop not found-----------> Disabled
/// Ready    --start_motion----------------> Running
/// Running  --stop_motion-----------------> Ready
/// any      --disable---------------------> Disabled
/// any      --enter_safe_state------------> Error (terminal)
///
/// * except Error
/// ```
pub struct StrokeEngine<D>
where
    D: StepperDriver + Send + 'static,
{
    shared: SharedRef<D>,
    runtime: Handle,
    stroking: TaskSlot,
    homing: TaskSlot,
}

fn take_task(slot: &TaskSlot) -> Option<JoinHandle<()>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn store_task(slot: &TaskSlot, task: JoinHandle<()>) -> Option<JoinHandle<()>> {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(task)
}

fn rejected(operation: &'static str, state: ServoState) -> Error {
    let error = if state.is_terminal() {
        EngineError::SafeState
    } else {
        EngineError::InvalidState { operation, state }
    };
    tracing::warn!("Rejected {}: {}", operation, error);
    error.into()
}

impl<D> StrokeEngine<D>
where
    D: StepperDriver + Send + 'static,
{
    /// Create a new builder.
    pub fn builder() -> StrokeEngineBuilder<D> {
        StrokeEngineBuilder::new()
    }

    /// Initialize: derive limits, load default settings into the first
    /// pattern and de-energize the motor.
    pub(crate) fn new(
        config: EngineConfig,
        mut driver: D,
        patterns: PatternRegistry,
        runtime: Handle,
    ) -> Self {
        let limits = config.limits();
        let settings = StrokeSettings::new(&limits);

        driver.disable_outputs();

        let mut inner = Inner::new(driver, patterns, settings);
        inner.inject_settings();

        tracing::info!(
            "Stroke engine initialized: travel {} steps, {} patterns",
            limits.max_step,
            inner.patterns.len()
        );

        Self {
            shared: Arc::new(Shared::new(config, inner)),
            runtime,
            stroking: Mutex::new(None),
            homing: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<D>> {
        self.shared.lock()
    }

    fn steps_per_millimeter(&self) -> f32 {
        self.shared.config.motor.steps_per_millimeter
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Set the cadence in strokes per minute.
    ///
    /// Stroke time is clamped to `[0.01, 120]` seconds.
    pub fn set_cadence(&self, cadence: StrokesPerMinute) {
        let mut inner = self.lock();
        let seconds = inner.settings.set_cadence(cadence);
        if let Some(pattern) = inner.active_pattern() {
            pattern.set_time_of_stroke(seconds);
        }
        tracing::debug!("Time of stroke: {} s", seconds);
    }

    /// Set the depth. Clamped to the travel limits.
    pub fn set_depth(&self, depth: Millimeters) {
        let spm = self.steps_per_millimeter();
        let mut inner = self.lock();
        let steps = inner.settings.set_depth(depth, spm, &self.shared.limits);
        if let Some(pattern) = inner.active_pattern() {
            pattern.set_depth(steps);
        }
        tracing::debug!("Depth: {} steps", steps);
    }

    /// Set the stroke length. Clamped to the travel limits.
    pub fn set_stroke(&self, stroke: Millimeters) {
        let spm = self.steps_per_millimeter();
        let mut inner = self.lock();
        let steps = inner.settings.set_stroke(stroke, spm, &self.shared.limits);
        if let Some(pattern) = inner.active_pattern() {
            pattern.set_stroke(steps);
        }
        tracing::debug!("Stroke: {} steps", steps);
    }

    /// Set the sensation. Clamped to `[-100, 100]`.
    pub fn set_sensation(&self, sensation: f32) {
        let mut inner = self.lock();
        let sensation = inner.settings.set_sensation(sensation);
        if let Some(pattern) = inner.active_pattern() {
            pattern.set_sensation(sensation);
        }
        tracing::debug!("Sensation: {}", sensation);
    }

    /// Switch to another pattern and restart its step index.
    ///
    /// # Errors
    ///
    /// [`EngineError::PatternOutOfRange`] if no pattern has this index. The
    /// active pattern is left unchanged.
    pub fn select_pattern(&self, index: usize) -> Result<()> {
        let mut inner = self.lock();
        let count = inner.patterns.len();
        if index >= count {
            let error = EngineError::PatternOutOfRange { index, count };
            tracing::warn!("Rejected select pattern: {}", error);
            return Err(error.into());
        }

        inner.settings.pattern = index;
        inner.inject_settings();
        inner.settings.index = 0;

        if let Some(pattern) = inner.patterns.get(index) {
            tracing::debug!("Pattern [{}] {}", index, pattern.name());
        }
        Ok(())
    }

    /// Dispatch the current target right away instead of waiting for the
    /// running move to finish.
    ///
    /// # Errors
    ///
    /// Rejected unless the servo is running.
    pub fn apply_settings_immediately(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != ServoState::Running {
            return Err(rejected("apply settings", inner.state));
        }

        let index = inner.settings.index;
        inner.dispatch_target(index, &self.shared.limits);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    /// Start stroking with the active pattern.
    ///
    /// # Errors
    ///
    /// Rejected unless the servo is ready.
    pub fn start_motion(&self) -> Result<()> {
        let generation = {
            let mut inner = self.lock();
            if inner.state != ServoState::Ready {
                return Err(rejected("start motion", inner.state));
            }

            inner.halt(&self.shared.limits);
            inner.transition(ServoState::Running);
            inner.settings.index = INDEX_BEFORE_START;
            inner.inject_settings();
            inner.run_generation = inner.run_generation.wrapping_add(1);
            inner.run_generation
        };

        let task = self
            .runtime
            .spawn(stroking::run(Arc::clone(&self.shared), generation));
        // A previous loop has already seen its generation retired.
        drop(store_task(&self.stroking, task));

        tracing::info!("Motion started");
        Ok(())
    }

    /// Stop stroking and decelerate to a halt. No-op unless running.
    pub fn stop_motion(&self) {
        let mut inner = self.lock();
        if inner.state != ServoState::Running {
            return;
        }

        inner.driver.set_acceleration(self.shared.limits.max_step_acceleration);
        inner.driver.stop_move();
        inner.transition(ServoState::Ready);
        tracing::info!("Motion stopped");
    }

    /// Energize the motor and home against `endstop` in the background.
    ///
    /// `speed` is the approach speed. Until the routine ends the engine is
    /// `Disabled` and not homed, so starting motion, jogging and confirming
    /// home are all refused. The callback, if any, is invoked with the
    /// result once homing ends; on failure the outputs are switched off and
    /// the state stays `Disabled`. A homing run still in progress is
    /// aborted first.
    ///
    /// # Errors
    ///
    /// [`EngineError::SafeState`] while latched in `Error`.
    pub fn enable_and_home<P>(
        &self,
        endstop: Endstop<P>,
        speed: MillimetersPerSec,
        callback: Option<HomingCallback>,
    ) -> Result<()>
    where
        P: InputPin + Send + 'static,
    {
        if self.state().is_terminal() {
            return Err(rejected("home", ServoState::Error));
        }

        if let Some(previous) = take_task(&self.homing) {
            previous.abort();
        }

        let speed_steps = speed.to_steps_per_sec(self.steps_per_millimeter());
        let token = {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                return Err(rejected("home", inner.state));
            }
            if inner.state == ServoState::Running {
                inner.halt(&self.shared.limits);
                tracing::info!("Motion stopped");
            }
            // The old reference is void until the switch is found again.
            inner.homed = false;
            inner.transition(ServoState::Disabled);
            inner.driver.enable_outputs();
            inner.begin_homing()
        };

        tracing::info!("Homing started at {} steps/s", speed_steps);

        let task = self.runtime.spawn(homing::run(
            Arc::clone(&self.shared),
            endstop,
            speed_steps,
            token,
            callback,
        ));
        if let Some(previous) = store_task(&self.homing, task) {
            previous.abort();
        }
        Ok(())
    }

    /// Energize the motor and home at the configured homing speed.
    ///
    /// # Errors
    ///
    /// See [`enable_and_home`](Self::enable_and_home).
    pub fn enable_and_home_default<P>(
        &self,
        endstop: Endstop<P>,
        callback: Option<HomingCallback>,
    ) -> Result<()>
    where
        P: InputPin + Send + 'static,
    {
        self.enable_and_home(endstop, self.shared.config.homing.speed, callback)
    }

    /// Take the current position as home without an endstop.
    ///
    /// Ignored while latched in `Error` or while homing is in progress.
    pub fn confirm_current_position_is_home(&self) {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            tracing::warn!("Ignored confirm home: {}", EngineError::SafeState);
            return;
        }
        if inner.homing_token.is_some() {
            tracing::warn!("Ignored confirm home: homing in progress");
            return;
        }

        inner.driver.enable_outputs();
        inner
            .driver
            .set_current_position(-self.shared.limits.keepout_steps);
        inner.homed = true;
        inner.transition(ServoState::Ready);
        tracing::info!("Current position confirmed as home");
    }

    /// Jog to the far end of the travel at `speed`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotHomed`] before homing; no command is sent.
    pub fn jog_to_max(&self, speed: MillimetersPerSec) -> Result<()> {
        self.jog(self.shared.limits.max_step, speed)
    }

    /// Jog to logical home at `speed`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotHomed`] before homing; no command is sent.
    pub fn jog_to_min(&self, speed: MillimetersPerSec) -> Result<()> {
        self.jog(self.shared.limits.min_step, speed)
    }

    fn jog(&self, target: i32, speed: MillimetersPerSec) -> Result<()> {
        let limits = self.shared.limits;
        let mut inner = self.lock();
        if !inner.homed {
            tracing::warn!("Rejected jog: {}", EngineError::NotHomed);
            return Err(EngineError::NotHomed.into());
        }
        if inner.state.is_terminal() {
            return Err(rejected("jog", inner.state));
        }

        if inner.state == ServoState::Running {
            inner.driver.set_acceleration(limits.max_step_acceleration);
            inner.driver.stop_move();
        }

        let motion = MotionParameter::new(
            target,
            speed.to_steps_per_sec(self.steps_per_millimeter()),
            limits.safe_acceleration(),
        );
        let sent = apply_motion_profile(&mut inner.driver, &limits, &motion);
        inner.transition(ServoState::Ready);

        tracing::info!("Jog to {} at {} steps/s", sent.position, sent.speed);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Power and faults
    // ------------------------------------------------------------------

    /// De-energize the motor, forget home and abort homing.
    ///
    /// A running stroking loop sees the state change on its next cycle and
    /// exits without issuing another command.
    pub fn disable(&self) {
        self.power_down(ServoState::Disabled);
        tracing::info!("Servo disabled");
    }

    /// Disable and latch the `Error` state.
    ///
    /// Only rebuilding the engine leaves it.
    pub fn enter_safe_state(&self) {
        self.power_down(ServoState::Error);
        tracing::error!("Servo entered safe state");
    }

    /// Switch the outputs off and enter `next` in one critical section, then
    /// abort homing.
    fn power_down(&self, next: ServoState) {
        {
            let mut inner = self.lock();
            inner.driver.disable_outputs();
            inner.homed = false;
            inner.homing_token = None;
            inner.transition(next);
        }

        if let Some(task) = take_task(&self.homing) {
            task.abort();
        }
    }

    /// Disable and wait for both background routines to end.
    pub async fn shutdown(self) {
        self.disable();

        let tasks = [take_task(&self.homing), take_task(&self.stroking)];
        for task in tasks.into_iter().flatten() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!("Background routine ended abnormally: {}", e);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current servo state.
    pub fn state(&self) -> ServoState {
        self.lock().state
    }

    /// Whether a home reference is established.
    pub fn is_homed(&self) -> bool {
        self.lock().homed
    }

    /// Registered patterns in registration order.
    pub fn patterns(&self) -> Vec<PatternInfo> {
        self.lock().patterns.infos().collect()
    }

    /// Number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        self.lock().patterns.len()
    }

    /// Index of the active pattern.
    pub fn active_pattern(&self) -> usize {
        self.lock().settings.pattern
    }

    /// Snapshot of the stroke settings.
    pub fn settings(&self) -> StrokeSettings {
        self.lock().settings
    }

    /// Derived step limits.
    pub fn limits(&self) -> StepLimits {
        self.shared.limits
    }

    /// Configuration the engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Driver position in steps.
    pub fn current_position(&self) -> i32 {
        self.lock().driver.current_position()
    }
}

impl<D> Drop for StrokeEngine<D>
where
    D: StepperDriver + Send + 'static,
{
    fn drop(&mut self) {
        self.disable();
    }
}

impl<D> core::fmt::Debug for StrokeEngine<D>
where
    D: StepperDriver + Send + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.lock();
        f.debug_struct("StrokeEngine")
            .field("state", &inner.state)
            .field("homed", &inner.homed)
            .field("settings", &inner.settings)
            .field("patterns", &inner.patterns)
            .finish()
    }
}
