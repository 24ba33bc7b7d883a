//! Simulated stepper driver and endstop.
//!
//! The carriage follows [`TrapezoidalMove`] kinematics on the tokio clock, so
//! tests running on a paused runtime advance it deterministically with
//! `tokio::time::advance` or by sleeping.
//!
//! Two coordinate frames are tracked. The physical frame is fixed to the
//! machine and is where the simulated home switch lives. The logical frame
//! is what the driver reports and can be redefined with
//! [`StepperDriver::set_current_position`].

use core::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{ErrorType, InputPin};
use tokio::time::Instant;

use super::StepperDriver;
use crate::motion::TrapezoidalMove;

/// A command received by the simulated driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// `set_speed`
    SetSpeed(u32),
    /// `set_acceleration`
    SetAcceleration(u32),
    /// `move_to`
    MoveTo(i32),
    /// `move_by`
    MoveBy(i32),
    /// `stop_move`
    StopMove,
    /// `set_current_position`
    SetCurrentPosition(i32),
    /// `force_stop_and_set_position`
    ForceStopAndSetPosition(i32),
    /// `enable_outputs`
    EnableOutputs,
    /// `disable_outputs`
    DisableOutputs,
}

impl DriverCommand {
    /// Whether the command starts carriage motion.
    pub fn is_move(&self) -> bool {
        matches!(self, DriverCommand::MoveTo(_) | DriverCommand::MoveBy(_))
    }
}

#[derive(Debug)]
struct SimState {
    speed: u32,
    acceleration: u32,
    motion: TrapezoidalMove,
    started: Instant,
    /// Logical minus physical position.
    offset: i32,
    enabled: bool,
    commands: Vec<DriverCommand>,
}

impl SimState {
    fn elapsed(&self) -> f32 {
        Instant::now().duration_since(self.started).as_secs_f32()
    }

    fn position(&self) -> i32 {
        self.motion.position_at(self.elapsed())
    }

    fn halt_at(&mut self, position: i32) {
        self.motion = TrapezoidalMove::at_rest(position);
        self.started = Instant::now();
    }

    fn start_move(&mut self, target: i32) {
        let start = self.position();
        self.motion = TrapezoidalMove::new(
            start,
            target,
            self.speed as f32,
            self.acceleration as f32,
        );
        self.started = Instant::now();
    }
}

/// Stepper driver simulation.
///
/// Clones share the same carriage. Moves always start from rest: a new move
/// issued mid-flight restarts the ramp from the current position, and
/// [`StepperDriver::stop_move`] halts the carriage where it is.
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    /// Carriage at rest at physical and logical position 0, outputs off.
    pub fn new() -> Self {
        Self::at_physical_position(0)
    }

    /// Carriage at rest at the given physical position.
    ///
    /// The logical position starts equal to the physical one.
    pub fn at_physical_position(position: i32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                speed: 0,
                acceleration: 0,
                motion: TrapezoidalMove::at_rest(position),
                started: Instant::now(),
                offset: 0,
                enabled: false,
                commands: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: DriverCommand) -> MutexGuard<'_, SimState> {
        tracing::trace!(?command, "sim driver");
        let mut state = self.lock();
        state.commands.push(command);
        state
    }

    /// Position in the fixed machine frame.
    pub fn physical_position(&self) -> i32 {
        let state = self.lock();
        state.position() - state.offset
    }

    /// Whether the outputs are energized.
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Last configured speed in steps/sec.
    pub fn speed(&self) -> u32 {
        self.lock().speed
    }

    /// Last configured acceleration in steps/sec².
    pub fn acceleration(&self) -> u32 {
        self.lock().acceleration
    }

    /// Every command received so far.
    pub fn commands(&self) -> Vec<DriverCommand> {
        self.lock().commands.clone()
    }

    /// Drain the command log.
    pub fn take_commands(&self) -> Vec<DriverCommand> {
        std::mem::take(&mut self.lock().commands)
    }

    /// Endstop switch at a physical position.
    ///
    /// The switch is asserted while the carriage is at or behind it.
    pub fn endstop(&self, switch_position: i32, active_low: bool) -> SimulatedEndstop {
        SimulatedEndstop {
            driver: self.clone(),
            switch_position,
            active_low,
        }
    }
}

impl StepperDriver for SimulatedDriver {
    fn set_speed(&mut self, steps_per_second: u32) {
        self.record(DriverCommand::SetSpeed(steps_per_second)).speed = steps_per_second;
    }

    fn set_acceleration(&mut self, steps_per_second2: u32) {
        self.record(DriverCommand::SetAcceleration(steps_per_second2))
            .acceleration = steps_per_second2;
    }

    fn move_to(&mut self, position: i32) {
        self.record(DriverCommand::MoveTo(position)).start_move(position);
    }

    fn move_by(&mut self, steps: i32) {
        let mut state = self.record(DriverCommand::MoveBy(steps));
        let target = state.position().saturating_add(steps);
        state.start_move(target);
    }

    fn stop_move(&mut self) {
        let mut state = self.record(DriverCommand::StopMove);
        let position = state.position();
        state.halt_at(position);
    }

    fn is_running(&self) -> bool {
        let state = self.lock();
        state.motion.phase_at(state.elapsed()) != crate::motion::MotionPhase::Complete
    }

    fn current_position(&self) -> i32 {
        self.lock().position()
    }

    fn current_speed(&self) -> i32 {
        let state = self.lock();
        libm::roundf(state.motion.speed_at(state.elapsed())) as i32
    }

    fn set_current_position(&mut self, position: i32) {
        let mut state = self.record(DriverCommand::SetCurrentPosition(position));
        let physical = state.position() - state.offset;
        state.offset = position - physical;
        state.halt_at(position);
    }

    fn force_stop_and_set_position(&mut self, position: i32) {
        let mut state = self.record(DriverCommand::ForceStopAndSetPosition(position));
        let physical = state.position() - state.offset;
        state.offset = position - physical;
        state.halt_at(position);
    }

    fn enable_outputs(&mut self) {
        self.record(DriverCommand::EnableOutputs).enabled = true;
    }

    fn disable_outputs(&mut self) {
        let mut state = self.record(DriverCommand::DisableOutputs);
        state.enabled = false;
        let position = state.position();
        state.halt_at(position);
    }
}

/// Home switch attached to a [`SimulatedDriver`].
#[derive(Debug, Clone)]
pub struct SimulatedEndstop {
    driver: SimulatedDriver,
    switch_position: i32,
    active_low: bool,
}

impl SimulatedEndstop {
    /// Whether the switch is physically pressed.
    pub fn is_pressed(&self) -> bool {
        self.driver.physical_position() <= self.switch_position
    }

    /// Polarity of the simulated line.
    pub fn is_active_low(&self) -> bool {
        self.active_low
    }
}

impl ErrorType for SimulatedEndstop {
    type Error = Infallible;
}

impl InputPin for SimulatedEndstop {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_pressed() != self.active_low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_pressed() == self.active_low)
    }
}
