//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use stroke_engine::driver::sim::DriverCommand;
use stroke_engine::{
    EngineConfig, MachineGeometry, Millimeters, MotionParameter, MotorProperties, Pattern,
    StepperDriver,
};

/// 160 mm travel, 5 mm keep-out, 50 steps/mm.
///
/// Limits: max_step 7500, keep-out 250 steps, travel 8000 steps,
/// 40 000 steps/s, 80 000 steps/s².
pub fn machine_config() -> EngineConfig {
    EngineConfig::new(
        MachineGeometry::new(Millimeters(160.0), Millimeters(5.0)),
        MotorProperties {
            steps_per_millimeter: 50.0,
            max_rpm: 3000,
            steps_per_revolution: 800,
            max_acceleration: 100.0,
            invert_direction: false,
            pins: Default::default(),
        },
    )
}

pub const MACHINE_TOML: &str = r#"
[machine]
physical_travel_mm = 160.0
keepout_boundary_mm = 5.0

[motor]
steps_per_millimeter = 50.0
max_rpm = 3000
steps_per_revolution = 800
max_acceleration_rev_per_sec2 = 100.0

[homing]
speed_mm_per_sec = 5.0
"#;

// =============================================================================
// Scripted driver
// =============================================================================

#[derive(Debug, Default)]
struct Script {
    running: bool,
    position: i32,
    speed: i32,
    commands: Vec<DriverCommand>,
}

/// Driver that never moves: it reports scripted running state, position and
/// speed, and records every command.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    script: Arc<Mutex<Script>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, running: bool) {
        self.script.lock().unwrap().running = running;
    }

    pub fn set_position(&self, position: i32) {
        self.script.lock().unwrap().position = position;
    }

    pub fn set_speed(&self, speed: i32) {
        self.script.lock().unwrap().speed = speed;
    }

    pub fn commands(&self) -> Vec<DriverCommand> {
        self.script.lock().unwrap().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<DriverCommand> {
        std::mem::take(&mut self.script.lock().unwrap().commands)
    }

    fn record(&self, command: DriverCommand) {
        self.script.lock().unwrap().commands.push(command);
    }
}

impl StepperDriver for RecordingDriver {
    fn set_speed(&mut self, steps_per_second: u32) {
        self.record(DriverCommand::SetSpeed(steps_per_second));
    }

    fn set_acceleration(&mut self, steps_per_second2: u32) {
        self.record(DriverCommand::SetAcceleration(steps_per_second2));
    }

    fn move_to(&mut self, position: i32) {
        self.record(DriverCommand::MoveTo(position));
    }

    fn move_by(&mut self, steps: i32) {
        self.record(DriverCommand::MoveBy(steps));
    }

    fn stop_move(&mut self) {
        self.record(DriverCommand::StopMove);
    }

    fn is_running(&self) -> bool {
        self.script.lock().unwrap().running
    }

    fn current_position(&self) -> i32 {
        self.script.lock().unwrap().position
    }

    fn current_speed(&self) -> i32 {
        self.script.lock().unwrap().speed
    }

    fn set_current_position(&mut self, position: i32) {
        self.record(DriverCommand::SetCurrentPosition(position));
        self.script.lock().unwrap().position = position;
    }

    fn force_stop_and_set_position(&mut self, position: i32) {
        self.record(DriverCommand::ForceStopAndSetPosition(position));
        self.script.lock().unwrap().position = position;
    }

    fn enable_outputs(&mut self) {
        self.record(DriverCommand::EnableOutputs);
    }

    fn disable_outputs(&mut self) {
        self.record(DriverCommand::DisableOutputs);
    }
}

/// Motion commands (`MoveTo` with the speed and acceleration set before it).
pub fn dispatched(commands: &[DriverCommand]) -> Vec<MotionParameter> {
    let mut speed = 0;
    let mut acceleration = 0;
    let mut out = Vec::new();
    for command in commands {
        match *command {
            DriverCommand::SetSpeed(s) => speed = s,
            DriverCommand::SetAcceleration(a) => acceleration = a,
            DriverCommand::MoveTo(p) => out.push(MotionParameter::new(p, speed, acceleration)),
            _ => {}
        }
    }
    out
}

// =============================================================================
// Probe pattern
// =============================================================================

/// What the engine told a [`ProbePattern`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProbeLog {
    pub time_of_stroke: f32,
    pub depth: i32,
    pub stroke: i32,
    pub sensation: f32,
    pub indices: Vec<i32>,
}

/// Alternates between depth and stroke start at a fixed requested
/// acceleration and records every call.
pub struct ProbePattern {
    name: &'static str,
    acceleration: u32,
    log: Arc<Mutex<ProbeLog>>,
}

impl ProbePattern {
    pub fn new(name: &'static str, acceleration: u32) -> (Self, Arc<Mutex<ProbeLog>>) {
        let log = Arc::new(Mutex::new(ProbeLog::default()));
        (
            Self {
                name,
                acceleration,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl Pattern for ProbePattern {
    fn name(&self) -> &str {
        self.name
    }

    fn set_time_of_stroke(&mut self, seconds: f32) {
        self.log.lock().unwrap().time_of_stroke = seconds;
    }

    fn set_depth(&mut self, depth: i32) {
        self.log.lock().unwrap().depth = depth;
    }

    fn set_stroke(&mut self, stroke: i32) {
        self.log.lock().unwrap().stroke = stroke;
    }

    fn set_sensation(&mut self, sensation: f32) {
        self.log.lock().unwrap().sensation = sensation;
    }

    fn next_target(&mut self, index: i32) -> MotionParameter {
        let mut log = self.log.lock().unwrap();
        log.indices.push(index);
        let position = if index % 2 == 0 {
            log.depth
        } else {
            log.depth - log.stroke
        };
        let speed = (2.0 * log.stroke as f32 / log.time_of_stroke) as u32;
        MotionParameter::new(position, speed, self.acceleration)
    }
}
