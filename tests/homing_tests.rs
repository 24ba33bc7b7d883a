//! Homing against the simulated driver and endstop.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use common::machine_config;
use stroke_engine::driver::sim::{DriverCommand, SimulatedDriver};
use stroke_engine::{
    EngineError, Endstop, Error, HomingCallback, ServoState, StrokeEngine, DEFAULT_HOMING_SPEED,
    DEFAULT_JOG_SPEED,
};

type Outcome = Arc<Mutex<Option<bool>>>;

fn make_engine(driver: &SimulatedDriver) -> StrokeEngine<SimulatedDriver> {
    let (pattern, _) = common::ProbePattern::new("Probe", 2000);
    StrokeEngine::builder()
        .config(&machine_config())
        .driver(driver.clone())
        .pattern(pattern)
        .build()
        .unwrap()
}

fn recorder() -> (Outcome, Option<HomingCallback>) {
    let outcome: Outcome = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&outcome);
    let callback: HomingCallback = Box::new(move |found| {
        *sink.lock().unwrap() = Some(found);
    });
    (outcome, Some(callback))
}

fn outcome(o: &Outcome) -> Option<bool> {
    *o.lock().unwrap()
}

async fn wait(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

/// Pin whose reads always fail.
struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = ErrorKind;
}

impl InputPin for BrokenPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }
}

#[tokio::test(start_paused = true)]
async fn test_homing_finds_switch() {
    // Switch at the physical origin, carriage 3000 steps away from it.
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    assert!(driver.is_enabled());

    wait(20).await;

    assert_eq!(outcome(&result), Some(true));
    assert!(engine.is_homed());
    assert_eq!(engine.state(), ServoState::Ready);
    assert_eq!(engine.current_position(), 0);

    let commands = driver.commands();
    assert!(commands.contains(&DriverCommand::SetSpeed(250)));
    assert!(commands.contains(&DriverCommand::SetAcceleration(8000)));
    assert!(commands.contains(&DriverCommand::MoveBy(-8000)));
    assert!(commands.contains(&DriverCommand::ForceStopAndSetPosition(-250)));
    assert_eq!(commands.last(), Some(&DriverCommand::MoveTo(0)));

    // Parked one keep-out boundary clear of the switch.
    let physical = driver.physical_position();
    assert!((240..=250).contains(&physical), "physical {}", physical);
}

#[tokio::test(start_paused = true)]
async fn test_homing_active_high_switch() {
    let driver = SimulatedDriver::at_physical_position(1000);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home(Endstop::new(driver.endstop(0, false), false), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    wait(10).await;

    assert_eq!(outcome(&result), Some(true));
    assert!(engine.is_homed());
}

#[tokio::test(start_paused = true)]
async fn test_homing_without_switch_fails() {
    // The switch sits beyond the reachable travel.
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home(Endstop::new(driver.endstop(-100_000, true), true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    wait(60).await;

    assert_eq!(outcome(&result), Some(false));
    assert!(!engine.is_homed());
    assert_eq!(engine.state(), ServoState::Disabled);
    assert!(!driver.is_enabled());
    assert!(!driver
        .commands()
        .iter()
        .any(|c| matches!(c, DriverCommand::ForceStopAndSetPosition(_))));
    // The full-travel move ran to completion.
    assert_eq!(driver.physical_position(), -5000);
}

#[tokio::test(start_paused = true)]
async fn test_homing_backs_off_asserted_switch() {
    let driver = SimulatedDriver::at_physical_position(-10);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    wait(20).await;

    assert_eq!(outcome(&result), Some(true));
    let moves: Vec<_> = driver
        .commands()
        .into_iter()
        .filter(|c| c.is_move())
        .collect();
    assert_eq!(
        moves,
        vec![
            DriverCommand::MoveBy(500),
            DriverCommand::MoveBy(-1000),
            DriverCommand::MoveTo(0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_endstop_read_error_fails_homing() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home(Endstop::new(BrokenPin, true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    wait(1).await;

    assert_eq!(outcome(&result), Some(false));
    assert_eq!(engine.state(), ServoState::Disabled);
    assert!(!driver.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_disable_aborts_homing() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    wait(1).await;

    engine.disable();
    driver.take_commands();
    wait(60).await;

    assert_eq!(outcome(&result), None);
    assert!(!engine.is_homed());
    assert_eq!(engine.state(), ServoState::Disabled);
    assert!(driver.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_homing_supersedes_first() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    let (first, first_callback) = recorder();
    let (second, second_callback) = recorder();

    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, first_callback)
        .unwrap();
    wait(1).await;
    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, second_callback)
        .unwrap();
    wait(30).await;

    assert_eq!(outcome(&first), None);
    assert_eq!(outcome(&second), Some(true));
    assert_eq!(engine.state(), ServoState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_homing_refused_in_safe_state() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    engine.enter_safe_state();
    driver.take_commands();

    let (result, callback) = recorder();
    let refused =
        engine.enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, callback);

    assert!(matches!(refused, Err(Error::Engine(EngineError::SafeState))));
    wait(20).await;
    assert_eq!(outcome(&result), None);
    assert!(driver.commands().is_empty());
    assert_eq!(engine.state(), ServoState::Error);
}

#[tokio::test(start_paused = true)]
async fn test_homing_stops_stroking() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    engine.confirm_current_position_is_home();
    engine.start_motion().unwrap();
    wait(1).await;

    let (result, callback) = recorder();
    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    assert_eq!(engine.state(), ServoState::Disabled);
    assert!(!engine.is_homed());
    assert!(driver.is_enabled());

    wait(60).await;
    assert_eq!(outcome(&result), Some(true));
    assert_eq!(engine.state(), ServoState::Ready);
    assert!(engine.is_homed());
}

#[tokio::test(start_paused = true)]
async fn test_motion_refused_while_homing() {
    // Homed in a stale frame, then homing again from Ready.
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    engine.confirm_current_position_is_home();
    assert_eq!(engine.state(), ServoState::Ready);

    let (result, callback) = recorder();
    engine
        .enable_and_home(Endstop::new(driver.endstop(0, true), true), DEFAULT_HOMING_SPEED, callback)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    driver.take_commands();

    assert!(matches!(
        engine.start_motion(),
        Err(Error::Engine(EngineError::InvalidState {
            state: ServoState::Disabled,
            ..
        }))
    ));
    assert!(matches!(
        engine.jog_to_max(DEFAULT_JOG_SPEED),
        Err(Error::Engine(EngineError::NotHomed))
    ));
    assert!(matches!(
        engine.jog_to_min(DEFAULT_JOG_SPEED),
        Err(Error::Engine(EngineError::NotHomed))
    ));
    engine.confirm_current_position_is_home();
    assert!(!engine.is_homed());
    assert_eq!(engine.state(), ServoState::Disabled);
    assert!(driver.commands().is_empty());

    wait(30).await;
    assert_eq!(outcome(&result), Some(true));
    assert_eq!(engine.state(), ServoState::Ready);
    // Parked clear of the switch, never sent toward the far end.
    let physical = driver.physical_position();
    assert!((240..=250).contains(&physical), "physical {}", physical);
}

#[tokio::test(start_paused = true)]
async fn test_homing_at_configured_speed() {
    let driver = SimulatedDriver::at_physical_position(1000);
    let engine = make_engine(&driver);
    let (result, callback) = recorder();

    engine
        .enable_and_home_default(Endstop::new(driver.endstop(0, true), true), callback)
        .unwrap();
    wait(10).await;

    assert_eq!(outcome(&result), Some(true));
    // 5 mm/s at 50 steps/mm
    assert!(driver.commands().contains(&DriverCommand::SetSpeed(250)));
}

#[tokio::test(start_paused = true)]
async fn test_safe_state_switches_outputs_off() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);
    engine.confirm_current_position_is_home();
    engine.start_motion().unwrap();
    wait(1).await;
    assert!(driver.is_enabled());

    engine.enter_safe_state();

    assert!(!driver.is_enabled());
    assert!(!engine.is_homed());
    assert_eq!(engine.state(), ServoState::Error);
}

#[tokio::test(start_paused = true)]
async fn test_safe_state_holds_against_concurrent_commands() {
    let driver = SimulatedDriver::at_physical_position(3000);
    let engine = make_engine(&driver);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..1000 {
                engine.confirm_current_position_is_home();
                let _ = engine.start_motion();
                let _ = engine.jog_to_max(DEFAULT_JOG_SPEED);
            }
        });
        std::thread::sleep(Duration::from_millis(1));
        engine.enter_safe_state();
    });

    assert_eq!(engine.state(), ServoState::Error);
    assert!(!driver.is_enabled());
    assert!(!engine.is_homed());
    assert!(matches!(
        engine.start_motion(),
        Err(Error::Engine(EngineError::SafeState))
    ));
}
