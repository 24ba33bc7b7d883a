//! Example: Simulated stroking session.
//!
//! This example demonstrates how to:
//! - Load the machine description from TOML
//! - Build a StrokeEngine with two patterns on the simulated driver
//! - Home against the simulated endstop
//! - Stroke, change settings on the fly and switch to the streaming pattern
//!
//! Run with: `RUST_LOG=stroke_engine=debug cargo run --example simulated_session`

use std::time::Duration;

use stroke_engine::{
    config::parse_config,
    driver::sim::SimulatedDriver,
    pattern::LivePosition,
    Endstop, MotionParameter, Pattern, Result, ServoState, StepperDriver, StrokeEngine, UnitExt,
};
use tracing_subscriber::EnvFilter;

const MACHINE: &str = r#"
[machine]
physical_travel_mm = 160.0
keepout_boundary_mm = 5.0

[motor]
steps_per_millimeter = 50.0
max_rpm = 3000
steps_per_revolution = 800
max_acceleration_rev_per_sec2 = 100.0

[homing]
speed_mm_per_sec = 20.0
"#;

/// Plain back-and-forth stroke with equal in and out speed.
///
/// Sensation above zero shortens the outstroke, below zero the instroke.
struct Simple {
    time_of_stroke: f32,
    depth: i32,
    stroke: i32,
    sensation: f32,
}

impl Simple {
    fn new() -> Self {
        Self {
            time_of_stroke: 1.0,
            depth: 0,
            stroke: 0,
            sensation: 0.0,
        }
    }
}

impl Pattern for Simple {
    fn name(&self) -> &str {
        "Simple Stroke"
    }

    fn set_time_of_stroke(&mut self, seconds: f32) {
        self.time_of_stroke = seconds;
    }

    fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    fn set_stroke(&mut self, stroke: i32) {
        self.stroke = stroke;
    }

    fn set_sensation(&mut self, sensation: f32) {
        self.sensation = sensation;
    }

    fn next_target(&mut self, index: i32) -> MotionParameter {
        let share = 0.5 + self.sensation / 400.0;
        let (position, time) = if index % 2 == 0 {
            (self.depth, self.time_of_stroke * share)
        } else {
            (self.depth - self.stroke, self.time_of_stroke * (1.0 - share))
        };
        // Triangle profile: peak speed twice the average.
        let speed = 2.0 * self.stroke as f32 / time;
        let acceleration = 2.0 * speed / time;
        MotionParameter::new(position, speed as u32, acceleration as u32)
    }
}

async fn watch(driver: &SimulatedDriver, label: &str, seconds: u64) {
    println!("\n{}", label);
    for _ in 0..seconds * 4 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        println!(
            "  position {:>5} steps, speed {:>6} steps/s",
            driver.current_position(),
            driver.current_speed()
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    println!("=== Simulated Stroking Session ===\n");

    let config = parse_config(MACHINE)?;
    let limits = config.limits();
    println!(
        "Travel {} .. {} steps, {} steps/s max, {} steps/s² max",
        limits.min_step, limits.max_step, limits.max_step_per_second, limits.max_step_acceleration
    );

    // Carriage parked 30 mm clear of the switch.
    let driver = SimulatedDriver::at_physical_position(1500);
    let live = LivePosition::new();
    let feed = live.feed();

    let engine = StrokeEngine::builder()
        .config(&config)
        .driver(driver.clone())
        .pattern(Simple::new())
        .pattern(live)
        .build()?;

    println!("\nPatterns:");
    for info in engine.patterns() {
        println!("  [{}] {}", info.index, info.name);
    }
    println!("State: {}", engine.state());

    engine.enable_and_home_default(
        Endstop::new(driver.endstop(0, true), true),
        Some(Box::new(|found| println!("Homing finished: found = {}", found))),
    )?;
    while engine.state() == ServoState::Disabled && !engine.is_homed() && driver.is_enabled() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    if !engine.is_homed() {
        println!("Homing failed, state {}", engine.state());
        return Ok(());
    }
    // Wait for the move off the switch to finish.
    while driver.is_running() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    println!("State: {}", engine.state());

    engine.set_depth(120.0_f32.mm());
    engine.set_stroke(80.0_f32.mm());
    engine.set_cadence(60.0_f32.strokes_per_minute());
    engine.start_motion()?;
    watch(&driver, "Stroking at 60 strokes/min", 3).await;

    engine.set_cadence(120.0_f32.strokes_per_minute());
    engine.set_sensation(50.0);
    engine.apply_settings_immediately()?;
    watch(&driver, "Faster, with a quick outstroke", 3).await;

    engine.stop_motion();
    engine.select_pattern(1)?;
    for (position, time_ms) in [(100, 600), (0, 600), (50, 300), (80, 300), (20, 400)] {
        feed.push(position, time_ms);
    }
    engine.start_motion()?;
    watch(&driver, "Streaming five targets", 3).await;

    engine.stop_motion();
    engine.jog_to_min(config.homing.speed)?;
    watch(&driver, "Jogging home", 2).await;

    engine.shutdown().await;
    println!("\nOutputs enabled after shutdown: {}", driver.is_enabled());

    Ok(())
}
