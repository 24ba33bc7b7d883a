//! # stroke-engine
//!
//! Collision-safe stroking motion control for stepper-driven linear actuators.
//!
//! ## Features
//!
//! - **Pattern driven**: Interchangeable patterns turn depth, stroke, cadence and
//!   sensation into a stream of trapezoidal moves
//! - **Collision avoidance**: Every dispatched move decelerates in time to stop
//!   before the travel limits, whatever the pattern asks for
//! - **Homing**: Endstop homing on any embedded-hal 1.0 `InputPin`
//! - **Safe state machine**: Disabled / Ready / Running / Error, with `Error`
//!   latched until the engine is rebuilt
//! - **Configuration-driven**: Machine geometry and motor limits from TOML files
//! - **no_std core**: Limits, collision math and the driver/pattern traits work
//!   without the standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stroke_engine::{Endstop, StrokeEngine, UnitExt, DEFAULT_HOMING_SPEED};
//!
//! let config = stroke_engine::load_config("machine.toml")?;
//!
//! let engine = StrokeEngine::builder()
//!     .config(&config)
//!     .driver(driver)
//!     .pattern(my_pattern)
//!     .build()?;
//!
//! engine.enable_and_home(Endstop::new(pin, true), DEFAULT_HOMING_SPEED, None)?;
//! // ... once Ready
//! engine.set_stroke(80.0_f32.mm());
//! engine.set_cadence(40.0_f32.strokes_per_minute());
//! engine.start_motion()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables the engine with its tokio background routines,
//!   TOML loading, tracing and the simulated driver

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod driver;
#[cfg(feature = "std")]
pub mod engine;
pub mod error;
pub mod motion;
pub mod pattern;
pub mod state;

// Re-exports for ergonomic API
pub use config::{validate_config, EngineConfig, MachineGeometry, MotorProperties, StepLimits};
pub use config::{DEFAULT_HOMING_SPEED, DEFAULT_JOG_SPEED};
pub use driver::{Endstop, StepperDriver};
pub use error::{ConfigError, EngineError, Error, Result};
pub use motion::{apply_motion_profile, MotionParameter};
pub use pattern::{Pattern, PatternInfo};
pub use state::ServoState;

#[cfg(feature = "std")]
pub use engine::{HomingCallback, StrokeEngine, StrokeEngineBuilder, StrokeSettings};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::load_config;

// Unit types
pub use config::units::{Millimeters, MillimetersPerSec, Steps, StrokesPerMinute, UnitExt};
