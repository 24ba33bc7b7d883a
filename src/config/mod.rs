//! Configuration module for stroke-engine.
//!
//! Provides the machine description (geometry, motor, timing) loaded from
//! TOML files (with `std` feature) or built in code, and the step limits
//! derived from it.

mod limits;
mod machine;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use limits::StepLimits;
pub use machine::{MachineGeometry, MotorProperties, PinAssignment};
pub use system::{
    EngineConfig, HomingConfig, StrokingConfig, DEFAULT_HOMING_SPEED, DEFAULT_JOG_SPEED,
};
pub use validation::{validate_config, validate_geometry, validate_motor};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Millimeters, MillimetersPerSec, Steps, StrokesPerMinute};
