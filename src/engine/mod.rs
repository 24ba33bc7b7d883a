//! Engine module for stroke-engine.
//!
//! The controller, its builder and the two background routines it owns:
//! homing (one-shot, abortable) and stroking (continuous, cooperative).

mod builder;
mod controller;
mod homing;
mod settings;
mod shared;
mod stroking;

pub use builder::StrokeEngineBuilder;
pub use controller::{HomingCallback, StrokeEngine};
pub use settings::{
    StrokeSettings, INDEX_BEFORE_START, MAX_SENSATION, MAX_TIME_OF_STROKE, MIN_TIME_OF_STROKE,
};
