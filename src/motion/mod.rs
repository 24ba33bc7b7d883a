//! Motion module for stroke-engine.
//!
//! Motion targets, the collision-avoidance bound, trapezoidal kinematics and
//! the dispatch path every move goes through.

mod applier;
pub mod collision;
mod parameter;
pub mod profile;

pub use applier::apply_motion_profile;
pub use collision::{CollisionCheck, Direction};
pub use parameter::MotionParameter;
pub use profile::{MotionPhase, TrapezoidalMove};
