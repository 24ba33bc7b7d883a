//! Pattern module for stroke-engine.
//!
//! A pattern turns a monotonically increasing step index and the current
//! stroke configuration into the next motion target. The engine routes
//! configuration to the active pattern and never looks at which one it is.

#[cfg(feature = "std")]
mod registry;
#[cfg(feature = "std")]
pub mod streaming;

#[cfg(feature = "std")]
pub use registry::PatternRegistry;
#[cfg(feature = "std")]
pub use streaming::{LiveFeed, LivePosition, Movement, MAX_PENDING_MOVEMENTS};

use heapless::String;

use crate::motion::MotionParameter;

/// Longest pattern name kept in a [`PatternInfo`].
pub const MAX_PATTERN_NAME: usize = 32;

/// Stroke pattern generator.
///
/// `next_target` may be queried again with the same index (for instance when
/// settings are applied mid-stroke) and should then return a consistent
/// target as long as the configuration is unchanged.
pub trait Pattern: Send {
    /// Display name.
    fn name(&self) -> &str;

    /// Time for one full stroke in seconds.
    fn set_time_of_stroke(&mut self, seconds: f32);

    /// Deepest position in steps.
    fn set_depth(&mut self, depth: i32);

    /// Stroke length in steps, measured back from the depth.
    fn set_stroke(&mut self, stroke: i32);

    /// Shape bias in `[-100, 100]`.
    fn set_sensation(&mut self, sensation: f32);

    /// Motion target for the given step index.
    fn next_target(&mut self, index: i32) -> MotionParameter;
}

/// Name and index of a registered pattern, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternInfo {
    /// Index to pass to pattern selection.
    pub index: usize,
    /// Pattern name, truncated to [`MAX_PATTERN_NAME`] bytes.
    pub name: String<MAX_PATTERN_NAME>,
}

impl PatternInfo {
    /// Describe a pattern at `index`.
    pub fn new(index: usize, name: &str) -> Self {
        let mut truncated = String::new();
        for c in name.chars() {
            if truncated.push(c).is_err() {
                break;
            }
        }
        Self {
            index,
            name: truncated,
        }
    }
}
