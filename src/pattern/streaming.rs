//! Streaming pattern driven by externally supplied positions.
//!
//! Positions arrive as `(percent, duration)` pairs through a [`LiveFeed`]
//! handle, typically from a remote controller, and are played back one per
//! stroke index. A percentage of 0 maps to the start of the stroke
//! (`depth - stroke`), 100 maps to the depth.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use heapless::Deque;

use super::Pattern;
use crate::motion::MotionParameter;

/// Capacity of the pending movement queue.
pub const MAX_PENDING_MOVEMENTS: usize = 10;

const MIN_MOVE_SECONDS: f32 = 0.01;
const MAX_MOVE_SECONDS: f32 = 120.0;

/// One queued movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    /// Target within the stroke, 0 to 100 percent.
    pub position: u8,
    /// Time to reach the target in milliseconds.
    pub time_ms: u32,
}

impl Movement {
    /// Create a movement. Positions above 100 % are clamped.
    pub fn new(position: u8, time_ms: u32) -> Self {
        Self {
            position: position.min(100),
            time_ms,
        }
    }

    fn seconds(&self) -> f32 {
        (self.time_ms as f32 / 1000.0).clamp(MIN_MOVE_SECONDS, MAX_MOVE_SECONDS)
    }
}

type Queue = Deque<Movement, MAX_PENDING_MOVEMENTS>;

/// Producer handle for a [`LivePosition`] pattern.
///
/// Cloneable; all clones feed the same queue.
#[derive(Debug, Clone, Default)]
pub struct LiveFeed {
    queue: Arc<Mutex<Queue>>,
}

impl LiveFeed {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a movement. When the queue is full the oldest pending movement
    /// is dropped and returned.
    pub fn push(&self, position: u8, time_ms: u32) -> Option<Movement> {
        let mut queue = self.lock();
        let dropped = if queue.is_full() {
            queue.pop_front()
        } else {
            None
        };
        // Cannot fail: a slot was freed above if needed.
        let _ = queue.push_back(Movement::new(position, time_ms));
        dropped
    }

    /// Discard all pending movements.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of pending movements.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no movement is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn pop(&self) -> Option<Movement> {
        self.lock().pop_front()
    }
}

/// Pattern that plays back streamed positions.
#[derive(Debug)]
pub struct LivePosition {
    feed: LiveFeed,
    depth: i32,
    stroke: i32,
    last_position: i32,
    last_index: Option<i32>,
    target: MotionParameter,
}

impl Default for LivePosition {
    fn default() -> Self {
        Self::new()
    }
}

impl LivePosition {
    /// Create the pattern with an empty queue.
    pub fn new() -> Self {
        Self {
            feed: LiveFeed::default(),
            depth: 0,
            stroke: 0,
            last_position: 0,
            last_index: None,
            target: MotionParameter::default(),
        }
    }

    /// Handle used to queue positions while the pattern is registered.
    pub fn feed(&self) -> LiveFeed {
        self.feed.clone()
    }

    fn to_steps(&self, percent: u8) -> i32 {
        let start = self.depth as i64 - self.stroke as i64;
        let offset = percent as i64 * self.stroke as i64 / 100;
        (start + offset) as i32
    }

    fn plan(&mut self, movement: Movement) -> MotionParameter {
        let position = self.to_steps(movement.position);
        let seconds = movement.seconds();
        let distance = (position as i64 - self.last_position as i64).unsigned_abs() as f32;

        // Trapezoid with a third of the time spent on each ramp.
        let speed = (1.5 * distance / seconds) as u32;
        let acceleration = (3.0 * speed as f32 / seconds) as u32;

        self.last_position = position;
        MotionParameter::new(position, speed, acceleration)
    }
}

impl Pattern for LivePosition {
    fn name(&self) -> &str {
        "Streaming"
    }

    fn set_time_of_stroke(&mut self, _seconds: f32) {
        // Timing comes with each movement.
    }

    fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    fn set_stroke(&mut self, stroke: i32) {
        self.stroke = stroke;
    }

    fn set_sensation(&mut self, _sensation: f32) {}

    fn next_target(&mut self, index: i32) -> MotionParameter {
        if self.last_index == Some(index) {
            return self.target;
        }
        self.last_index = Some(index);

        if let Some(movement) = self.feed.pop() {
            self.target = self.plan(movement);
        }
        self.target
    }
}
