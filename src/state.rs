//! Servo state machine states.

use core::fmt;

/// Operating state of the actuator.
///
/// `Error` is terminal: only re-initializing the engine leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServoState {
    /// No power to the servo. Its position is unknown.
    #[default]
    Disabled,
    /// Servo is energized and knows its position. Not running.
    Ready,
    /// Servo is in a fault state. Cleared only by removing power.
    Error,
    /// Servo is moving according to the selected pattern.
    Running,
}

impl ServoState {
    /// Short state name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ServoState::Disabled => "Disabled",
            ServoState::Ready => "Ready",
            ServoState::Error => "Error",
            ServoState::Running => "Running",
        }
    }

    /// Whether the state can never be left.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, ServoState::Error)
    }
}

impl fmt::Display for ServoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServoState::Disabled => write!(f, "[0] Servo disabled"),
            ServoState::Ready => write!(f, "[1] Servo ready"),
            ServoState::Error => write!(f, "[2] Servo error"),
            ServoState::Running => write!(f, "[3] Servo running"),
        }
    }
}
