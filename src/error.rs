//! Error types for stroke-engine.
//!
//! Provides unified error handling across configuration and engine operations.

use core::fmt;

use crate::state::ServoState;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stroke-engine operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Engine operation rejected
    Engine(EngineError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Physical travel must be > 0
    InvalidTravel(f32),
    /// Keep-out boundary must be >= 0 and leave usable travel
    InvalidKeepout {
        /// Physical travel in mm
        travel: f32,
        /// Keep-out boundary in mm
        keepout: f32,
    },
    /// Steps per millimeter must be > 0
    InvalidStepsPerMillimeter(f32),
    /// Max RPM must be > 0
    InvalidMaxRpm(u32),
    /// Steps per revolution must be > 0
    InvalidStepsPerRevolution(u32),
    /// Max acceleration must be > 0
    InvalidMaxAcceleration(f32),
    /// Homing speed must be > 0
    InvalidHomingSpeed(f32),
    /// Timing interval must be > 0
    InvalidInterval(&'static str),
    /// Required builder field was not provided
    Missing(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Engine operation errors.
///
/// A rejected operation leaves every piece of engine state untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Operation not allowed in the current state
    InvalidState {
        /// Rejected operation
        operation: &'static str,
        /// State at the time of the call
        state: ServoState,
    },
    /// Pattern index outside the registered patterns
    PatternOutOfRange {
        /// Requested index
        index: usize,
        /// Number of registered patterns
        count: usize,
    },
    /// Operation requires a homed axis
    NotHomed,
    /// Machine is latched in its safe state
    SafeState,
    /// No pattern was registered
    NoPatterns,
    /// No async runtime available to host the background routines
    NoRuntime,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidTravel(v) => write!(f, "Invalid physical travel: {} mm. Must be > 0", v),
            ConfigError::InvalidKeepout { travel, keepout } => write!(
                f,
                "Invalid keep-out boundary: {} mm twice leaves no usable travel out of {} mm",
                keepout, travel
            ),
            ConfigError::InvalidStepsPerMillimeter(v) => {
                write!(f, "Invalid steps per millimeter: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxRpm(v) => write!(f, "Invalid max RPM: {}. Must be > 0", v),
            ConfigError::InvalidStepsPerRevolution(v) => {
                write!(f, "Invalid steps per revolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxAcceleration(v) => {
                write!(f, "Invalid max acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidHomingSpeed(v) => write!(f, "Invalid homing speed: {} mm/s. Must be > 0", v),
            ConfigError::InvalidInterval(name) => write!(f, "Invalid interval '{}': must be > 0", name),
            ConfigError::Missing(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidState { operation, state } => {
                write!(f, "Cannot {} while in state {}", operation, state)
            }
            EngineError::PatternOutOfRange { index, count } => {
                write!(f, "Pattern index {} out of range ({} patterns)", index, count)
            }
            EngineError::NotHomed => write!(f, "Axis is not homed"),
            EngineError::SafeState => write!(f, "Servo is in safe state. Remove power to clear fault"),
            EngineError::NoPatterns => write!(f, "At least one pattern must be registered"),
            EngineError::NoRuntime => write!(f, "No async runtime available"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::Engine(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}
