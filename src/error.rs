//! Error types for the character controller.

use std::error::Error;
use std::fmt;

/// Errors surfaced by the controller core.
///
/// None of these are raised during a normal fixed step: steady-state
/// movement never fails. They come from configuration validation,
/// the action log, and lifecycle requests that cannot be honoured.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerError {
    /// An action was recorded with a time-stamp earlier than the last entry
    /// of the current session.
    NonMonotonicTimestamp {
        /// Time-stamp of the most recent entry.
        last: f32,
        /// Rejected time-stamp.
        got: f32,
    },
    /// A respawn was requested but no spawn point is known.
    NoSpawnPoint,
    /// A configuration field holds an unusable value.
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonMonotonicTimestamp { last, got } => {
                write!(f, "action time-stamp {got} is earlier than last entry {last}")
            }
            Self::NoSpawnPoint => write!(f, "no spawn point available"),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid controller config field '{field}': {reason}")
            }
        }
    }
}

impl Error for ControllerError {}
