use std::path::PathBuf;

use thiserror::Error;

use crate::calibration::CalibrationState;

/// Errors produced by the guiding log.
#[derive(Error, Debug)]
pub enum LogError {
    /// The log file could not be opened or its session header written.
    #[error("failed to open guide log {}: {source}", path.display())]
    Open {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A write or flush failed; the log has been disabled.
    #[error("failed to write guide log {}: {source}", path.display())]
    Write {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A log directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A guide step arrived without an active guiding header.
    #[error("guide step rejected: guiding has not been started")]
    GuidingNotStarted,

    /// A calibration event arrived in an order the session does not allow.
    #[error("calibration {event} rejected in state {state:?}")]
    CalibrationOrder {
        /// Name of the rejected event.
        event: &'static str,
        /// Session state at the time of the event.
        state: CalibrationState,
    },

    /// A guide log could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Errors produced while validating graph settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A min/max limit was rejected and its pair reset to defaults.
    #[error("invalid value {value} for {key}; limits reset to defaults")]
    InvalidLimit {
        /// Settings key of the rejected value.
        key: &'static str,
        /// The rejected value.
        value: i64,
    },
}
