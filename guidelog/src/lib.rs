//! Guiding telemetry core.
//!
//! Records every control-loop measurement of a guiding controller into a
//! line-oriented guide log and keeps a bounded history of recent samples for
//! live stability statistics.
//!
//! - [`sample_history`]: fixed-capacity sample history with zoomable window
//! - [`stability`]: RMS error and oscillation index over the history
//! - [`event_log`]: the guide log and its calibration/guiding sessions
//! - [`schema`]: text layout of every log line
//! - [`reader`]: parse a guide log back into sessions
//! - [`telemetry`]: feed one guide step to both history and log

pub mod calibration;
pub mod config;
pub mod error;
pub mod event_log;
pub mod reader;
pub mod record;
pub mod sample_history;
pub mod schema;
pub mod sink;
pub mod stability;
pub mod telemetry;

pub use calibration::CalibrationState;
pub use config::LogConfig;
pub use error::{ConfigError, LogError};
pub use event_log::GuidingLog;
pub use reader::{parse_file, parse_log, GuideLogFile, LogSession, SessionKind};
pub use record::{
    CalibrationEvent, CalibrationStep, GuideDirection, GuideStepRecord, LockShiftParams,
    MountKind, ParamValue, Point, ShiftAxes, ShiftUnits,
};
pub use sample_history::{GraphLimits, GraphMode, Sample, SampleHistory};
pub use stability::{StabilityReport, StabilityStats};
pub use telemetry::GuideTelemetry;
