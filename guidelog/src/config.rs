//! Guide log configuration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Default number of lines the queued writer buffers.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Where and how the guiding log writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory holding log files; created on demand
    pub directory: PathBuf,
    /// File name inside `directory`. `None` picks a timestamped name once,
    /// when the log is constructed.
    pub file_name: Option<String>,
    /// Open the log as soon as it is constructed
    pub enabled: bool,
    /// Write through a background worker instead of the caller's thread
    pub queued_writes: bool,
    /// Lines buffered by the background worker before writers block
    pub queue_depth: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_name: None,
            enabled: false,
            queued_writes: false,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl LogConfig {
    /// Default configuration writing into `directory`.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// The configured file name, or a name stamped with the current time.
    pub fn resolve_file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| default_file_name(&Local::now()))
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// `GuideLog_<YYYY-MM-DD_HHMMSS>.txt` for the given instant.
pub fn default_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("GuideLog_{}.txt", at.format("%Y-%m-%d_%H%M%S"))
}

fn default_log_directory() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".guidelog").join("logs"),
        Err(_) => PathBuf::from(".guidelog").join("logs"),
    }
}
