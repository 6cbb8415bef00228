//! The guiding event log.
//!
//! [`GuidingLog`] owns one log file and serializes calibration events, guide
//! steps and annotations into it through [`crate::schema`]. The log is either
//! disabled (all calls succeed without writing) or enabled with the file open
//! in append mode. Enabling again after a disable appends a fresh session
//! header to the same file.
//!
//! Any write or flush failure disables the log and is reported as
//! [`LogError::Write`]; the caller decides whether to try
//! [`GuidingLog::enable`] again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::calibration::{CalibrationSession, CalibrationState};
use crate::config::LogConfig;
use crate::error::LogError;
use crate::record::{
    CalibrationEvent, CalibrationStep, GuideDirection, GuideStepRecord, LockShiftParams,
    ParamValue, Point,
};
use crate::schema;
use crate::sink::{FileSink, LogSink, NullSink, QueuedSink};

/// Guiding header currently governing rows.
#[derive(Debug, Clone, Copy, Default)]
struct GuidingSession {
    /// Frame number of the last row written
    frame: u64,
}

pub struct GuidingLog {
    config: LogConfig,
    file_name: String,
    sink: Box<dyn LogSink>,
    /// Set once the current file holds calibration or guiding content
    keep_file: bool,
    /// Set once the current file has been opened by this log
    opened: bool,
    calibration: CalibrationSession,
    guiding: Option<GuidingSession>,
}

fn now() -> String {
    schema::format_timestamp(&Local::now())
}

impl GuidingLog {
    /// Create a disabled log. No file is touched until [`GuidingLog::enable`].
    pub fn new(config: LogConfig) -> Self {
        let file_name = config.resolve_file_name();
        Self {
            config,
            file_name,
            sink: Box::new(NullSink),
            keep_file: false,
            opened: false,
            calibration: CalibrationSession::default(),
            guiding: None,
        }
    }

    /// Create a log and enable it if the configuration asks for it.
    pub fn open(config: LogConfig) -> Result<Self, LogError> {
        let enabled = config.enabled;
        let mut log = Self::new(config);
        log.set_enabled(enabled)?;
        Ok(log)
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Full path of the log file.
    pub fn path(&self) -> PathBuf {
        self.config.directory.join(&self.file_name)
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_active()
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    pub fn is_guiding(&self) -> bool {
        self.guiding.is_some()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), LogError> {
        if enabled {
            self.enable()
        } else {
            self.disable()
        }
    }

    /// Open the log file and write a session header.
    ///
    /// Enabling an enabled log does nothing. On failure the log stays
    /// disabled.
    pub fn enable(&mut self) -> Result<(), LogError> {
        if self.is_enabled() {
            return Ok(());
        }

        let path = self.path();
        let open_error = |source: io::Error| LogError::Open {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.config.directory).map_err(open_error)?;
        let existing = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let mut sink = self.open_sink(&path).map_err(open_error)?;
        for line in schema::session_header(&now()) {
            sink.write_line(&line).map_err(open_error)?;
        }
        sink.flush().map_err(open_error)?;

        self.sink = sink;
        self.opened = true;
        if existing > 0 {
            self.keep_file = true;
        }
        self.reset_sessions();
        info!("Guide log enabled: {}", path.display());
        Ok(())
    }

    /// Write the closing line, flush and close the file. Idempotent.
    pub fn disable(&mut self) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let result = self
            .write_lines(schema::log_closed(&now()))
            .and_then(|_| self.flush());
        self.sink = Box::new(NullSink);
        self.reset_sessions();
        info!("Guide log disabled: {}", self.path().display());
        result
    }

    /// Flush buffered lines and sync file data. No-op when disabled.
    pub fn flush(&mut self) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.sink.flush().map_err(|source| self.degrade(source))
    }

    /// Disable the log and delete its file if it never received calibration
    /// or guiding content.
    pub fn close(&mut self) -> Result<(), LogError> {
        let result = self.disable();
        if self.opened && !self.keep_file {
            let path = self.path();
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed empty guide log {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove empty guide log {}: {}", path.display(), e),
            }
            self.opened = false;
        }
        result
    }

    /// Move the log to `directory`, keeping the file name.
    ///
    /// The directory is created first; if that fails nothing changes. The
    /// current file is then closed and, if the log was enabled, reopened
    /// under the new directory. A failure to close the old file is only
    /// logged; the result reports the reopen.
    pub fn change_dir(&mut self, directory: impl AsRef<Path>) -> Result<(), LogError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|source| LogError::CreateDir {
            path: directory.clone(),
            source,
        })?;

        let was_enabled = self.is_enabled();
        if let Err(e) = self.close() {
            warn!("Closing guide log before directory change: {}", e);
        }
        info!(
            "Guide log directory changed from {} to {}",
            self.config.directory.display(),
            directory.display()
        );
        self.config.directory = directory;
        self.keep_file = false;

        if was_enabled {
            self.enable()?;
        }
        Ok(())
    }

    /// Log one calibration event, enforcing the session order.
    pub fn log_calibration(&mut self, event: &CalibrationEvent) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let next = self
            .calibration
            .check(event)
            .ok_or(LogError::CalibrationOrder {
                event: event.name(),
                state: self.calibration.state(),
            })?;

        let lines = match event {
            CalibrationEvent::Start { mount } => schema::calibration_header(&now(), mount),
            CalibrationEvent::Step(step) => vec![schema::calibration_step(step)],
            CalibrationEvent::DirectComplete {
                direction,
                angle,
                rate,
            } => vec![schema::calibration_direct_complete(
                *direction, *angle, *rate,
            )],
            CalibrationEvent::Failed { reason } => vec![schema::calibration_failed(reason)],
            CalibrationEvent::Complete => {
                vec![schema::calibration_complete(self.calibration.mount())]
            }
        };

        if matches!(event, CalibrationEvent::Start { .. }) && self.guiding.take().is_some() {
            debug!("Calibration started; guiding header closed");
        }
        self.write_lines(lines)?;
        self.calibration.apply(event, next);

        match event {
            CalibrationEvent::Start { .. } => self.keep_file = true,
            CalibrationEvent::Complete | CalibrationEvent::Failed { .. } => self.flush()?,
            _ => {}
        }
        Ok(())
    }

    pub fn start_calibration(&mut self, mount: &str) -> Result<(), LogError> {
        self.log_calibration(&CalibrationEvent::Start {
            mount: mount.to_string(),
        })
    }

    pub fn calibration_step(&mut self, step: &CalibrationStep) -> Result<(), LogError> {
        self.log_calibration(&CalibrationEvent::Step(step.clone()))
    }

    /// `angle` in radians, `rate` in pixels per second.
    pub fn calibration_direct_complete(
        &mut self,
        direction: GuideDirection,
        angle: f64,
        rate: f64,
    ) -> Result<(), LogError> {
        self.log_calibration(&CalibrationEvent::DirectComplete {
            direction,
            angle,
            rate,
        })
    }

    pub fn calibration_failed(&mut self, reason: &str) -> Result<(), LogError> {
        self.log_calibration(&CalibrationEvent::Failed {
            reason: reason.to_string(),
        })
    }

    pub fn calibration_complete(&mut self) -> Result<(), LogError> {
        self.log_calibration(&CalibrationEvent::Complete)
    }

    /// Write a guiding header and restart frame numbering at 1.
    ///
    /// A calibration still in progress is abandoned.
    pub fn start_guiding(&mut self) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }
        if self.calibration.state().is_active() {
            debug!(
                "Guiding started during calibration ({:?}); calibration abandoned",
                self.calibration.state()
            );
            self.calibration.reset();
        }

        self.write_lines(schema::guiding_header(&now()))?;
        self.guiding = Some(GuidingSession::default());
        self.keep_file = true;
        debug!("Guiding header written");
        Ok(())
    }

    /// End the current guiding header. Does nothing if guiding is not active.
    pub fn stop_guiding(&mut self) -> Result<(), LogError> {
        if !self.is_enabled() || self.guiding.take().is_none() {
            return Ok(());
        }
        self.write_lines([schema::guiding_ends(&now())])?;
        self.flush()
    }

    /// Write one guide-step row.
    pub fn guide_step(&mut self, step: &GuideStepRecord) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let session = self.guiding.as_mut().ok_or(LogError::GuidingNotStarted)?;
        session.frame += 1;
        let frame = session.frame;
        self.write_lines([schema::guide_step(frame, step)])
    }

    pub fn server_command(&mut self, command: &str) -> Result<(), LogError> {
        self.annotate(schema::server_command(command))
    }

    pub fn notify_guiding_dithered(
        &mut self,
        dx: f64,
        dy: f64,
        lock_position: Point,
    ) -> Result<(), LogError> {
        self.annotate(schema::dither(dx, dy, lock_position))
    }

    pub fn notify_set_lock_position(&mut self, lock_position: Point) -> Result<(), LogError> {
        self.annotate(schema::set_lock_position(lock_position))
    }

    /// `camera_rate` is the shift rate converted to camera pixels per hour.
    pub fn notify_lock_shift_params(
        &mut self,
        params: &LockShiftParams,
        camera_rate: Point,
    ) -> Result<(), LogError> {
        self.annotate(schema::lock_shift(params, camera_rate))
    }

    pub fn set_guiding_param(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), LogError> {
        let value = value.into();
        self.annotate(schema::guiding_param(name, &value))
    }

    fn annotate(&mut self, line: String) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.write_lines([line])
    }

    /// Install `sink` as if `enable` had opened it.
    #[cfg(test)]
    pub(crate) fn with_sink(&mut self, sink: Box<dyn LogSink>) {
        self.sink = sink;
        self.opened = true;
    }

    fn open_sink(&self, path: &Path) -> io::Result<Box<dyn LogSink>> {
        if self.config.queued_writes {
            Ok(Box::new(QueuedSink::open(path, self.config.queue_depth)?))
        } else {
            Ok(Box::new(FileSink::open(path)?))
        }
    }

    fn write_lines<I, S>(&mut self, lines: I) -> Result<(), LogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            if let Err(source) = self.sink.write_line(line.as_ref()) {
                return Err(self.degrade(source));
            }
        }
        Ok(())
    }

    /// Fall back to the null sink after an I/O failure.
    fn degrade(&mut self, source: io::Error) -> LogError {
        let path = self.path();
        warn!(
            "Guide log write to {} failed, disabling log: {}",
            path.display(),
            source
        );
        self.sink = Box::new(NullSink);
        self.reset_sessions();
        LogError::Write { path, source }
    }

    fn reset_sessions(&mut self) {
        self.calibration.reset();
        self.guiding = None;
    }
}

impl Drop for GuidingLog {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            warn!("Failed to close guide log: {}", e);
        }
    }
}
