//! One entry point per control-loop iteration.

use tracing::warn;

use crate::error::LogError;
use crate::event_log::GuidingLog;
use crate::record::GuideStepRecord;
use crate::sample_history::SampleHistory;
use crate::stability::StabilityReport;

/// Feeds guide steps to both the sample history and the guiding log.
pub struct GuideTelemetry {
    history: SampleHistory,
    log: GuidingLog,
}

impl GuideTelemetry {
    pub fn new(history: SampleHistory, log: GuidingLog) -> Self {
        Self { history, log }
    }

    /// Record one guide step.
    ///
    /// The sample always reaches the history; a log failure is returned
    /// after the history has been updated.
    pub fn record_step(&mut self, record: &GuideStepRecord) -> Result<(), LogError> {
        self.history.append(record.sample());
        self.log.guide_step(record).inspect_err(|e| {
            warn!("Guide step not logged: {}", e);
        })
    }

    pub fn stability_report(&self, sampling: f64) -> StabilityReport {
        self.history.stability_report(sampling)
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut SampleHistory {
        &mut self.history
    }

    pub fn log(&self) -> &GuidingLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut GuidingLog {
        &mut self.log
    }
}
