use crate::record::CalibrationEvent;

/// Calibration session states.
///
/// A session runs `Idle -> Started -> (Stepping | AxisComplete)* -> Idle`;
/// `Complete` and `Failed` both end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    /// No calibration in progress
    #[default]
    Idle,
    /// Header written, no moves yet
    Started,
    /// Moving along an axis
    Stepping,
    /// An axis finished; another axis or the final result follows
    AxisComplete,
}

impl CalibrationState {
    /// State after `event`, or `None` if the event is not allowed here.
    pub fn next(self, event: &CalibrationEvent) -> Option<CalibrationState> {
        use CalibrationState::*;

        match (self, event) {
            (Idle, CalibrationEvent::Start { .. }) => Some(Started),
            (Idle, _) => None,
            (_, CalibrationEvent::Start { .. }) => None,
            (_, CalibrationEvent::Step(_)) => Some(Stepping),
            (_, CalibrationEvent::DirectComplete { .. }) => Some(AxisComplete),
            (_, CalibrationEvent::Complete | CalibrationEvent::Failed { .. }) => Some(Idle),
        }
    }

    pub fn is_active(&self) -> bool {
        *self != CalibrationState::Idle
    }
}

/// Tracks the calibration session the log is currently writing.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    state: CalibrationState,
    mount: String,
}

impl CalibrationSession {
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Mount named by the most recent `Start`.
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Check whether `event` may be logged now, without changing state.
    pub fn check(&self, event: &CalibrationEvent) -> Option<CalibrationState> {
        self.state.next(event)
    }

    /// Move to the state following `event`. The caller must have validated
    /// the event with [`CalibrationSession::check`].
    pub fn apply(&mut self, event: &CalibrationEvent, next: CalibrationState) {
        if let CalibrationEvent::Start { mount } = event {
            self.mount = mount.clone();
        }
        tracing::debug!("Calibration {:?} -> {:?} on {}", self.state, next, event.name());
        self.state = next;
    }

    /// Abandon any session in progress.
    pub fn reset(&mut self) {
        self.state = CalibrationState::Idle;
    }
}
