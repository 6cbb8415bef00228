//! Values handed to the guiding log by the control loop and its collaborators.

use std::fmt;

use crate::sample_history::Sample;

/// A 2D position or offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the offset.
    pub fn distance(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Direction of a guide pulse or calibration move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuideDirection {
    /// No pulse was issued on this axis.
    #[default]
    None,
    North,
    South,
    East,
    West,
}

impl GuideDirection {
    /// Short mnemonic used in guide-step rows; empty for no pulse.
    pub fn token(&self) -> &'static str {
        match self {
            GuideDirection::None => "",
            GuideDirection::North => "N",
            GuideDirection::South => "S",
            GuideDirection::East => "E",
            GuideDirection::West => "W",
        }
    }

    /// Full name used in calibration lines.
    pub fn name(&self) -> &'static str {
        match self {
            GuideDirection::None => "None",
            GuideDirection::North => "North",
            GuideDirection::South => "South",
            GuideDirection::East => "East",
            GuideDirection::West => "West",
        }
    }

    /// Inverse of [`GuideDirection::token`].
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(GuideDirection::None),
            "N" => Some(GuideDirection::North),
            "S" => Some(GuideDirection::South),
            "E" => Some(GuideDirection::East),
            "W" => Some(GuideDirection::West),
            _ => None,
        }
    }
}

/// Which actuator produced a guide step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountKind {
    #[default]
    Mount,
    AdaptiveOptics,
}

impl MountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountKind::Mount => "Mount",
            MountKind::AdaptiveOptics => "AO",
        }
    }
}

/// One control-loop correction, written as a single guide-step row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuideStepRecord {
    /// Seconds since guiding began
    pub time: f64,
    pub mount: MountKind,
    /// Star offset from the lock position in camera coordinates (pixels)
    pub camera_offset: Point,
    /// The same offset rotated into mount RA/Dec axes (pixels)
    pub mount_offset: Point,
    /// Distance the guide algorithm chose to correct on RA
    pub guide_distance_ra: f64,
    /// Distance the guide algorithm chose to correct on Dec
    pub guide_distance_dec: f64,
    /// RA pulse length in milliseconds
    pub duration_ra: u32,
    /// Dec pulse length in milliseconds
    pub duration_dec: u32,
    pub direction_ra: GuideDirection,
    pub direction_dec: GuideDirection,
    /// Adaptive-optics element position in steps, when an AO unit is fitted
    pub ao_position: Option<(i32, i32)>,
    pub star_mass: f64,
    pub star_snr: f64,
}

impl GuideStepRecord {
    /// The history sample this step contributes to the live graph.
    pub fn sample(&self) -> Sample {
        Sample {
            dx: self.camera_offset.x,
            dy: self.camera_offset.y,
            ra: self.mount_offset.x,
            dec: self.mount_offset.y,
        }
    }
}

/// One calibration move.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationStep {
    pub direction: GuideDirection,
    /// 1-based step number within the current axis
    pub step: u32,
    /// Offset from the calibration start position
    pub dx: f64,
    pub dy: f64,
    /// Absolute star position after the move
    pub position: Point,
    /// Cumulative distance moved along the axis
    pub distance: f64,
}

/// Events of a calibration session, in the order a session emits them.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationEvent {
    Start {
        mount: String,
    },
    Step(CalibrationStep),
    /// One axis finished; `angle` in radians, `rate` in pixels per second.
    DirectComplete {
        direction: GuideDirection,
        angle: f64,
        rate: f64,
    },
    Failed {
        reason: String,
    },
    Complete,
}

impl CalibrationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationEvent::Start { .. } => "start",
            CalibrationEvent::Step(_) => "step",
            CalibrationEvent::DirectComplete { .. } => "direct-complete",
            CalibrationEvent::Failed { .. } => "failed",
            CalibrationEvent::Complete => "complete",
        }
    }
}

/// Units of a lock-position shift rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftUnits {
    ArcsecPerHour,
    PixelsPerHour,
}

impl ShiftUnits {
    pub fn label(&self) -> &'static str {
        match self {
            ShiftUnits::ArcsecPerHour => "arcsec/hr",
            ShiftUnits::PixelsPerHour => "pixels/hr",
        }
    }
}

/// Axes a lock-position shift rate is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftAxes {
    RaDec,
    CameraXY,
}

impl ShiftAxes {
    pub fn label(&self) -> &'static str {
        match self {
            ShiftAxes::RaDec => "RA/Dec",
            ShiftAxes::CameraXY => "X/Y",
        }
    }
}

/// Lock-position shift (comet tracking) settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockShiftParams {
    pub enabled: bool,
    pub rate: Point,
    pub units: ShiftUnits,
    pub axes: ShiftAxes,
}

/// Value of a guiding parameter change.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{v:.3}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_tokens_round_trip() {
        for dir in [
            GuideDirection::None,
            GuideDirection::North,
            GuideDirection::South,
            GuideDirection::East,
            GuideDirection::West,
        ] {
            assert_eq!(GuideDirection::from_token(dir.token()), Some(dir));
        }
        assert_eq!(GuideDirection::from_token("X"), None);
    }

    #[test]
    fn test_step_sample_mapping() {
        let record = GuideStepRecord {
            camera_offset: Point::new(0.5, -0.25),
            mount_offset: Point::new(0.4, 0.3),
            ..Default::default()
        };
        let sample = record.sample();
        assert_relative_eq!(sample.dx, 0.5);
        assert_relative_eq!(sample.dy, -0.25);
        assert_relative_eq!(sample.ra, 0.4);
        assert_relative_eq!(sample.dec, 0.3);
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::from(0.75).to_string(), "0.750");
        assert_eq!(ParamValue::from(42).to_string(), "42");
        assert_eq!(ParamValue::from("Hysteresis").to_string(), "Hysteresis");
    }

    #[test]
    fn test_point_distance() {
        assert_relative_eq!(Point::new(3.0, 4.0).distance(), 5.0);
    }
}
