//! Text layout of the guide log.
//!
//! Every line the log writes is produced here so the format has one owner.
//! Rows are comma separated and their columns are declared by the most recent
//! calibration or guiding header. A file may hold any number of header
//! blocks; readers must treat each as a new session.

use std::borrow::Cow;

use chrono::{DateTime, TimeZone};

use crate::record::{
    CalibrationStep, GuideDirection, GuideStepRecord, LockShiftParams, ParamValue, Point,
};

pub const APP_NAME: &str = "guidelog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LOG_FORMAT_VERSION: &str = "2.5";

pub const LOG_HEADER_PREFIX: &str = "guidelog version";
pub const CALIBRATION_BEGINS: &str = "Calibration Begins at";
pub const GUIDING_BEGINS: &str = "Guiding Begins at";
pub const GUIDING_ENDS: &str = "Guiding Ends at";
pub const LOG_CLOSED: &str = "Log closed at";
pub const INFO_PREFIX: &str = "INFO:";

pub const CALIBRATION_COLUMNS: [&str; 7] = ["Direction", "Step", "dx", "dy", "x", "y", "Dist"];

pub const GUIDE_COLUMNS: [&str; 17] = [
    "Frame",
    "Time",
    "mount",
    "dx",
    "dy",
    "RARawDistance",
    "DECRawDistance",
    "RAGuideDistance",
    "DECGuideDistance",
    "RADuration",
    "RADirection",
    "DECDuration",
    "DECDirection",
    "XStep",
    "YStep",
    "StarMass",
    "SNR",
];

/// Caller-supplied text with line breaks folded to spaces, so it can never
/// start a line of its own.
pub fn one_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        Cow::Owned(text.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

/// Timestamp layout used in every header line.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Header written each time logging is enabled.
pub fn session_header(timestamp: &str) -> Vec<String> {
    vec![
        format!(
            "{LOG_HEADER_PREFIX} {APP_VERSION}, Log version {LOG_FORMAT_VERSION}. Log enabled at {timestamp}"
        ),
        "Direction codes: N = North, S = South, E = East, W = West".to_string(),
    ]
}

pub fn log_closed(timestamp: &str) -> Vec<String> {
    vec![String::new(), format!("{LOG_CLOSED} {timestamp}")]
}

pub fn calibration_header(timestamp: &str, mount: &str) -> Vec<String> {
    vec![
        String::new(),
        format!("{CALIBRATION_BEGINS} {timestamp}"),
        format!("Mount = {}", one_line(mount)),
        CALIBRATION_COLUMNS.join(","),
    ]
}

pub fn calibration_step(step: &CalibrationStep) -> String {
    format!(
        "{},{},{:.3},{:.3},{:.3},{:.3},{:.3}",
        step.direction.name(),
        step.step,
        step.dx,
        step.dy,
        step.position.x,
        step.position.y,
        step.distance
    )
}

/// `angle` in radians, `rate` in pixels per second.
pub fn calibration_direct_complete(direction: GuideDirection, angle: f64, rate: f64) -> String {
    format!(
        "{} calibration complete. Angle = {:.1} deg, Rate = {:.3} px/sec",
        direction.name(),
        angle.to_degrees(),
        rate
    )
}

pub fn calibration_failed(reason: &str) -> String {
    format!("Calibration failed: {}", one_line(reason))
}

pub fn calibration_complete(mount: &str) -> String {
    format!("Calibration complete, mount = {}.", one_line(mount))
}

pub fn guiding_header(timestamp: &str) -> Vec<String> {
    vec![
        String::new(),
        format!("{GUIDING_BEGINS} {timestamp}"),
        GUIDE_COLUMNS.join(","),
    ]
}

pub fn guiding_ends(timestamp: &str) -> String {
    format!("{GUIDING_ENDS} {timestamp}")
}

/// One row in [`GUIDE_COLUMNS`] order.
pub fn guide_step(frame: u64, step: &GuideStepRecord) -> String {
    let (x_step, y_step) = match step.ao_position {
        Some((x, y)) => (x.to_string(), y.to_string()),
        None => (String::new(), String::new()),
    };
    format!(
        "{},{:.3},\"{}\",{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{},{},{},{},{},{},{:.0},{:.2}",
        frame,
        step.time,
        step.mount.as_str(),
        step.camera_offset.x,
        step.camera_offset.y,
        step.mount_offset.x,
        step.mount_offset.y,
        step.guide_distance_ra,
        step.guide_distance_dec,
        step.duration_ra,
        step.direction_ra.token(),
        step.duration_dec,
        step.direction_dec.token(),
        x_step,
        y_step,
        step.star_mass,
        step.star_snr,
    )
}

pub fn server_command(command: &str) -> String {
    format!("{INFO_PREFIX} SERVER COMMAND: {}", one_line(command))
}

pub fn dither(dx: f64, dy: f64, lock_position: Point) -> String {
    format!(
        "{INFO_PREFIX} DITHER by {dx:.3}, {dy:.3}, new lock pos = {:.3}, {:.3}",
        lock_position.x, lock_position.y
    )
}

pub fn set_lock_position(lock_position: Point) -> String {
    format!(
        "{INFO_PREFIX} SET LOCK POSITION, new lock pos = {:.3}, {:.3}",
        lock_position.x, lock_position.y
    )
}

/// `camera_rate` is the shift rate converted to camera pixels per hour.
pub fn lock_shift(params: &LockShiftParams, camera_rate: Point) -> String {
    if !params.enabled {
        return format!("{INFO_PREFIX} LOCK SHIFT, disabled");
    }
    format!(
        "{INFO_PREFIX} LOCK SHIFT, enabled = true, rate X = {:.2} Y = {:.2} ({}), axes = {}, camera rate X = {:.3} Y = {:.3} px/hr",
        params.rate.x,
        params.rate.y,
        params.units.label(),
        params.axes.label(),
        camera_rate.x,
        camera_rate.y
    )
}

pub fn guiding_param(name: &str, value: &ParamValue) -> String {
    format!(
        "{INFO_PREFIX} Guiding parameter change, {} = {}",
        one_line(name),
        one_line(&value.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MountKind, ShiftAxes, ShiftUnits};
    use chrono::Utc;

    fn sample_step() -> GuideStepRecord {
        GuideStepRecord {
            time: 1.0,
            mount: MountKind::Mount,
            camera_offset: Point::new(0.12, -0.08),
            mount_offset: Point::new(0.14, 0.03),
            guide_distance_ra: 0.14,
            guide_distance_dec: 0.03,
            duration_ra: 210,
            duration_dec: 0,
            direction_ra: GuideDirection::East,
            direction_dec: GuideDirection::None,
            ao_position: None,
            star_mass: 12345.4,
            star_snr: 25.3,
        }
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 21, 5, 7).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-09 21:05:07");
    }

    #[test]
    fn test_session_header_names_version() {
        let lines = session_header("2024-03-09 21:05:07");
        assert!(lines[0].starts_with(LOG_HEADER_PREFIX));
        assert!(lines[0].contains(APP_VERSION));
        assert!(lines[0].contains("Log version 2.5"));
        assert!(lines[0].ends_with("Log enabled at 2024-03-09 21:05:07"));
    }

    #[test]
    fn test_guide_row_matches_header_columns() {
        let row = guide_step(1, &sample_step());
        assert_eq!(
            row,
            "1,1.000,\"Mount\",0.120,-0.080,0.140,0.030,0.140,0.030,210,E,0,,,,12345,25.30"
        );
        assert_eq!(row.split(',').count(), GUIDE_COLUMNS.len());
    }

    #[test]
    fn test_guide_row_with_ao_position() {
        let step = GuideStepRecord {
            mount: MountKind::AdaptiveOptics,
            ao_position: Some((-12, 7)),
            direction_dec: GuideDirection::North,
            duration_dec: 40,
            ..sample_step()
        };
        let row = guide_step(7, &step);
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[0], "7");
        assert_eq!(fields[2], "\"AO\"");
        assert_eq!(fields[11], "40");
        assert_eq!(fields[12], "N");
        assert_eq!(fields[13], "-12");
        assert_eq!(fields[14], "7");
    }

    #[test]
    fn test_calibration_lines() {
        let step = CalibrationStep {
            direction: GuideDirection::West,
            step: 1,
            dx: 1.0,
            dy: 0.5,
            position: Point::new(101.0, 100.5),
            distance: 1.118034,
        };
        assert_eq!(
            calibration_step(&step),
            "West,1,1.000,0.500,101.000,100.500,1.118"
        );
        assert_eq!(
            calibration_direct_complete(GuideDirection::West, 10f64.to_radians(), 5.0),
            "West calibration complete. Angle = 10.0 deg, Rate = 5.000 px/sec"
        );
        let header = calibration_header("ts", "EQMOD");
        assert_eq!(header[0], "");
        assert_eq!(header[2], "Mount = EQMOD");
        assert_eq!(header[3], "Direction,Step,dx,dy,x,y,Dist");
    }

    #[test]
    fn test_info_lines() {
        assert_eq!(
            dither(1.5, -2.25, Point::new(300.0, 200.0)),
            "INFO: DITHER by 1.500, -2.250, new lock pos = 300.000, 200.000"
        );
        assert_eq!(
            set_lock_position(Point::new(1.0, 2.0)),
            "INFO: SET LOCK POSITION, new lock pos = 1.000, 2.000"
        );
        assert_eq!(server_command("dither 3"), "INFO: SERVER COMMAND: dither 3");
        assert_eq!(
            guiding_param("Dec guide mode", &ParamValue::from("Auto")),
            "INFO: Guiding parameter change, Dec guide mode = Auto"
        );
    }

    #[test]
    fn test_free_text_stays_on_one_line() {
        let forged = "guide\nGuiding Begins at fake\r\ndx,dy\n9,9";
        for line in [
            server_command(forged),
            calibration_failed(forged),
            calibration_complete(forged),
            guiding_param(forged, &ParamValue::from(forged)),
        ] {
            assert!(!line.contains(['\r', '\n']), "{line:?}");
        }
        assert_eq!(server_command("a\nb"), "INFO: SERVER COMMAND: a b");
        for line in calibration_header("ts", forged) {
            assert!(!line.contains('\n'));
        }
        assert!(matches!(one_line("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_lock_shift_lines() {
        let mut params = LockShiftParams {
            enabled: true,
            rate: Point::new(1.5, -0.25),
            units: ShiftUnits::ArcsecPerHour,
            axes: ShiftAxes::RaDec,
        };
        let line = lock_shift(&params, Point::new(0.75, 0.1));
        assert!(line.starts_with("INFO: LOCK SHIFT, enabled = true"));
        assert!(line.contains("rate X = 1.50 Y = -0.25 (arcsec/hr)"));
        assert!(line.contains("axes = RA/Dec"));

        params.enabled = false;
        assert_eq!(lock_shift(&params, Point::default()), "INFO: LOCK SHIFT, disabled");
    }
}
