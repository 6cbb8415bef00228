//! Parse guide logs back into sessions.
//!
//! A file is a sequence of session headers, each followed by calibration or
//! guiding blocks. A block starts at its `... Begins at` line; the first
//! comma-separated line after it names the columns and every following line
//! with the same number of fields is a row. Anything else inside a block
//! (`INFO:` annotations, calibration results) is kept as a note.

use std::path::Path;

use crate::error::LogError;
use crate::sample_history::Sample;
use crate::schema::{
    CALIBRATION_BEGINS, GUIDING_BEGINS, GUIDING_ENDS, LOG_CLOSED, LOG_HEADER_PREFIX,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Calibration,
    Guiding,
}

/// One data row and the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// 1-based line number
    pub line: usize,
    pub fields: Vec<String>,
}

/// One calibration or guiding block.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSession {
    pub kind: SessionKind,
    /// Timestamp text of the `Begins at` line
    pub started: String,
    /// Timestamp text of `Guiding Ends at`, if the block was ended explicitly
    pub ended: Option<String>,
    /// 1-based line number of the `Begins at` line
    pub line: usize,
    /// Mount named in a calibration block
    pub mount: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<LogRow>,
    pub notes: Vec<String>,
}

impl LogSession {
    fn new(kind: SessionKind, started: &str, line: usize) -> Self {
        Self {
            kind,
            started: started.trim().to_string(),
            ended: None,
            line,
            mount: None,
            columns: Vec::new(),
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Index of a column by header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, LogError> {
        self.column(name).ok_or_else(|| LogError::Parse {
            line: self.line,
            message: format!("session has no {name} column"),
        })
    }

    /// Numeric values of one column; empty fields are skipped.
    pub fn values(&self, name: &str) -> Result<Vec<f64>, LogError> {
        let index = self.require_column(name)?;
        let mut values = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let field = row.fields[index].as_str();
            if field.is_empty() {
                continue;
            }
            values.push(parse_number(row.line, name, field)?);
        }
        Ok(values)
    }

    /// History samples of a guiding block, in row order.
    ///
    /// Columns are located by name. Calibration blocks yield no samples.
    pub fn samples(&self) -> Result<Vec<Sample>, LogError> {
        if self.kind != SessionKind::Guiding {
            return Ok(Vec::new());
        }

        let dx = self.require_column("dx")?;
        let dy = self.require_column("dy")?;
        let ra = self.require_column("RARawDistance")?;
        let dec = self.require_column("DECRawDistance")?;

        self.rows
            .iter()
            .map(|row| -> Result<Sample, LogError> {
                let get = |index: usize| {
                    parse_number(row.line, &self.columns[index], &row.fields[index])
                };
                Ok(Sample::new(get(dx)?, get(dy)?, get(ra)?, get(dec)?))
            })
            .collect()
    }
}

/// A parsed guide log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuideLogFile {
    /// Session header lines, one per enable
    pub headers: Vec<String>,
    pub sessions: Vec<LogSession>,
}

impl GuideLogFile {
    pub fn guiding_sessions(&self) -> impl Iterator<Item = &LogSession> {
        self.sessions
            .iter()
            .filter(|s| s.kind == SessionKind::Guiding)
    }

    pub fn calibration_sessions(&self) -> impl Iterator<Item = &LogSession> {
        self.sessions
            .iter()
            .filter(|s| s.kind == SessionKind::Calibration)
    }
}

fn parse_number(line: usize, column: &str, field: &str) -> Result<f64, LogError> {
    field.trim().parse::<f64>().map_err(|_| LogError::Parse {
        line,
        message: format!("invalid {column} value {field:?}"),
    })
}

/// Split a row on commas outside double quotes, dropping the quotes.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse the text of a guide log.
pub fn parse_log(text: &str) -> Result<GuideLogFile, LogError> {
    let mut file = GuideLogFile::default();
    let mut current: Option<LogSession> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let begins = if let Some(rest) = line.strip_prefix(CALIBRATION_BEGINS) {
            Some(LogSession::new(SessionKind::Calibration, rest, line_no))
        } else {
            line.strip_prefix(GUIDING_BEGINS)
                .map(|rest| LogSession::new(SessionKind::Guiding, rest, line_no))
        };
        if let Some(session) = begins {
            file.sessions.extend(current.replace(session));
            continue;
        }

        if line.starts_with(LOG_HEADER_PREFIX) {
            file.headers.push(line.to_string());
            file.sessions.extend(current.take());
            continue;
        }
        if line.starts_with(LOG_CLOSED) {
            file.sessions.extend(current.take());
            continue;
        }

        let Some(session) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.strip_prefix(GUIDING_ENDS) {
            session.ended = Some(rest.trim().to_string());
            file.sessions.extend(current.take());
            continue;
        }
        if session.kind == SessionKind::Calibration && session.columns.is_empty() {
            if let Some(mount) = line.strip_prefix("Mount = ") {
                session.mount = Some(mount.to_string());
                continue;
            }
        }

        let fields = split_fields(line);
        if session.columns.is_empty() && fields.len() > 1 {
            session.columns = fields;
        } else if !session.columns.is_empty() && fields.len() == session.columns.len() {
            session.rows.push(LogRow {
                line: line_no,
                fields,
            });
        } else {
            session.notes.push(line.to_string());
        }
    }

    file.sessions.extend(current);
    Ok(file)
}

/// Read and parse a guide log file.
pub fn parse_file(path: &Path) -> Result<GuideLogFile, LogError> {
    let text = std::fs::read_to_string(path).map_err(|source| LogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_log(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LOG: &str = "\
guidelog version 0.1.0, Log version 2.5. Log enabled at 2024-03-09 21:00:00
Direction codes: N = North, S = South, E = East, W = West

Calibration Begins at 2024-03-09 21:00:05
Mount = EQMOD
Direction,Step,dx,dy,x,y,Dist
West,1,1.000,0.500,101.000,100.500,1.118
West calibration complete. Angle = 10.0 deg, Rate = 5.000 px/sec
Calibration complete, mount = EQMOD.

Guiding Begins at 2024-03-09 21:02:00
Frame,Time,mount,dx,dy,RARawDistance,DECRawDistance,RAGuideDistance,DECGuideDistance,RADuration,RADirection,DECDuration,DECDirection,XStep,YStep,StarMass,SNR
1,1.000,\"Mount\",0.120,-0.080,0.140,0.030,0.140,0.030,210,E,0,,,,12345,25.30
INFO: SERVER COMMAND: dither 3
2,2.000,\"Mount\",-0.100,0.050,-0.110,0.020,-0.110,0.020,160,W,0,,,,12001,24.10
Guiding Ends at 2024-03-09 21:02:03

Log closed at 2024-03-09 21:03:00
";

    #[test]
    fn test_split_fields_respects_quotes() {
        assert_eq!(split_fields("1,\"a,b\",,x"), vec!["1", "a,b", "", "x"]);
        assert_eq!(split_fields("single"), vec!["single"]);
    }

    #[test]
    fn test_parse_sessions() {
        let file = parse_log(LOG).unwrap();
        assert_eq!(file.headers.len(), 1);
        assert_eq!(file.sessions.len(), 2);

        let cal = file.calibration_sessions().next().unwrap();
        assert_eq!(cal.mount.as_deref(), Some("EQMOD"));
        assert_eq!(cal.rows.len(), 1);
        assert_eq!(cal.notes.len(), 2);
        assert!(cal.samples().unwrap().is_empty());

        let guiding = file.guiding_sessions().next().unwrap();
        assert_eq!(guiding.started, "2024-03-09 21:02:00");
        assert_eq!(guiding.ended.as_deref(), Some("2024-03-09 21:02:03"));
        assert_eq!(guiding.rows.len(), 2);
        assert_eq!(guiding.notes, vec!["INFO: SERVER COMMAND: dither 3"]);
        assert_eq!(guiding.rows[0].fields[2], "Mount");
    }

    #[test]
    fn test_samples_by_column_name() {
        let file = parse_log(LOG).unwrap();
        let guiding = file.guiding_sessions().next().unwrap();
        let samples = guiding.samples().unwrap();
        assert_eq!(samples.len(), 2);
        assert_relative_eq!(samples[0].dx, 0.12);
        assert_relative_eq!(samples[0].ra, 0.14);
        assert_relative_eq!(samples[1].dec, 0.02);

        let snr = guiding.values("SNR").unwrap();
        assert_eq!(snr, vec![25.3, 24.1]);
        assert!(guiding.values("XStep").unwrap().is_empty());
    }

    #[test]
    fn test_reordered_columns() {
        let text = "\
Guiding Begins at 2024-03-09 21:02:00
RARawDistance,DECRawDistance,dy,dx
0.5,0.25,2.0,1.0
";
        let file = parse_log(text).unwrap();
        let samples = file.sessions[0].samples().unwrap();
        assert_eq!(samples, vec![Sample::new(1.0, 2.0, 0.5, 0.25)]);
    }

    #[test]
    fn test_malformed_number_reports_line() {
        let text = "\
Guiding Begins at 2024-03-09 21:02:00
dx,dy,RARawDistance,DECRawDistance
1.0,2.0,0.5,0.25
1.0,oops,0.5,0.25
";
        let file = parse_log(text).unwrap();
        match file.sessions[0].samples() {
            Err(LogError::Parse { line, message }) => {
                assert_eq!(line, 4);
                assert!(message.contains("dy"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_header_ends_open_session() {
        let text = "\
Guiding Begins at 2024-03-09 21:02:00
dx,dy,RARawDistance,DECRawDistance
1.0,2.0,0.5,0.25
guidelog version 0.1.0, Log version 2.5. Log enabled at 2024-03-09 22:00:00
1.0,2.0,0.5,0.25
Guiding Begins at 2024-03-09 22:00:10
dx,dy,RARawDistance,DECRawDistance
";
        let file = parse_log(text).unwrap();
        assert_eq!(file.headers.len(), 1);
        assert_eq!(file.sessions.len(), 2);
        assert_eq!(file.sessions[0].rows.len(), 1);
        assert!(file.sessions[1].rows.is_empty());
    }
}
