//! Replay Source - recorded accelerometer traces from CSV
//!
//! Accepts one reading per row as `x,y,z` in raw driver units. Blank lines and
//! lines starting with `#` are skipped, and a non-numeric first row is taken as
//! a header. The whole trace is loaded up front and looped on exhaustion.

use std::io::BufRead;
use std::path::Path;

use tracing::{debug, info};

use super::{AccelerometerSource, SensorError};
use crate::types::Axes;

pub struct ReplaySource {
    readings: Vec<Axes>,
    cursor: usize,
    /// Completed passes over the trace
    loops: u64,
}

impl ReplaySource {
    /// Load a trace from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SensorError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let source = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            path = %path.display(),
            readings = source.readings.len(),
            "Loaded replay trace"
        );
        Ok(source)
    }

    /// Parse a trace from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SensorError> {
        let mut readings = Vec::new();
        let mut seen_row = false;

        for (ix, line) in reader.lines().enumerate() {
            let line_num = ix + 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match parse_row(trimmed) {
                Ok(axes) => readings.push(axes),
                // Header row
                Err(_) if !seen_row && trimmed.chars().any(char::is_alphabetic) => {}
                Err(message) => {
                    return Err(SensorError::Replay {
                        line: line_num,
                        message,
                    })
                }
            }
            seen_row = true;
        }

        if readings.is_empty() {
            return Err(SensorError::Replay {
                line: 0,
                message: "trace contains no readings".to_string(),
            });
        }

        Ok(Self {
            readings,
            cursor: 0,
            loops: 0,
        })
    }
}

fn parse_row(line: &str) -> Result<Axes, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(format!("expected 3 fields (x,y,z), found {}", fields.len()));
    }

    let mut values = [0.0f32; 3];
    for (slot, field) in values.iter_mut().zip(&fields) {
        *slot = field
            .parse::<f32>()
            .map_err(|e| format!("invalid value '{field}': {e}"))?;
        if !slot.is_finite() {
            return Err(format!("non-finite value '{field}'"));
        }
    }
    Ok(Axes::new(values[0], values[1], values[2]))
}

impl AccelerometerSource for ReplaySource {
    fn read_axes(&mut self) -> Result<Axes, SensorError> {
        let axes = self.readings[self.cursor];
        self.cursor += 1;
        if self.cursor == self.readings.len() {
            self.cursor = 0;
            self.loops += 1;
            debug!(loops = self.loops, readings = self.readings.len(), "Replay trace exhausted, looping");
        }
        Ok(axes)
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parses_header_comments_and_blanks() {
        let csv = "x,y,z\n# captured at rest\n\n1,2,981\n-3.5, 0, 975\n";
        let src = ReplaySource::from_reader(Cursor::new(csv)).unwrap();
        assert_eq!(src.readings.len(), 2);
    }

    #[test]
    fn test_loops_on_exhaustion() {
        let mut src = ReplaySource::from_reader(Cursor::new("1,1,1\n2,2,2\n")).unwrap();
        let xs: Vec<f32> = (0..5).map(|_| src.read_axes().unwrap().x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
        assert_eq!(src.loops, 2);
    }

    #[test]
    fn test_bad_row_reports_line_number() {
        let csv = "x,y,z\n1,2,3\n4,five,6\n";
        match ReplaySource::from_reader(Cursor::new(csv)) {
            Err(SensorError::Replay { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("five"), "{message}");
            }
            other => panic!("expected replay error, got {:?}", other.map(|s| s.readings.len())),
        }
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert!(matches!(
            ReplaySource::from_reader(Cursor::new("1,2\n")),
            Err(SensorError::Replay { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_trace_rejected() {
        assert!(ReplaySource::from_reader(Cursor::new("x,y,z\n# nothing\n")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y,z").unwrap();
        writeln!(file, "0,0,981").unwrap();
        let mut src = ReplaySource::load(file.path()).unwrap();
        assert_eq!(src.read_axes().unwrap(), Axes::new(0.0, 0.0, 981.0));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            ReplaySource::load("/nonexistent/trace.csv"),
            Err(SensorError::Io(_))
        ));
    }
}
