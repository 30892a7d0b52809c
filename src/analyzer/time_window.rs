//! Time-window filter for syslog-style lines
//!
//! Lines carry their own timestamps in one of several shapes. The first shape
//! found in a line decides. A line whose timestamp is missing or cannot be
//! parsed is kept, so unformatted but relevant lines are never dropped.

use crate::error::ConfigError;
use crate::findings::Timestamp;
use chrono::{Datelike, Duration, NaiveDateTime};
use regex::Regex;

const SYSLOG_SHAPE: &str = r"(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})";
const ISO_T_SHAPE: &str = r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})";
const ISO_SPACE_SHAPE: &str = r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})";

/// How a line's embedded timestamp was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTimestamp {
    /// Timestamp found and parsed
    Parsed(NaiveDateTime),
    /// A timestamp shape was found but it is not a valid date/time
    Unparseable,
    /// No timestamp shape in the line
    Absent,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    /// `Mon D HH:MM:SS`, year taken from the reference time
    Syslog,
    IsoT,
    IsoSpace,
}

/// Keeps lines at or after a cutoff computed from a reference time
#[derive(Debug, Clone)]
pub struct TimeWindow {
    cutoff: NaiveDateTime,
    year: i32,
    shapes: Vec<(Shape, Regex)>,
}

impl TimeWindow {
    /// Window covering the `hours_back` hours before `now`
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` when the cutoff falls outside the
    /// representable date range.
    pub fn new(now: Timestamp, hours_back: u32) -> Result<Self, ConfigError> {
        let now = now.naive_local();
        let cutoff = now
            .checked_sub_signed(Duration::hours(i64::from(hours_back)))
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "look-back window of {} hour(s) is out of range",
                    hours_back
                ))
            })?;
        Ok(Self {
            cutoff,
            year: now.year(),
            shapes: vec![
                (Shape::Syslog, Regex::new(SYSLOG_SHAPE)?),
                (Shape::IsoT, Regex::new(ISO_T_SHAPE)?),
                (Shape::IsoSpace, Regex::new(ISO_SPACE_SHAPE)?),
            ],
        })
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    /// Interpret the first timestamp-looking substring of `line`
    pub fn timestamp_of(&self, line: &str) -> LineTimestamp {
        for (shape, regex) in &self.shapes {
            let Some(found) = regex.captures(line).and_then(|c| c.get(1)) else {
                continue;
            };
            let text = found.as_str();
            let parsed = match shape {
                Shape::Syslog => {
                    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    NaiveDateTime::parse_from_str(
                        &format!("{} {}", self.year, normalized),
                        "%Y %b %d %H:%M:%S",
                    )
                }
                Shape::IsoT => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"),
                Shape::IsoSpace => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"),
            };
            return match parsed {
                Ok(time) => LineTimestamp::Parsed(time),
                Err(_) => LineTimestamp::Unparseable,
            };
        }
        LineTimestamp::Absent
    }

    /// Whether the line belongs to the window
    pub fn includes(&self, line: &str) -> bool {
        match self.timestamp_of(line) {
            LineTimestamp::Parsed(time) => time >= self.cutoff,
            LineTimestamp::Unparseable | LineTimestamp::Absent => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, TimeZone};

    fn window_at(y: i32, m: u32, d: u32, h: u32, hours_back: u32) -> TimeWindow {
        let now = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap(),
            )
            .single()
            .unwrap();
        TimeWindow::new(now, hours_back).unwrap()
    }

    #[test]
    fn test_syslog_timestamp_uses_reference_year() {
        let window = window_at(2023, 11, 21, 15, 1);
        assert_eq!(
            window.timestamp_of("Nov 21 14:30:45 host sshd[1]: hello"),
            LineTimestamp::Parsed(
                NaiveDate::from_ymd_opt(2023, 11, 21)
                    .unwrap()
                    .and_hms_opt(14, 30, 45)
                    .unwrap()
            )
        );
        assert!(window.includes("Nov 21 14:30:45 host sshd[1]: hello"));
        assert!(!window.includes("Nov 21 13:59:59 host sshd[1]: hello"));
    }

    #[test]
    fn test_single_digit_day_with_padding() {
        let window = window_at(2023, 11, 1, 12, 2);
        assert!(window.includes("Nov  1 11:00:00 host kernel: oops"));
        assert!(!window.includes("Nov  1 09:00:00 host kernel: oops"));
    }

    #[test]
    fn test_iso_formats() {
        let window = window_at(2023, 11, 21, 15, 1);
        assert!(window.includes("2023-11-21T14:30:45 app: error"));
        assert!(!window.includes("2023-11-21T10:00:00 app: error"));
        assert!(window.includes("2023-11-21 14:00:00 app: error"));
        assert!(!window.includes("2023-11-20 14:00:00 app: error"));
    }

    #[test]
    fn test_unparseable_timestamp_is_kept() {
        let window = window_at(2023, 11, 21, 15, 1);
        assert_eq!(
            window.timestamp_of("Foo 21 14:30:45 weird"),
            LineTimestamp::Unparseable
        );
        assert!(window.includes("Foo 21 14:30:45 weird"));
        assert!(window.includes("2023-13-40 14:00:00 broken"));
    }

    #[test]
    fn test_line_without_timestamp_is_kept() {
        let window = window_at(2023, 11, 21, 15, 1);
        assert_eq!(
            window.timestamp_of("kernel panic - not syncing"),
            LineTimestamp::Absent
        );
        assert!(window.includes("kernel panic - not syncing"));
    }

    #[test]
    fn test_window_beyond_date_range_is_rejected() {
        assert!(matches!(
            TimeWindow::new(Local::now(), u32::MAX),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(TimeWindow::new(Local::now(), 87_600).is_ok());
    }
}
