//! Numeric field extraction (backup duration and transferred volume)
//!
//! Both extractors run independently of category matching. Values are
//! normalized to minutes and megabytes respectively.

use regex::{Regex, RegexBuilder};

const DURATION_PATTERN: &str = r"duration:?\s*(\d+:\d+:\d+|\d+(?:\.\d+)?\s*(?:hours?|hrs?|minutes?|mins?|seconds?|secs?))";
const VOLUME_PATTERN: &str = r"transferred:?\s*(\d+(?:\.\d+)?)\s*(bytes?|KB|MB|GB|TB)";

/// Extracts and normalizes duration and volume values from log lines
#[derive(Debug, Clone)]
pub struct NumericExtractor {
    duration: Regex,
    volume: Regex,
}

impl NumericExtractor {
    /// Compile the extraction patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            duration: RegexBuilder::new(DURATION_PATTERN)
                .case_insensitive(true)
                .build()?,
            volume: RegexBuilder::new(VOLUME_PATTERN)
                .case_insensitive(true)
                .build()?,
        })
    }

    /// Duration mentioned on the line, in minutes
    pub fn duration_minutes(&self, line: &str) -> Option<f64> {
        let captures = self.duration.captures(line)?;
        parse_duration_minutes(captures.get(1)?.as_str())
    }

    /// Transferred volume mentioned on the line, in megabytes
    pub fn transferred_mb(&self, line: &str) -> Option<f64> {
        let captures = self.volume.captures(line)?;
        let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
        volume_to_mb(amount, captures.get(2)?.as_str())
    }
}

/// Parse `HH:MM:SS` or `<N> <unit>` into minutes
///
/// Units: hours/hrs/hr, minutes/mins/min, seconds/secs/sec (singular or plural).
pub fn parse_duration_minutes(value: &str) -> Option<f64> {
    let value = value.trim();

    if value.contains(':') {
        let parts: Vec<f64> = value
            .split(':')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        return match parts.as_slice() {
            [hours, minutes, seconds] => Some(hours * 60.0 + minutes + seconds / 60.0),
            _ => None,
        };
    }

    let split_at = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let amount: f64 = value[..split_at].parse().ok()?;
    let unit = value[split_at..].trim().to_ascii_lowercase();

    if unit.starts_with('h') {
        Some(amount * 60.0)
    } else if unit.starts_with('m') {
        Some(amount)
    } else if unit.starts_with('s') {
        Some(amount / 60.0)
    } else {
        None
    }
}

/// Convert an amount in `unit` to megabytes using 1024 per unit step
pub fn volume_to_mb(amount: f64, unit: &str) -> Option<f64> {
    let unit = unit.to_ascii_lowercase();
    let megabytes = match unit.as_str() {
        "byte" | "bytes" => amount / (1024.0 * 1024.0),
        "kb" => amount / 1024.0,
        "mb" => amount,
        "gb" => amount * 1024.0,
        "tb" => amount * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(megabytes)
}
