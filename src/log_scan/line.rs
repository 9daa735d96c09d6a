/// Log line model
///
/// A single line of application log text with its stream position and the
/// time-of-day token embedded in it (if any).
use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;

/// One immutable line of log text
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// 0-based position of the line in its stream
    pub sequence_index: usize,
    /// Time-of-day found in the text, `None` when absent or unparseable
    pub timestamp: Option<NaiveTime>,
    /// Raw line text without the trailing newline
    pub text: String,
}

impl LogLine {
    /// Create a log line, extracting its timestamp from the text
    pub fn new(sequence_index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let timestamp = parse_time_of_day(&text);
        Self {
            sequence_index,
            timestamp,
            text,
        }
    }
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|\D)(\d{1,2}):(\d{2}):(\d{2})(?:[.,](\d{1,9}))?")
            .expect("time-of-day pattern is valid")
    })
}

/// Extract the first valid `HH:MM:SS[.fraction]` token from a line
///
/// Tokens that look like a time but are out of range (e.g. `27:61:00`) are
/// skipped rather than treated as errors.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    time_pattern().captures_iter(text).find_map(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        let second: u32 = caps.get(3)?.as_str().parse().ok()?;
        let nanos = match caps.get(4) {
            Some(fraction) => {
                let digits = fraction.as_str();
                let padded = format!("{:0<9}", digits);
                padded.parse::<u32>().ok()?
            }
            None => 0,
        };
        NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
    })
}

/// Split a block of log text into sequentially indexed lines
///
/// Handles both `\n` and `\r\n` terminators. A trailing line without a
/// newline is still yielded.
pub fn lines_from_text(text: &str) -> impl Iterator<Item = LogLine> + '_ {
    text.lines()
        .enumerate()
        .map(|(index, line)| LogLine::new(index, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bracketed_timestamp() {
        let time = parse_time_of_day("[14:03:27.512] State changed").unwrap();
        assert_eq!(time, NaiveTime::from_hms_milli_opt(14, 3, 27, 512).unwrap());
    }

    #[test]
    fn test_parse_iso_datetime_timestamp() {
        let time = parse_time_of_day("2025-03-01T09:15:00 boot").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
    }

    #[test]
    fn test_missing_timestamp_is_none() {
        assert!(parse_time_of_day("no time here").is_none());
        assert!(parse_time_of_day("").is_none());
    }

    #[test]
    fn test_out_of_range_timestamp_skipped() {
        assert!(parse_time_of_day("[27:61:00] bogus").is_none());

        let time = parse_time_of_day("[27:61:00] then [01:02:03]").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(1, 2, 3).unwrap());
    }

    #[test]
    fn test_lines_from_text_indices() {
        let lines: Vec<LogLine> = lines_from_text("a\r\nb\nc").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "a");
        assert_eq!(lines[2].sequence_index, 2);
        assert_eq!(lines[2].text, "c");
    }
}
