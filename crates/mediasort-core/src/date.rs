use chrono::{DateTime, FixedOffset, NaiveDateTime};
use thiserror::Error;

/// A parsed capture time: wall-clock fields plus the UTC offset, when the
/// source string carried one. Always at least second precision - partial
/// dates are rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureInstant {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl CaptureInstant {
    /// Unix timestamp for mtime stamping. Offset-less instants are
    /// interpreted in local time.
    pub fn timestamp(&self) -> Option<i64> {
        use chrono::TimeZone;
        match self.offset {
            Some(offset) => offset
                .from_local_datetime(&self.local)
                .single()
                .map(|dt| dt.timestamp()),
            None => self
                .local
                .and_local_timezone(chrono::Local)
                .single()
                .map(|dt| dt.timestamp()),
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized capture time format: {0:?}")]
pub struct DateParseError(pub String);

/// Parse a raw timestamp string from whichever provider supplied it.
/// Tries a fixed ordered list of formats, first full match wins; trailing
/// unparsed input fails a pattern, which is what lets the offset variant of
/// the exiftool format fall through to the last pattern.
pub fn parse_capture_instant(raw: &str) -> Result<CaptureInstant, DateParseError> {
    let s = raw.trim();

    // exiftool: "2023:05:01 10:15:22"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Ok(CaptureInstant {
            local: dt,
            offset: None,
        });
    }

    // mdls: "2023-05-01 10:15:22 +0200"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(CaptureInstant {
            local: dt.naive_local(),
            offset: Some(*dt.offset()),
        });
    }

    // ffprobe: "2023-05-01T10:15:22.123456Z" - fraction required, Z is UTC
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S.%fZ") {
        return Ok(CaptureInstant {
            local: dt,
            offset: FixedOffset::east_opt(0),
        });
    }

    // exiftool with offset appended: "2023:05:01 10:15:22+0200"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S%z") {
        return Ok(CaptureInstant {
            local: dt.naive_local(),
            offset: Some(*dt.offset()),
        });
    }

    Err(DateParseError(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn fields(i: &CaptureInstant) -> (i32, u32, u32, u32, u32, u32) {
        let d = i.local;
        (
            d.year(),
            d.month(),
            d.day(),
            d.hour(),
            d.minute(),
            d.second(),
        )
    }

    #[test]
    fn test_exiftool_format() {
        let i = parse_capture_instant("2023:05:01 10:15:22").unwrap();
        assert_eq!(fields(&i), (2023, 5, 1, 10, 15, 22));
        assert!(i.offset.is_none());
    }

    #[test]
    fn test_creation_date_format() {
        let i = parse_capture_instant("2023-05-01 10:15:22 +0200").unwrap();
        assert_eq!(fields(&i), (2023, 5, 1, 10, 15, 22));
        assert_eq!(i.offset, FixedOffset::east_opt(2 * 3600));
    }

    #[test]
    fn test_container_format() {
        let i = parse_capture_instant("2023-05-01T10:15:22.123456Z").unwrap();
        assert_eq!(fields(&i), (2023, 5, 1, 10, 15, 22));
        assert_eq!(i.offset, FixedOffset::east_opt(0));
    }

    #[test]
    fn test_exiftool_offset_format() {
        let i = parse_capture_instant("2023:05:01 10:15:22+0200").unwrap();
        assert_eq!(fields(&i), (2023, 5, 1, 10, 15, 22));
        assert_eq!(i.offset, FixedOffset::east_opt(2 * 3600));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert!(parse_capture_instant(" 2023:05:01 10:15:22\n").is_ok());
    }

    #[test]
    fn test_unrecognized_strings_fail() {
        assert!(parse_capture_instant("not-a-date").is_err());
        assert!(parse_capture_instant("").is_err());
        // Partial dates carry no time of day and are not accepted
        assert!(parse_capture_instant("2023:05:01").is_err());
        // Trailing garbage fails the whole pattern
        assert!(parse_capture_instant("2023:05:01 10:15:22 tomorrow").is_err());
        // The container format requires its fractional part
        assert!(parse_capture_instant("2023-05-01T10:15:22Z").is_err());
    }
}
