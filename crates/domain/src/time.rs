//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for project creation and modification times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way the programming software writes its own
/// project files: ISO-8601 without an offset, microsecond precision.
#[must_use]
pub fn document_format(ts: Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_format_without_offset() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(document_format(ts), "2025-03-09T14:05:07.000000");
    }
}
