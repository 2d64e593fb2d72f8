//! Small time helpers shared by the orchestrator's components.

use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;

/// Render a duration the way operator-facing logs and reports want it:
/// `1h 02m 03s`, dropping leading zero units.
pub fn human_duration(d: Duration) -> String {
    let total = d.as_secs();
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Truncate a wall-clock instant down to the start of its hour, used to
/// key the hourly health CSV and its rollover.
pub fn hour_bucket(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(t.hour(), 0, 0)
        .unwrap()
        .and_utc()
}

/// Filename-safe stamp for the hourly CSV: `YYYYMMDD-HH0000`.
pub fn hour_stamp(t: DateTime<Utc>) -> String {
    t.format("%Y%m%d-%H0000").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(human_duration(Duration::from_secs(5)), "5s");
        assert_eq!(human_duration(Duration::from_secs(65)), "1m 05s");
        assert_eq!(human_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }

    #[test]
    fn hour_stamp_format() {
        let t = DateTime::parse_from_rfc3339("2026-07-27T04:03:11Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(hour_stamp(t), "20260727-040000");
        assert_eq!(hour_bucket(t).hour(), 4);
        assert_eq!(hour_bucket(t).minute(), 0);
    }
}
