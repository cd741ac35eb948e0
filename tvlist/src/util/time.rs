use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get the current time as a UTC datetime.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a UTC instant as local wall-clock time in `tz`.
pub fn format_in(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string()
}

/// The current wall-clock time in `tz`.
pub fn now_in(tz: Tz) -> String {
    format_in(now(), tz)
}

/**
    Format a duration in seconds as `MM:SS`, or `H:MM:SS` once it reaches an hour.
*/
pub fn format_interval(secs: u64) -> String {
    let (hours, rest) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn test_format_in_time_zone() {
        let at = Utc.with_ymd_and_hms(2026, 2, 8, 5, 0, 0).unwrap();
        assert_eq!(format_in(at, chrono_tz::Asia::Shanghai), "2026-02-08 13:00:00");
        assert_eq!(format_in(at, chrono_tz::UTC), "2026-02-08 05:00:00");
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "00:00");
        assert_eq!(format_interval(65), "01:05");
        assert_eq!(format_interval(3600), "1:00:00");
        assert_eq!(format_interval(3725), "1:02:05");
    }
}
