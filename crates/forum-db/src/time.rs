use chrono::{DateTime, NaiveDateTime, Utc};

/// SQLite's `datetime('now')` layout. Stored timestamps use it so they compare
/// correctly against `datetime('now')` in SQL.
pub const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(SQLITE_FORMAT).to_string()
}

/// Accepts the SQLite layout (naive, UTC) as well as RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, SQLITE_FORMAT)
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sqlite_layout_round_trips() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap();
        let stored = format_timestamp(ts);
        assert_eq!(stored, "2024-03-09 17:04:05");
        assert_eq!(parse_timestamp(&stored), Some(ts));
    }

    #[test]
    fn accepts_rfc3339() {
        let parsed = parse_timestamp("2024-03-09T17:04:05Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
