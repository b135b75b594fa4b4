use chrono::{DateTime, NaiveDateTime, Utc};

/// Text form Postgres uses for `timestamp` columns
const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// Text form Postgres uses for `timestamptz` columns (offset may omit minutes)
const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Parse a timestamp cast to text by the database.
///
/// Values without an offset are taken as UTC. Fractional seconds are kept,
/// so equality against other parsed values is exact.
pub fn parse_db_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_str(raw, OFFSET_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}
