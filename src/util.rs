use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Current UTC time as an RFC 3339 string, for response timestamps.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
