use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct SaveEntryResponse {
    pub success: bool,
    pub id: i64,
}

/// List view projection: id, title, timestamp and a small preview of the
/// stored data, never the full payload.
#[derive(Debug, Serialize)]
pub struct EntrySummary {
    pub id: i64,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub preview: Value,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntrySummary>,
}

#[derive(Debug, Serialize)]
pub struct EntryDetails {
    pub id: i64,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry: EntryDetails,
}

#[derive(Debug, Serialize)]
pub struct DeleteEntryResponse {
    pub success: bool,
}
