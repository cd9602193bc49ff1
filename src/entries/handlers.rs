use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    entries::{
        dto::{
            DeleteEntryResponse, EntriesResponse, EntryDetails, EntryResponse, EntrySummary,
            SaveEntryResponse,
        },
        preview::preview,
        repo::SavedEntry,
    },
    error::{ApiError, Result},
    state::AppState,
};

pub fn entry_routes() -> Router<AppState> {
    Router::new()
        .route("/api/save_entry", post(save_entry))
        .route("/api/saved_entries", get(list_entries))
        .route(
            "/api/saved_entries/:id",
            get(get_entry).delete(delete_entry),
        )
}

/// POST /api/save_entry
///
/// Persists the posted JSON verbatim for the authenticated user. An
/// optional top-level `"title"` string names the entry; the payload itself
/// is stored untouched. Owner id comes from the session, never the body.
#[instrument(skip(state, body))]
pub async fn save_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveEntryResponse>)> {
    let Json(data) =
        body.map_err(|_| ApiError::Validation("request body must be valid JSON".into()))?;

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let entry = SavedEntry::create(&state.db, user_id, &title, &data).await?;
    info!(user_id, entry_id = entry.id, "entry saved");
    Ok((
        StatusCode::CREATED,
        Json(SaveEntryResponse {
            success: true,
            id: entry.id,
        }),
    ))
}

/// GET /api/saved_entries
#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<EntriesResponse>> {
    let rows = SavedEntry::list_by_owner(&state.db, user_id).await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let data = row.decoded_data()?;
        entries.push(EntrySummary {
            id: row.id,
            title: row.title,
            created_at: row.created_at,
            preview: preview(&data),
        });
    }
    Ok(Json(EntriesResponse { entries }))
}

/// GET /api/saved_entries/{id}
#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<EntryResponse>> {
    let entry = SavedEntry::get(&state.db, id, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let data = entry.decoded_data()?;
    Ok(Json(EntryResponse {
        entry: EntryDetails {
            id: entry.id,
            title: entry.title,
            created_at: entry.created_at,
            data,
        },
    }))
}

/// DELETE /api/saved_entries/{id}
#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<DeleteEntryResponse>> {
    if !SavedEntry::delete(&state.db, id, user_id).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id, entry_id = id, "entry deleted");
    Ok(Json(DeleteEntryResponse { success: true }))
}
