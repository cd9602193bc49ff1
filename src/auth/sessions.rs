use sqlx::{FromRow, SqlitePool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::Result;

pub const SESSION_COOKIE: &str = "session";

/// A server-side session row. The token is the authenticated context:
/// it is created by login, destroyed by logout, and ignored after expiry.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Issue a fresh session for the user. Callers are expected to have
    /// deleted any prior session for the same client first, so a login
    /// always regenerates the session identity.
    pub async fn create(db: &SqlitePool, user_id: i64, ttl_minutes: i64) -> Result<Session> {
        let now = OffsetDateTime::now_utc();
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .bind(now + Duration::minutes(ttl_minutes))
        .fetch_one(db)
        .await?;
        Ok(session)
    }

    /// Resolve a token to a live session. Absent and expired tokens are
    /// both `None`.
    pub async fn find_valid(db: &SqlitePool, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, created_at, expires_at
            FROM sessions
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(session.filter(|s| s.expires_at > OffsetDateTime::now_utc()))
    }

    /// Destroy a session. Deleting an unknown token is a no-op.
    pub async fn delete(db: &SqlitePool, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }
}
