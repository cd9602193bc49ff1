use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;

use crate::auth::sessions::{Session, SESSION_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the session cookie to the authenticated user id.
///
/// This is the single choke point for snapshot authorization: every owner
/// id flows from here, never from client-supplied request fields. Handlers
/// taking `AuthUser` reject anonymous requests with a 401 before touching
/// the store.
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthenticated)?;

        let token = cookies
            .get(SESSION_COOKIE)
            .ok_or(ApiError::Unauthenticated)?;

        let session = Session::find_valid(&state.db, token.value())
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthUser(session.user_id))
    }
}
