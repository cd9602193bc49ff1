use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod sessions;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
