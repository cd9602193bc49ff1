use axum::{
    response::Redirect,
    routing::{get, post},
    extract::{Form, State},
    Router,
};
use tower_cookies::{
    cookie::SameSite,
    Cookie, Cookies,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, RegisterForm},
        password::{hash_password, verify_password},
        repo::User,
        sessions::{Session, SESSION_COOKIE},
    },
    error::{ApiError, Result},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout).post(logout))
}

/// One-shot message surfaced to the next page load, standing in for
/// server-rendered flash messages.
fn flash(cookies: &Cookies, message: &str) {
    let mut cookie = Cookie::new("flash", message.to_string());
    cookie.set_path("/");
    cookies.add(cookie);
}

#[instrument(skip(state, cookies, form))]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".into(),
        ));
    }

    let hash = hash_password(&form.password)?;
    match User::create(&state.db, &username, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            flash(&cookies, "Registration successful. Please log in.");
            Ok(Redirect::to("/"))
        }
        Err(ApiError::DuplicateUsername) => {
            warn!(username = %username, "registration with existing username");
            flash(&cookies, &ApiError::DuplicateUsername.to_string());
            Ok(Redirect::to("/"))
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, cookies, form))]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let username = form.username.trim();

    // Unknown user and wrong password take the same exit.
    let user = User::find_by_username(&state.db, username).await?;
    let verified = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash)?,
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        warn!(username = %username, "login failed");
        flash(&cookies, &ApiError::InvalidCredentials.to_string());
        return Ok(Redirect::to("/"));
    };

    // Regenerate the session identity on every login: any token the
    // client presented before authenticating is discarded.
    if let Some(old) = cookies.get(SESSION_COOKIE) {
        Session::delete(&state.db, old.value()).await?;
    }
    let session = Session::create(&state.db, user.id, state.config.session_ttl_minutes).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(time::Duration::minutes(state.config.session_ttl_minutes));
    cookies.add(cookie);

    info!(user_id = user.id, username = %user.username, "user logged in");
    flash(&cookies, "Logged in.");
    Ok(Redirect::to("/"))
}

#[instrument(skip(state, cookies))]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Redirect> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        Session::delete(&state.db, cookie.value()).await?;
        let mut removal = Cookie::new(SESSION_COOKIE, "");
        removal.set_path("/");
        cookies.remove(removal);
        info!("session cleared");
    }
    Ok(Redirect::to("/"))
}
