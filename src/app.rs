use std::net::SocketAddr;

use axum::{response::Html, routing::get, Router};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, backlog, collector, entries};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>IP Address Information Tool</title></head>
<body>
<h1>IP Address Information Tool</h1>
<p>Endpoints: /api/ip_info, /api/local_info, /api/backlog,
/api/save_entry, /api/saved_entries</p>
<form method="post" action="/register">
  <input name="username" placeholder="username">
  <input name="password" type="password" placeholder="password">
  <button>Register</button>
</form>
<form method="post" action="/login">
  <input name="username" placeholder="username">
  <input name="password" type="password" placeholder="password">
  <button>Login</button>
</form>
<a href="/logout">Logout</a>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(auth::router())
        .merge(entries::router())
        .merge(collector::handlers::collector_routes())
        .merge(backlog::router())
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_env() -> (Router, AppState) {
        let state = AppState::for_tests().await;
        (build_app(state.clone()), state)
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn api(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn session_cookie(response: &axum::http::Response<Body>) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    fn flash_cookie(response: &axum::http::Response<Body>) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("flash="))
            .map(str::to_string)
    }

    async fn body_json(response: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
        let creds = format!("username={username}&password={password}");
        let response = app
            .clone()
            .oneshot(form("/register", &creds))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(form("/login", &creds))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("session cookie set after login")
    }

    async fn entry_count(state: &AppState) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM saved_entries")
            .fetch_one(&state.db)
            .await
            .expect("count")
    }

    #[tokio::test]
    async fn index_serves_landing_page() {
        let (app, _state) = test_env().await;
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .expect("index");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert!(String::from_utf8_lossy(&bytes).contains("IP Address Information Tool"));
    }

    #[tokio::test]
    async fn unauthenticated_snapshot_calls_return_401_and_do_not_mutate() {
        let (app, state) = test_env().await;

        let requests = vec![
            api(Method::POST, "/api/save_entry", None, Some(json!({"a": 1}))),
            api(Method::GET, "/api/saved_entries", None, None),
            api(Method::GET, "/api/saved_entries/1", None, None),
            api(Method::DELETE, "/api/saved_entries/1", None, None),
        ];
        for request in requests {
            let response = app.clone().oneshot(request).await.expect("request");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert!(body["error"].is_string());
        }
        assert_eq!(entry_count(&state).await, 0);
    }

    #[tokio::test]
    async fn save_list_fetch_delete_scenario() {
        let (app, _state) = test_env().await;
        let cookie = register_and_login(&app, "alice", "pw1").await;

        let payload = json!({
            "addresses": {"ipv4": "1.2.3.4"},
            "geolocation": {"city": "X"}
        });
        let response = app
            .clone()
            .oneshot(api(
                Method::POST,
                "/api/save_entry",
                Some(&cookie),
                Some(payload.clone()),
            ))
            .await
            .expect("save");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        let id = body["id"].as_i64().expect("entry id");

        let response = app
            .clone()
            .oneshot(api(Method::GET, "/api/saved_entries", Some(&cookie), None))
            .await
            .expect("list");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let entries = body["entries"].as_array().expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], json!(id));
        assert_eq!(entries[0]["title"], json!(""));
        assert_eq!(
            entries[0]["preview"],
            json!({"ipv4": "1.2.3.4", "city": "X"})
        );

        let response = app
            .clone()
            .oneshot(api(
                Method::GET,
                &format!("/api/saved_entries/{id}"),
                Some(&cookie),
                None,
            ))
            .await
            .expect("fetch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["entry"]["data"], payload);

        let response = app
            .clone()
            .oneshot(api(
                Method::DELETE,
                &format!("/api/saved_entries/{id}"),
                Some(&cookie),
                None,
            ))
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], json!(true));

        // a second delete now reports not found
        let response = app
            .clone()
            .oneshot(api(
                Method::DELETE,
                &format!("/api/saved_entries/{id}"),
                Some(&cookie),
                None,
            ))
            .await
            .expect("redelete");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_entry_title_field_names_the_entry() {
        let (app, _state) = test_env().await;
        let cookie = register_and_login(&app, "alice", "pw1").await;

        let payload = json!({"title": "home connection", "addresses": {"ipv4": "9.9.9.9"}});
        let response = app
            .clone()
            .oneshot(api(
                Method::POST,
                "/api/save_entry",
                Some(&cookie),
                Some(payload.clone()),
            ))
            .await
            .expect("save");
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(api(
                Method::GET,
                &format!("/api/saved_entries/{id}"),
                Some(&cookie),
                None,
            ))
            .await
            .expect("fetch");
        let body = body_json(response).await;
        assert_eq!(body["entry"]["title"], json!("home connection"));
        // the stored payload keeps the title field
        assert_eq!(body["entry"]["data"], payload);
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_400() {
        let (app, state) = test_env().await;
        let cookie = register_and_login(&app, "alice", "pw1").await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/save_entry")
            .header(header::COOKIE, &cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.expect("save");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(entry_count(&state).await, 0);
    }

    #[tokio::test]
    async fn users_cannot_see_each_others_entries() {
        let (app, _state) = test_env().await;
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;

        let response = app
            .clone()
            .oneshot(api(
                Method::POST,
                "/api/save_entry",
                Some(&alice),
                Some(json!({"secret": true})),
            ))
            .await
            .expect("save");
        let id = body_json(response).await["id"].as_i64().unwrap();

        // bob gets a uniform not-found on alice's entry
        for method in [Method::GET, Method::DELETE] {
            let response = app
                .clone()
                .oneshot(api(
                    method,
                    &format!("/api/saved_entries/{id}"),
                    Some(&bob),
                    None,
                ))
                .await
                .expect("request");
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let response = app
            .clone()
            .oneshot(api(Method::GET, "/api/saved_entries", Some(&bob), None))
            .await
            .expect("list");
        assert_eq!(body_json(response).await["entries"], json!([]));

        // and alice still owns it
        let response = app
            .clone()
            .oneshot(api(
                Method::GET,
                &format!("/api/saved_entries/{id}"),
                Some(&alice),
                None,
            ))
            .await
            .expect("fetch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_the_original_credentials() {
        let (app, _state) = test_env().await;

        let response = app
            .clone()
            .oneshot(form("/register", "username=alice&password=pw1"))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(form("/register", "username=alice&password=other"))
            .await
            .expect("re-register");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let flash = flash_cookie(&response).expect("flash set");
        assert!(flash.contains("already taken"));

        // original password still logs in
        let response = app
            .clone()
            .oneshot(form("/login", "username=alice&password=pw1"))
            .await
            .expect("login");
        assert!(session_cookie(&response).is_some());

        // the second registration's password does not
        let response = app
            .clone()
            .oneshot(form("/login", "username=alice&password=other"))
            .await
            .expect("login");
        assert!(session_cookie(&response).is_none());
        assert!(flash_cookie(&response)
            .expect("flash set")
            .contains("Invalid username or password"));
    }

    #[tokio::test]
    async fn empty_registration_fields_are_rejected() {
        let (app, _state) = test_env().await;
        for body in ["username=&password=pw", "username=alice&password="] {
            let response = app
                .clone()
                .oneshot(form("/register", body))
                .await
                .expect("register");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn login_regenerates_the_session() {
        let (app, _state) = test_env().await;
        let first = register_and_login(&app, "alice", "pw1").await;

        // logging in again while presenting the old cookie invalidates it
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::COOKIE, &first)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=alice&password=pw1"))
            .unwrap();
        let response = app.clone().oneshot(request).await.expect("relogin");
        let second = session_cookie(&response).expect("fresh session");
        assert_ne!(first, second);

        let response = app
            .clone()
            .oneshot(api(Method::GET, "/api/saved_entries", Some(&first), None))
            .await
            .expect("list with stale session");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(api(Method::GET, "/api/saved_entries", Some(&second), None))
            .await
            .expect("list with fresh session");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_destroys_the_session_and_is_idempotent() {
        let (app, _state) = test_env().await;
        let cookie = register_and_login(&app, "alice", "pw1").await;

        let response = app
            .clone()
            .oneshot(api(Method::GET, "/logout", Some(&cookie), None))
            .await
            .expect("logout");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(api(Method::GET, "/api/saved_entries", Some(&cookie), None))
            .await
            .expect("list after logout");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // logging out while anonymous is a no-op
        let response = app
            .clone()
            .oneshot(api(Method::GET, "/logout", None, None))
            .await
            .expect("anonymous logout");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn backlog_endpoint_is_public() {
        let (app, _state) = test_env().await;
        let response = app
            .oneshot(api(Method::GET, "/api/backlog", None, None))
            .await
            .expect("backlog");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_items"], json!(10));
    }
}
