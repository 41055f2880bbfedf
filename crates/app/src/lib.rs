//! Gatehouse application composition root
//!
//! Wires the stores, the auth backend and the email collaborator into the
//! Accounts router and wraps it in the cross-cutting HTTP layers.

pub mod rate_limit;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use gatehouse_accounts::{AccountSettings, AccountsState, PgAccountStore};
use gatehouse_auth::{AuthBackend, AuthConfig};
use gatehouse_common::{Argon2Hasher, Config, Error};
use gatehouse_email::EmailService;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use rate_limit::RateLimiter;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Apply pending SQL migrations
pub async fn migrate(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Build the Accounts state over Postgres
pub fn build_state(config: &Config, pool: PgPool, email: Arc<dyn EmailService>) -> AccountsState {
    AccountsState {
        accounts: Arc::new(PgAccountStore::new(pool.clone())),
        auth: AuthBackend::postgres(pool, AuthConfig::from(config)),
        email,
        hasher: Arc::new(Argon2Hasher::new()),
        settings: AccountSettings::from(config),
    }
}

/// Create the main application router with all routes and middleware
pub fn create_app(config: &Config, state: AccountsState) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_per_second,
        config.rate_limit_burst,
    ));
    let app_name = config.app_name.clone();

    Router::new()
        .route("/health-check", get(move || health_check(app_name.clone())))
        .route("/", get(root))
        .merge(gatehouse_accounts::routes(&state).with_state(state))
        .fallback(not_found)
        .layer(from_fn_with_state(limiter, rate_limit::rate_limit))
        .layer(body_limit_layer())
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// CORS from a comma-separated origin list; `*` allows any origin
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.split(',').any(|o| o.trim() == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

async fn health_check(app: String) -> Json<Value> {
    Json(json!({ "status": "ok", "app": app }))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

async fn not_found() -> Error {
    Error::NotFound("Resource not found".to_string())
}
