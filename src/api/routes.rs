use anyhow::{Context, Result};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{
    api as auth_api, require_session, AccountStore, AuthGate, AuthState, PasswordHasher,
    TokenService,
};
use crate::config::Config;
use crate::middleware::request_logging;
use crate::storage::Database;
use crate::tasks::{api as task_api, TaskState, TaskStore};

/// Every resource route lives under this prefix; `/health` stays at the root
pub const API_PREFIX: &str = "/api";

/// Wire storage, auth and handlers into the application router.
///
/// Everything here runs once at startup; any error is fatal.
pub fn create_router(config: &Config) -> Result<Router> {
    config.validate()?;
    let db = Database::open(&config.db_path, config.db_timeout())?;

    let accounts = Arc::new(AccountStore::new(db.clone())?);
    let tasks = Arc::new(TaskStore::new(db)?);
    let tokens = Arc::new(TokenService::new(
        config.token_secret.clone(),
        config.token_ttl(),
    ));
    let hasher = Arc::new(PasswordHasher::new(&config.password_salt)?);
    let gate = Arc::new(AuthGate::new(tokens.clone(), accounts.clone()));

    let auth_state = AuthState::new(accounts, tokens, hasher, config.cookie_domain.clone());
    let task_state = TaskState::new(tasks);

    let origin = HeaderValue::from_str(&config.allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {}", config.allowed_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    info!(
        db_path = %config.db_path.display(),
        token_ttl_minutes = config.token_ttl_minutes,
        "🔐 Authentication initialized"
    );

    Ok(Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, build_routes(auth_state, task_state, gate))
        .layer(middleware::from_fn(request_logging))
        .layer(cors))
}

fn build_routes(auth_state: AuthState, task_state: TaskState, gate: Arc<AuthGate>) -> Router {
    // Open to anyone
    let public_routes = Router::new()
        .route(
            "/accounts",
            get(auth_api::list_accounts).post(auth_api::register),
        )
        .route("/accounts/login", post(auth_api::login))
        .route("/accounts/lookup", post(auth_api::lookup_account))
        .route("/accounts/:id", get(auth_api::get_account))
        .with_state(auth_state.clone());

    // Session required
    let account_routes = Router::new()
        .route("/accounts", put(auth_api::update_account))
        .route("/accounts/logout", get(auth_api::logout))
        .route("/accounts/me", get(auth_api::get_current_account))
        .route("/accounts/:id", axum::routing::delete(auth_api::delete_account))
        .route_layer(middleware::from_fn_with_state(gate.clone(), require_session))
        .with_state(auth_state);

    let task_routes = Router::new()
        .route(
            "/tasks",
            get(task_api::list_tasks)
                .post(task_api::create_task)
                .put(task_api::update_task)
                .delete(task_api::delete_task),
        )
        .route("/tasks/:id", get(task_api::get_task))
        .route_layer(middleware::from_fn_with_state(gate, require_session))
        .with_state(task_state);

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(task_routes)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
