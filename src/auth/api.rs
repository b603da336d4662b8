//! Account API Endpoints
//! Mission: Registration, login/logout and owner-only account management

use crate::api::{require_non_blank, ApiError};
use crate::auth::{
    account_store::AccountStore,
    jwt::TokenService,
    middleware::{CurrentAccount, TOKEN_COOKIE},
    models::{Account, CredentialsRequest, LoginResponse, UpdateAccountRequest},
    password::PasswordHasher,
};
use crate::storage::StoreError;
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<AccountStore>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<PasswordHasher>,
    pub cookie_domain: String,
}

impl AuthState {
    pub fn new(
        accounts: Arc<AccountStore>,
        tokens: Arc<TokenService>,
        hasher: Arc<PasswordHasher>,
        cookie_domain: String,
    ) -> Self {
        Self {
            accounts,
            tokens,
            hasher,
            cookie_domain,
        }
    }

    /// Cookie carrying a fresh session token; lives as long as the token
    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((TOKEN_COOKIE, token))
            .http_only(true)
            .path("/")
            .domain(self.cookie_domain.clone())
            .max_age(time::Duration::minutes(self.tokens.ttl().num_minutes()))
            .build()
    }

    /// Empty cookie that tells the browser to drop the session
    fn cleared_cookie(&self) -> Cookie<'static> {
        Cookie::build((TOKEN_COOKIE, ""))
            .http_only(true)
            .path("/")
            .domain(self.cookie_domain.clone())
            .max_age(time::Duration::seconds(-1))
            .build()
    }
}

/// Register - POST /api/accounts
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Json(payload) = payload?;
    require_non_blank("name", &payload.name)?;
    require_non_blank("password", &payload.password)?;

    let password_hash = state.hasher.hash(&payload.password);
    let account = state
        .accounts
        .create(payload.name.trim(), &password_hash)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Resolve a name and plaintext password to the matching account
async fn verify_credentials(
    state: &AuthState,
    payload: &CredentialsRequest,
) -> Result<Account, ApiError> {
    let password_hash = state.hasher.hash(&payload.password);
    match state
        .accounts
        .get_by_credential(payload.name.trim(), &password_hash)
        .await
    {
        Ok(account) => Ok(account),
        Err(StoreError::NotFound) => {
            warn!("❌ Credential check failed: {}", payload.name);
            Err(ApiError::InvalidCredentials)
        }
        Err(e) => Err(e.into()),
    }
}

/// Login - POST /api/accounts/login
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(payload) = payload?;
    info!("🔐 Login attempt: {}", payload.name);

    let account = verify_credentials(&state, &payload).await?;

    let token = state.tokens.issue(&account.id).map_err(|e| {
        error!(account_id = %account.id, error = %e, "Failed to issue session token");
        ApiError::Unknown
    })?;

    info!("✅ Login successful: {} ({})", account.name, account.id);

    let jar = jar.add(state.session_cookie(token.clone()));
    Ok((
        jar,
        Json(LoginResponse {
            status: "success".to_string(),
            token,
        }),
    ))
}

/// Credential lookup without a session - POST /api/accounts/lookup
///
/// Returns the account for a matching name and password; no token is issued.
pub async fn lookup_account(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(verify_credentials(&state, &payload).await?))
}

/// Logout - GET /api/accounts/logout
pub async fn logout(
    State(state): State<AuthState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    info!(account_id = %account.id, "Logged out");
    (
        jar.add(state.cleared_cookie()),
        Json(json!({ "status": "success" })),
    )
}

/// Current account - GET /api/accounts/me
pub async fn get_current_account(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<Account> {
    Json(account)
}

/// List accounts - GET /api/accounts
pub async fn list_accounts(
    State(state): State<AuthState>,
) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.accounts.list_all().await?))
}

/// Get account - GET /api/accounts/:id
pub async fn get_account(
    State(state): State<AuthState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Account>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.accounts.get_by_id(&id).await?))
}

/// Rename own account - PUT /api/accounts
pub async fn update_account(
    State(state): State<AuthState>,
    Extension(CurrentAccount(current)): Extension<CurrentAccount>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(payload) = payload?;

    if payload.id != current.id {
        warn!(account_id = %current.id, target = %payload.id, "Refused update of another account");
        return Err(ApiError::Forbidden);
    }
    require_non_blank("name", &payload.name)?;

    let updated = Account {
        name: payload.name.trim().to_string(),
        ..current
    };
    state.accounts.update(&updated).await?;

    Ok(Json(updated))
}

/// Delete own account - DELETE /api/accounts/:id
pub async fn delete_account(
    State(state): State<AuthState>,
    Extension(CurrentAccount(current)): Extension<CurrentAccount>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    if id != current.id {
        warn!(account_id = %current.id, target = %id, "Refused delete of another account");
        return Err(ApiError::Forbidden);
    }

    state.accounts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
