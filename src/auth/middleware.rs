//! Authentication Middleware
//! Mission: Admit a request only once its session token resolves to a live account

use crate::api::ApiError;
use crate::auth::{account_store::AccountStore, jwt::TokenService, models::Account};
use crate::storage::StoreError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

/// Identity resolved for the current request
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

/// Per-request session gate. Holds no state across requests.
pub struct AuthGate {
    tokens: Arc<TokenService>,
    accounts: Arc<AccountStore>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, accounts: Arc<AccountStore>) -> Self {
        Self { tokens, accounts }
    }

    /// Resolve the account behind the request's session token
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<Account, ApiError> {
        let token = extract_token(headers).ok_or(ApiError::Unauthenticated)?;

        let subject = self.tokens.validate(&token).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ApiError::Unauthenticated
        })?;

        match self.accounts.get_by_id(&subject).await {
            Ok(account) => Ok(account),
            Err(StoreError::NotFound) => {
                warn!(account_id = %subject, "Token subject no longer exists");
                Err(ApiError::Forbidden)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Pull the candidate token: `Authorization: Bearer` first, then the cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        CookieJar::from_headers(headers)
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Auth middleware that gates every protected route
pub async fn require_session(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = gate.authorize(req.headers()).await?;

    // Handlers read the identity from request extensions
    req.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(req).await)
}
