//! Authentication Models
//! Mission: Define account and session data structures

use serde::{Deserialize, Serialize};

/// Account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub password_hash: String, // never serialize
}

/// JWT Claims payload (all instants are unix seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (account id)
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Registration and login request body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub name: String,
    pub password: String,
}

/// Account rename request body
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub id: String,
    pub name: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
}
