//! Authentication Module
//! Mission: Password digests, session tokens, and the gate in front of protected routes

pub mod account_store;
pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use account_store::AccountStore;
pub use api::AuthState;
pub use jwt::{TokenError, TokenService};
pub use middleware::{require_session, AuthGate, CurrentAccount};
pub use password::PasswordHasher;
