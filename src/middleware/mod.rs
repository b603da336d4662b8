//! Middleware for observability.
//!
//! Request logging with latency tracking. Session gating lives in
//! `auth::middleware`.

pub mod logging;

pub use logging::request_logging;
