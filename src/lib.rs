//! Taskboard Backend Library
//!
//! Multi-user task lists behind password login and signed session tokens.
//! Every task query is scoped to the authenticated owner.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod storage;
pub mod tasks;

pub use api::create_router;
pub use config::Config;
