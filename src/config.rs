//! Application Configuration
//! Mission: Read settings once at startup into an immutable value

use anyhow::{bail, Result};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Longest accepted session lifetime: 30 days
pub const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Runtime settings, from flags or `TASKBOARD_*` environment variables
#[derive(Parser, Clone)]
#[command(name = "taskboard")]
#[command(about = "Multi-user task list API with session-token authentication")]
pub struct Config {
    /// Path to the SQLite database
    #[arg(long, env = "TASKBOARD_DB_PATH", default_value = "taskboard.db")]
    pub db_path: PathBuf,

    /// Upper bound on any single storage call, in milliseconds
    #[arg(long, env = "TASKBOARD_DB_TIMEOUT_MS", default_value = "5000")]
    pub db_timeout_ms: u64,

    /// Secret used to sign session tokens
    #[arg(long, env = "TASKBOARD_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: String,

    /// Session token lifetime (also the cookie max-age), in minutes
    #[arg(long, env = "TASKBOARD_TOKEN_TTL_MINUTES", default_value = "60")]
    pub token_ttl_minutes: i64,

    /// Process-wide salt for password digests
    #[arg(long, env = "TASKBOARD_PASSWORD_SALT", hide_env_values = true)]
    pub password_salt: String,

    /// Domain attribute of the session cookie
    #[arg(long, env = "TASKBOARD_COOKIE_DOMAIN", default_value = "localhost")]
    pub cookie_domain: String,

    /// Origin allowed by CORS
    #[arg(long, env = "TASKBOARD_ALLOWED_ORIGIN", default_value = "http://localhost")]
    pub allowed_origin: String,

    #[arg(long, env = "TASKBOARD_BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    #[arg(long, env = "TASKBOARD_PORT", default_value = "8080")]
    pub port: u16,
}

impl Config {
    /// Reject settings that would only fail later, at request time
    pub fn validate(&self) -> Result<()> {
        if self.token_secret.trim().is_empty() {
            bail!("TASKBOARD_TOKEN_SECRET must not be empty");
        }
        if self.password_salt.trim().is_empty() {
            bail!("TASKBOARD_PASSWORD_SALT must not be empty");
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.token_ttl_minutes) {
            bail!(
                "TASKBOARD_TOKEN_TTL_MINUTES must be between 1 and {} (got {})",
                MAX_TOKEN_TTL_MINUTES,
                self.token_ttl_minutes
            );
        }
        if self.db_timeout_ms == 0 {
            bail!("TASKBOARD_DB_TIMEOUT_MS must be positive");
        }
        Ok(())
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

// Secrets stay out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &self.db_path)
            .field("db_timeout_ms", &self.db_timeout_ms)
            .field("token_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("password_salt", &"<redacted>")
            .field("cookie_domain", &self.cookie_domain)
            .field("allowed_origin", &self.allowed_origin)
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .finish()
    }
}
