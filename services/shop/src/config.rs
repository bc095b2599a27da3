//! Service configuration
//!
//! Built-in defaults are layered under environment variables prefixed with
//! `SHOP_`.
//!
//! # Environment Variables
//! - `SHOP_BIND_ADDRESS`: listen address (default: 0.0.0.0:8080)
//! - `SHOP_DATA_DIR`: directory holding the JSON collections (default: data)
//! - `SHOP_SESSION_SECRET`: HS256 signing secret for session tokens
//! - `SHOP_SESSION_TTL_SECONDS`: session lifetime (default: 86400)
//! - `SHOP_LOGIN_MAX_ATTEMPTS`: login attempts per window (default: 5)
//! - `SHOP_LOGIN_WINDOW_SECONDS`: attempt counting window (default: 300)
//! - `SHOP_LOGIN_BAN_SECONDS`: lockout once the limit is hit (default: 900)
//! - `SHOP_ADMIN_USERNAME` / `SHOP_ADMIN_PASSWORD` / `SHOP_ADMIN_EMAIL`:
//!   optional bootstrap administrator

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

use crate::rate_limiter::RateLimiterConfig;

const DEFAULT_SESSION_SECRET: &str = "shop-development-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub session_secret: String,
    pub session_ttl_seconds: u64,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

/// Credentials for the administrator created at startup
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl AppConfig {
    /// Load configuration from defaults and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("data_dir", "data")?
            .set_default("session_secret", DEFAULT_SESSION_SECRET)?
            .set_default("session_ttl_seconds", 86_400_i64)?
            .set_default("login_max_attempts", 5_i64)?
            .set_default("login_window_seconds", 300_i64)?
            .set_default("login_ban_seconds", 900_i64)?
            .add_source(Environment::with_prefix("SHOP").try_parsing(true))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        if app_config.session_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "SHOP_SESSION_SECRET must not be blank".to_string(),
            ));
        }
        if app_config.data_dir.to_string_lossy().trim().is_empty() {
            return Err(ConfigError::Message(
                "SHOP_DATA_DIR must not be blank".to_string(),
            ));
        }
        if app_config.session_ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "SHOP_SESSION_TTL_SECONDS must be positive".to_string(),
            ));
        }

        Ok(app_config)
    }

    /// Defaults rooted at `data_dir`, without consulting the environment
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.into(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_seconds: 86_400,
            login_max_attempts: 5,
            login_window_seconds: 300,
            login_ban_seconds: 900,
            admin_username: None,
            admin_password: None,
            admin_email: None,
        }
    }

    /// Whether the well-known development secret is still in use
    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == DEFAULT_SESSION_SECRET
    }

    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.login_max_attempts,
            window_seconds: self.login_window_seconds,
            ban_duration_seconds: self.login_ban_seconds,
        }
    }

    /// The bootstrap administrator, when both username and password are set
    pub fn admin_bootstrap(&self) -> Option<AdminBootstrap> {
        let username = self.admin_username.as_deref()?.trim();
        let password = self.admin_password.as_deref()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }

        Some(AdminBootstrap {
            username: username.to_string(),
            password: password.to_string(),
            email: self
                .admin_email
                .clone()
                .unwrap_or_else(|| format!("{username}@localhost")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SHOP_BIND_ADDRESS",
        "SHOP_DATA_DIR",
        "SHOP_SESSION_SECRET",
        "SHOP_SESSION_TTL_SECONDS",
        "SHOP_LOGIN_MAX_ATTEMPTS",
        "SHOP_ADMIN_USERNAME",
        "SHOP_ADMIN_PASSWORD",
        "SHOP_ADMIN_EMAIL",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.session_ttl_seconds, 86_400);
        assert_eq!(config.rate_limiter().max_attempts, 5);
        assert!(config.uses_default_secret());
        assert!(config.admin_bootstrap().is_none());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("SHOP_BIND_ADDRESS", "127.0.0.1:9000");
            std::env::set_var("SHOP_DATA_DIR", "/tmp/shop");
            std::env::set_var("SHOP_SESSION_TTL_SECONDS", "60");
            std::env::set_var("SHOP_LOGIN_MAX_ATTEMPTS", "2");
            std::env::set_var("SHOP_ADMIN_USERNAME", "root");
            std::env::set_var("SHOP_ADMIN_PASSWORD", "rootpass");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shop"));
        assert_eq!(config.session_ttl_seconds, 60);
        assert_eq!(config.rate_limiter().max_attempts, 2);

        let admin = config.admin_bootstrap().unwrap();
        assert_eq!(admin.username, "root");
        assert_eq!(admin.email, "root@localhost");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_secret_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("SHOP_SESSION_SECRET", "  ");
        }

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_data_dir_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("SHOP_DATA_DIR", "  ");
        }

        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("SHOP_DATA_DIR"));

        clear_env();
    }
}
