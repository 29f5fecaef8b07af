/// Configuration management for Post Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use crypto_core::jwt::JwtKeys;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Logging configuration
    pub log: LogConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT key material (PEM)
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub public_key_pem: String,
    /// Only needed by deployments that mint tokens
    pub private_key_pem: Option<String>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("public_key_pem", &"<redacted>")
            .field("private_key_pem", &self.private_key_pem.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl JwtConfig {
    /// Signing keys when a private key is configured, validation-only otherwise
    pub fn keys(&self) -> Result<JwtKeys> {
        let keys = match &self.private_key_pem {
            Some(private) => JwtKeys::from_pem(private, &self.public_key_pem),
            None => JwtKeys::validation_only(&self.public_key_pem),
        };
        keys.map_err(|e| anyhow::anyhow!("Failed to load JWT keys: {e}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// EnvFilter directives
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::Json,
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_log_filter() -> String {
    "post_service=info,info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_connections),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_connections),
        };

        let jwt = JwtConfig {
            public_key_pem: std::env::var("JWT_PUBLIC_KEY_PEM")
                .context("JWT_PUBLIC_KEY_PEM environment variable not set")?,
            private_key_pem: std::env::var("JWT_PRIVATE_KEY_PEM").ok(),
        };

        let format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            Ok("json") | Err(_) => LogFormat::Json,
            Ok(other) => anyhow::bail!("unsupported LOG_FORMAT: {other}"),
        };
        let log = LogConfig {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_filter()),
            format,
        };

        Ok(Config {
            app,
            database,
            jwt,
            log,
        })
    }

    /// Build the PostgreSQL pool described by `database`
    pub async fn connect_pool(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&self.database.url)
            .await
            .context("Failed to connect to PostgreSQL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_optional() {
        for key in [
            "APP_ENV",
            "DB_MAX_CONNECTIONS",
            "DB_MIN_CONNECTIONS",
            "JWT_PRIVATE_KEY_PEM",
            "RUST_LOG",
            "LOG_FORMAT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_optional();
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_PUBLIC_KEY_PEM", "pem");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 5);
        assert!(config.jwt.private_key_pem.is_none());
        assert_eq!(config.log.filter, "post_service=info,info");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_missing_database_url_fails() {
        clear_optional();
        std::env::remove_var("DATABASE_URL");
        std::env::set_var("JWT_PUBLIC_KEY_PEM", "pem");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn test_unknown_log_format_fails() {
        clear_optional();
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_PUBLIC_KEY_PEM", "pem");
        std::env::set_var("LOG_FORMAT", "xml");

        assert!(Config::from_env().is_err());
        std::env::remove_var("LOG_FORMAT");
    }

    #[test]
    fn test_jwt_keys_sign_only_with_private_key() {
        let public_key_pem =
            include_str!("../../libs/crypto-core/tests/fixtures/test_public_key.pem").to_string();
        let private_key_pem =
            include_str!("../../libs/crypto-core/tests/fixtures/test_private_key.pem").to_string();

        let validating = JwtConfig {
            public_key_pem: public_key_pem.clone(),
            private_key_pem: None,
        };
        assert!(!validating.keys().unwrap().can_sign());

        let signing = JwtConfig {
            public_key_pem,
            private_key_pem: Some(private_key_pem),
        };
        assert!(signing.keys().unwrap().can_sign());

        let broken = JwtConfig {
            public_key_pem: "not a pem".to_string(),
            private_key_pem: None,
        };
        assert!(broken.keys().is_err());
    }

    #[test]
    fn test_jwt_config_debug_redacts_keys() {
        let jwt = JwtConfig {
            public_key_pem: "secret-public".into(),
            private_key_pem: Some("secret-private".into()),
        };
        let rendered = format!("{:?}", jwt);
        assert!(!rendered.contains("secret"));
    }
}
