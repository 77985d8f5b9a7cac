//! Process configuration, read once at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use storefront_auth::BcryptHasher;
use storefront_observability::LogFormat;

use crate::AdminSeed;

const DEV_SECRET: &str = "dev-secret";

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key} ('{value}'): {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Immutable settings injected into the services at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub store_timeout: Duration,
    pub bcrypt_cost: u32,
    pub admin: AdminSeed,
    /// Allowed CORS origin; `None` disables CORS.
    pub frontend_url: Option<String>,
    /// Postgres DSN; `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("admin", &self.admin)
            .field("frontend_url", &self.frontend_url)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;

        let ttl_secs: i64 = parse_or(&get, "TOKEN_TTL_SECS", 3600)?;
        if ttl_secs <= 0 {
            return Err(invalid("TOKEN_TTL_SECS", ttl_secs, "must be positive"));
        }
        if ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(invalid(
                "TOKEN_TTL_SECS",
                ttl_secs,
                format!("must not exceed {MAX_TOKEN_TTL_SECS}"),
            ));
        }
        let token_ttl = chrono::TimeDelta::try_seconds(ttl_secs)
            .ok_or_else(|| invalid("TOKEN_TTL_SECS", ttl_secs, "out of range"))?;

        let timeout_ms: u64 = parse_or(&get, "STORE_TIMEOUT_MS", 2000)?;
        if timeout_ms == 0 {
            return Err(invalid("STORE_TIMEOUT_MS", timeout_ms, "must be positive"));
        }

        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", BcryptHasher::default().cost())?;
        BcryptHasher::new(bcrypt_cost).map_err(|e| invalid("BCRYPT_COST", bcrypt_cost, e))?;

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => LogFormat::from_str(&raw).map_err(|e| invalid("LOG_FORMAT", &raw, e))?,
            None => LogFormat::default(),
        };

        let defaults = AdminSeed::default();
        let admin = AdminSeed {
            username: get("ADMIN_USERNAME").unwrap_or(defaults.username),
            email: get("ADMIN_EMAIL").unwrap_or(defaults.email),
            password: get("ADMIN_PASSWORD").unwrap_or(defaults.password),
        };

        Ok(Self {
            bind_addr,
            jwt_secret: get("JWT_SECRET").unwrap_or_else(|| DEV_SECRET.to_string()),
            token_ttl,
            store_timeout: Duration::from_millis(timeout_ms),
            bcrypt_cost,
            admin,
            frontend_url: get("FRONTEND_URL"),
            database_url: get("DATABASE_URL"),
            log_format,
        })
    }

    /// Settings that are fine for local runs but must not reach production.
    ///
    /// Returned rather than logged so the caller can report them once logging
    /// is initialized.
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.jwt_secret == DEV_SECRET {
            warnings.push("JWT_SECRET not set; using insecure dev default");
        }
        if self.admin.password == AdminSeed::default().password {
            warnings.push("ADMIN_PASSWORD not set; bootstrap admin uses the default password");
        }
        warnings
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e| invalid(key, &raw, e)),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.token_ttl, chrono::Duration::hours(1));
        assert_eq!(cfg.store_timeout, Duration::from_secs(2));
        assert_eq!(cfg.admin, AdminSeed::default());
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.insecure_defaults().len(), 2);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "prod-secret"),
            ("TOKEN_TTL_SECS", "60"),
            ("BCRYPT_COST", "4"),
            ("ADMIN_PASSWORD", "hunter22"),
            ("FRONTEND_URL", "http://localhost:5173"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.token_ttl, chrono::Duration::seconds(60));
        assert_eq!(cfg.bcrypt_cost, 4);
        assert_eq!(cfg.frontend_url.as_deref(), Some("http://localhost:5173"));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(cfg.insecure_defaults().is_empty());
    }

    #[test]
    fn malformed_or_zero_values_fail() {
        assert!(matches!(
            config(&[("TOKEN_TTL_SECS", "soon")]),
            Err(ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. })
        ));
        assert!(config(&[("TOKEN_TTL_SECS", "0")]).is_err());
        assert!(config(&[("STORE_TIMEOUT_MS", "0")]).is_err());
        assert!(config(&[("BCRYPT_COST", "2")]).is_err());
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn huge_token_ttl_is_rejected_instead_of_panicking() {
        for raw in ["9223372036854775807", "10000000000000", "31536001"] {
            assert!(
                matches!(
                    config(&[("TOKEN_TTL_SECS", raw)]),
                    Err(ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. })
                ),
                "TOKEN_TTL_SECS={raw} should be rejected"
            );
        }

        let cfg = config(&[("TOKEN_TTL_SECS", "31536000")]).unwrap();
        assert_eq!(cfg.token_ttl, chrono::Duration::seconds(MAX_TOKEN_TTL_SECS));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("JWT_SECRET", "  "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(cfg.jwt_secret, DEV_SECRET);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = config(&[("JWT_SECRET", "top-secret"), ("DATABASE_URL", "postgres://u:pw@h/db")]).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("pw@h"));
    }
}
