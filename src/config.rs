// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`SecurityConfig`] loaded
//! from them at startup. Invalid values fail fast with a [`ConfigError`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Secret the auth signing key is derived from | Required |
//! | `JWT_ALGORITHM` | `HS256`, `HS384` or `HS512` | `HS256` |
//! | `JWT_VALIDITY_SECS` | Lifetime of issued tokens, at most 100 years | `18000` (5 hours) |
//! | `JWT_ISSUER` | `iss` claim of issued tokens | Unset |
//! | `CSRF_SECRET` | Secret the CSRF signing key is derived from | Random per process |
//! | `CSRF_EXEMPT_PATHS` | Comma-separated paths skipped by CSRF checks | Empty |
//! | `SESSION_SECURE_COOKIE` | Mark the session cookie `Secure` | `true` |
//! | `SEED_USER` | `username:ROLE_A,ROLE_B` added to the user directory | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{fmt, str::FromStr, sync::Arc};

use chrono::Duration;
use thiserror::Error;

use crate::auth::{
    roles::{role_authority, ROLE_USER},
    Principal,
};
use crate::token::{
    derive_key,
    issuer::{DEFAULT_VALIDITY_SECS, MAX_VALIDITY_SECS},
    Algorithm, SigningKey,
};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Secret for access tokens. Short secrets are stretched to the algorithm's
/// key length, so prefer one at least that long.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const JWT_VALIDITY_SECS_ENV: &str = "JWT_VALIDITY_SECS";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";

/// Secret for CSRF challenges. Unset means a random key per process, which
/// invalidates outstanding challenges on restart.
pub const CSRF_SECRET_ENV: &str = "CSRF_SECRET";
pub const CSRF_EXEMPT_PATHS_ENV: &str = "CSRF_EXEMPT_PATHS";
pub const SESSION_SECURE_COOKIE_ENV: &str = "SESSION_SECURE_COOKIE";
pub const SEED_USER_ENV: &str = "SEED_USER";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected json or pretty, got {other}")),
        }
    }
}

/// A principal to add to the in-memory directory at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub authorities: Vec<String>,
}

impl SeedUser {
    pub fn into_principal(self) -> Principal {
        Principal::new(self.username, self.authorities)
    }
}

impl FromStr for SeedUser {
    type Err = String;

    /// Parses `username` or `username:ROLE_A,ROLE_B`. Role names are
    /// normalized; no roles means `ROLE_USER`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (username, roles) = s.split_once(':').unwrap_or((s, ""));
        let username = username.trim();
        if username.is_empty() {
            return Err("username must not be empty".to_string());
        }

        let mut authorities: Vec<String> = roles
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(role_authority)
            .collect();
        if authorities.is_empty() {
            authorities.push(ROLE_USER.to_string());
        }

        Ok(SeedUser {
            username: username.to_string(),
            authorities,
        })
    }
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_validity: Duration,
    pub jwt_issuer: Option<String>,
    pub csrf_secret: Option<String>,
    pub csrf_exempt_paths: Vec<String>,
    pub secure_cookies: bool,
    pub seed_user: Option<SeedUser>,
    pub log_format: LogFormat,
}

impl SecurityConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get(PORT_ENV) {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, &v, e))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let jwt_algorithm = match get(JWT_ALGORITHM_ENV) {
            Some(v) => v
                .parse::<Algorithm>()
                .map_err(|e| ConfigError::invalid(JWT_ALGORITHM_ENV, &v, e))?,
            None => Algorithm::default(),
        };

        let jwt_validity = match get(JWT_VALIDITY_SECS_ENV) {
            Some(v) => match v.trim().parse::<i64>() {
                Ok(secs) if secs <= 0 => {
                    return Err(ConfigError::invalid(JWT_VALIDITY_SECS_ENV, &v, "must be positive"))
                }
                Ok(secs) if secs > MAX_VALIDITY_SECS => {
                    return Err(ConfigError::invalid(
                        JWT_VALIDITY_SECS_ENV,
                        &v,
                        format!("must not exceed {MAX_VALIDITY_SECS}"),
                    ))
                }
                Ok(secs) => Duration::try_seconds(secs)
                    .ok_or_else(|| ConfigError::invalid(JWT_VALIDITY_SECS_ENV, &v, "out of range"))?,
                Err(e) => return Err(ConfigError::invalid(JWT_VALIDITY_SECS_ENV, &v, e)),
            },
            None => Duration::seconds(DEFAULT_VALIDITY_SECS),
        };

        let csrf_exempt_paths = get(CSRF_EXEMPT_PATHS_ENV)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let secure_cookies = match get(SESSION_SECURE_COOKIE_ENV) {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| ConfigError::invalid(SESSION_SECURE_COOKIE_ENV, &v, "expected true or false"))?,
            None => true,
        };

        let seed_user = get(SEED_USER_ENV)
            .map(|v| v.parse::<SeedUser>().map_err(|e| ConfigError::invalid(SEED_USER_ENV, &v, e)))
            .transpose()?;

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(v) => v
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid(LOG_FORMAT_ENV, &v, e))?,
            None => LogFormat::default(),
        };

        Ok(SecurityConfig {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret,
            jwt_algorithm,
            jwt_validity,
            jwt_issuer: get(JWT_ISSUER_ENV),
            csrf_secret: get(CSRF_SECRET_ENV),
            csrf_exempt_paths,
            secure_cookies,
            seed_user,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Signing key for access tokens.
    pub fn auth_key(&self) -> Result<Arc<SigningKey>, ConfigError> {
        derive_key(&self.jwt_secret, self.jwt_algorithm)
            .map(Arc::new)
            .map_err(|e| ConfigError::invalid(JWT_SECRET_ENV, "<redacted>", e))
    }

    /// Signing key for CSRF challenges, always HS256.
    pub fn csrf_key(&self) -> Result<Arc<SigningKey>, ConfigError> {
        let key = match &self.csrf_secret {
            Some(secret) => derive_key(secret, Algorithm::HS256)
                .map_err(|e| ConfigError::invalid(CSRF_SECRET_ENV, "<redacted>", e))?,
            None => SigningKey::random(Algorithm::HS256),
        };
        Ok(Arc::new(key))
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_validity", &self.jwt_validity)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("csrf_secret", &self.csrf_secret.as_ref().map(|_| "<redacted>"))
            .field("csrf_exempt_paths", &self.csrf_exempt_paths)
            .field("secure_cookies", &self.secure_cookies)
            .field("seed_user", &self.seed_user)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
