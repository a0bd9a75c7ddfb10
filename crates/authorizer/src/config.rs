//! Authorizer configuration.
//!
//! Configuration is loaded from environment variables and validated at load
//! time; the pipeline receives it explicitly instead of looking anything up
//! at validation time. The issuer URL must be absolute; a relative value is
//! a configuration error, not a runtime failure.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Conventional discovery-document location relative to the issuer.
pub const DEFAULT_OPENID_CONFIGURATION_RESOURCE: &str = ".well-known/openid-configuration";

/// Default timeout applied to both outbound fetches.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the configurable fetch timeout.
pub const MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time-to-live for the cached signing key set (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(300);

/// Authorizer configuration.
///
/// Loaded from environment variables with sensible defaults, or constructed
/// directly via [`AuthorizerConfig::new`].
#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    /// Absolute URL of the server issuing tokens.
    pub issuer_url: Url,

    /// Discovery-document resource relative to the issuer
    /// (default: `.well-known/openid-configuration`).
    pub openid_configuration_resource: String,

    /// Timeout applied to the discovery and JWKS fetches.
    pub http_timeout: Duration,

    /// Time-to-live for the cached signing key set. Zero disables caching,
    /// restoring two fetches per invocation.
    pub jwks_cache_ttl: Duration,

    /// Enforce that the `iss` claim matches the issuer URL. Off by default;
    /// intended for deployments that terminate on a fixed custom domain.
    pub validate_issuer: bool,

    /// Enforce that the `aud` claim includes [`Self::expected_audience`].
    /// Off by default, same rationale as issuer enforcement.
    pub validate_audience: bool,

    /// Audience accepted when audience validation is enabled.
    pub expected_audience: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid issuer URL: {0}")]
    InvalidIssuerUrl(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid boolean configuration: {0}")]
    InvalidToggle(String),

    #[error("EXPECTED_AUDIENCE must be set when VALIDATE_AUDIENCE is enabled")]
    MissingExpectedAudience,
}

impl AuthorizerConfig {
    /// Configuration for `issuer_url` with every other field at its default.
    #[must_use]
    pub fn new(issuer_url: Url) -> Self {
        Self {
            issuer_url,
            openid_configuration_resource: DEFAULT_OPENID_CONFIGURATION_RESOURCE.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            jwks_cache_ttl: DEFAULT_JWKS_CACHE_TTL,
            validate_issuer: false,
            validate_audience: false,
            expected_audience: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let issuer_raw = vars
            .get("ISSUER_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("ISSUER_URL".to_string()))?;

        let issuer_url = Url::parse(issuer_raw).map_err(|e| {
            ConfigError::InvalidIssuerUrl(format!(
                "ISSUER_URL must be an absolute URL, got '{issuer_raw}': {e}"
            ))
        })?;

        if issuer_url.scheme() != "https" && issuer_url.scheme() != "http" {
            return Err(ConfigError::InvalidIssuerUrl(format!(
                "ISSUER_URL must use http or https, got scheme '{}'",
                issuer_url.scheme()
            )));
        }

        let openid_configuration_resource = vars
            .get("OPENID_CONFIGURATION_RESOURCE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_OPENID_CONFIGURATION_RESOURCE.to_string());

        let http_timeout = if let Some(value_str) = vars.get("HTTP_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidHttpTimeout(format!(
                    "HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidHttpTimeout(
                    "HTTP_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_HTTP_TIMEOUT.as_secs() {
                return Err(ConfigError::InvalidHttpTimeout(format!(
                    "HTTP_TIMEOUT_SECONDS must not exceed {} seconds, got {}",
                    MAX_HTTP_TIMEOUT.as_secs(),
                    value
                )));
            }

            Duration::from_secs(value)
        } else {
            DEFAULT_HTTP_TIMEOUT
        };

        // Zero is a valid TTL: it disables the cache entirely.
        let jwks_cache_ttl = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid integer, got '{value_str}': {e}"
                ))
            })?;
            Duration::from_secs(value)
        } else {
            DEFAULT_JWKS_CACHE_TTL
        };

        let validate_issuer = parse_toggle(vars, "VALIDATE_ISSUER")?;
        let validate_audience = parse_toggle(vars, "VALIDATE_AUDIENCE")?;
        let expected_audience = vars.get("EXPECTED_AUDIENCE").cloned();

        if validate_audience && expected_audience.is_none() {
            return Err(ConfigError::MissingExpectedAudience);
        }

        Ok(AuthorizerConfig {
            issuer_url,
            openid_configuration_resource,
            http_timeout,
            jwks_cache_ttl,
            validate_issuer,
            validate_audience,
            expected_audience,
        })
    }
}

fn parse_toggle(vars: &HashMap<String, String>, name: &str) -> Result<bool, ConfigError> {
    match vars.get(name) {
        None => Ok(false),
        Some(value_str) => value_str.parse().map_err(|_| {
            ConfigError::InvalidToggle(format!(
                "{name} must be 'true' or 'false', got '{value_str}'"
            ))
        }),
    }
}
