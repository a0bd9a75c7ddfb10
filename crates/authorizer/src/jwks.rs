//! Signing key set (JWKS) fetching, caching, and selection.
//!
//! Keys are fetched from the endpoint named by the discovery document and
//! cached with a configurable TTL. The JWKS URL's path and query are
//! re-resolved against the issuer host: the issuer is the trust anchor, a
//! key-set host named by the document is not independently trusted.
//!
//! # Security
//!
//! - Selection is a linear scan in publisher order; with duplicate key
//!   identifiers the first match wins (documented tie-break)
//! - A key identifier absent from a fresh cache forces one refetch, so key
//!   rotation converges without waiting for TTL expiry
//! - Concurrent refreshes are serialized; a rotation event triggers at most
//!   one upstream fetch no matter how many invocations miss at once

use crate::config::AuthorizerConfig;
use crate::discovery;
use crate::errors::AuthError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// A single published signing key.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksKey {
    /// Key type (`RSA` for every key this pipeline can use).
    pub kty: String,

    /// Key identifier, matched against the token header's `kid`.
    pub kid: String,

    /// Algorithm the key is published for.
    #[serde(default)]
    pub alg: Option<String>,

    /// Intended use (`sig` for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA public modulus, base64url without padding.
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent, base64url without padding.
    #[serde(default)]
    pub e: Option<String>,

    /// Optional X.509 certificate chain.
    #[serde(default)]
    pub x5c: Option<Vec<String>>,

    /// Optional SHA-1 thumbprint of the leaf certificate.
    #[serde(default)]
    pub x5t: Option<String>,
}

/// Key set as published, order preserved.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    /// The signing keys, in publisher order.
    pub keys: Vec<JwksKey>,
}

/// First key matching `kid`, scanning in publisher order.
pub(crate) fn select_key<'a>(keys: &'a [JwksKey], kid: &str) -> Option<&'a JwksKey> {
    keys.iter().find(|key| key.kid == kid)
}

/// Resolve the published JWKS URL's path and query against the issuer host.
pub(crate) fn resolve_jwks_url(issuer_url: &Url, jwks_uri: &str) -> Result<Url, AuthError> {
    let published = Url::parse(jwks_uri).map_err(|e| {
        tracing::error!(target: "authorizer.jwks", error = %e, "Discovery document carries an unparseable jwks_uri");
        AuthError::DiscoveryUnavailable
    })?;

    let mut resolved = issuer_url.clone();
    resolved.set_path(published.path());
    resolved.set_query(published.query());
    Ok(resolved)
}

/// Cached key set with refresh bookkeeping.
struct CachedKeys {
    keys: Vec<JwksKey>,

    /// When this key set was fetched; used to detect refreshes that landed
    /// while a task was waiting on the refresh lock.
    fetched_at: Instant,

    /// When this cache entry expires.
    expires_at: Instant,
}

/// Client for fetching and caching the issuer's signing keys.
///
/// Safe for concurrent use: reads share an `RwLock`, refreshes serialize
/// through an async mutex.
pub struct JwksClient {
    config: Arc<AuthorizerConfig>,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
    refresh_lock: Mutex<()>,
}

impl JwksClient {
    /// Create a new client. The HTTP client carries the configured timeout so
    /// a hung issuer fails the invocation instead of stalling it.
    #[must_use]
    pub fn new(config: Arc<AuthorizerConfig>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authorizer.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            config,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Get the signing key for `kid`, refreshing the cached set when it is
    /// expired, absent, or does not contain the identifier.
    ///
    /// # Errors
    ///
    /// - [`AuthError::DiscoveryUnavailable`] / [`AuthError::KeySetUnavailable`]
    ///   when the upstream fetches fail
    /// - [`AuthError::KeyNotFound`] when the identifier is absent even from a
    ///   freshly fetched key set
    pub async fn get_key(&self, kid: &str) -> Result<JwksKey, AuthError> {
        let miss_observed_at = Instant::now();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = select_key(&cached.keys, kid) {
                        tracing::debug!(target: "authorizer.jwks", kid = %kid, "Signing key cache hit");
                        return Ok(key.clone());
                    }
                    // Unknown kid in a fresh cache: likely rotation, refetch once.
                    tracing::debug!(
                        target: "authorizer.jwks",
                        kid = %kid,
                        "Key identifier not in cached set, forcing refresh"
                    );
                }
            }
        }

        self.refresh(miss_observed_at).await?;

        let cache = self.cache.read().await;
        if let Some(cached) = cache.as_ref() {
            if let Some(key) = select_key(&cached.keys, kid) {
                return Ok(key.clone());
            }
        }

        tracing::warn!(target: "authorizer.jwks", kid = %kid, "Key identifier not found after refresh");
        Err(AuthError::KeyNotFound)
    }

    /// Refresh the cached key set via discovery + JWKS fetch.
    ///
    /// Serialized on `refresh_lock`; a task that waited on the lock skips the
    /// fetch when a concurrent refresh already landed after its miss.
    async fn refresh(&self, miss_observed_at: Instant) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at > miss_observed_at {
                    tracing::debug!(
                        target: "authorizer.jwks",
                        "Concurrent refresh already landed, skipping fetch"
                    );
                    return Ok(());
                }
            }
        }

        let document =
            discovery::fetch_discovery_document(&self.http_client, &self.config).await?;
        let jwks_url = resolve_jwks_url(&self.config.issuer_url, &document.jwks_uri)?;
        let jwks = fetch_jwks(&self.http_client, jwks_url).await?;

        tracing::info!(
            target: "authorizer.jwks",
            key_count = jwks.keys.len(),
            "Signing key set refreshed"
        );

        let now = Instant::now();
        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys {
            keys: jwks.keys,
            fetched_at: now,
            expires_at: now + self.config.jwks_cache_ttl,
        });

        Ok(())
    }

    /// Drop the cached key set so the next lookup refetches.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}

/// Fetch the key set from the resolved JWKS endpoint.
async fn fetch_jwks(client: &reqwest::Client, url: Url) -> Result<Jwks, AuthError> {
    tracing::debug!(target: "authorizer.jwks", url = %url, "Fetching signing key set");

    let response = client.get(url).send().await.map_err(|e| {
        tracing::error!(target: "authorizer.jwks", error = %e, "Failed to fetch signing key set");
        AuthError::KeySetUnavailable
    })?;

    if !response.status().is_success() {
        tracing::error!(
            target: "authorizer.jwks",
            status = %response.status(),
            "JWKS endpoint returned error"
        );
        return Err(AuthError::KeySetUnavailable);
    }

    let jwks: Jwks = response.json().await.map_err(|e| {
        tracing::error!(target: "authorizer.jwks", error = %e, "Failed to parse signing key set");
        AuthError::KeySetUnavailable
    })?;

    Ok(jwks)
}
