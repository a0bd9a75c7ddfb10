//! The authorization pipeline.
//!
//! Strictly linear per invocation:
//!
//! ```text
//! extract -> decode -> discover -> fetch keys -> select key -> validate -> decide
//! ```
//!
//! Each stage narrows the value it passes forward or fails the invocation;
//! there is no retry state. [`Authorizer::check`] exposes the typed outcome
//! for diagnostics and tests, [`Authorizer::authorize`] is the boundary that
//! collapses every failure into the opaque [`Unauthorized`] outcome.

use crate::config::AuthorizerConfig;
use crate::errors::{AuthError, Unauthorized};
use crate::jwks::JwksClient;
use crate::models::{AuthorizerRequest, AuthorizerResponse};
use crate::token::{decode_unverified, extract_bearer_token};
use crate::validator::{TokenValidator, ValidatedToken};
use std::sync::Arc;

/// Bearer-token authorizer for gateway invocations.
///
/// Holds no per-invocation state; a single instance serves any number of
/// concurrent invocations, sharing only the cached signing key set.
pub struct Authorizer {
    jwks_client: JwksClient,
    validator: TokenValidator,
}

impl Authorizer {
    /// Build an authorizer from explicit configuration.
    #[must_use]
    pub fn new(config: AuthorizerConfig) -> Self {
        let config = Arc::new(config);
        Self {
            jwks_client: JwksClient::new(Arc::clone(&config)),
            validator: TokenValidator::new(config),
        }
    }

    /// Decide whether the invocation may proceed.
    ///
    /// On success the decision allows exactly the invoked resource and names
    /// the token's subject as principal.
    ///
    /// # Errors
    ///
    /// Any pipeline failure returns the uniform [`Unauthorized`] outcome.
    /// The internal failure kind is logged here and is deliberately not
    /// distinguishable by the caller.
    pub async fn authorize(
        &self,
        request: &AuthorizerRequest,
    ) -> Result<AuthorizerResponse, Unauthorized> {
        match self.check(request).await {
            Ok(token) => {
                tracing::debug!(
                    target: "authorizer.decision",
                    resource = %request.method_arn,
                    "Authorization granted"
                );
                Ok(AuthorizerResponse::allow(
                    token.subject,
                    request.method_arn.clone(),
                ))
            }
            Err(err) => {
                tracing::info!(
                    target: "authorizer.decision",
                    kind = err.kind(),
                    error = %err,
                    "Authorization denied"
                );
                Err(Unauthorized)
            }
        }
    }

    /// Run the validation pipeline, returning the typed outcome.
    ///
    /// This is the diagnostic entry point: the specific [`AuthError`] kind is
    /// visible to callers inside the trust boundary (logging, tests) but must
    /// never be forwarded to the request origin; use [`Self::authorize`]
    /// there.
    ///
    /// # Errors
    ///
    /// One of the [`AuthError`] kinds; every failure is terminal for the
    /// invocation.
    pub async fn check(&self, request: &AuthorizerRequest) -> Result<ValidatedToken, AuthError> {
        let token = extract_bearer_token(request)?;
        let unverified = decode_unverified(token)?;
        let key = self.jwks_client.get_key(&unverified.key_id).await?;
        self.validator.validate(&unverified, &key)
    }

    /// Drop the cached signing key set so the next invocation refetches.
    pub async fn invalidate_keys(&self) {
        self.jwks_client.invalidate().await;
    }
}
