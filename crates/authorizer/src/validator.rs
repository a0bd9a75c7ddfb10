//! Signature and claims validation.
//!
//! Reconstructs an RSA public key from the selected JWK's numeric material,
//! verifies the token signature over the exact signed bytes, then checks the
//! temporal claims by hand against an explicit clock so boundaries stay
//! deterministic under test.
//!
//! # Security
//!
//! - Only the RSA signature family (RS256/RS384/RS512) is accepted, and the
//!   declared algorithm is pinned as the single algorithm the verifier will
//!   use, so `none` and HMAC confusion attempts fail before any key work
//! - An expiration claim is mandatory; a token without `exp` is rejected
//!   rather than treated as never-expiring
//! - Issuer and audience are read but enforced only behind explicit
//!   configuration toggles

use crate::config::AuthorizerConfig;
use crate::errors::AuthError;
use crate::jwks::JwksKey;
use crate::token::UnverifiedToken;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Registered claims this pipeline reads, plus everything else the token
/// carried. The subject is required: a token that names no principal cannot
/// produce a decision.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, used as the principal identifier on allow. Redacted in
    /// Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds). Optional at the serde
    /// layer so its absence maps to a validation failure, not a parse error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer, read but only enforced when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience, string or array per the JWT spec; only enforced when
    /// configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,

    /// Any further claims, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .finish()
    }
}

/// A token that passed signature and temporal validation.
///
/// Never constructed on any other path: holding one is proof the signature
/// verified against a published key and the validity window was open.
#[derive(Clone)]
pub struct ValidatedToken {
    /// Subject claim, the principal identifier. Redacted in Debug output.
    pub subject: String,

    /// Expiration timestamp (Unix epoch seconds), strictly in the future at
    /// validation time.
    pub expires_at: i64,

    /// Not-before timestamp, when the token carried one.
    pub not_before: Option<i64>,

    /// Issuer claim, when the token carried one.
    pub issuer: Option<String>,

    /// The full claim set.
    pub claims: Claims,
}

impl fmt::Debug for ValidatedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedToken")
            .field("subject", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("not_before", &self.not_before)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Validates token signatures and claims against a selected signing key.
pub struct TokenValidator {
    config: Arc<AuthorizerConfig>,
}

impl TokenValidator {
    #[must_use]
    pub fn new(config: Arc<AuthorizerConfig>) -> Self {
        Self { config }
    }

    /// Verify `token` against `key` and check its claims.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UnsupportedAlgorithm`] for a non-RSA-family algorithm,
    ///   or a key published for a different algorithm than the token declares
    /// - [`AuthError::InvalidKeyMaterial`] when the key's numeric components
    ///   do not decode
    /// - [`AuthError::SignatureInvalid`] when the signature does not verify
    /// - [`AuthError::TokenExpired`] / [`AuthError::TokenNotYetValid`] for
    ///   temporal violations (a missing `exp` is expired, not eternal)
    /// - [`AuthError::IssuerMismatch`] / [`AuthError::AudienceMismatch`] when
    ///   the corresponding toggle is enabled and the claim does not match
    pub fn validate(
        &self,
        token: &UnverifiedToken,
        key: &JwksKey,
    ) -> Result<ValidatedToken, AuthError> {
        let algorithm = parse_algorithm(&token.algorithm)?;

        // A key published for one algorithm must not verify a token that
        // declares another.
        if let Some(key_alg) = &key.alg {
            if key_alg != &token.algorithm {
                tracing::warn!(
                    target: "authorizer.validation",
                    token_alg = %token.algorithm,
                    key_alg = %key_alg,
                    "Token and signing key disagree on algorithm"
                );
                return Err(AuthError::UnsupportedAlgorithm);
            }
        }

        let decoding_key = decoding_key_from_jwk(key)?;

        // Signature only here; claim checks are performed by hand below so
        // the boundaries match the documented semantics exactly.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let token_data =
            decode::<Claims>(token.raw(), &decoding_key, &validation).map_err(map_decode_error)?;
        let claims = token_data.claims;

        let expires_at = validate_temporal_claims(&claims)?;
        self.check_issuer(&claims)?;
        self.check_audience(&claims)?;

        tracing::debug!(target: "authorizer.validation", "Token validated successfully");

        Ok(ValidatedToken {
            subject: claims.sub.clone(),
            expires_at,
            not_before: claims.nbf,
            issuer: claims.iss.clone(),
            claims,
        })
    }

    fn check_issuer(&self, claims: &Claims) -> Result<(), AuthError> {
        if !self.config.validate_issuer {
            return Ok(());
        }

        // Trailing slashes are not significant when comparing issuers.
        let expected = self.config.issuer_url.as_str().trim_end_matches('/');
        match claims.iss.as_deref() {
            Some(iss) if iss.trim_end_matches('/') == expected => Ok(()),
            _ => {
                tracing::debug!(
                    target: "authorizer.validation",
                    "Token rejected: issuer claim does not match configured issuer"
                );
                Err(AuthError::IssuerMismatch)
            }
        }
    }

    fn check_audience(&self, claims: &Claims) -> Result<(), AuthError> {
        if !self.config.validate_audience {
            return Ok(());
        }

        // from_vars guarantees the pair; directly-built configs may not.
        let Some(expected) = self.config.expected_audience.as_deref() else {
            tracing::warn!(
                target: "authorizer.validation",
                "Audience validation enabled without an expected audience"
            );
            return Err(AuthError::AudienceMismatch);
        };

        let accepted = match &claims.aud {
            Some(serde_json::Value::String(aud)) => aud == expected,
            Some(serde_json::Value::Array(entries)) => {
                entries.iter().any(|entry| entry.as_str() == Some(expected))
            }
            _ => false,
        };

        if accepted {
            Ok(())
        } else {
            tracing::debug!(
                target: "authorizer.validation",
                "Token rejected: audience claim does not include expected audience"
            );
            Err(AuthError::AudienceMismatch)
        }
    }
}

/// Map the token's declared algorithm onto the RSA signature family.
fn parse_algorithm(alg: &str) -> Result<Algorithm, AuthError> {
    match alg {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        other => {
            tracing::debug!(
                target: "authorizer.validation",
                alg = %other,
                "Declared algorithm is outside the RSA signature family"
            );
            Err(AuthError::UnsupportedAlgorithm)
        }
    }
}

/// Decode a base64url value whose padding may have been stripped.
///
/// JWKS components are published unpadded; `=` is appended until the encoded
/// length is a multiple of four, then the value is decoded. A length of
/// 1 (mod 4) has no valid padded form and fails rather than truncating.
pub(crate) fn decode_base64url_padded(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut padded = value.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE.decode(padded)
}

/// Reconstruct an RSA public key from a JWK's numeric components.
///
/// The decoded modulus and exponent are unsigned big-endian integers; empty
/// or undecodable material fails with [`AuthError::InvalidKeyMaterial`];
/// nothing is ever silently substituted.
fn decoding_key_from_jwk(key: &JwksKey) -> Result<DecodingKey, AuthError> {
    if key.kty != "RSA" {
        tracing::warn!(
            target: "authorizer.validation",
            kty = %key.kty,
            kid = %key.kid,
            "Unexpected signing key type"
        );
        return Err(AuthError::InvalidKeyMaterial);
    }

    let modulus = key.n.as_deref().ok_or_else(|| {
        tracing::error!(target: "authorizer.validation", kid = %key.kid, "Signing key has no modulus");
        AuthError::InvalidKeyMaterial
    })?;
    let exponent = key.e.as_deref().ok_or_else(|| {
        tracing::error!(target: "authorizer.validation", kid = %key.kid, "Signing key has no exponent");
        AuthError::InvalidKeyMaterial
    })?;

    let modulus_bytes = decode_base64url_padded(modulus).map_err(|e| {
        tracing::error!(target: "authorizer.validation", kid = %key.kid, error = %e, "Signing key modulus does not decode");
        AuthError::InvalidKeyMaterial
    })?;
    let exponent_bytes = decode_base64url_padded(exponent).map_err(|e| {
        tracing::error!(target: "authorizer.validation", kid = %key.kid, error = %e, "Signing key exponent does not decode");
        AuthError::InvalidKeyMaterial
    })?;

    if modulus_bytes.is_empty() || exponent_bytes.is_empty() {
        tracing::error!(target: "authorizer.validation", kid = %key.kid, "Signing key component decodes to nothing");
        return Err(AuthError::InvalidKeyMaterial);
    }

    Ok(DecodingKey::from_rsa_raw_components(
        &modulus_bytes,
        &exponent_bytes,
    ))
}

/// Check `exp`/`nbf` against the current wall clock.
///
/// Returns the expiration timestamp on success.
pub(crate) fn validate_temporal_claims(claims: &Claims) -> Result<i64, AuthError> {
    validate_temporal_claims_at(claims.exp, claims.nbf, chrono::Utc::now().timestamp())
}

/// Deterministic temporal validation against an explicit `now`.
///
/// Prefer [`validate_temporal_claims`] in production code. This variant
/// exists so boundary conditions can be unit-tested without wall-clock
/// dependence.
fn validate_temporal_claims_at(
    exp: Option<i64>,
    nbf: Option<i64>,
    now: i64,
) -> Result<i64, AuthError> {
    let Some(exp) = exp else {
        tracing::debug!(
            target: "authorizer.validation",
            "Token rejected: no expiration claim"
        );
        return Err(AuthError::TokenExpired);
    };

    // Strictly in the future: a token expiring exactly now is already dead.
    if exp <= now {
        tracing::debug!(
            target: "authorizer.validation",
            exp = exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(AuthError::TokenExpired);
    }

    if let Some(nbf) = nbf {
        if nbf > now {
            tracing::debug!(
                target: "authorizer.validation",
                nbf = nbf,
                now = now,
                "Token rejected: not yet valid"
            );
            return Err(AuthError::TokenNotYetValid);
        }
    }

    Ok(exp)
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    tracing::debug!(target: "authorizer.validation", error = %err, "Token verification failed");
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName | ErrorKind::MissingAlgorithm => {
            AuthError::UnsupportedAlgorithm
        }
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => AuthError::InvalidKeyMaterial,
        ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::InvalidToken => {
            AuthError::MalformedToken
        }
        _ => AuthError::SignatureInvalid,
    }
}
