//! Authorizer error types.
//!
//! The pipeline reports failures through [`AuthError`], an internal taxonomy
//! that names the failing stage for diagnostics. None of it is ever shown to
//! the request origin: at the pipeline boundary every kind is logged and
//! collapsed into the opaque [`Unauthorized`] outcome, so a caller cannot
//! distinguish an expired token from a forged one.

use thiserror::Error;

/// Internal failure taxonomy for the token-validation pipeline.
///
/// Every variant is terminal for the invocation; nothing is retried. The
/// specific kind is available to logging and tests only; the routing layer
/// sees [`Unauthorized`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The invocation was not a bearer-token request in the expected shape.
    #[error("malformed authorization request")]
    MalformedRequest,

    /// The token was not a structurally valid JWT.
    #[error("malformed bearer token")]
    MalformedToken,

    /// The OpenID discovery document could not be fetched or parsed.
    #[error("discovery document unavailable")]
    DiscoveryUnavailable,

    /// The signing key set could not be fetched or parsed.
    #[error("signing key set unavailable")]
    KeySetUnavailable,

    /// No published signing key matches the token's key identifier.
    #[error("no signing key matches the token key identifier")]
    KeyNotFound,

    /// The selected key's numeric material could not be decoded.
    #[error("signing key material is invalid")]
    InvalidKeyMaterial,

    /// The token declares an algorithm outside the RSA signature family.
    #[error("token algorithm is not supported")]
    UnsupportedAlgorithm,

    /// The token signature does not verify against the selected key.
    #[error("token signature verification failed")]
    SignatureInvalid,

    /// The expiration claim is absent or not in the future.
    #[error("token is expired or carries no expiration")]
    TokenExpired,

    /// The not-before claim is in the future.
    #[error("token is not yet valid")]
    TokenNotYetValid,

    /// The issuer claim does not match the configured issuer (only when
    /// issuer validation is enabled).
    #[error("token issuer is not trusted")]
    IssuerMismatch,

    /// The audience claim does not include the expected audience (only when
    /// audience validation is enabled).
    #[error("token audience is not accepted")]
    AudienceMismatch,
}

impl AuthError {
    /// Stable label for structured logging and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedRequest => "malformed_request",
            AuthError::MalformedToken => "malformed_token",
            AuthError::DiscoveryUnavailable => "discovery_unavailable",
            AuthError::KeySetUnavailable => "key_set_unavailable",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::InvalidKeyMaterial => "invalid_key_material",
            AuthError::UnsupportedAlgorithm => "unsupported_algorithm",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::AudienceMismatch => "audience_mismatch",
        }
    }
}

/// The uniform outcome returned to the routing layer on any pipeline failure.
///
/// Deliberately carries no detail about which stage failed: distinguishing
/// "token expired" from "signature invalid" at this boundary would aid
/// credential probing. The internal [`AuthError`] kind is logged before the
/// collapse.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unauthorized")]
pub struct Unauthorized;
