//! Bearer-token extraction and untrusted decoding.
//!
//! Nothing in this module establishes trust: [`UnverifiedToken`] records only
//! what the token claims about itself (key identifier, algorithm) so the
//! right signing key can be located. Signature and claim validation happen
//! downstream in `validator`.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any base64 or JSON work (DoS prevention)
//! - The bearer scheme keyword is matched case-sensitively
//! - Rejection reasons are logged at debug level, never returned to callers

use crate::errors::AuthError;
use crate::models::{AuthorizerRequest, TOKEN_REQUEST_TYPE};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Maximum accepted token size in bytes (8 KiB).
///
/// Typical tokens are well under 1 KiB; anything larger is rejected before
/// base64 decoding or signature work is attempted.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// A decoded-but-untrusted token.
///
/// Carries the header fields needed for key lookup plus the raw compact form,
/// which signature verification later consumes so the check runs over the
/// exact bytes that were signed rather than re-serialized structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedToken {
    /// Key identifier declared in the token header.
    pub key_id: String,

    /// Algorithm declared in the token header. Untrusted until checked
    /// against the supported-algorithm allow-list.
    pub algorithm: String,

    raw: String,
}

impl UnverifiedToken {
    /// The original compact serialization (`header.claims.signature`).
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Extract the bare token from a bearer-token authorizer invocation.
///
/// The carrier type must equal `TOKEN` (case-sensitive) and the
/// authorization value must be exactly `Bearer <token>` with a single,
/// whitespace-free token segment. Any deviation fails with
/// [`AuthError::MalformedRequest`]. No network access, no side effects.
pub fn extract_bearer_token(request: &AuthorizerRequest) -> Result<&str, AuthError> {
    if request.kind != TOKEN_REQUEST_TYPE {
        tracing::debug!(
            target: "authorizer.token",
            kind = %request.kind,
            "Request rejected: carrier type is not TOKEN"
        );
        return Err(AuthError::MalformedRequest);
    }

    let value = match request.authorization_token.as_deref() {
        Some(value) if !value.is_empty() => value,
        _ => {
            tracing::debug!(
                target: "authorizer.token",
                "Request rejected: authorization value missing or empty"
            );
            return Err(AuthError::MalformedRequest);
        }
    };

    let Some(token) = value.strip_prefix("Bearer ") else {
        tracing::debug!(
            target: "authorizer.token",
            "Request rejected: authorization value is not a bearer credential"
        );
        return Err(AuthError::MalformedRequest);
    };

    if token.is_empty() || token.contains(char::is_whitespace) {
        tracing::debug!(
            target: "authorizer.token",
            "Request rejected: bearer value is empty or contains whitespace"
        );
        return Err(AuthError::MalformedRequest);
    }

    Ok(token)
}

/// Decode a token's header without verifying anything.
///
/// Splits the compact form into exactly three segments, decodes the header as
/// unpadded base64url JSON, and requires non-empty `kid` and `alg` fields.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] for oversized tokens, a segment
/// count other than three, undecodable header base64/JSON, or a missing,
/// empty, or non-string `kid`/`alg`.
pub fn decode_unverified(token: &str) -> Result<UnverifiedToken, AuthError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "authorizer.token",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::MalformedToken);
    }

    let segments: Vec<&str> = token.split('.').collect();
    let [header_segment, _claims, _signature] = segments.as_slice() else {
        tracing::debug!(
            target: "authorizer.token",
            segments = segments.len(),
            "Token rejected: expected three segments"
        );
        return Err(AuthError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_segment).map_err(|e| {
        tracing::debug!(target: "authorizer.token", error = %e, "Failed to decode token header base64");
        AuthError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "authorizer.token", error = %e, "Failed to parse token header JSON");
        AuthError::MalformedToken
    })?;

    // Empty values are rejected for defense-in-depth
    let key_id = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "authorizer.token", "Token rejected: header has no usable kid");
            AuthError::MalformedToken
        })?;

    let algorithm = header
        .get("alg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "authorizer.token", "Token rejected: header has no usable alg");
            AuthError::MalformedToken
        })?;

    Ok(UnverifiedToken {
        key_id,
        algorithm,
        raw: token.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn request(kind: &str, token: Option<&str>) -> AuthorizerRequest {
        AuthorizerRequest {
            kind: kind.to_string(),
            authorization_token: token.map(ToString::to_string),
            method_arn: "arn:test:resource".to_string(),
        }
    }

    fn token_with_header(header: &str) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        format!("{header_b64}.payload.signature")
    }

    // -------------------------------------------------------------------------
    // extract_bearer_token Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_extract_valid_bearer() {
        let request = request("TOKEN", Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&request).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_rejects_wrong_carrier_type() {
        let request = request("REQUEST", Some("Bearer abc"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_carrier_type_is_case_sensitive() {
        let request = request("token", Some("Bearer abc"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_missing_authorization() {
        let request = request("TOKEN", None);
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_empty_authorization() {
        let request = request("TOKEN", Some(""));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_wrong_scheme() {
        let request = request("TOKEN", Some("Basic abc"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_scheme_keyword_is_case_sensitive() {
        let request = request("TOKEN", Some("bearer abc"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_bare_scheme() {
        let request = request("TOKEN", Some("Bearer"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_empty_token() {
        let request = request("TOKEN", Some("Bearer "));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_multiple_segments() {
        let request = request("TOKEN", Some("Bearer abc def"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    #[test]
    fn test_extract_rejects_double_space() {
        // A second leading space means the captured segment starts with
        // whitespace, which is not a single clean token.
        let request = request("TOKEN", Some("Bearer  abc"));
        assert_eq!(
            extract_bearer_token(&request),
            Err(AuthError::MalformedRequest)
        );
    }

    // -------------------------------------------------------------------------
    // decode_unverified Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_valid_header() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"abc123"}"#);

        let unverified = decode_unverified(&token).unwrap();

        assert_eq!(unverified.key_id, "abc123");
        assert_eq!(unverified.algorithm, "RS256");
        assert_eq!(unverified.raw(), token);
    }

    #[test]
    fn test_decode_rejects_oversized_token() {
        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert_eq!(decode_unverified(&oversized), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_accepts_token_at_size_limit() {
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"key"}"#);
        let remaining = MAX_TOKEN_SIZE_BYTES - header_b64.len() - 2;
        let payload_len = remaining / 2;
        let sig_len = remaining - payload_len;
        let token = format!(
            "{}.{}.{}",
            header_b64,
            "a".repeat(payload_len),
            "b".repeat(sig_len)
        );
        assert_eq!(token.len(), MAX_TOKEN_SIZE_BYTES);

        let unverified = decode_unverified(&token).unwrap();
        assert_eq!(unverified.key_id, "key");
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        assert_eq!(decode_unverified("single"), Err(AuthError::MalformedToken));
        assert_eq!(
            decode_unverified("only.two"),
            Err(AuthError::MalformedToken)
        );
        assert_eq!(
            decode_unverified("a.b.c.d"),
            Err(AuthError::MalformedToken)
        );
        assert_eq!(decode_unverified(""), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_rejects_invalid_base64_header() {
        assert_eq!(
            decode_unverified("!!!invalid!!!.payload.signature"),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn test_decode_rejects_invalid_json_header() {
        let token = token_with_header("not-json");
        assert_eq!(decode_unverified(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_rejects_missing_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT"}"#);
        assert_eq!(decode_unverified(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_rejects_empty_kid() {
        let token = token_with_header(r#"{"alg":"RS256","kid":""}"#);
        assert_eq!(decode_unverified(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_rejects_non_string_kid() {
        let token = token_with_header(r#"{"alg":"RS256","kid":12345}"#);
        assert_eq!(decode_unverified(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_rejects_missing_alg() {
        let token = token_with_header(r#"{"typ":"JWT","kid":"abc123"}"#);
        assert_eq!(decode_unverified(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_decode_keeps_declared_non_rsa_alg() {
        // The allow-list check lives in the validator; decoding only records
        // what the header declares.
        let token = token_with_header(r#"{"alg":"none","kid":"abc123"}"#);

        let unverified = decode_unverified(&token).unwrap();
        assert_eq!(unverified.algorithm, "none");
    }

    #[test]
    fn test_decode_kid_with_special_characters() {
        let token = token_with_header(r#"{"alg":"RS256","kid":"key-with-special_chars.123"}"#);

        let unverified = decode_unverified(&token).unwrap();
        assert_eq!(unverified.key_id, "key-with-special_chars.123");
    }
}
