//! Builder patterns for signed test tokens.
//!
//! Provides a fluent API for constructing tokens with arbitrary claim
//! shapes, including deliberately broken ones (missing expiration, future
//! not-before, absent subject), signed with an [`RsaKeyFixture`].

use crate::rsa_fixtures::RsaKeyFixture;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("user-42")
///     .expires_in(3600)
///     .sign(&signing_key());
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    algorithm: Algorithm,
    kid: Option<String>,
}

impl TestTokenBuilder {
    /// A builder with a default subject and an expiration one hour out.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!("test-subject"));
        claims.insert("exp".to_string(), json!(now + 3600));

        Self {
            claims,
            algorithm: Algorithm::RS256,
            kid: None,
        }
    }

    /// Set the subject claim.
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.claims.insert("sub".to_string(), json!(subject));
        self
    }

    /// Remove the subject claim entirely.
    pub fn without_subject(mut self) -> Self {
        self.claims.remove("sub");
        self
    }

    /// Set expiration relative to now; negative values produce expired tokens.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.claims
            .insert("exp".to_string(), json!(Utc::now().timestamp() + seconds));
        self
    }

    /// Set an absolute expiration timestamp.
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.claims.insert("exp".to_string(), json!(timestamp));
        self
    }

    /// Remove the expiration claim entirely.
    pub fn without_expiration(mut self) -> Self {
        self.claims.remove("exp");
        self
    }

    /// Set not-before relative to now; positive values are in the future.
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.claims
            .insert("nbf".to_string(), json!(Utc::now().timestamp() + seconds));
        self
    }

    /// Set the issuer claim.
    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.claims.insert("iss".to_string(), json!(issuer));
        self
    }

    /// Set the audience claim to a single string.
    pub fn for_audience(mut self, audience: &str) -> Self {
        self.claims.insert("aud".to_string(), json!(audience));
        self
    }

    /// Set an arbitrary claim.
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Override the `kid` the token header declares (defaults to the signing
    /// fixture's identifier). Use with a mismatched key for wrong-key tests.
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    /// Sign with a different algorithm from the RSA family.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The claim set as a JSON value.
    pub fn build_claims(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign the claims with the fixture's private key.
    pub fn sign(&self, key: &RsaKeyFixture) -> String {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone().unwrap_or_else(|| key.kid.clone()));

        encode(&header, &self.claims, &key.encoding_key()).expect("Failed to sign test token")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
