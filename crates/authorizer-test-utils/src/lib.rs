//! Test utilities for authorizer tests.
//!
//! Provides RSA signing fixtures with matching JWK components and a fluent
//! builder for signing test tokens with arbitrary claim shapes.

/// RSA keypair fixtures with JWK components
pub mod rsa_fixtures;

/// Builder patterns for signed test tokens
pub mod token_builders;

pub use rsa_fixtures::{rotated_signing_key, signing_key, RsaKeyFixture};
pub use token_builders::TestTokenBuilder;
