//! Gateway bearer-token authorizer.
//!
//! Decides whether an invocation carrying `Authorization: Bearer <token>`
//! may proceed, by validating the token against the issuer's published
//! signing keys:
//!
//! ```text
//! extract -> decode -> discover -> fetch keys -> select key -> validate -> decide
//! ```
//!
//! The outcome is binary by design: an Allow decision scoped to exactly the
//! invoked resource, or an opaque rejection that reveals nothing about which
//! check failed.
//!
//! # Modules
//!
//! - `config` - Configuration from environment, validated at load time
//! - `errors` - Internal failure taxonomy and the opaque boundary outcome
//! - `models` - Gateway event and policy decision types
//! - `token` - Bearer extraction and untrusted header decoding
//! - `discovery` - OpenID discovery-document resolution
//! - `jwks` - Signing key set fetching, caching, and selection
//! - `validator` - RSA signature and claims validation
//! - `authorizer` - The pipeline and its decision boundary
//! - `response` - Gateway proxy response envelopes for hosts

#![warn(clippy::pedantic)]

pub mod authorizer;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod jwks;
pub mod models;
pub mod response;
pub mod token;
pub mod validator;

pub use authorizer::Authorizer;
pub use config::AuthorizerConfig;
pub use errors::{AuthError, Unauthorized};
pub use models::{AuthorizerRequest, AuthorizerResponse, Effect};
pub use validator::ValidatedToken;
