//! OpenID discovery resolution.
//!
//! Fetches the issuer's discovery document and extracts the JWKS endpoint
//! URL. The document is parsed permissively (unknown fields are ignored)
//! but the `jwks_uri` field is required. One bounded fetch, no retries.

use crate::config::AuthorizerConfig;
use crate::errors::AuthError;
use serde::Deserialize;
use url::Url;

/// The subset of the discovery document this pipeline consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    /// URL of the issuer's published signing key set.
    pub jwks_uri: String,
}

/// Discovery-document URL: the configured resource joined onto the issuer.
pub(crate) fn discovery_url(config: &AuthorizerConfig) -> Result<Url, AuthError> {
    let base = config.issuer_url.as_str().trim_end_matches('/');
    let resource = config.openid_configuration_resource.trim_start_matches('/');

    Url::parse(&format!("{base}/{resource}")).map_err(|e| {
        tracing::error!(
            target: "authorizer.discovery",
            error = %e,
            "Failed to build discovery URL"
        );
        AuthError::DiscoveryUnavailable
    })
}

/// Fetch the discovery document from the issuer.
///
/// # Errors
///
/// Returns [`AuthError::DiscoveryUnavailable`] on transport failure, timeout,
/// a non-success status, or a body without a usable `jwks_uri`.
pub(crate) async fn fetch_discovery_document(
    client: &reqwest::Client,
    config: &AuthorizerConfig,
) -> Result<DiscoveryDocument, AuthError> {
    let url = discovery_url(config)?;

    tracing::debug!(target: "authorizer.discovery", url = %url, "Fetching discovery document");

    let response = client.get(url).send().await.map_err(|e| {
        tracing::error!(target: "authorizer.discovery", error = %e, "Failed to fetch discovery document");
        AuthError::DiscoveryUnavailable
    })?;

    if !response.status().is_success() {
        tracing::error!(
            target: "authorizer.discovery",
            status = %response.status(),
            "Discovery endpoint returned error"
        );
        return Err(AuthError::DiscoveryUnavailable);
    }

    let document: DiscoveryDocument = response.json().await.map_err(|e| {
        tracing::error!(target: "authorizer.discovery", error = %e, "Failed to parse discovery document");
        AuthError::DiscoveryUnavailable
    })?;

    Ok(document)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn config_for(issuer: &str) -> AuthorizerConfig {
        AuthorizerConfig::new(Url::parse(issuer).unwrap())
    }

    #[test]
    fn test_discovery_url_joins_default_resource() {
        let config = config_for("https://auth.example.com");

        let url = discovery_url(&config).unwrap();

        assert_eq!(
            url.as_str(),
            "https://auth.example.com/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_with_trailing_slash_issuer() {
        let config = config_for("https://auth.example.com/");

        let url = discovery_url(&config).unwrap();

        assert_eq!(
            url.as_str(),
            "https://auth.example.com/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_preserves_issuer_path() {
        let config = config_for("https://auth.example.com/tenant");

        let url = discovery_url(&config).unwrap();

        assert_eq!(
            url.as_str(),
            "https://auth.example.com/tenant/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_with_custom_resource() {
        let mut config = config_for("https://auth.example.com");
        config.openid_configuration_resource = "/custom/configuration".to_string();

        let url = discovery_url(&config).unwrap();

        assert_eq!(url.as_str(), "https://auth.example.com/custom/configuration");
    }

    #[test]
    fn test_document_parses_permissively() {
        // Real discovery documents carry dozens of fields; only jwks_uri is
        // consumed.
        let json = r#"{
            "issuer": "https://auth.example.com",
            "authorization_endpoint": "https://auth.example.com/authorize",
            "jwks_uri": "https://auth.example.com/.well-known/jwks.json",
            "response_types_supported": ["code"]
        }"#;

        let document: DiscoveryDocument = serde_json::from_str(json).unwrap();

        assert_eq!(
            document.jwks_uri,
            "https://auth.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_document_requires_jwks_uri() {
        let json = r#"{"issuer": "https://auth.example.com"}"#;

        let result = serde_json::from_str::<DiscoveryDocument>(json);

        assert!(result.is_err());
    }
}
