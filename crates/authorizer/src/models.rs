//! Gateway event and decision types.
//!
//! Wire shapes follow the gateway authorizer event format: request fields are
//! camelCase, the policy document inside the response uses the IAM PascalCase
//! casing. The raw authorization value is redacted in Debug output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Carrier type for bearer-token authorizer invocations.
pub const TOKEN_REQUEST_TYPE: &str = "TOKEN";

/// Policy language version emitted in every decision.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The invoke permission each statement grants or denies.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Inbound authorizer invocation from the routing layer.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    /// Carrier type; must equal [`TOKEN_REQUEST_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw `Authorization` header value (`Bearer <token>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,

    /// Identifier of the resource being invoked.
    pub method_arn: String,
}

impl fmt::Debug for AuthorizerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizerRequest")
            .field("kind", &self.kind)
            .field("authorization_token", &"[REDACTED]")
            .field("method_arn", &self.method_arn)
            .finish()
    }
}

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// A single policy statement scoped to concrete resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Action")]
    pub action: Vec<String>,

    #[serde(rename = "Effect")]
    pub effect: Effect,

    #[serde(rename = "Resource")]
    pub resource: Vec<String>,
}

/// IAM-style policy document carried by the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,

    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

/// Decision returned to the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    /// Principal the decision applies to (the token's subject on allow).
    pub principal_id: String,

    /// Policy document with exactly one statement.
    pub policy_document: PolicyDocument,
}

impl AuthorizerResponse {
    /// Allow decision naming the validated subject, scoped to exactly the
    /// resource that was invoked, never a wildcard.
    #[must_use]
    pub fn allow(principal_id: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::statement(principal_id.into(), Effect::Allow, resource.into())
    }

    /// Deny decision for hosts whose convention is a policy response rather
    /// than a rejected invocation. No validated identity exists on this
    /// path, so the principal is empty.
    #[must_use]
    pub fn deny(resource: impl Into<String>) -> Self {
        Self::statement(String::new(), Effect::Deny, resource.into())
    }

    fn statement(principal_id: String, effect: Effect, resource: String) -> Self {
        Self {
            principal_id,
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![PolicyStatement {
                    action: vec![INVOKE_ACTION.to_string()],
                    effect,
                    resource: vec![resource],
                }],
            },
        }
    }
}
