use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{
    builder::MessagePayloadBuilder, claims::Claims, CLAIM_LTI_DEPLOYMENT_ID,
    CLAIM_LTI_MESSAGE_TYPE, CLAIM_LTI_ROLES, CLAIM_LTI_TARGET_LINK_URI, CLAIM_LTI_VERSION,
    CLAIM_REGISTRATION_ID, LTI_VERSION,
};
use crate::{error::LtiError, registration::Registration};

/// A URL-addressed launch message carrying its (signed) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtiMessage {
    url: String,
    parameters: BTreeMap<String, String>,
}

impl LtiMessage {
    pub fn new(url: impl Into<String>, parameters: BTreeMap<String, String>) -> Self {
        Self {
            url: url.into(),
            parameters,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// The message as a GET URL, parameters appended to any existing query.
    pub fn to_url(&self) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&self.url)?;
        url.query_pairs_mut().extend_pairs(self.parameters.iter());
        Ok(url.to_string())
    }
}

fn resolve_deployment_id<'a>(
    registration: &'a Registration,
    deployment_id: Option<&'a str>,
) -> Result<&'a str, LtiError> {
    match deployment_id {
        Some(deployment_id) if registration.has_deployment_id(deployment_id) => Ok(deployment_id),
        Some(deployment_id) => Err(LtiError::new(format!(
            "Invalid deployment id {deployment_id} for registration {}",
            registration.identifier
        ))),
        None => registration.default_deployment_id().ok_or_else(|| {
            LtiError::new(format!(
                "Missing deployment id for registration {}",
                registration.identifier
            ))
        }),
    }
}

/// Composes platform-to-tool launches: an OIDC login initiation whose
/// `lti_message_hint` is the signed launch payload.
#[derive(Debug, Clone, Default)]
pub struct PlatformOriginatingLaunchBuilder {
    builder: MessagePayloadBuilder,
}

impl PlatformOriginatingLaunchBuilder {
    pub fn new(builder: MessagePayloadBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &MessagePayloadBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut MessagePayloadBuilder {
        &mut self.builder
    }

    /// Deployment id failures surface as [`LtiError`]; everything else
    /// (signing, encoding) as the underlying error.
    #[allow(clippy::too_many_arguments)]
    pub fn build_platform_originating_launch(
        &mut self,
        registration: &Registration,
        message_type: &str,
        target_link_uri: &str,
        login_hint: &str,
        deployment_id: Option<&str>,
        roles: &[String],
        optional_claims: Claims,
    ) -> anyhow::Result<LtiMessage> {
        let deployment_id = resolve_deployment_id(registration, deployment_id)?;

        self.builder
            .with_claim("iss", registration.platform.audience.as_str())
            .with_claim("aud", registration.client_id.as_str())
            .with_claim(CLAIM_LTI_MESSAGE_TYPE, message_type)
            .with_claim(CLAIM_LTI_VERSION, LTI_VERSION)
            .with_claim(CLAIM_LTI_DEPLOYMENT_ID, deployment_id)
            .with_claim(CLAIM_LTI_TARGET_LINK_URI, target_link_uri)
            .with_claim(
                CLAIM_LTI_ROLES,
                Value::from(roles.iter().map(String::as_str).collect::<Vec<_>>()),
            )
            .with_claim(CLAIM_REGISTRATION_ID, registration.identifier.as_str())
            .with_claims(optional_claims);

        let hint = self
            .builder
            .build_message_payload(registration.platform_key_chain()?)?;

        let oidc_initiation_url = registration
            .tool
            .oidc_initiation_url
            .as_deref()
            .unwrap_or(target_link_uri);

        debug!(
            registration = %registration.identifier,
            message_type,
            target_link_uri,
            "lti: platform originating launch built"
        );

        let parameters = BTreeMap::from([
            ("iss".to_string(), registration.platform.audience.clone()),
            ("login_hint".to_string(), login_hint.to_string()),
            ("target_link_uri".to_string(), target_link_uri.to_string()),
            ("lti_message_hint".to_string(), hint.token().to_string()),
            ("lti_deployment_id".to_string(), deployment_id.to_string()),
            ("client_id".to_string(), registration.client_id.clone()),
        ]);

        Ok(LtiMessage::new(oidc_initiation_url, parameters))
    }
}

/// Composes tool-to-platform launches: a form post of a single `JWT`
/// parameter signed with the tool key chain.
#[derive(Debug, Clone, Default)]
pub struct ToolOriginatingLaunchBuilder {
    builder: MessagePayloadBuilder,
}

impl ToolOriginatingLaunchBuilder {
    pub fn new(builder: MessagePayloadBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &MessagePayloadBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut MessagePayloadBuilder {
        &mut self.builder
    }

    pub fn build_tool_originating_launch(
        &mut self,
        registration: &Registration,
        message_type: &str,
        url: &str,
        deployment_id: Option<&str>,
        optional_claims: Claims,
    ) -> anyhow::Result<LtiMessage> {
        let deployment_id = resolve_deployment_id(registration, deployment_id)?;

        self.builder
            .with_claim("iss", registration.client_id.as_str())
            .with_claim("aud", registration.platform.audience.as_str())
            .with_claim(CLAIM_LTI_MESSAGE_TYPE, message_type)
            .with_claim(CLAIM_LTI_VERSION, LTI_VERSION)
            .with_claim(CLAIM_LTI_DEPLOYMENT_ID, deployment_id)
            .with_claims(optional_claims);

        let payload = self
            .builder
            .build_message_payload(registration.tool_key_chain()?)?;

        debug!(
            registration = %registration.identifier,
            message_type,
            url,
            "lti: tool originating launch built"
        );

        Ok(LtiMessage::new(
            url,
            BTreeMap::from([("JWT".to_string(), payload.token().to_string())]),
        ))
    }
}

#[cfg(test)]
#[path = "tests/launch_tests.rs"]
mod tests;
