use lti_core::{
    message::{
        Claims, PlatformOriginatingLaunchBuilder, ResourceLinkClaim, CLAIM_LTI_RESOURCE_LINK,
        CLAIM_REGISTRATION_ID,
    },
    LtiError, LtiMessage, LtiResourceLink, LtiResult, Registration,
};
use serde_json::Value;
use tracing::debug;

use super::default_roles;
use crate::message::{
    AcsClaim, CLAIM_PROCTORING_ACS, CLAIM_PROCTORING_ATTEMPT_NUMBER,
    CLAIM_PROCTORING_SESSION_DATA, CLAIM_PROCTORING_START_ASSESSMENT_URL,
    MESSAGE_TYPE_START_PROCTORING,
};

#[derive(Debug, Clone)]
pub struct StartProctoringLaunchRequest {
    pub resource_link: LtiResourceLink,
    pub start_assessment_url: String,
    pub login_hint: String,
    pub attempt_number: u32,
    pub deployment_id: Option<String>,
    pub roles: Vec<String>,
    pub optional_claims: Claims,
}

impl StartProctoringLaunchRequest {
    pub fn new(
        resource_link: LtiResourceLink,
        start_assessment_url: impl Into<String>,
        login_hint: impl Into<String>,
    ) -> Self {
        Self {
            resource_link,
            start_assessment_url: start_assessment_url.into(),
            login_hint: login_hint.into(),
            attempt_number: 1,
            deployment_id: None,
            roles: default_roles(),
            optional_claims: Claims::new(),
        }
    }

    pub fn with_attempt_number(mut self, attempt_number: u32) -> Self {
        self.attempt_number = attempt_number;
        self
    }

    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        self.deployment_id = Some(deployment_id.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_optional_claims(mut self, optional_claims: Claims) -> Self {
        self.optional_claims = optional_claims;
        self
    }

    /// Grants the tool the right to send the listed ACS actions.
    pub fn with_acs_claim(mut self, acs: &AcsClaim) -> Self {
        self.optional_claims
            .insert(CLAIM_PROCTORING_ACS.to_string(), Value::from(acs));
        self
    }
}

/// Platform side launch asking the tool to start proctoring an attempt.
#[derive(Debug, Clone, Default)]
pub struct StartProctoringLaunchRequestBuilder {
    launch: PlatformOriginatingLaunchBuilder,
}

impl StartProctoringLaunchRequestBuilder {
    pub fn new(launch: PlatformOriginatingLaunchBuilder) -> Self {
        Self { launch }
    }

    pub fn build_start_proctoring_launch_request(
        &mut self,
        registration: &Registration,
        request: StartProctoringLaunchRequest,
    ) -> LtiResult<LtiMessage> {
        self.build(registration, request).map_err(|err| {
            LtiError::rethrow_or_wrap("Cannot create start proctoring launch request", err)
        })
    }

    fn build(
        &mut self,
        registration: &Registration,
        request: StartProctoringLaunchRequest,
    ) -> anyhow::Result<LtiMessage> {
        let resource_link_claim = ResourceLinkClaim::from(&request.resource_link);

        let session_data = self
            .launch
            .builder_mut()
            .reset()
            .with_claim(CLAIM_REGISTRATION_ID, registration.identifier.as_str())
            .build_message_payload(registration.platform_key_chain()?)?;

        self.launch
            .builder_mut()
            .reset()
            .with_serialized_claim(CLAIM_LTI_RESOURCE_LINK, &resource_link_claim)?
            .with_claim(
                CLAIM_PROCTORING_START_ASSESSMENT_URL,
                request.start_assessment_url.as_str(),
            )
            .with_claim(CLAIM_PROCTORING_ATTEMPT_NUMBER, request.attempt_number)
            .with_claim(CLAIM_PROCTORING_SESSION_DATA, session_data.token());

        let launch_url = request
            .resource_link
            .url()
            .or(registration.tool.launch_url.as_deref())
            .ok_or_else(|| {
                LtiError::new("Neither resource link url nor tool default url were presented")
            })?;

        let message = self.launch.build_platform_originating_launch(
            registration,
            MESSAGE_TYPE_START_PROCTORING,
            launch_url,
            &request.login_hint,
            request.deployment_id.as_deref(),
            &request.roles,
            request.optional_claims,
        )?;

        debug!(
            registration = %registration.identifier,
            resource_link = request.resource_link.identifier(),
            attempt_number = request.attempt_number,
            "proctoring: start proctoring launch built"
        );

        Ok(message)
    }
}

#[cfg(test)]
#[path = "tests/start_proctoring_tests.rs"]
mod tests;
