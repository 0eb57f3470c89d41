use lti_core::{
    message::{Claims, PlatformOriginatingLaunchBuilder},
    LtiError, LtiMessage, LtiResult, Registration,
};
use serde_json::Value;
use tracing::debug;

use super::default_roles;
use crate::message::{
    CLAIM_PROCTORING_ATTEMPT_NUMBER, CLAIM_PROCTORING_ERROR_LOG, CLAIM_PROCTORING_ERROR_MESSAGE,
    MESSAGE_TYPE_END_ASSESSMENT,
};

#[derive(Debug, Clone)]
pub struct EndAssessmentLaunchRequest {
    pub login_hint: String,
    pub end_assessment_url: Option<String>,
    pub attempt_number: u32,
    pub deployment_id: Option<String>,
    pub roles: Vec<String>,
    pub optional_claims: Claims,
}

impl EndAssessmentLaunchRequest {
    pub fn new(login_hint: impl Into<String>) -> Self {
        Self {
            login_hint: login_hint.into(),
            end_assessment_url: None,
            attempt_number: 1,
            deployment_id: None,
            roles: default_roles(),
            optional_claims: Claims::new(),
        }
    }

    pub fn with_end_assessment_url(mut self, end_assessment_url: impl Into<String>) -> Self {
        self.end_assessment_url = Some(end_assessment_url.into());
        self
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
}

/// Platform side launch telling the tool the attempt is over.
#[derive(Debug, Clone, Default)]
pub struct EndAssessmentLaunchRequestBuilder {
    launch: PlatformOriginatingLaunchBuilder,
}

impl EndAssessmentLaunchRequestBuilder {
    pub fn new(launch: PlatformOriginatingLaunchBuilder) -> Self {
        Self { launch }
    }

    pub fn build_end_assessment_launch_request(
        &mut self,
        registration: &Registration,
        request: EndAssessmentLaunchRequest,
    ) -> LtiResult<LtiMessage> {
        self.build(registration, request).map_err(|err| {
            LtiError::rethrow_or_wrap("Cannot create end assessment launch request", err)
        })
    }

    /// Same launch, flagged as failed. The log defaults to the message.
    pub fn build_end_assessment_launch_error_request(
        &mut self,
        registration: &Registration,
        mut request: EndAssessmentLaunchRequest,
        error_message: &str,
        error_log: Option<&str>,
    ) -> LtiResult<LtiMessage> {
        request.optional_claims.insert(
            CLAIM_PROCTORING_ERROR_MESSAGE.to_string(),
            Value::from(error_message),
        );
        request.optional_claims.insert(
            CLAIM_PROCTORING_ERROR_LOG.to_string(),
            Value::from(error_log.unwrap_or(error_message)),
        );

        self.build_end_assessment_launch_request(registration, request)
    }

    fn build(
        &mut self,
        registration: &Registration,
        request: EndAssessmentLaunchRequest,
    ) -> anyhow::Result<LtiMessage> {
        self.launch
            .builder_mut()
            .reset()
            .with_claim(CLAIM_PROCTORING_ATTEMPT_NUMBER, request.attempt_number);

        let launch_url = request
            .end_assessment_url
            .as_deref()
            .or(registration.tool.launch_url.as_deref())
            .ok_or_else(|| {
                LtiError::new("Neither end assessment url nor tool default url were presented")
            })?;

        let message = self.launch.build_platform_originating_launch(
            registration,
            MESSAGE_TYPE_END_ASSESSMENT,
            launch_url,
            &request.login_hint,
            request.deployment_id.as_deref(),
            &request.roles,
            request.optional_claims,
        )?;

        debug!(
            registration = %registration.identifier,
            attempt_number = request.attempt_number,
            "proctoring: end assessment launch built"
        );

        Ok(message)
    }
}

#[cfg(test)]
#[path = "tests/end_assessment_tests.rs"]
mod tests;
