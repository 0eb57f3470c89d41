use lti_core::{
    message::{Claims, ResourceLinkClaim, ToolOriginatingLaunchBuilder, CLAIM_LTI_RESOURCE_LINK},
    LtiError, LtiMessage, LtiMessagePayload, LtiResult, Registration,
};
use tracing::debug;

use crate::{
    error::ValidationError,
    message::{
        ProctoringPayloadExt, CLAIM_PROCTORING_ATTEMPT_NUMBER,
        CLAIM_PROCTORING_END_ASSESSMENT_RETURN, CLAIM_PROCTORING_SESSION_DATA,
        MESSAGE_TYPE_START_ASSESSMENT,
    },
};

#[derive(Debug, Clone)]
pub struct StartAssessmentLaunchRequest {
    pub resource_link: ResourceLinkClaim,
    pub start_assessment_url: String,
    pub session_data: String,
    pub attempt_number: u32,
    pub deployment_id: Option<String>,
    pub optional_claims: Claims,
    pub end_assessment_return: bool,
}

impl StartAssessmentLaunchRequest {
    pub fn new(
        resource_link: ResourceLinkClaim,
        start_assessment_url: impl Into<String>,
        session_data: impl Into<String>,
    ) -> Self {
        Self {
            resource_link,
            start_assessment_url: start_assessment_url.into(),
            session_data: session_data.into(),
            attempt_number: 1,
            deployment_id: None,
            optional_claims: Claims::new(),
            end_assessment_return: false,
        }
    }

    /// Reads the inbound start proctoring claims a tool must echo back.
    pub fn from_payload(payload: &LtiMessagePayload) -> Result<Self, ValidationError> {
        let resource_link = payload
            .resource_link()
            .ok_or(ValidationError::MissingPayloadClaim("resource link"))?;
        let start_assessment_url = payload
            .proctoring_start_assessment_url()
            .ok_or(ValidationError::MissingPayloadClaim("start assessment url"))?;
        let session_data = payload
            .proctoring_session_data()
            .ok_or(ValidationError::MissingPayloadClaim("session data"))?;
        let attempt_number = payload
            .proctoring_attempt_number()
            .ok_or(ValidationError::MissingPayloadClaim("attempt number"))?;

        Ok(Self::new(resource_link, start_assessment_url, session_data)
            .with_attempt_number(attempt_number))
    }

    pub fn with_attempt_number(mut self, attempt_number: u32) -> Self {
        self.attempt_number = attempt_number;
        self
    }

    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        self.deployment_id = Some(deployment_id.into());
        self
    }

    pub fn with_optional_claims(mut self, optional_claims: Claims) -> Self {
        self.optional_claims = optional_claims;
        self
    }

    pub fn with_end_assessment_return(mut self, end_assessment_return: bool) -> Self {
        self.end_assessment_return = end_assessment_return;
        self
    }
}

/// Tool side launch sending the candidate back to the platform assessment.
#[derive(Debug, Clone, Default)]
pub struct StartAssessmentLaunchRequestBuilder {
    launch: ToolOriginatingLaunchBuilder,
}

impl StartAssessmentLaunchRequestBuilder {
    pub fn new(launch: ToolOriginatingLaunchBuilder) -> Self {
        Self { launch }
    }

    pub fn build_start_assessment_launch_request(
        &mut self,
        registration: &Registration,
        request: StartAssessmentLaunchRequest,
    ) -> LtiResult<LtiMessage> {
        self.build(registration, request).map_err(|err| {
            LtiError::rethrow_or_wrap("Cannot create start assessment launch request", err)
        })
    }

    pub fn build_start_assessment_launch_request_from_payload(
        &mut self,
        payload: &LtiMessagePayload,
        registration: &Registration,
        deployment_id: Option<&str>,
        optional_claims: Claims,
        end_assessment_return: bool,
    ) -> LtiResult<LtiMessage> {
        let mut request = StartAssessmentLaunchRequest::from_payload(payload).map_err(|err| {
            LtiError::wrap("Cannot create start assessment launch request from payload", err)
        })?;
        request.deployment_id = deployment_id.map(str::to_string);
        request.optional_claims = optional_claims;
        request.end_assessment_return = end_assessment_return;

        self.build_start_assessment_launch_request(registration, request)
    }

    fn build(
        &mut self,
        registration: &Registration,
        request: StartAssessmentLaunchRequest,
    ) -> anyhow::Result<LtiMessage> {
        self.launch
            .builder_mut()
            .reset()
            .with_serialized_claim(CLAIM_LTI_RESOURCE_LINK, &request.resource_link)?
            .with_claim(CLAIM_PROCTORING_SESSION_DATA, request.session_data.as_str())
            .with_claim(CLAIM_PROCTORING_ATTEMPT_NUMBER, request.attempt_number)
            .with_claim(
                CLAIM_PROCTORING_END_ASSESSMENT_RETURN,
                request.end_assessment_return,
            );

        let message = self.launch.build_tool_originating_launch(
            registration,
            MESSAGE_TYPE_START_ASSESSMENT,
            &request.start_assessment_url,
            request.deployment_id.as_deref(),
            request.optional_claims,
        )?;

        debug!(
            registration = %registration.identifier,
            resource_link = %request.resource_link.id,
            attempt_number = request.attempt_number,
            "proctoring: start assessment launch built"
        );

        Ok(message)
    }
}

#[cfg(test)]
#[path = "tests/start_assessment_tests.rs"]
mod tests;
