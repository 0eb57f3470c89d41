use std::sync::Arc;

use axum::http::{header::ACCEPT, Method};
use lti_core::{
    service::{HttpLtiServiceClient, LtiServiceClient, ServiceRequestOptions},
    LtiError, LtiMessagePayload, LtiResult, Registration,
};
use tracing::{info, warn};

use super::{AUTHORIZATION_SCOPE_CONTROL, CONTENT_TYPE_CONTROL};
use crate::{
    error::ValidationError,
    message::ProctoringPayloadExt,
    model::{AcsControl, AcsControlResult},
    serializer::{AcsControlResultSerializer, AcsControlSerializer},
};

/// Sends ACS controls to a platform and reads back the control result.
#[derive(Clone)]
pub struct AcsServiceClient {
    client: Arc<dyn LtiServiceClient>,
    control_serializer: AcsControlSerializer,
    control_result_serializer: AcsControlResultSerializer,
}

impl Default for AcsServiceClient {
    fn default() -> Self {
        Self::new(Arc::new(HttpLtiServiceClient::default()))
    }
}

impl AcsServiceClient {
    pub fn new(client: Arc<dyn LtiServiceClient>) -> Self {
        Self {
            client,
            control_serializer: AcsControlSerializer::default(),
            control_result_serializer: AcsControlResultSerializer::default(),
        }
    }

    pub fn with_serializers(
        mut self,
        control_serializer: AcsControlSerializer,
        control_result_serializer: AcsControlResultSerializer,
    ) -> Self {
        self.control_serializer = control_serializer;
        self.control_result_serializer = control_result_serializer;
        self
    }

    /// Sends to the control URL advertised by the payload ACS claim, provided
    /// the claim allows the control action.
    pub async fn send_control_for_payload(
        &self,
        registration: &Registration,
        control: &mut AcsControl,
        payload: &LtiMessagePayload,
    ) -> LtiResult<AcsControlResult> {
        self.try_send_control_for_payload(registration, control, payload)
            .await
            .map_err(|err| LtiError::wrap("Cannot send ACS control for payload", err))
    }

    async fn try_send_control_for_payload(
        &self,
        registration: &Registration,
        control: &mut AcsControl,
        payload: &LtiMessagePayload,
    ) -> anyhow::Result<AcsControlResult> {
        let acs = payload.acs()?.ok_or(ValidationError::MissingAcsClaim)?;
        if !acs.allows(control.action()) {
            warn!(
                registration = %registration.identifier,
                action = %control.action(),
                "acs: control action not allowed by payload"
            );
            return Err(ValidationError::ActionNotAllowed.into());
        }

        Ok(self
            .send_control(registration, control, &acs.assessment_control_url)
            .await?)
    }

    /// Leaves the issuer set to the platform audience on `control` when it
    /// had none.
    pub async fn send_control(
        &self,
        registration: &Registration,
        control: &mut AcsControl,
        acs_url: &str,
    ) -> LtiResult<AcsControlResult> {
        self.try_send_control(registration, control, acs_url)
            .await
            .map_err(|err| LtiError::wrap("Cannot send ACS control", err))
    }

    async fn try_send_control(
        &self,
        registration: &Registration,
        control: &mut AcsControl,
        acs_url: &str,
    ) -> anyhow::Result<AcsControlResult> {
        if control.issuer_identifier().is_none() {
            control.set_issuer_identifier(Some(registration.platform.audience.clone()));
        }

        let body = self.control_serializer.serialize(control)?;
        let response = self
            .client
            .request(
                registration,
                Method::POST,
                acs_url,
                ServiceRequestOptions::default()
                    .with_header(ACCEPT.as_str(), CONTENT_TYPE_CONTROL)
                    .with_body(body),
                &[AUTHORIZATION_SCOPE_CONTROL],
            )
            .await?;

        let result = self.control_result_serializer.deserialize(&response.body)?;
        info!(
            registration = %registration.identifier,
            action = %control.action(),
            status = %result.status(),
            "acs: control sent"
        );
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
