use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    response::Response,
};
use lti_core::{
    security::RequestAccessTokenValidationResult, service::LtiServiceServerRequestHandler,
    Registration,
};
use tracing::debug;

use super::{AUTHORIZATION_SCOPE_CONTROL, CONTENT_TYPE_CONTROL, NAME};
use crate::{
    model::{AcsControl, AcsControlResult},
    serializer::{AcsControlResultSerializer, AcsControlSerializer},
};

/// Largest control body read when no limit is configured.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Application logic applying a received control.
#[async_trait]
pub trait AcsControlProcessor: Send + Sync {
    async fn process(
        &self,
        registration: &Registration,
        control: AcsControl,
    ) -> anyhow::Result<AcsControlResult>;
}

#[derive(Clone)]
pub struct AcsServiceServerRequestHandler {
    processor: Arc<dyn AcsControlProcessor>,
    control_serializer: AcsControlSerializer,
    control_result_serializer: AcsControlResultSerializer,
    max_body_bytes: usize,
}

impl AcsServiceServerRequestHandler {
    pub fn new(processor: Arc<dyn AcsControlProcessor>) -> Self {
        Self {
            processor,
            control_serializer: AcsControlSerializer::default(),
            control_result_serializer: AcsControlResultSerializer::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
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
}

#[async_trait]
impl LtiServiceServerRequestHandler for AcsServiceServerRequestHandler {
    fn service_name(&self) -> &str {
        NAME
    }

    fn allowed_content_type(&self) -> Option<&str> {
        Some(CONTENT_TYPE_CONTROL)
    }

    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::POST]
    }

    fn allowed_scopes(&self) -> Vec<&str> {
        vec![AUTHORIZATION_SCOPE_CONTROL]
    }

    async fn handle_validated_service_request(
        &self,
        validation: &RequestAccessTokenValidationResult,
        request: Request<Body>,
    ) -> anyhow::Result<Response> {
        let registration = validation
            .registration()
            .ok_or_else(|| anyhow!("validated ACS request carries no registration"))?;

        let body = to_bytes(request.into_body(), self.max_body_bytes)
            .await
            .context("failed to read ACS request body")?;
        let body = std::str::from_utf8(&body).context("ACS request body is not UTF-8")?;

        let control = self.control_serializer.deserialize(body)?;
        debug!(
            registration = %registration.identifier,
            action = %control.action(),
            user = control.user_identifier(),
            "acs: control received"
        );

        let result = self.processor.process(registration, control).await?;
        let response_body = self.control_result_serializer.serialize(&result)?;

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, CONTENT_TYPE_CONTROL)
            .header(CONTENT_LENGTH, response_body.len())
            .body(Body::from(response_body))?)
    }
}

#[cfg(test)]
#[path = "tests/server_tests.rs"]
mod tests;
