use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::ACCEPT, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::security::{RequestAccessTokenValidationResult, RequestAccessTokenValidator};

/// Service specific half of an LTI service endpoint. The generic checks
/// (method, content type, access token) run in [`LtiServiceServer`] first.
#[async_trait]
pub trait LtiServiceServerRequestHandler: Send + Sync {
    fn service_name(&self) -> &str;

    fn allowed_content_type(&self) -> Option<&str>;

    fn allowed_methods(&self) -> Vec<Method>;

    fn allowed_scopes(&self) -> Vec<&str>;

    async fn handle_validated_service_request(
        &self,
        validation: &RequestAccessTokenValidationResult,
        request: Request<Body>,
    ) -> anyhow::Result<Response>;
}

#[derive(Clone)]
pub struct LtiServiceServer {
    validator: Arc<dyn RequestAccessTokenValidator>,
    handler: Arc<dyn LtiServiceServerRequestHandler>,
}

fn plain(status: StatusCode, body: String) -> Response {
    (status, body).into_response()
}

impl LtiServiceServer {
    pub fn new(
        validator: Arc<dyn RequestAccessTokenValidator>,
        handler: Arc<dyn LtiServiceServerRequestHandler>,
    ) -> Self {
        Self { validator, handler }
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        let service = self.handler.service_name();

        let allowed_methods = self.handler.allowed_methods();
        if !allowed_methods.contains(request.method()) {
            let accepts = allowed_methods
                .iter()
                .map(|method| method.as_str().to_lowercase())
                .collect::<Vec<_>>()
                .join(", ");
            let message = format!("Not acceptable request method, accepts: [{accepts}]");
            error!(service, method = %request.method(), "{message}");
            return plain(StatusCode::METHOD_NOT_ALLOWED, message);
        }

        if let Some(content_type) = self.handler.allowed_content_type() {
            let accept = request
                .headers()
                .get(ACCEPT)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            if !accept.contains(content_type) {
                let message =
                    format!("Not acceptable request content type, accepts: {content_type}");
                error!(service, accept, "{message}");
                return plain(StatusCode::NOT_ACCEPTABLE, message);
            }
        }

        let validation = self
            .validator
            .validate(request.headers(), &self.handler.allowed_scopes());
        if let Some(validation_error) = validation.error() {
            error!(service, "{validation_error}");
            return plain(StatusCode::UNAUTHORIZED, validation_error.to_string());
        }

        match self
            .handler
            .handle_validated_service_request(&validation, request)
            .await
        {
            Ok(response) => {
                info!(service, status = %response.status(), "{service} service success");
                response
            }
            Err(err) => {
                error!(service, error = %err, "{err}");
                plain(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal {service} service error"),
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/server_tests.rs"]
mod tests;
