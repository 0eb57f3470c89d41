use super::*;
use crate::registration::RegistrationSettings;
use anyhow::anyhow;
use axum::{body::to_bytes, http::HeaderMap, routing::any, Router};
use tower::ServiceExt;

const CONTENT_TYPE: &str = "application/vnd.test+json";

struct StaticValidator {
    error: Option<&'static str>,
}

impl RequestAccessTokenValidator for StaticValidator {
    fn validate(
        &self,
        _headers: &HeaderMap,
        _allowed_scopes: &[&str],
    ) -> RequestAccessTokenValidationResult {
        match self.error {
            Some(error) => RequestAccessTokenValidationResult::failure(error),
            None => RequestAccessTokenValidationResult::success(
                RegistrationSettings::default().to_registration(),
                vec!["scope".into()],
            ),
        }
    }
}

struct EchoHandler {
    fail: bool,
}

#[async_trait]
impl LtiServiceServerRequestHandler for EchoHandler {
    fn service_name(&self) -> &str {
        "TEST"
    }

    fn allowed_content_type(&self) -> Option<&str> {
        Some(CONTENT_TYPE)
    }

    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::POST]
    }

    fn allowed_scopes(&self) -> Vec<&str> {
        vec!["scope"]
    }

    async fn handle_validated_service_request(
        &self,
        validation: &RequestAccessTokenValidationResult,
        request: Request<Body>,
    ) -> anyhow::Result<Response> {
        if self.fail {
            return Err(anyhow!("generic error"));
        }
        let registration = validation
            .registration()
            .ok_or_else(|| anyhow!("no registration"))?;
        let body = to_bytes(request.into_body(), usize::MAX).await?;
        Ok(format!(
            "{}:{}",
            registration.identifier,
            String::from_utf8_lossy(&body)
        )
        .into_response())
    }
}

fn server(validation_error: Option<&'static str>, fail: bool) -> LtiServiceServer {
    LtiServiceServer::new(
        Arc::new(StaticValidator {
            error: validation_error,
        }),
        Arc::new(EchoHandler { fail }),
    )
}

fn request(method: Method, accept: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/service")
        .header(ACCEPT, accept)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn validated_request_reaches_handler() {
    let response = server(None, false)
        .handle(request(Method::POST, CONTENT_TYPE, "hello"))
        .await;
    assert_eq!(read(response).await, (StatusCode::OK, "local:hello".into()));
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let response = server(None, false)
        .handle(request(Method::GET, CONTENT_TYPE, ""))
        .await;
    assert_eq!(
        read(response).await,
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Not acceptable request method, accepts: [post]".into()
        )
    );
}

#[tokio::test]
async fn wrong_accept_header_is_rejected() {
    let response = server(None, false)
        .handle(request(Method::POST, "invalid", ""))
        .await;
    assert_eq!(
        read(response).await,
        (
            StatusCode::NOT_ACCEPTABLE,
            format!("Not acceptable request content type, accepts: {CONTENT_TYPE}")
        )
    );
}

#[tokio::test]
async fn validation_error_is_unauthorized() {
    let response = server(Some("validation error"), false)
        .handle(request(Method::POST, CONTENT_TYPE, ""))
        .await;
    assert_eq!(
        read(response).await,
        (StatusCode::UNAUTHORIZED, "validation error".into())
    );
}

#[tokio::test]
async fn handler_failure_is_internal_error() {
    let response = server(None, true)
        .handle(request(Method::POST, CONTENT_TYPE, ""))
        .await;
    assert_eq!(
        read(response).await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal TEST service error".into()
        )
    );
}

#[tokio::test]
async fn server_mounts_on_router() {
    let server = server(None, false);
    let app = Router::new().route(
        "/service",
        any(move |request: Request<Body>| async move { server.handle(request).await }),
    );

    let response = app
        .oneshot(request(Method::POST, CONTENT_TYPE, "routed"))
        .await
        .unwrap();
    assert_eq!(read(response).await, (StatusCode::OK, "local:routed".into()));
}
