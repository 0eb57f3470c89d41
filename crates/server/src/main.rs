use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::{any, get, post},
    Form, Json, Router,
};
use lti_core::{
    registration::InMemoryRegistrationRepository,
    security::{
        AccessTokenError, AccessTokenIssuer, AccessTokenRequest, AccessTokenResponse,
        JwtRequestAccessTokenValidator,
    },
    service::LtiServiceServer,
    RegistrationRepository,
};
use lti_proctoring::AcsServiceServerRequestHandler;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

mod config;
mod processor;

use config::{load_settings, Settings};
use processor::ActionStatusProcessor;

#[derive(Clone)]
struct AppState {
    issuer: AccessTokenIssuer,
    acs: LtiServiceServer,
}

/// OAuth2 error body of the token endpoint.
#[derive(Debug, Serialize, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let app = build_router(build_state(&settings), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        registration = %settings.registration.identifier,
        client_id = %settings.registration.client_id,
        "acs server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(settings: &Settings) -> AppState {
    let repository: Arc<dyn RegistrationRepository> = Arc::new(
        InMemoryRegistrationRepository::new(vec![settings.registration.to_registration()]),
    );

    AppState {
        issuer: AccessTokenIssuer::new(repository.clone())
            .with_ttl_seconds(settings.access_token_ttl_seconds),
        acs: LtiServiceServer::new(
            Arc::new(JwtRequestAccessTokenValidator::new(repository)),
            Arc::new(
                AcsServiceServerRequestHandler::new(Arc::new(ActionStatusProcessor))
                    .with_max_body_bytes(settings.max_body_bytes),
            ),
        ),
    }
}

fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/oauth2/token", post(token))
        .route("/acs", any(acs))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn token(
    State(state): State<AppState>,
    Form(request): Form<AccessTokenRequest>,
) -> Result<Json<AccessTokenResponse>, (StatusCode, Json<TokenErrorResponse>)> {
    state.issuer.issue(&request).map(Json).map_err(|error| {
        warn!(code = error.error_code(), %error, "oauth2: token request rejected");
        let status = match error {
            AccessTokenError::InvalidClient(_) => StatusCode::UNAUTHORIZED,
            AccessTokenError::Signing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(TokenErrorResponse {
                error: error.error_code().to_string(),
                error_description: error.to_string(),
            }),
        )
    })
}

async fn acs(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.acs.handle(request).await
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
