use super::*;
use axum::{
    body,
    http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use chrono::Utc;
use lti_core::{
    registration::RegistrationSettings,
    security::{mint_client_assertion, CLIENT_ASSERTION_TYPE_JWT_BEARER},
    LtiResourceLink,
};
use lti_proctoring::{
    service::{AUTHORIZATION_SCOPE_CONTROL, CONTENT_TYPE_CONTROL},
    AcsAction, AcsControl, AcsControlResult, AcsControlSerializer, AcsServiceClient, AcsStatus,
};
use tower::ServiceExt;

fn test_app() -> Router {
    let settings = Settings::default();
    build_router(build_state(&settings), settings.max_body_bytes)
}

fn token_form(grant_type: &str, client_assertion: &str) -> String {
    format!(
        "grant_type={grant_type}&client_assertion_type={CLIENT_ASSERTION_TYPE_JWT_BEARER}\
         &client_assertion={client_assertion}&scope={AUTHORIZATION_SCOPE_CONTROL}"
    )
}

async fn request_token(app: &Router, form: String) -> (StatusCode, body::Bytes) {
    let request = Request::post("/oauth2/token")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, bytes)
}

fn control() -> AcsControl {
    AcsControl::new(
        LtiResourceLink::new("rl1"),
        "candidate",
        AcsAction::Pause,
        Utc::now().fixed_offset(),
        1,
    )
    .with_issuer_identifier("http://127.0.0.1:8090")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn token_then_acs_control_round_trip() {
    let app = test_app();
    let registration = RegistrationSettings::default().to_registration();
    let assertion = mint_client_assertion(&registration).expect("assertion");

    let (status, bytes) = request_token(&app, token_form("client_credentials", &assertion)).await;
    assert_eq!(status, StatusCode::OK);
    let token: AccessTokenResponse = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, 3600);
    assert_eq!(token.scope, AUTHORIZATION_SCOPE_CONTROL);

    let request = Request::post("/acs")
        .header(ACCEPT, CONTENT_TYPE_CONTROL)
        .header(AUTHORIZATION, format!("Bearer {}", token.access_token))
        .body(Body::from(
            AcsControlSerializer::default()
                .serialize(&control())
                .expect("serialize"),
        ))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).expect("content type"),
        CONTENT_TYPE_CONTROL
    );
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), br#"{"status":"paused"}"#);
}

#[tokio::test]
async fn unsupported_grant_type_is_oauth2_error() {
    let registration = RegistrationSettings::default().to_registration();
    let assertion = mint_client_assertion(&registration).expect("assertion");

    let (status, bytes) = request_token(&test_app(), token_form("password", &assertion)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: TokenErrorResponse = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(error.error, "unsupported_grant_type");
    assert_eq!(error.error_description, "unsupported grant type password");
}

#[tokio::test]
async fn assertion_signed_with_wrong_key_is_invalid_client() {
    let registration = RegistrationSettings {
        tool_secret: "not-the-tool-secret".into(),
        ..RegistrationSettings::default()
    }
    .to_registration();
    let assertion = mint_client_assertion(&registration).expect("assertion");

    let (status, bytes) =
        request_token(&test_app(), token_form("client_credentials", &assertion)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: TokenErrorResponse = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(error.error, "invalid_client");
}

#[tokio::test]
async fn acs_without_bearer_token_is_unauthorized() {
    let request = Request::post("/acs")
        .header(ACCEPT, CONTENT_TYPE_CONTROL)
        .body(Body::from("{}"))
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"Missing Authorization header");
}

#[tokio::test]
async fn acs_rejects_get() {
    let request = Request::get("/acs")
        .header(ACCEPT, CONTENT_TYPE_CONTROL)
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let settings = Settings {
        max_body_bytes: 16,
        ..Settings::default()
    };
    let app = build_router(build_state(&settings), settings.max_body_bytes);
    let request = Request::post("/acs")
        .header(ACCEPT, CONTENT_TYPE_CONTROL)
        .header(CONTENT_TYPE, CONTENT_TYPE_CONTROL)
        .header("content-length", "64")
        .body(Body::from("x".repeat(64)))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn acs_service_client_talks_to_running_server() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));

    let settings = Settings {
        registration: RegistrationSettings {
            platform_access_token_url: Some(format!("{base}/oauth2/token")),
            ..RegistrationSettings::default()
        },
        ..Settings::default()
    };
    let registration = settings.registration.to_registration();
    let app = build_router(build_state(&settings), settings.max_body_bytes);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let client = AcsServiceClient::default();
    let mut update = AcsControl::new(
        LtiResourceLink::new("rl1"),
        "candidate",
        AcsAction::Update,
        Utc::now().fixed_offset(),
        1,
    )
    .with_extra_time(30);
    let result = client
        .send_control(&registration, &mut update, &format!("{base}/acs"))
        .await
        .expect("send control");

    assert_eq!(
        result,
        AcsControlResult::new(AcsStatus::Running).with_extra_time(30)
    );
}
