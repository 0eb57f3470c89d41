use super::*;
use crate::message::{
    launch::{StartProctoringLaunchRequest, StartProctoringLaunchRequestBuilder},
    CLAIM_PROCTORING_START_ASSESSMENT_URL,
};
use lti_core::{registration::RegistrationSettings, LtiResourceLink};
use serde_json::Value;

fn registration() -> Registration {
    RegistrationSettings {
        tool_launch_url: Some("https://tool/launch".into()),
        ..RegistrationSettings::default()
    }
    .to_registration()
}

fn jwt_payload(message: &LtiMessage, registration: &Registration) -> LtiMessagePayload {
    LtiMessagePayload::decode(
        message.parameter("JWT").unwrap(),
        registration.tool_key_chain().unwrap(),
    )
    .unwrap()
}

/// The payload a tool receives from a start proctoring launch.
fn start_proctoring_payload(registration: &Registration) -> LtiMessagePayload {
    let message = StartProctoringLaunchRequestBuilder::default()
        .build_start_proctoring_launch_request(
            registration,
            StartProctoringLaunchRequest::new(
                LtiResourceLink::new("rl1"),
                "https://platform/start-assessment",
                "lh",
            )
            .with_attempt_number(2),
        )
        .unwrap();
    LtiMessagePayload::decode(
        message.parameter("lti_message_hint").unwrap(),
        registration.platform_key_chain().unwrap(),
    )
    .unwrap()
}

#[test]
fn direct_launch_posts_signed_claims_to_start_assessment_url() {
    let registration = registration();
    let message = StartAssessmentLaunchRequestBuilder::default()
        .build_start_assessment_launch_request(
            &registration,
            StartAssessmentLaunchRequest::new(
                ResourceLinkClaim::new("rl1"),
                "https://platform/start-assessment",
                "session",
            )
            .with_end_assessment_return(true),
        )
        .unwrap();

    assert_eq!(message.url(), "https://platform/start-assessment");
    let payload = jwt_payload(&message, &registration);
    assert_eq!(payload.message_type(), Some(MESSAGE_TYPE_START_ASSESSMENT));
    assert_eq!(payload.resource_link().unwrap().id, "rl1");
    assert_eq!(payload.proctoring_session_data(), Some("session"));
    assert_eq!(payload.proctoring_attempt_number(), Some(1));
    assert_eq!(payload.proctoring_end_assessment_return(), Some(true));
}

#[test]
fn launch_from_payload_echoes_inbound_claims() {
    let registration = registration();
    let inbound = start_proctoring_payload(&registration);

    let message = StartAssessmentLaunchRequestBuilder::default()
        .build_start_assessment_launch_request_from_payload(
            &inbound,
            &registration,
            None,
            Claims::from_iter([("custom".to_string(), Value::from("value"))]),
            false,
        )
        .unwrap();

    assert_eq!(message.url(), "https://platform/start-assessment");
    let payload = jwt_payload(&message, &registration);
    assert_eq!(payload.resource_link().unwrap().id, "rl1");
    assert_eq!(
        payload.proctoring_session_data(),
        inbound.proctoring_session_data()
    );
    assert_eq!(payload.proctoring_attempt_number(), Some(2));
    assert_eq!(payload.proctoring_end_assessment_return(), Some(false));
    assert_eq!(payload.claim_str("custom"), Some("value"));
}

#[test]
fn missing_payload_claims_are_reported_in_order() {
    let registration = registration();
    let inbound = start_proctoring_payload(&registration);

    let cases = [
        (CLAIM_LTI_RESOURCE_LINK, "Missing resource link claim from payload"),
        (
            CLAIM_PROCTORING_START_ASSESSMENT_URL,
            "Missing start assessment url claim from payload",
        ),
        (CLAIM_PROCTORING_SESSION_DATA, "Missing session data claim from payload"),
        (CLAIM_PROCTORING_ATTEMPT_NUMBER, "Missing attempt number claim from payload"),
    ];

    // Each case also drops every later claim: the earliest missing one wins.
    for (index, (_, expected)) in cases.iter().enumerate() {
        let mut claims = inbound.claims().clone();
        for (claim, _) in &cases[index..] {
            claims.remove(*claim);
        }
        let stripped = LtiMessagePayload::decode(
            &sign(&registration, &claims),
            registration.platform_key_chain().unwrap(),
        )
        .unwrap();

        let err = StartAssessmentLaunchRequestBuilder::default()
            .build_start_assessment_launch_request_from_payload(
                &stripped,
                &registration,
                None,
                Claims::new(),
                false,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Cannot create start assessment launch request from payload: {expected}")
        );
    }
}

fn sign(registration: &Registration, claims: &Claims) -> String {
    let mut builder = lti_core::MessagePayloadBuilder::new();
    builder.with_claims(claims.clone());
    builder
        .build_message_payload(registration.platform_key_chain().unwrap())
        .unwrap()
        .token()
        .to_string()
}

#[test]
fn invalid_deployment_propagates_unchanged_from_payload() {
    let registration = registration();
    let inbound = start_proctoring_payload(&registration);

    let err = StartAssessmentLaunchRequestBuilder::default()
        .build_start_assessment_launch_request_from_payload(
            &inbound,
            &registration,
            Some("invalid"),
            Claims::new(),
            false,
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid deployment id invalid for registration local"
    );
}

#[test]
fn missing_tool_key_chain_is_wrapped() {
    let mut registration = registration();
    registration.tool_key_chain = None;

    let err = StartAssessmentLaunchRequestBuilder::default()
        .build_start_assessment_launch_request(
            &registration,
            StartAssessmentLaunchRequest::new(
                ResourceLinkClaim::new("rl1"),
                "https://sa",
                "session",
            ),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot create start assessment launch request: Missing tool key chain for registration local"
    );
}
