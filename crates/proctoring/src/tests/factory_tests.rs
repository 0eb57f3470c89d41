use super::*;
use serde_json::json;

fn valid_data() -> Map<String, Value> {
    json!({
        "user": { "iss": "http://platform.com", "sub": "userIdentifier" },
        "resource_link": {
            "id": "resourceLinkIdentifier",
            "title": "Exam",
            "description": "Final exam"
        },
        "attempt_number": 1,
        "action": "update",
        "incident_time": "2021-06-01T10:30:00+00:00",
        "extra_time": 10,
        "incident_severity": 0.5,
        "reason_code": "code",
        "reason_msg": "message"
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn control_error(data: &Map<String, Value>) -> String {
    AcsControlFactory.create(data).unwrap_err().to_string()
}

#[test]
fn creates_fully_populated_control() {
    let control = AcsControlFactory.create(&valid_data()).unwrap();

    assert_eq!(control.resource_link().identifier(), "resourceLinkIdentifier");
    assert_eq!(control.resource_link().title(), Some("Exam"));
    assert_eq!(control.resource_link().text(), Some("Final exam"));
    assert_eq!(control.user_identifier(), "userIdentifier");
    assert_eq!(control.issuer_identifier(), Some("http://platform.com"));
    assert_eq!(control.action(), AcsAction::Update);
    assert_eq!(control.attempt_number(), 1);
    assert_eq!(control.extra_time(), Some(10));
    assert_eq!(control.incident_severity(), Some(0.5));
    assert_eq!(control.reason_code(), Some("code"));
    assert_eq!(control.reason_message(), Some("message"));
    assert_eq!(
        control.incident_time(),
        DateTime::parse_from_rfc3339("2021-06-01T10:30:00Z").unwrap()
    );
}

#[test]
fn mandatory_fields_are_checked_in_order() {
    let cases: [(&[&str], &str); 6] = [
        (&["resource_link"], "Missing mandatory resource_link"),
        (&["user", "resource_link.id"], "Missing mandatory resource_link.id"),
        (&["user", "action"], "Missing mandatory user"),
        (&["user.sub", "user.iss"], "Missing mandatory user.sub"),
        (&["user.iss", "attempt_number"], "Missing mandatory user.iss"),
        (&["attempt_number", "incident_time"], "Missing mandatory attempt_number"),
    ];

    for (removed, expected) in cases {
        let mut data = valid_data();
        for key in removed {
            match key.split_once('.') {
                Some((parent, child)) => {
                    data[parent].as_object_mut().unwrap().remove(child);
                }
                None => {
                    data.remove(*key);
                }
            }
        }
        assert_eq!(
            control_error(&data),
            format!("Cannot create ACS control: {expected}"),
            "removed {removed:?}"
        );
    }

    let mut data = valid_data();
    data.remove("incident_time");
    assert_eq!(
        control_error(&data),
        "Cannot create ACS control: Missing mandatory incident_time"
    );
}

#[test]
fn missing_or_unknown_action_is_invalid() {
    let mut data = valid_data();
    data.insert("action".into(), json!("invalid"));
    assert_eq!(control_error(&data), "Cannot create ACS control: Invalid action");

    data.remove("action");
    assert_eq!(control_error(&data), "Cannot create ACS control: Invalid action");
}

#[test]
fn malformed_incident_time_is_wrapped() {
    let mut data = valid_data();
    data.insert("incident_time".into(), json!("not a date"));
    let message = control_error(&data);
    assert!(message.starts_with("Cannot create ACS control: "), "{message}");
}

#[test]
fn incident_time_without_offset_is_utc() {
    let mut data = valid_data();
    data.insert("incident_time".into(), json!("2021-06-01T10:30:00"));
    let control = AcsControlFactory.create(&data).unwrap();
    assert_eq!(
        control.incident_time(),
        DateTime::parse_from_rfc3339("2021-06-01T10:30:00Z").unwrap()
    );
}

#[test]
fn optional_fields_are_coerced_and_keep_zero() {
    let mut data = valid_data();
    data.insert("extra_time".into(), json!("0"));
    data.insert("incident_severity".into(), json!("0"));
    data.insert("attempt_number".into(), json!("2"));
    data.insert("reason_code".into(), Value::Null);

    let control = AcsControlFactory.create(&data).unwrap();
    assert_eq!(control.extra_time(), Some(0));
    assert_eq!(control.incident_severity(), Some(0.0));
    assert_eq!(control.attempt_number(), 2);
    assert_eq!(control.reason_code(), None);

    let mut data = valid_data();
    data.insert("extra_time".into(), json!(2.5));
    data.insert("attempt_number".into(), json!("3.9"));
    let control = AcsControlFactory.create(&data).unwrap();
    assert_eq!(control.extra_time(), Some(2));
    assert_eq!(control.attempt_number(), 3);

    let mut data = valid_data();
    data.insert("extra_time".into(), json!("2.5"));
    assert_eq!(AcsControlFactory.create(&data).unwrap().extra_time(), Some(2));
}

#[test]
fn non_coercible_values_are_invalid() {
    let mut data = valid_data();
    data.insert("extra_time".into(), json!("ten"));
    assert_eq!(control_error(&data), "Cannot create ACS control: Invalid extra_time");

    let mut data = valid_data();
    data.insert("attempt_number".into(), json!(0));
    assert_eq!(
        control_error(&data),
        "Cannot create ACS control: Invalid attempt_number"
    );

    let mut data = valid_data();
    data.insert("extra_time".into(), json!(-2.5));
    assert_eq!(control_error(&data), "Cannot create ACS control: Invalid extra_time");

    let mut data = valid_data();
    data.insert("extra_time".into(), json!("inf"));
    assert_eq!(control_error(&data), "Cannot create ACS control: Invalid extra_time");

    let mut data = valid_data();
    data.insert("attempt_number".into(), json!(0.5));
    assert_eq!(
        control_error(&data),
        "Cannot create ACS control: Invalid attempt_number"
    );

    let mut data = valid_data();
    data.insert("incident_severity".into(), json!("NaN"));
    assert_eq!(
        control_error(&data),
        "Cannot create ACS control: Invalid incident_severity"
    );

    let mut data = valid_data();
    data.insert("incident_severity".into(), json!([1]));
    assert_eq!(
        control_error(&data),
        "Cannot create ACS control: Invalid incident_severity"
    );
}

#[test]
fn creates_control_result() {
    let data = json!({ "status": "running", "extra_time": 5 });
    let result = AcsControlResultFactory
        .create(data.as_object().unwrap())
        .unwrap();
    assert_eq!(result.status(), AcsStatus::Running);
    assert_eq!(result.extra_time(), Some(5));
}

#[test]
fn control_result_requires_known_status() {
    for data in [json!({}), json!({ "status": "invalid" }), json!({ "status": null })] {
        let err = AcsControlResultFactory
            .create(data.as_object().unwrap())
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot create ACS control result: Invalid status");
    }
}
