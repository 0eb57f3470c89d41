use super::*;
use chrono::Utc;
use lti_core::{registration::RegistrationSettings, LtiResourceLink};

fn control(action: AcsAction) -> AcsControl {
    AcsControl::new(
        LtiResourceLink::new("rl1"),
        "candidate",
        action,
        Utc::now().fixed_offset(),
        1,
    )
    .with_extra_time(15)
}

#[test]
fn actions_map_to_statuses() {
    assert_eq!(ActionStatusProcessor::status_for(AcsAction::Pause), AcsStatus::Paused);
    assert_eq!(ActionStatusProcessor::status_for(AcsAction::Resume), AcsStatus::Running);
    assert_eq!(
        ActionStatusProcessor::status_for(AcsAction::Terminate),
        AcsStatus::Terminated
    );
    assert_eq!(ActionStatusProcessor::status_for(AcsAction::Update), AcsStatus::Running);
    assert_eq!(ActionStatusProcessor::status_for(AcsAction::Flag), AcsStatus::Running);
}

#[tokio::test]
async fn update_grants_requested_extra_time() {
    let registration = RegistrationSettings::default().to_registration();
    let result = ActionStatusProcessor
        .process(&registration, control(AcsAction::Update))
        .await
        .expect("process");
    assert_eq!(
        result,
        AcsControlResult::new(AcsStatus::Running).with_extra_time(15)
    );
}

#[tokio::test]
async fn other_actions_ignore_extra_time() {
    let registration = RegistrationSettings::default().to_registration();
    let result = ActionStatusProcessor
        .process(&registration, control(AcsAction::Pause))
        .await
        .expect("process");
    assert_eq!(result, AcsControlResult::new(AcsStatus::Paused));
    assert_eq!(result.extra_time(), None);
}
