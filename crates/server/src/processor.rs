use async_trait::async_trait;
use lti_core::Registration;
use lti_proctoring::{AcsAction, AcsControl, AcsControlProcessor, AcsControlResult, AcsStatus};
use tracing::info;

/// Demo assessment engine: answers each control with the status the action
/// leads to, without keeping any attempt state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStatusProcessor;

impl ActionStatusProcessor {
    pub fn status_for(action: AcsAction) -> AcsStatus {
        match action {
            AcsAction::Pause => AcsStatus::Paused,
            AcsAction::Terminate => AcsStatus::Terminated,
            AcsAction::Resume | AcsAction::Update | AcsAction::Flag => AcsStatus::Running,
        }
    }
}

#[async_trait]
impl AcsControlProcessor for ActionStatusProcessor {
    async fn process(
        &self,
        registration: &Registration,
        control: AcsControl,
    ) -> anyhow::Result<AcsControlResult> {
        let status = Self::status_for(control.action());
        let mut result = AcsControlResult::new(status);
        if control.action() == AcsAction::Update {
            if let Some(extra_time) = control.extra_time() {
                result = result.with_extra_time(extra_time);
            }
        }

        info!(
            registration = %registration.identifier,
            resource_link = control.resource_link().identifier(),
            user = control.user_identifier(),
            action = %control.action(),
            status = %status,
            "acs: control applied"
        );

        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/processor_tests.rs"]
mod tests;
