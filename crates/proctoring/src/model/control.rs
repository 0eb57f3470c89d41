use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use lti_core::LtiResourceLink;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcsAction {
    Pause,
    Resume,
    Terminate,
    Update,
    Flag,
}

impl AcsAction {
    pub const ALL: [AcsAction; 5] = [
        AcsAction::Pause,
        AcsAction::Resume,
        AcsAction::Terminate,
        AcsAction::Update,
        AcsAction::Flag,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AcsAction::Pause => "pause",
            AcsAction::Resume => "resume",
            AcsAction::Terminate => "terminate",
            AcsAction::Update => "update",
            AcsAction::Flag => "flag",
        }
    }
}

impl fmt::Display for AcsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcsAction {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AcsAction::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ValidationError::UnsupportedAction(value.to_string()))
    }
}

/// Instruction affecting a proctored assessment attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AcsControl {
    resource_link: LtiResourceLink,
    user_identifier: String,
    issuer_identifier: Option<String>,
    action: AcsAction,
    incident_time: DateTime<FixedOffset>,
    attempt_number: u32,
    extra_time: Option<u32>,
    incident_severity: Option<f64>,
    reason_code: Option<String>,
    reason_message: Option<String>,
}

impl AcsControl {
    pub fn new(
        resource_link: LtiResourceLink,
        user_identifier: impl Into<String>,
        action: AcsAction,
        incident_time: DateTime<FixedOffset>,
        attempt_number: u32,
    ) -> Self {
        Self {
            resource_link,
            user_identifier: user_identifier.into(),
            issuer_identifier: None,
            action,
            incident_time,
            attempt_number,
            extra_time: None,
            incident_severity: None,
            reason_code: None,
            reason_message: None,
        }
    }

    pub fn with_issuer_identifier(mut self, issuer_identifier: impl Into<String>) -> Self {
        self.issuer_identifier = Some(issuer_identifier.into());
        self
    }

    pub fn with_extra_time(mut self, extra_time: u32) -> Self {
        self.extra_time = Some(extra_time);
        self
    }

    pub fn with_incident_severity(mut self, incident_severity: f64) -> Self {
        self.incident_severity = Some(incident_severity);
        self
    }

    pub fn with_reason_code(mut self, reason_code: impl Into<String>) -> Self {
        self.reason_code = Some(reason_code.into());
        self
    }

    pub fn with_reason_message(mut self, reason_message: impl Into<String>) -> Self {
        self.reason_message = Some(reason_message.into());
        self
    }

    pub fn resource_link(&self) -> &LtiResourceLink {
        &self.resource_link
    }

    pub fn set_resource_link(&mut self, resource_link: LtiResourceLink) -> &mut Self {
        self.resource_link = resource_link;
        self
    }

    pub fn user_identifier(&self) -> &str {
        &self.user_identifier
    }

    pub fn set_user_identifier(&mut self, user_identifier: impl Into<String>) -> &mut Self {
        self.user_identifier = user_identifier.into();
        self
    }

    pub fn issuer_identifier(&self) -> Option<&str> {
        self.issuer_identifier.as_deref()
    }

    pub fn set_issuer_identifier(&mut self, issuer_identifier: Option<String>) -> &mut Self {
        self.issuer_identifier = issuer_identifier;
        self
    }

    pub fn action(&self) -> AcsAction {
        self.action
    }

    pub fn set_action(&mut self, action: AcsAction) -> &mut Self {
        self.action = action;
        self
    }

    /// Sets the action from its wire name, rejecting anything outside the
    /// action set.
    pub fn set_action_str(&mut self, action: &str) -> Result<&mut Self, ValidationError> {
        self.action = action.parse()?;
        Ok(self)
    }

    pub fn incident_time(&self) -> DateTime<FixedOffset> {
        self.incident_time
    }

    pub fn set_incident_time(&mut self, incident_time: DateTime<FixedOffset>) -> &mut Self {
        self.incident_time = incident_time;
        self
    }

    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    pub fn set_attempt_number(&mut self, attempt_number: u32) -> &mut Self {
        self.attempt_number = attempt_number;
        self
    }

    /// Minutes.
    pub fn extra_time(&self) -> Option<u32> {
        self.extra_time
    }

    pub fn set_extra_time(&mut self, extra_time: Option<u32>) -> &mut Self {
        self.extra_time = extra_time;
        self
    }

    pub fn incident_severity(&self) -> Option<f64> {
        self.incident_severity
    }

    pub fn set_incident_severity(&mut self, incident_severity: Option<f64>) -> &mut Self {
        self.incident_severity = incident_severity;
        self
    }

    pub fn reason_code(&self) -> Option<&str> {
        self.reason_code.as_deref()
    }

    pub fn set_reason_code(&mut self, reason_code: Option<String>) -> &mut Self {
        self.reason_code = reason_code;
        self
    }

    pub fn reason_message(&self) -> Option<&str> {
        self.reason_message.as_deref()
    }

    pub fn set_reason_message(&mut self, reason_message: Option<String>) -> &mut Self {
        self.reason_message = reason_message;
        self
    }
}

#[derive(Serialize)]
struct WireUser<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<&'a str>,
    sub: &'a str,
}

#[derive(Serialize)]
struct WireResourceLink<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct WireControl<'a> {
    user: WireUser<'a>,
    resource_link: WireResourceLink<'a>,
    attempt_number: u32,
    action: AcsAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_time: Option<u32>,
    incident_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    incident_severity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason_msg: Option<&'a str>,
}

impl Serialize for AcsControl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireControl {
            user: WireUser {
                iss: self.issuer_identifier(),
                sub: &self.user_identifier,
            },
            resource_link: WireResourceLink {
                id: self.resource_link.identifier(),
            },
            attempt_number: self.attempt_number,
            action: self.action,
            extra_time: self.extra_time,
            incident_time: self
                .incident_time
                .to_rfc3339_opts(SecondsFormat::AutoSi, false),
            // JSON has no literal for NaN or infinities.
            incident_severity: self.incident_severity.filter(|severity| severity.is_finite()),
            reason_code: self.reason_code(),
            reason_msg: self.reason_message(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
#[path = "tests/control_tests.rs"]
mod tests;
