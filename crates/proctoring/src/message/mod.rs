pub mod launch;

use lti_core::LtiMessagePayload;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::model::AcsAction;

pub const MESSAGE_TYPE_START_PROCTORING: &str = "LtiStartProctoring";
pub const MESSAGE_TYPE_START_ASSESSMENT: &str = "LtiStartAssessment";
pub const MESSAGE_TYPE_END_ASSESSMENT: &str = "LtiEndAssessment";

pub const CLAIM_PROCTORING_START_ASSESSMENT_URL: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/start_assessment_url";
pub const CLAIM_PROCTORING_SESSION_DATA: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/session_data";
pub const CLAIM_PROCTORING_ATTEMPT_NUMBER: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/attempt_number";
pub const CLAIM_PROCTORING_END_ASSESSMENT_RETURN: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/end_assessment_return";
pub const CLAIM_PROCTORING_ACS: &str = "https://purl.imsglobal.org/spec/lti-ap/claim/acs";
pub const CLAIM_PROCTORING_ERROR_MESSAGE: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/error_message";
pub const CLAIM_PROCTORING_ERROR_LOG: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/error_log";

/// Actions a tool may send and where to send them.
///
/// Actions stay as raw strings: a platform may grant values this crate does
/// not know, and those must not hide the ones it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcsClaim {
    pub actions: Vec<String>,
    pub assessment_control_url: String,
}

impl AcsClaim {
    pub fn new(
        actions: impl IntoIterator<Item = AcsAction>,
        assessment_control_url: impl Into<String>,
    ) -> Self {
        Self {
            actions: actions
                .into_iter()
                .map(|action| action.as_str().to_string())
                .collect(),
            assessment_control_url: assessment_control_url.into(),
        }
    }

    pub fn allows(&self, action: AcsAction) -> bool {
        self.actions.iter().any(|granted| granted == action.as_str())
    }
}

impl From<&AcsClaim> for Value {
    fn from(claim: &AcsClaim) -> Self {
        json!({
            "actions": claim.actions,
            "assessment_control_url": claim.assessment_control_url,
        })
    }
}

/// Proctoring claim accessors on an inbound payload.
pub trait ProctoringPayloadExt {
    fn proctoring_start_assessment_url(&self) -> Option<&str>;
    fn proctoring_session_data(&self) -> Option<&str>;
    fn proctoring_attempt_number(&self) -> Option<u32>;
    fn proctoring_end_assessment_return(&self) -> Option<bool>;
    fn proctoring_error_message(&self) -> Option<&str>;
    fn proctoring_error_log(&self) -> Option<&str>;
    fn acs(&self) -> Result<Option<AcsClaim>, serde_json::Error>;
}

impl ProctoringPayloadExt for LtiMessagePayload {
    fn proctoring_start_assessment_url(&self) -> Option<&str> {
        self.claim_str(CLAIM_PROCTORING_START_ASSESSMENT_URL)
    }

    fn proctoring_session_data(&self) -> Option<&str> {
        self.claim_str(CLAIM_PROCTORING_SESSION_DATA)
    }

    fn proctoring_attempt_number(&self) -> Option<u32> {
        self.claim(CLAIM_PROCTORING_ATTEMPT_NUMBER)
            .and_then(Value::as_u64)
            .and_then(|number| u32::try_from(number).ok())
    }

    fn proctoring_end_assessment_return(&self) -> Option<bool> {
        self.claim(CLAIM_PROCTORING_END_ASSESSMENT_RETURN)
            .and_then(Value::as_bool)
    }

    fn proctoring_error_message(&self) -> Option<&str> {
        self.claim_str(CLAIM_PROCTORING_ERROR_MESSAGE)
    }

    fn proctoring_error_log(&self) -> Option<&str> {
        self.claim_str(CLAIM_PROCTORING_ERROR_LOG)
    }

    fn acs(&self) -> Result<Option<AcsClaim>, serde_json::Error> {
        self.claim(CLAIM_PROCTORING_ACS)
            .map(AcsClaim::deserialize)
            .transpose()
    }
}
