use thiserror::Error;

/// Low-level validation failure. Callers only see it wrapped in an
/// [`lti_core::LtiError`] carrying the failing operation's prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing mandatory {0}")]
    MissingField(&'static str),
    #[error("Invalid {0}")]
    InvalidField(&'static str),
    #[error("Control action {0} is not supported")]
    UnsupportedAction(String),
    #[error("Control result status {0} is not supported")]
    UnsupportedStatus(String),
    #[error("Missing {0} claim from payload")]
    MissingPayloadClaim(&'static str),
    #[error("Provided payload does not contain ACS claim")]
    MissingAcsClaim,
    #[error("Provided control action not allowed from ACS claim")]
    ActionNotAllowed,
}
