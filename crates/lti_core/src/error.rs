use thiserror::Error;

/// Error surfaced by every LTI operation.
///
/// Domain failures carry their message as-is; anything else is wrapped under
/// the failing operation's prefix, rendering as `<context>: <cause>`.
#[derive(Debug, Error)]
pub enum LtiError {
    #[error("{0}")]
    Message(String),
    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        source: anyhow::Error,
    },
}

impl LtiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn wrap(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Wrapped {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Lets an `LtiError` raised deeper in the call chain through untouched,
    /// wrapping any other failure under `context`.
    pub fn rethrow_or_wrap(context: impl Into<String>, source: anyhow::Error) -> Self {
        match source.downcast::<LtiError>() {
            Ok(lti) => lti,
            Err(other) => Self::wrap(context, other),
        }
    }
}

pub type LtiResult<T> = Result<T, LtiError>;

#[derive(Debug, Error)]
pub enum KeyChainError {
    #[error("Missing platform key chain for registration {0}")]
    MissingPlatformKeyChain(String),
    #[error("Missing tool key chain for registration {0}")]
    MissingToolKeyChain(String),
    #[error("Key chain {0} has no private key")]
    MissingPrivateKey(String),
}
