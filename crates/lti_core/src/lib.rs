//! LTI 1.3 core: registrations and key chains, signed message payloads,
//! launch composers, OAuth2 service access tokens and the generic service
//! client/server plumbing the advantage services are built on.

pub mod error;
pub mod message;
pub mod registration;
pub mod resource_link;
pub mod security;
pub mod service;

pub use error::{KeyChainError, LtiError, LtiResult};
pub use message::{Claims, LtiMessage, LtiMessagePayload, MessagePayloadBuilder};
pub use registration::{KeyChain, Registration, RegistrationRepository};
pub use resource_link::LtiResourceLink;
