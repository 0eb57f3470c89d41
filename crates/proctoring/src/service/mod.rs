pub mod client;
pub mod server;

pub use client::AcsServiceClient;
pub use server::{AcsControlProcessor, AcsServiceServerRequestHandler, DEFAULT_MAX_BODY_BYTES};

/// Assessment Control Service.
pub const NAME: &str = "ACS";
pub const AUTHORIZATION_SCOPE_CONTROL: &str =
    "https://purl.imsglobal.org/spec/lti-ap/scope/control.all";
pub const CONTENT_TYPE_CONTROL: &str = "application/vnd.ims.lti-ap.v1.control+json";
