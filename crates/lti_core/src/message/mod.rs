pub mod builder;
pub mod claims;
pub mod launch;
pub mod payload;

pub use builder::MessagePayloadBuilder;
pub use claims::{Claims, ResourceLinkClaim};
pub use launch::{LtiMessage, PlatformOriginatingLaunchBuilder, ToolOriginatingLaunchBuilder};
pub use payload::LtiMessagePayload;

pub const LTI_VERSION: &str = "1.3.0";

pub const CLAIM_LTI_MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
pub const CLAIM_LTI_VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
pub const CLAIM_LTI_DEPLOYMENT_ID: &str = "https://purl.imsglobal.org/spec/lti/claim/deployment_id";
pub const CLAIM_LTI_TARGET_LINK_URI: &str =
    "https://purl.imsglobal.org/spec/lti/claim/target_link_uri";
pub const CLAIM_LTI_ROLES: &str = "https://purl.imsglobal.org/spec/lti/claim/roles";
pub const CLAIM_LTI_RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
pub const CLAIM_REGISTRATION_ID: &str = "registration_id";

pub const ROLE_LEARNER: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner";
pub const ROLE_INSTRUCTOR: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor";
