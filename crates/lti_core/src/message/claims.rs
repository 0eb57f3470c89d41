use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource_link::LtiResourceLink;

/// Named claims of a message payload, keyed by claim URI.
pub type Claims = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLinkClaim {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceLinkClaim {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
        }
    }
}

impl From<&LtiResourceLink> for ResourceLinkClaim {
    fn from(link: &LtiResourceLink) -> Self {
        Self {
            id: link.identifier().to_string(),
            title: link.title().map(str::to_string),
            description: link.text().map(str::to_string),
        }
    }
}

impl From<&ResourceLinkClaim> for LtiResourceLink {
    fn from(claim: &ResourceLinkClaim) -> Self {
        let mut link = LtiResourceLink::new(claim.id.clone());
        if let Some(title) = &claim.title {
            link = link.with_title(title.clone());
        }
        if let Some(description) = &claim.description {
            link = link.with_text(description.clone());
        }
        link
    }
}
