use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::Deserialize;

use crate::error::KeyChainError;

/// Signing material for one side of a registration.
#[derive(Clone)]
pub struct KeyChain {
    identifier: String,
    key_set_name: String,
    algorithm: Algorithm,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
}

impl KeyChain {
    /// HS256 key chain sharing one secret for signing and verification.
    pub fn from_secret(
        identifier: impl Into<String>,
        key_set_name: impl Into<String>,
        secret: &[u8],
    ) -> Self {
        Self {
            identifier: identifier.into(),
            key_set_name: key_set_name.into(),
            algorithm: Algorithm::HS256,
            encoding_key: Some(EncodingKey::from_secret(secret)),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// RS256 key chain; without a private key it can only verify.
    pub fn from_rsa_pem(
        identifier: impl Into<String>,
        key_set_name: impl Into<String>,
        public_key_pem: &[u8],
        private_key_pem: Option<&[u8]>,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let encoding_key = private_key_pem
            .map(EncodingKey::from_rsa_pem)
            .transpose()?;
        Ok(Self {
            identifier: identifier.into(),
            key_set_name: key_set_name.into(),
            algorithm: Algorithm::RS256,
            encoding_key,
            decoding_key: DecodingKey::from_rsa_pem(public_key_pem)?,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn key_set_name(&self) -> &str {
        &self.key_set_name
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encoding_key(&self) -> Result<&EncodingKey, KeyChainError> {
        self.encoding_key
            .as_ref()
            .ok_or_else(|| KeyChainError::MissingPrivateKey(self.identifier.clone()))
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChain")
            .field("identifier", &self.identifier)
            .field("key_set_name", &self.key_set_name)
            .field("algorithm", &self.algorithm)
            .field("has_private_key", &self.encoding_key.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub identifier: String,
    pub name: String,
    pub audience: String,
    pub oidc_authentication_url: Option<String>,
    pub oauth2_access_token_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub identifier: String,
    pub name: String,
    pub audience: String,
    pub oidc_initiation_url: Option<String>,
    pub launch_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub identifier: String,
    pub client_id: String,
    pub platform: Platform,
    pub tool: Tool,
    pub deployment_ids: Vec<String>,
    pub platform_key_chain: Option<KeyChain>,
    pub tool_key_chain: Option<KeyChain>,
}

impl Registration {
    pub fn default_deployment_id(&self) -> Option<&str> {
        self.deployment_ids.first().map(String::as_str)
    }

    pub fn has_deployment_id(&self, deployment_id: &str) -> bool {
        self.deployment_ids.iter().any(|id| id == deployment_id)
    }

    pub fn platform_key_chain(&self) -> Result<&KeyChain, KeyChainError> {
        self.platform_key_chain
            .as_ref()
            .ok_or_else(|| KeyChainError::MissingPlatformKeyChain(self.identifier.clone()))
    }

    pub fn tool_key_chain(&self) -> Result<&KeyChain, KeyChainError> {
        self.tool_key_chain
            .as_ref()
            .ok_or_else(|| KeyChainError::MissingToolKeyChain(self.identifier.clone()))
    }
}

pub trait RegistrationRepository: Send + Sync {
    fn find(&self, identifier: &str) -> Option<Registration>;
    fn find_by_client_id(&self, client_id: &str) -> Option<Registration>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistrationRepository {
    registrations: Vec<Registration>,
}

impl InMemoryRegistrationRepository {
    pub fn new(registrations: Vec<Registration>) -> Self {
        Self { registrations }
    }

    pub fn add(&mut self, registration: Registration) {
        self.registrations.push(registration);
    }
}

impl RegistrationRepository for InMemoryRegistrationRepository {
    fn find(&self, identifier: &str) -> Option<Registration> {
        self.registrations
            .iter()
            .find(|registration| registration.identifier == identifier)
            .cloned()
    }

    fn find_by_client_id(&self, client_id: &str) -> Option<Registration> {
        self.registrations
            .iter()
            .find(|registration| registration.client_id == client_id)
            .cloned()
    }
}

/// File representation of a single registration with shared-secret key chains.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationSettings {
    pub identifier: String,
    pub client_id: String,
    pub deployment_ids: Vec<String>,
    pub platform_identifier: String,
    pub platform_audience: String,
    #[serde(default)]
    pub platform_oidc_authentication_url: Option<String>,
    #[serde(default)]
    pub platform_access_token_url: Option<String>,
    pub platform_secret: String,
    pub tool_identifier: String,
    pub tool_audience: String,
    #[serde(default)]
    pub tool_oidc_initiation_url: Option<String>,
    #[serde(default)]
    pub tool_launch_url: Option<String>,
    pub tool_secret: String,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            identifier: "local".into(),
            client_id: "local-client".into(),
            deployment_ids: vec!["deployment-1".into()],
            platform_identifier: "platform".into(),
            platform_audience: "http://127.0.0.1:8090".into(),
            platform_oidc_authentication_url: None,
            platform_access_token_url: Some("http://127.0.0.1:8090/oauth2/token".into()),
            platform_secret: "platform-dev-secret".into(),
            tool_identifier: "tool".into(),
            tool_audience: "http://127.0.0.1:8091".into(),
            tool_oidc_initiation_url: Some("http://127.0.0.1:8091/oidc/init".into()),
            tool_launch_url: Some("http://127.0.0.1:8091/launch".into()),
            tool_secret: "tool-dev-secret".into(),
        }
    }
}

impl RegistrationSettings {
    pub fn to_registration(&self) -> Registration {
        Registration {
            identifier: self.identifier.clone(),
            client_id: self.client_id.clone(),
            platform: Platform {
                identifier: self.platform_identifier.clone(),
                name: self.platform_identifier.clone(),
                audience: self.platform_audience.clone(),
                oidc_authentication_url: self.platform_oidc_authentication_url.clone(),
                oauth2_access_token_url: self.platform_access_token_url.clone(),
            },
            tool: Tool {
                identifier: self.tool_identifier.clone(),
                name: self.tool_identifier.clone(),
                audience: self.tool_audience.clone(),
                oidc_initiation_url: self.tool_oidc_initiation_url.clone(),
                launch_url: self.tool_launch_url.clone(),
            },
            deployment_ids: self.deployment_ids.clone(),
            platform_key_chain: Some(KeyChain::from_secret(
                format!("{}-platform", self.identifier),
                "platformSet",
                self.platform_secret.as_bytes(),
            )),
            tool_key_chain: Some(KeyChain::from_secret(
                format!("{}-tool", self.identifier),
                "toolSet",
                self.tool_secret.as_bytes(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
