use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde_json::Value;

use super::{
    claims::{Claims, ResourceLinkClaim},
    CLAIM_LTI_DEPLOYMENT_ID, CLAIM_LTI_MESSAGE_TYPE, CLAIM_LTI_RESOURCE_LINK, CLAIM_LTI_ROLES,
    CLAIM_LTI_TARGET_LINK_URI, CLAIM_LTI_VERSION, CLAIM_REGISTRATION_ID,
};
use crate::registration::KeyChain;

/// A signed message token together with its claims.
#[derive(Debug, Clone, PartialEq)]
pub struct LtiMessagePayload {
    token: String,
    claims: Claims,
}

impl LtiMessagePayload {
    pub(crate) fn new(token: String, claims: Claims) -> Self {
        Self { token, claims }
    }

    /// Verifies `token` against `key_chain` and checks its expiry.
    pub fn decode(token: &str, key_chain: &KeyChain) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(key_chain.algorithm());
        validation.validate_aud = false;
        let data = decode::<Claims>(token, key_chain.decoding_key(), &validation)?;
        Ok(Self::new(token.to_string(), data.claims))
    }

    /// Reads claims without verifying the signature, to find which key
    /// chain the token should then be verified with.
    pub fn peek(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let header = decode_header(token)?;
        let mut validation = Validation::new(header.alg);
        validation.insecure_disable_signature_validation();
        validation.validate_aud = false;
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn has_claim(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name).filter(|value| !value.is_null())
    }

    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claim(name).and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.claim_str("iss")
    }

    pub fn audience(&self) -> Option<&str> {
        self.claim_str("aud")
    }

    pub fn message_type(&self) -> Option<&str> {
        self.claim_str(CLAIM_LTI_MESSAGE_TYPE)
    }

    pub fn version(&self) -> Option<&str> {
        self.claim_str(CLAIM_LTI_VERSION)
    }

    pub fn deployment_id(&self) -> Option<&str> {
        self.claim_str(CLAIM_LTI_DEPLOYMENT_ID)
    }

    pub fn target_link_uri(&self) -> Option<&str> {
        self.claim_str(CLAIM_LTI_TARGET_LINK_URI)
    }

    pub fn registration_id(&self) -> Option<&str> {
        self.claim_str(CLAIM_REGISTRATION_ID)
    }

    pub fn roles(&self) -> Vec<&str> {
        self.claim(CLAIM_LTI_ROLES)
            .and_then(Value::as_array)
            .map(|roles| roles.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn resource_link(&self) -> Option<ResourceLinkClaim> {
        self.claim(CLAIM_LTI_RESOURCE_LINK)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
