use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Header};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{claims::Claims, payload::LtiMessagePayload};
use crate::registration::KeyChain;

const DEFAULT_MESSAGE_TTL_SECONDS: i64 = 600;

/// Accumulates claims and signs them into a message payload.
///
/// The builder is stateful: claims stay attached across builds until
/// [`MessagePayloadBuilder::reset`] is called.
#[derive(Debug, Clone)]
pub struct MessagePayloadBuilder {
    claims: Claims,
    ttl_seconds: i64,
}

impl Default for MessagePayloadBuilder {
    fn default() -> Self {
        Self {
            claims: Claims::new(),
            ttl_seconds: DEFAULT_MESSAGE_TTL_SECONDS,
        }
    }
}

impl MessagePayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.claims.clear();
        self
    }

    pub fn with_claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn with_serialized_claim<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        Ok(self.with_claim(name, value))
    }

    pub fn with_claims(&mut self, claims: Claims) -> &mut Self {
        self.claims.extend(claims);
        self
    }

    pub fn has_claim(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Signs the accumulated claims, stamping `jti`, `iat`, `nbf` and `exp`.
    pub fn build_message_payload(&self, key_chain: &KeyChain) -> anyhow::Result<LtiMessagePayload> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_seconds);

        let mut claims = self.claims.clone();
        claims.insert("jti".into(), Value::String(Uuid::new_v4().to_string()));
        claims.insert("iat".into(), now.timestamp().into());
        claims.insert("nbf".into(), now.timestamp().into());
        claims.insert("exp".into(), exp.timestamp().into());

        let mut header = Header::new(key_chain.algorithm());
        header.kid = Some(key_chain.identifier().to_string());

        let token = encode(&header, &claims, key_chain.encoding_key()?)?;
        Ok(LtiMessagePayload::new(token, claims))
    }
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
