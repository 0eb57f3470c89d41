use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    message::LtiMessagePayload,
    registration::{KeyChain, Registration, RegistrationRepository},
};

pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const CLIENT_ASSERTION_TTL_SECONDS: i64 = 300;
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Form body of an OAuth2 client credentials token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    pub grant_type: String,
    pub client_assertion_type: String,
    pub client_assertion: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
}

impl AccessTokenClaims {
    pub fn scopes(&self) -> Vec<String> {
        self.scope.split_whitespace().map(str::to_string).collect()
    }
}

#[derive(Debug, Error)]
pub enum AccessTokenError {
    #[error("unsupported grant type {0}")]
    UnsupportedGrantType(String),
    #[error("invalid client: {0}")]
    InvalidClient(String),
    #[error("no scope requested")]
    InvalidScope,
    #[error("access token signing failed: {source}")]
    Signing { source: anyhow::Error },
}

impl AccessTokenError {
    /// OAuth2 `error` code for the token endpoint response.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidScope => "invalid_scope",
            Self::Signing { .. } => "server_error",
        }
    }
}

fn sign<T: Serialize>(claims: &T, key_chain: &KeyChain) -> anyhow::Result<String> {
    let mut header = Header::new(key_chain.algorithm());
    header.kid = Some(key_chain.identifier().to_string());
    Ok(encode(&header, claims, key_chain.encoding_key()?)?)
}

/// Tool-signed JWT proving the client identity to the platform token endpoint.
pub fn mint_client_assertion(registration: &Registration) -> anyhow::Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(CLIENT_ASSERTION_TTL_SECONDS);
    let audience = registration
        .platform
        .oauth2_access_token_url
        .clone()
        .unwrap_or_else(|| registration.platform.audience.clone());

    let claims = AccessTokenClaims {
        iss: registration.client_id.clone(),
        sub: registration.client_id.clone(),
        aud: audience,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        scope: String::new(),
    };

    sign(&claims, registration.tool_key_chain()?)
}

/// Platform side of the client credentials grant.
#[derive(Clone)]
pub struct AccessTokenIssuer {
    repository: Arc<dyn RegistrationRepository>,
    ttl_seconds: i64,
}

impl AccessTokenIssuer {
    pub fn new(repository: Arc<dyn RegistrationRepository>) -> Self {
        Self {
            repository,
            ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        }
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn issue(
        &self,
        request: &AccessTokenRequest,
    ) -> Result<AccessTokenResponse, AccessTokenError> {
        if request.grant_type != GRANT_TYPE_CLIENT_CREDENTIALS {
            return Err(AccessTokenError::UnsupportedGrantType(
                request.grant_type.clone(),
            ));
        }
        if request.client_assertion_type != CLIENT_ASSERTION_TYPE_JWT_BEARER {
            return Err(AccessTokenError::InvalidClient(format!(
                "unsupported assertion type {}",
                request.client_assertion_type
            )));
        }

        let peeked = LtiMessagePayload::peek(&request.client_assertion)
            .map_err(|err| AccessTokenError::InvalidClient(err.to_string()))?;
        let client_id = peeked
            .get("sub")
            .and_then(|value| value.as_str())
            .ok_or_else(|| AccessTokenError::InvalidClient("assertion has no subject".into()))?;
        let registration = self
            .repository
            .find_by_client_id(client_id)
            .ok_or_else(|| AccessTokenError::InvalidClient(format!("unknown client {client_id}")))?;

        let tool_key_chain = registration
            .tool_key_chain()
            .map_err(|err| AccessTokenError::InvalidClient(err.to_string()))?;
        let mut validation = Validation::new(tool_key_chain.algorithm());
        validation.validate_aud = false;
        decode::<AccessTokenClaims>(
            &request.client_assertion,
            tool_key_chain.decoding_key(),
            &validation,
        )
        .map_err(|err| AccessTokenError::InvalidClient(err.to_string()))?;

        let scopes: Vec<&str> = request.scope.split_whitespace().collect();
        if scopes.is_empty() {
            return Err(AccessTokenError::InvalidScope);
        }
        let scope = scopes.join(" ");

        let now = Utc::now();
        let claims = AccessTokenClaims {
            iss: registration.platform.audience.clone(),
            sub: registration.client_id.clone(),
            aud: registration.platform.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
            scope: scope.clone(),
        };
        let key_chain = registration
            .platform_key_chain()
            .map_err(|err| AccessTokenError::Signing { source: err.into() })?;
        let access_token =
            sign(&claims, key_chain).map_err(|source| AccessTokenError::Signing { source })?;

        debug!(
            registration = %registration.identifier,
            client_id = %registration.client_id,
            scope = %scope,
            "oauth2: access token issued"
        );

        Ok(AccessTokenResponse {
            access_token,
            token_type: "Bearer".into(),
            expires_in: self.ttl_seconds,
            scope,
        })
    }
}

/// Outcome of validating a service request bearer token.
#[derive(Debug, Clone, Default)]
pub struct RequestAccessTokenValidationResult {
    registration: Option<Registration>,
    scopes: Vec<String>,
    error: Option<String>,
}

impl RequestAccessTokenValidationResult {
    pub fn success(registration: Registration, scopes: Vec<String>) -> Self {
        Self {
            registration: Some(registration),
            scopes,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            registration: None,
            scopes: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

pub trait RequestAccessTokenValidator: Send + Sync {
    fn validate(
        &self,
        headers: &HeaderMap,
        allowed_scopes: &[&str],
    ) -> RequestAccessTokenValidationResult;
}

/// Validates `Authorization: Bearer` access tokens issued by [`AccessTokenIssuer`].
#[derive(Clone)]
pub struct JwtRequestAccessTokenValidator {
    repository: Arc<dyn RegistrationRepository>,
}

impl JwtRequestAccessTokenValidator {
    pub fn new(repository: Arc<dyn RegistrationRepository>) -> Self {
        Self { repository }
    }

    fn verify(
        &self,
        token: &str,
        allowed_scopes: &[&str],
    ) -> Result<(Registration, Vec<String>), String> {
        let peeked = LtiMessagePayload::peek(token)
            .map_err(|err| format!("JWT access token is invalid: {err}"))?;
        let client_id = peeked
            .get("sub")
            .and_then(|value| value.as_str())
            .ok_or("JWT access token has no subject")?;
        let registration = self
            .repository
            .find_by_client_id(client_id)
            .ok_or("No registration found for client_id")?;

        let key_chain = registration
            .platform_key_chain()
            .map_err(|err| err.to_string())?;
        let mut validation = Validation::new(key_chain.algorithm());
        validation.set_audience(&[registration.platform.audience.as_str()]);
        let claims = decode::<AccessTokenClaims>(token, key_chain.decoding_key(), &validation)
            .map_err(|err| format!("JWT access token is invalid: {err}"))?
            .claims;

        let scopes = claims.scopes();
        if !allowed_scopes
            .iter()
            .any(|allowed| scopes.iter().any(|scope| scope == allowed))
        {
            return Err("JWT access token scopes are invalid".into());
        }

        Ok((registration, scopes))
    }
}

impl RequestAccessTokenValidator for JwtRequestAccessTokenValidator {
    fn validate(
        &self,
        headers: &HeaderMap,
        allowed_scopes: &[&str],
    ) -> RequestAccessTokenValidationResult {
        let Some(authorization) = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        else {
            return RequestAccessTokenValidationResult::failure("Missing Authorization header");
        };
        let Some(token) = authorization.strip_prefix("Bearer ") else {
            return RequestAccessTokenValidationResult::failure(
                "Authorization header is not a bearer token",
            );
        };

        match self.verify(token.trim(), allowed_scopes) {
            Ok((registration, scopes)) => {
                debug!(registration = %registration.identifier, "oauth2: access token validated");
                RequestAccessTokenValidationResult::success(registration, scopes)
            }
            Err(error) => {
                warn!(error = %error, "oauth2: access token rejected");
                RequestAccessTokenValidationResult::failure(error)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/access_token_tests.rs"]
mod tests;
