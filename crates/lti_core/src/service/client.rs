use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    registration::Registration,
    security::{
        mint_client_assertion, AccessTokenRequest, AccessTokenResponse,
        CLIENT_ASSERTION_TYPE_JWT_BEARER, GRANT_TYPE_CLIENT_CREDENTIALS,
    },
};

/// Headers and body of an outgoing service call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRequestOptions {
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ServiceRequestOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

/// Sends authenticated requests to LTI services on behalf of a registration.
#[async_trait]
pub trait LtiServiceClient: Send + Sync {
    async fn request(
        &self,
        registration: &Registration,
        method: Method,
        url: &str,
        options: ServiceRequestOptions,
        scopes: &[&str],
    ) -> Result<ServiceResponse>;
}

struct CachedAccessToken {
    token: String,
    expires_at: Instant,
}

/// reqwest-backed client obtaining access tokens through the client
/// credentials grant, cached per registration and scope set.
pub struct HttpLtiServiceClient {
    http: Client,
    tokens: Mutex<HashMap<String, CachedAccessToken>>,
}

impl Default for HttpLtiServiceClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl HttpLtiServiceClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    async fn access_token(&self, registration: &Registration, scopes: &[&str]) -> Result<String> {
        let scope = scopes.join(" ");
        let cache_key = format!("{}:{scope}", registration.identifier);

        if let Some(cached) = self.tokens.lock().await.get(&cache_key) {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        let token_url = registration
            .platform
            .oauth2_access_token_url
            .as_deref()
            .ok_or_else(|| {
                anyhow!(
                    "Missing platform access token url for registration {}",
                    registration.identifier
                )
            })?;

        let response: AccessTokenResponse = self
            .http
            .post(token_url)
            .form(&AccessTokenRequest {
                grant_type: GRANT_TYPE_CLIENT_CREDENTIALS.into(),
                client_assertion_type: CLIENT_ASSERTION_TYPE_JWT_BEARER.into(),
                client_assertion: mint_client_assertion(registration)?,
                scope,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(
            registration = %registration.identifier,
            expires_in = response.expires_in,
            "lti: access token obtained"
        );

        // The lock is not held across the fetch; concurrent misses may each
        // fetch a token and the last one wins.
        let now = Instant::now();
        let lifetime = Duration::from_secs(response.expires_in.max(0) as u64);
        let mut tokens = self.tokens.lock().await;
        tokens.retain(|_, cached| cached.expires_at > now);
        tokens.insert(
            cache_key,
            CachedAccessToken {
                token: response.access_token.clone(),
                expires_at: now + lifetime,
            },
        );
        Ok(response.access_token)
    }
}

#[async_trait]
impl LtiServiceClient for HttpLtiServiceClient {
    async fn request(
        &self,
        registration: &Registration,
        method: Method,
        url: &str,
        options: ServiceRequestOptions,
        scopes: &[&str],
    ) -> Result<ServiceResponse> {
        let token = self.access_token(registration, scopes).await?;

        let mut request = self.http.request(method, url).bearer_auth(token);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await?.error_for_status()?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ServiceResponse { status, body })
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
