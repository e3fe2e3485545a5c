//! OAuth2 client-credentials authentication

use crate::config::FunctionConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// Bearer token for a single invocation
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Token endpoint for the configured tenant
pub fn token_url(config: &FunctionConfig) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        config.authority_host, config.tenant_id
    )
}

/// Obtain a bearer token with the client-credentials grant. No retry.
pub async fn acquire_token(
    client: &reqwest::Client,
    config: &FunctionConfig,
) -> Result<AccessToken> {
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("scope", config.scope.as_str()),
    ];

    let response = client.post(token_url(config)).form(&form).send().await?;

    if !response.status().is_success() {
        return Err(Error::Authentication {
            status: response.status().as_u16(),
        });
    }

    let token: TokenResponse = response.json().await?;

    // Tokens are not refreshed; a split that outlives the token fails on upload.
    if let Some(expires_in) = token.expires_in {
        tracing::debug!(expires_in, "Access token acquired");
    } else {
        tracing::debug!("Access token acquired");
    }

    Ok(AccessToken(token.access_token))
}
