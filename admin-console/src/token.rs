//! Token minting against the identity provider.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::config::IdentityConfig;
use crate::error::ConsoleError;

/// Tokens are treated as stale this many seconds before their
/// reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Mints ID tokens via the resource-owner password grant and caches
/// the result until shortly before expiry, so each console action
/// gets a token that is valid for its whole duration.
pub struct TokenMinter {
    http_client: reqwest::Client,
    config: IdentityConfig,
    cached: Option<CachedToken>,
}

impl TokenMinter {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
            cached: None,
        }
    }

    /// Return a token valid now, minting a new one when the cached
    /// token is missing or about to expire.
    pub async fn mint(&mut self) -> Result<String, ConsoleError> {
        if let Some(cached) = &self.cached {
            if cached.expires_at > Utc::now() {
                return Ok(cached.token.clone());
            }
        }

        let mut form = vec![
            ("grant_type", "password".to_string()),
            ("username", self.config.username.clone()),
            ("password", self.config.password.clone()),
            ("scope", "openid".to_string()),
        ];
        if let Some(client_id) = &self.config.client_id {
            form.push(("client_id", client_id.clone()));
        }

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ConsoleError::TokenRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ConsoleError::TokenRequest(format!(
                "{} from token endpoint: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ConsoleError::TokenRequest(e.to_string()))?;

        let expires_at =
            Utc::now() + Duration::seconds((token.expires_in - EXPIRY_MARGIN_SECS).max(0));
        tracing::debug!("Minted new token, valid until {}", expires_at);

        let id_token = token.id_token.clone();
        self.cached = Some(CachedToken {
            token: token.id_token,
            expires_at,
        });

        Ok(id_token)
    }
}
