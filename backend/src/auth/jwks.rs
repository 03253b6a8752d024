use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::IdentityConfig;

/// Identity claims extracted from a verified token.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("JWKS fetch error: {0}")]
    JwksFetchError(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
}

/// JWKS key set response.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[allow(dead_code)]
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// JWT claims.
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    aud: serde_json::Value,
    exp: u64,
    iat: u64,
}

#[derive(Debug, Deserialize)]
struct OidcConfig {
    jwks_uri: String,
}

/// Verifies bearer tokens against the identity provider's JWKS keys.
///
/// Keys are cached in memory; an unknown kid triggers one refresh
/// before the token is rejected, so provider key rotation does not
/// require a restart.
pub struct JwksVerifier {
    http_client: Client,
    jwks_uri: String,
    keys: Arc<RwLock<HashMap<String, DecodingKey>>>,
    issuer: String,
    audience: Option<String>,
}

impl JwksVerifier {
    pub async fn new(identity: &IdentityConfig) -> Result<Self, AuthError> {
        let http_client = Client::new();

        // Fetch OIDC configuration to get JWKS URI
        let config_url = format!(
            "{}/.well-known/openid-configuration",
            identity.issuer.trim_end_matches('/')
        );
        let config: OidcConfig = http_client
            .get(&config_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let verifier = Self {
            http_client,
            jwks_uri: config.jwks_uri,
            keys: Arc::new(RwLock::new(HashMap::new())),
            issuer: identity.issuer.clone(),
            audience: identity.audience.clone(),
        };

        // Fetch keys initially
        verifier.refresh_keys().await?;

        Ok(verifier)
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();

        for jwk in response.keys {
            if jwk.kty == "RSA" {
                if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            keys.insert(jwk.kid.clone(), key);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", keys.len());
        Ok(())
    }

    /// Look up the decoding key for a kid, refreshing the cache once
    /// when the kid is unknown (the provider may have rotated keys).
    async fn decoding_key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let keys = self.keys.read().await;
            if let Some(key) = keys.get(kid) {
                return Ok(key.clone());
            }
        }

        tracing::info!("Unknown kid {}, refreshing JWKS", kid);
        self.refresh_keys().await?;

        let keys = self.keys.read().await;
        keys.get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }

    /// Validate a raw JWT and extract its identity claims.
    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        // Decode header to get kid
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Missing kid in token header".to_string()))?;

        let key = self.decoding_key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("Empty subject claim".to_string()));
        }

        Ok(VerifiedToken {
            subject: token_data.claims.sub,
            email: token_data.claims.email,
            display_name: token_data.claims.name,
        })
    }

    /// Authenticate a request by validating the Bearer token.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<VerifiedToken, AuthError> {
        let auth_header = headers
            .get("authorization")
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AuthError::InvalidFormat);
        }

        let token = &auth_header[7..];
        self.verify(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use axum::http::HeaderMap;

    fn headers_with_auth(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token.parse().unwrap());
        headers
    }

    #[test]
    fn test_verified_token_fields() {
        let token = VerifiedToken {
            subject: "auth0|123456".to_string(),
            email: Some("test@example.com".to_string()),
            display_name: Some("Test User".to_string()),
        };
        assert_eq!(token.subject, "auth0|123456");
        assert_eq!(token.email.as_deref(), Some("test@example.com"));
        assert_eq!(token.display_name.as_deref(), Some("Test User"));
    }

    #[test]
    fn test_verified_token_optional_claims() {
        let token = VerifiedToken {
            subject: "user123".to_string(),
            email: None,
            display_name: None,
        };
        assert!(token.email.is_none());
        assert!(token.display_name.is_none());
    }

    #[test]
    fn test_verified_token_clone() {
        let original = VerifiedToken {
            subject: "user123".to_string(),
            email: Some("user@example.com".to_string()),
            display_name: None,
        };
        let cloned = original.clone();
        assert_eq!(cloned.subject, original.subject);
        assert_eq!(cloned.email, original.email);
    }

    #[test]
    fn test_auth_error_missing_header() {
        let err = AuthError::MissingHeader;
        assert_eq!(err.to_string(), "Missing Authorization header");
    }

    #[test]
    fn test_auth_error_invalid_format() {
        let err = AuthError::InvalidFormat;
        assert_eq!(err.to_string(), "Invalid Authorization header format");
    }

    #[test]
    fn test_auth_error_invalid_token() {
        let err = AuthError::InvalidToken("signature mismatch".to_string());
        assert!(err.to_string().contains("Invalid token"));
        assert!(err.to_string().contains("signature mismatch"));
    }

    #[test]
    fn test_auth_error_jwks_fetch() {
        let err = AuthError::JwksFetchError("connection refused".to_string());
        assert!(err.to_string().contains("JWKS fetch error"));
    }

    #[test]
    fn test_auth_error_key_not_found() {
        let err = AuthError::KeyNotFound("kid123".to_string());
        assert!(err.to_string().contains("Key not found for kid"));
    }

    #[test]
    fn test_claims_deserialize_without_optional_fields() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"user123","exp":1700000000,"iat":1699990000}"#)
                .unwrap();
        assert_eq!(claims.sub, "user123");
        assert!(claims.email.is_none());
        assert!(claims.name.is_none());
    }

    #[test]
    fn test_jwks_response_skips_unknown_fields() {
        let jwks: JwksResponse = serde_json::from_str(
            r#"{"keys":[{"kid":"k1","kty":"RSA","alg":"RS256","use":"sig","n":"abc","e":"AQAB"}]}"#,
        )
        .unwrap();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kid, "k1");
    }

    #[test]
    fn test_bearer_token_extraction_valid() {
        let headers = headers_with_auth("Bearer eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.test");
        let auth_header = headers.get("authorization").and_then(|v| v.to_str().ok());
        assert!(auth_header.is_some());
        assert!(auth_header.unwrap().starts_with("Bearer "));
    }

    #[test]
    fn test_bearer_token_extraction_basic_auth() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        let auth_header = headers.get("authorization").and_then(|v| v.to_str().ok());
        assert!(auth_header.is_some());
        assert!(!auth_header.unwrap().starts_with("Bearer "));
    }

    #[test]
    fn test_empty_headers_have_no_auth() {
        let headers = HeaderMap::new();
        assert!(headers.get("authorization").is_none());
    }
}
