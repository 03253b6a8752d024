//! Helpers shared by unit and integration tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::config::{
    Config, CorsConfig, DatabaseConfig, IdentityConfig, LoggingConfig, ServerConfig,
};

/// Config pointing at the given issuer with an in-memory database.
pub fn test_config(issuer: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        identity: IdentityConfig {
            issuer: issuer.to_string(),
            audience: None,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

#[derive(serde::Serialize)]
struct TestClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    iss: String,
    aud: serde_json::Value,
    exp: u64,
    iat: u64,
}

/// Sign a token that the verifier will accept, given the matching
/// JWKS key is served under `kid`.
pub fn generate_test_jwt(
    subject: &str,
    email: Option<&str>,
    display_name: Option<&str>,
    issuer: &str,
    kid: &str,
    signing_key: &EncodingKey,
) -> String {
    let now = Utc::now();
    let claims = TestClaims {
        sub: subject.to_string(),
        email: email.map(String::from),
        name: display_name.map(String::from),
        iss: issuer.to_string(),
        aud: serde_json::Value::String("test-audience".to_string()),
        exp: (now + Duration::hours(1)).timestamp() as u64,
        iat: now.timestamp() as u64,
    };

    let header = Header {
        alg: Algorithm::RS256,
        kid: Some(kid.to_string()),
        ..Default::default()
    };

    encode(&header, &claims, signing_key).expect("Failed to encode JWT")
}

/// Sign a token that expired an hour ago.
pub fn generate_expired_jwt(
    subject: &str,
    issuer: &str,
    kid: &str,
    signing_key: &EncodingKey,
) -> String {
    let now = Utc::now();
    let claims = TestClaims {
        sub: subject.to_string(),
        email: None,
        name: None,
        iss: issuer.to_string(),
        aud: serde_json::Value::String("test-audience".to_string()),
        exp: (now - Duration::hours(1)).timestamp() as u64,
        iat: (now - Duration::hours(2)).timestamp() as u64,
    };

    let header = Header {
        alg: Algorithm::RS256,
        kid: Some(kid.to_string()),
        ..Default::default()
    };

    encode(&header, &claims, signing_key).expect("Failed to encode JWT")
}
