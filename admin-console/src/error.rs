//! Error types for the admin console.

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the call; the message is the server's own.
    #[error("{message}")]
    Server { status: u16, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Token request failed: {0}")]
    TokenRequest(String),

    #[error(transparent)]
    Api(#[from] ApiClientError),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_displays_server_message() {
        let err = ApiClientError::Server {
            status: 403,
            message: "Forbidden: Admin access required".to_string(),
        };
        assert_eq!(err.to_string(), "Forbidden: Admin access required");
    }

    #[test]
    fn test_api_error_wraps_transparently() {
        let err = ConsoleError::from(ApiClientError::Server {
            status: 404,
            message: "User not found".to_string(),
        });
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn test_token_request_error() {
        let err = ConsoleError::TokenRequest("connection refused".to_string());
        assert!(err.to_string().contains("Token request failed"));
    }
}
