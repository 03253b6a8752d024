//! HTTP client for the Roster API.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use roster_common::{ErrorResponse, MessageResponse, Role, User, UserResponse, UsersResponse};

use crate::error::ApiClientError;

pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http_client.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::server_error(status, response).await);
        }

        Ok(response.json().await?)
    }

    async fn server_error(status: StatusCode, response: reqwest::Response) -> ApiClientError {
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {}", status),
        };
        ApiClientError::Server {
            status: status.as_u16(),
            message,
        }
    }

    /// POST /api/auth/login
    pub async fn login(&self, token: &str) -> Result<User, ApiClientError> {
        let response: UserResponse = self
            .call(Method::POST, "/api/auth/login", token, None)
            .await?;
        Ok(response.user)
    }

    /// GET /api/admin/users
    pub async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiClientError> {
        let response: UsersResponse = self
            .call(Method::GET, "/api/admin/users", token, None)
            .await?;
        Ok(response.users)
    }

    /// PATCH /api/admin/users/:id/status
    pub async fn set_status(
        &self,
        token: &str,
        id: i64,
        is_active: bool,
    ) -> Result<User, ApiClientError> {
        let response: UserResponse = self
            .call(
                Method::PATCH,
                &format!("/api/admin/users/{}/status", id),
                token,
                Some(serde_json::json!({ "is_active": is_active })),
            )
            .await?;
        Ok(response.user)
    }

    /// PATCH /api/admin/users/:id/role
    pub async fn set_role(&self, token: &str, id: i64, role: Role) -> Result<User, ApiClientError> {
        let response: UserResponse = self
            .call(
                Method::PATCH,
                &format!("/api/admin/users/{}/role", id),
                token,
                Some(serde_json::json!({ "role": role })),
            )
            .await?;
        Ok(response.user)
    }

    /// DELETE /api/admin/users/:id
    pub async fn delete_user(&self, token: &str, id: i64) -> Result<String, ApiClientError> {
        let response: MessageResponse = self
            .call(
                Method::DELETE,
                &format!("/api/admin/users/{}", id),
                token,
                None,
            )
            .await?;
        Ok(response.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_user_json(id: i64, role: &str, is_active: bool) -> serde_json::Value {
        json!({
            "id": id,
            "subject": format!("subject-{}", id),
            "email": format!("user{}@example.com", id),
            "display_name": null,
            "role": role,
            "is_active": is_active,
            "created_at": "2026-08-01T10:00:00Z",
            "last_login": null,
        })
    }

    #[tokio::test]
    async fn test_list_users_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/users"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [sample_user_json(1, "admin", true)],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let users = client.list_users("token-1").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, 1);
    }

    #[tokio::test]
    async fn test_set_status_patches_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/admin/users/2/status"))
            .and(body_json(json!({"is_active": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": sample_user_json(2, "user", false),
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let user = client.set_status("token-1", 2, false).await.unwrap();
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn test_set_role_sends_lowercase_role() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/admin/users/2/role"))
            .and(body_json(json!({"role": "admin"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": sample_user_json(2, "admin", true),
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let user = client.set_role("token-1", 2, Role::Admin).await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_delete_returns_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/admin/users/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "User deleted successfully",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let message = client.delete_user("token-1", 2).await.unwrap();
        assert_eq!(message, "User deleted successfully");
    }

    #[tokio::test]
    async fn test_error_body_becomes_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/admin/users/1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Cannot delete your own account",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let err = client.delete_user("token-1", 1).await.unwrap_err();
        match err {
            ApiClientError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Cannot delete your own account");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/users"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let err = client.list_users("token-1").await.unwrap_err();
        match err {
            ApiClientError::Server { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "HTTP 502 Bad Gateway");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }
}
