//! HTTP transport used by the GitHub client.
//!
//! The client builds [`ApiRequest`]s and hands them to an [`HttpTransport`].
//! Retries and backoff are not handled here.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::GitHubError;

pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// An outbound GitHub API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// Authenticate with `Authorization: Bearer {token}`.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A raw response: status code and body bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 300
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GitHubError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// The capability to execute a single HTTP round trip.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GitHubError>;
}

/// [`HttpTransport`] backed by a `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, GitHubError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GitHubError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);

        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post("https://api.github.com/repos/o/r/statuses/abc")
            .bearer("tok")
            .json(serde_json::json!({"state": "success"}));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.bearer.as_deref(), Some("tok"));
        assert_eq!(request.body.unwrap()["state"], "success");
    }

    #[test]
    fn test_response_success_boundary() {
        assert!(ApiResponse::new(299, "").is_success());
        assert!(!ApiResponse::new(300, "").is_success());
        assert!(!ApiResponse::new(404, "").is_success());
    }

    #[test]
    fn test_response_json_decode_error() {
        let response = ApiResponse::new(200, "not json");
        let decoded: Result<serde_json::Value, _> = response.json();
        assert!(matches!(decoded, Err(GitHubError::Decode(_))));
    }
}
