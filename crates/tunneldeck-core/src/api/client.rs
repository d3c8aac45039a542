//! HTTP client for the tunnel-management REST API.
//!
//! Every request goes through the `BearerAttacher` and `UnauthorizedHandler`
//! stages, so the call groups in `auth`, `tunnels` and `users` carry no
//! credential handling of their own.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::AuthContext;

use super::middleware::{BearerAttacher, UnauthorizedHandler};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Renewal endpoint, excluded from the reactive logout rule
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the tunnel-management backend.
/// Clone is cheap - the middleware client shares its connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ApiClient {
    /// Create a client whose requests carry the credential held in `context`
    pub fn new(base_url: &str, timeout: Duration, context: &AuthContext) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        let client = ClientBuilder::new(client)
            .with(UnauthorizedHandler::new(context.clone()))
            .with(BearerAttacher::new(context.state().clone()))
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Check if response is successful, returning an error with body if not.
    pub(crate) async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request and parse a JSON body from a successful response.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = Self::check_response(response).await?;
        debug!(path, status = %response.status(), "Response received");

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e)))
    }

    /// Send a request that answers with no body and expect `expected`.
    async fn send_expecting(
        &self,
        builder: RequestBuilder,
        path: &str,
        expected: StatusCode,
    ) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let response = Self::check_response(response).await?;
        let status = response.status();
        debug!(path, %status, "Response received");

        if status == expected {
            Ok(())
        } else {
            Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(reqwest::Method::GET, path), path).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(reqwest::Method::GET, path).query(query), path)
            .await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(reqwest::Method::POST, path).json(body), path)
            .await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(reqwest::Method::PUT, path).json(body), path)
            .await
    }

    /// PUT with no body, expecting 204 No Content
    pub(crate) async fn put_no_content(&self, path: &str) -> Result<(), ApiError> {
        self.send_expecting(
            self.request(reqwest::Method::PUT, path),
            path,
            StatusCode::NO_CONTENT,
        )
        .await
    }

    /// DELETE expecting 204 No Content
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_expecting(
            self.request(reqwest::Method::DELETE, path),
            path,
            StatusCode::NO_CONTENT,
        )
        .await
    }

    /// POST with no body, expecting 200 OK and no payload of interest
    pub(crate) async fn post_expecting_ok(&self, path: &str) -> Result<(), ApiError> {
        self.send_expecting(self.request(reqwest::Method::POST, path), path, StatusCode::OK)
            .await
    }
}
