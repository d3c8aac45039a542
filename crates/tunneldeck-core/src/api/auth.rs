use reqwest::StatusCode;
use tracing::{debug, error};

use crate::auth::RenewalError;
use crate::models::{CodeDto, LoginDto, TokenDto};

use super::client::REFRESH_PATH;
use super::{ApiClient, ApiError};

const TOKEN_PATH: &str = "/token";
const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";

impl ApiClient {
    /// Exchange an external authorization code for an access token
    pub async fn authorize(&self, code: &str) -> Result<String, ApiError> {
        let body = CodeDto {
            code: code.to_string(),
        };
        let token: TokenDto = self.post(TOKEN_PATH, &body).await.inspect_err(|e| {
            error!(error = %e, "Authorization code exchange failed");
        })?;
        Ok(token.access_token)
    }

    /// Authenticate with username and password and return an access token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginDto {
            username: username.to_string(),
            password: password.to_string(),
        };
        let token: TokenDto = self.post(LOGIN_PATH, &body).await.inspect_err(|e| {
            error!(error = %e, username, "Login failed");
        })?;
        Ok(token.access_token)
    }

    /// Exchange the current credential for a new one.
    ///
    /// The credential travels in the bearer header; only a 200 with a
    /// non-empty token counts as success.
    pub async fn refresh(&self) -> Result<String, RenewalError> {
        let response = self
            .request(reqwest::Method::POST, REFRESH_PATH)
            .send()
            .await
            .map_err(|e| RenewalError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RenewalError::Rejected(status.as_u16()));
        }

        let token: TokenDto = response
            .json()
            .await
            .map_err(|e| RenewalError::InvalidResponse(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(RenewalError::InvalidResponse("empty access token".to_string()));
        }

        debug!("Token refreshed");
        Ok(token.access_token)
    }

    /// Invalidate the current credential on the server.
    /// Only a 200 counts as success.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post_expecting_ok(LOGOUT_PATH).await
    }
}
