use serde::{Deserialize, Serialize};

/// Access token returned by login, authorization and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Username/password login payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginDto {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginDto")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// External authorization code exchanged once for an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeDto {
    pub code: String,
}
