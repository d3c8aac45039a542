use crate::models::{NewUser, User};

use super::{ApiClient, ApiError};

impl ApiClient {
    /// Fetch the logged-in user's data
    pub async fn my_data(&self) -> Result<User, ApiError> {
        self.get("/user/my-data").await
    }

    pub async fn user(&self, uuid: &str) -> Result<User, ApiError> {
        self.get(&format!("/user/{}", uuid)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post("/user", user).await
    }

    pub async fn update_user(&self, uuid: &str, user: &User) -> Result<User, ApiError> {
        self.put(&format!("/user/{}", uuid), user).await
    }

    pub async fn delete_user(&self, uuid: &str) -> Result<(), ApiError> {
        self.delete(&format!("/user/{}", uuid)).await
    }

    /// Fetch all users (superadmin only)
    pub async fn all_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/user/all-users").await
    }

    /// Search users by name
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, ApiError> {
        self.get_with_query("/user/search", &[("query", query)]).await
    }

    pub async fn user_by_oib(&self, oib: &str) -> Result<User, ApiError> {
        self.get(&format!("/user/oib/{}", oib)).await
    }
}
