//! REST API client module for the tunnel-management backend.
//!
//! The `ApiClient` carries the session's bearer credential on every request
//! and terminates the session when the backend rejects it. Calls are split
//! into `auth`, `tunnels` and `users` groups.

pub mod auth;
pub mod client;
pub mod error;
pub mod middleware;
pub mod tunnels;
pub mod users;

pub use client::{ApiClient, DEFAULT_REQUEST_TIMEOUT_SECS, REFRESH_PATH};
pub use error::ApiError;
pub use middleware::{BearerAttacher, UnauthorizedHandler};
