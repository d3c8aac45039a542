//! Core library for tunneldeck.
//!
//! Provides the session credential lifecycle (login, bearer attachment,
//! scheduled renewal, forced logout on rejection) and the REST client for
//! tunnel, DNS and user administration.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use app::Tunneldeck;
pub use auth::{
    AuthContext, Identity, Renewal, RenewalError, RenewalScheduler, Renewer, SchedulerState,
    SessionEvent, SessionState, TerminationReason,
};
pub use config::Config;
