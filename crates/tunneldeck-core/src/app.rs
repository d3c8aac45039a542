//! Session facade for tunneldeck.
//!
//! `Tunneldeck` wires the session state, middleware-equipped API client and
//! renewal scheduler together and implements the login and logout flows.

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthContext, Identity, RenewalScheduler, SessionEvent, SessionState};
use crate::config::Config;

pub struct Tunneldeck {
    context: AuthContext,
    api: ApiClient,
    scheduler: RenewalScheduler,
}

impl Tunneldeck {
    /// Create a client for the backend described by `config`
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let context = AuthContext::new();
        let api = ApiClient::new(&config.base_url, config.request_timeout(), &context)?;
        let scheduler = RenewalScheduler::new(context.clone(), api.clone(), config.refresh_interval());

        Ok(Self {
            context,
            api,
            scheduler,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionState {
        self.context.state()
    }

    pub fn scheduler(&self) -> &RenewalScheduler {
        &self.scheduler
    }

    /// Subscribe to session events. The UI navigates to login on `Terminated`.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.context.subscribe()
    }

    /// Log in with username and password and start the renewal schedule
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ApiError> {
        let token = self.api.login(username, password).await?;
        self.establish(token).await
    }

    /// Exchange an external authorization code and start the renewal schedule
    pub async fn authorize(&self, code: &str) -> Result<Identity, ApiError> {
        let token = self.api.authorize(code).await?;
        self.establish(token).await
    }

    async fn establish(&self, token: String) -> Result<Identity, ApiError> {
        let state = self.context.state();
        state.set_credential(token);

        let identity: Identity = match self.api.my_data().await {
            Ok(user) => user.into(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch user data after login");
                state.clear();
                return Err(e);
            }
        };

        if !state.set_identity(identity.clone()) {
            return Err(ApiError::Unauthorized);
        }

        info!(user = %identity.display_name, role = %identity.role, "Login successful");
        self.context.emit(SessionEvent::LoggedIn(identity.clone()));
        self.scheduler.start();
        Ok(identity)
    }

    /// Log out: stop renewing, invalidate the server session best-effort and
    /// clear local state.
    pub async fn logout(&self) {
        self.scheduler.stop();

        if self.context.state().is_authenticated() {
            if let Err(e) = self.api.logout().await {
                warn!(error = %e, "Logout call failed, clearing local session anyway");
            }
        }

        if self.context.state().clear() {
            info!("Logged out");
            self.context.emit(SessionEvent::LoggedOut);
        }
    }
}
