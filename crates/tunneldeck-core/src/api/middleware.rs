//! Request/response stages registered on every `ApiClient`.
//!
//! `BearerAttacher` adds the current credential to outgoing requests.
//! `UnauthorizedHandler` watches responses and terminates the session when
//! the backend rejects a request that is not itself a renewal.

use http::Extensions;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next};
use tracing::{trace, warn};

use crate::auth::{AuthContext, SessionState, TerminationReason};

use super::client::REFRESH_PATH;

pub struct BearerAttacher {
    state: SessionState,
}

impl BearerAttacher {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    /// Attach `Authorization: Bearer <credential>` if a credential is held.
    /// The credential is read at dispatch time.
    pub fn attach(&self, req: &mut Request) {
        let Some(token) = self.state.credential() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                req.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => {
                warn!(error = %e, "Credential is not a valid header value, sending request without it");
            }
        }
    }
}

#[async_trait::async_trait]
impl Middleware for BearerAttacher {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        self.attach(&mut req);
        next.run(req, extensions).await
    }
}

pub struct UnauthorizedHandler {
    context: AuthContext,
}

impl UnauthorizedHandler {
    pub fn new(context: AuthContext) -> Self {
        Self { context }
    }

    /// Rejections of the renewal call are left to the renewal caller.
    pub fn is_renewal_path(path: &str) -> bool {
        path.trim_end_matches('/').ends_with(REFRESH_PATH)
    }

    /// Apply the 401 rule to a response for a request to `path`.
    pub fn inspect(&self, path: &str, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }
        if Self::is_renewal_path(path) {
            trace!(path, "Renewal rejected, leaving it to the renewal caller");
            return;
        }

        warn!(path, "Request rejected as unauthorized, logging out");
        self.context.terminate(TerminationReason::Unauthorized {
            path: path.to_string(),
        });
    }
}

#[async_trait::async_trait]
impl Middleware for UnauthorizedHandler {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let path = req.url().path().to_string();
        let response = next.run(req, extensions).await?;
        self.inspect(&path, response.status());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    use crate::auth::SessionEvent;

    fn request() -> Request {
        let url = "http://localhost/api/tunnel".parse().expect("valid test URL");
        Request::new(Method::GET, url)
    }

    #[test]
    fn test_attach_with_credential() {
        let state = SessionState::new();
        state.set_credential("abc");
        let attacher = BearerAttacher::new(state);

        let mut req = request();
        attacher.attach(&mut req);
        assert_eq!(
            req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer abc")
        );
    }

    #[test]
    fn test_attach_without_credential_leaves_request_alone() {
        let attacher = BearerAttacher::new(SessionState::new());
        let mut req = request();
        attacher.attach(&mut req);
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_attach_skips_invalid_header_value() {
        let state = SessionState::new();
        state.set_credential("bad\ntoken");
        let attacher = BearerAttacher::new(state);

        let mut req = request();
        attacher.attach(&mut req);
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_is_renewal_path() {
        assert!(UnauthorizedHandler::is_renewal_path("/auth/refresh"));
        assert!(UnauthorizedHandler::is_renewal_path("/api/auth/refresh"));
        assert!(UnauthorizedHandler::is_renewal_path("/api/auth/refresh/"));
        assert!(!UnauthorizedHandler::is_renewal_path("/api/auth/logout"));
        assert!(!UnauthorizedHandler::is_renewal_path("/api/tunnel"));
    }

    #[test]
    fn test_inspect_terminates_on_unauthorized() {
        let context = AuthContext::new();
        let mut events = context.subscribe();
        context.state().set_credential("abc");
        let handler = UnauthorizedHandler::new(context.clone());

        handler.inspect("/api/tunnel", StatusCode::UNAUTHORIZED);

        assert!(context.state().snapshot().is_empty());
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::Terminated(TerminationReason::Unauthorized { path })) if path == "/api/tunnel"
        ));
    }

    #[test]
    fn test_inspect_ignores_renewal_rejection() {
        let context = AuthContext::new();
        context.state().set_credential("abc");
        let handler = UnauthorizedHandler::new(context.clone());

        handler.inspect("/api/auth/refresh", StatusCode::UNAUTHORIZED);
        assert_eq!(context.state().credential().as_deref(), Some("abc"));
    }

    #[test]
    fn test_inspect_ignores_other_statuses() {
        let context = AuthContext::new();
        context.state().set_credential("abc");
        let handler = UnauthorizedHandler::new(context.clone());

        handler.inspect("/api/tunnel", StatusCode::OK);
        handler.inspect("/api/tunnel", StatusCode::FORBIDDEN);
        handler.inspect("/api/tunnel", StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(context.state().credential().as_deref(), Some("abc"));
    }
}
