use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::debug;

use crate::api::ApiClient;

use super::SessionState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenewalError {
    #[error("No credential to renew")]
    NoCredential,

    #[error("Renewal rejected with status {0}")]
    Rejected(u16),

    #[error("Renewal request failed: {0}")]
    Transport(String),

    #[error("Invalid renewal response: {0}")]
    InvalidResponse(String),
}

/// A fresh credential and the credential it was issued in exchange for.
#[derive(Clone, PartialEq, Eq)]
pub struct Renewal {
    pub previous: String,
    pub credential: String,
}

impl fmt::Debug for Renewal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renewal")
            .field("previous", &"<redacted>")
            .field("credential", &"<redacted>")
            .finish()
    }
}

type RenewalFuture = Shared<BoxFuture<'static, Result<Renewal, RenewalError>>>;
type InFlight = Arc<Mutex<Option<RenewalFuture>>>;

/// Exchanges the current credential for a new one.
///
/// Single-flight: while a renewal is in progress, further callers await the
/// same request instead of issuing another one. The request runs on its own
/// task, so it completes and leaves the slot even if every caller is dropped.
pub struct Renewer {
    api: ApiClient,
    state: SessionState,
    in_flight: InFlight,
}

impl Renewer {
    pub fn new(api: ApiClient, state: SessionState) -> Self {
        Self {
            api,
            state,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Request a new credential. Does not modify the session.
    pub async fn renew(&self) -> Result<Renewal, RenewalError> {
        let Some(previous) = self.state.credential() else {
            return Err(RenewalError::NoCredential);
        };

        let future = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(future) => {
                    debug!("Joining in-flight token renewal");
                    future.clone()
                }
                None => {
                    let api = self.api.clone();
                    let future = async move {
                        api.refresh()
                            .await
                            .map(|credential| Renewal { previous, credential })
                    }
                    .boxed()
                    .shared();
                    *slot = Some(future.clone());
                    drive(Arc::clone(&self.in_flight), future.clone());
                    future
                }
            }
        };

        let result = future.clone().await;
        release(&self.in_flight, &future);
        result
    }
}

/// Poll `future` to completion on a background task, then free the slot.
fn drive(in_flight: InFlight, future: RenewalFuture) {
    tokio::spawn(async move {
        let _ = future.clone().await;
        release(&in_flight, &future);
    });
}

fn release(in_flight: &Mutex<Option<RenewalFuture>>, future: &RenewalFuture) {
    let mut slot = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.as_ref().is_some_and(|current| current.ptr_eq(future)) {
        *slot = None;
    }
}
