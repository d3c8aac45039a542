//! Proactive token renewal on a fixed interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;

use super::{AuthContext, Renewer, SessionEvent, TerminationReason};

/// Default renewal interval: 10 minutes.
pub const DEFAULT_RENEWAL_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct SchedulerInner {
    context: AuthContext,
    renewer: Renewer,
    api: ApiClient,
    interval: Duration,
    attempts: AtomicU64,
}

/// Renews the credential before the server expires it.
///
/// The timer task lives in the context's `ScheduleSlot`, so the reactive
/// handler can stop it too. Each renewal attempt runs as its own task:
/// stopping the schedule never cancels an attempt already in flight.
#[derive(Clone)]
pub struct RenewalScheduler {
    inner: Arc<SchedulerInner>,
}

impl RenewalScheduler {
    pub fn new(context: AuthContext, api: ApiClient, interval: Duration) -> Self {
        let renewer = Renewer::new(api.clone(), context.state().clone());
        Self {
            inner: Arc::new(SchedulerInner {
                context,
                renewer,
                api,
                interval,
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Renewal attempts started since this scheduler was created
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    pub fn renewer(&self) -> &Renewer {
        &self.inner.renewer
    }

    pub fn state(&self) -> SchedulerState {
        if self.inner.context.schedule().is_armed() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Start (or restart) the schedule.
    ///
    /// Renews once immediately if a user is logged in, then on every interval.
    pub fn start(&self) {
        let slot = self.inner.context.schedule();
        if slot.cancel() {
            debug!("Cancelled existing renewal schedule before restart");
        }

        let period = self.inner.interval;
        let scheduler = self.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                scheduler.spawn_attempt();
            }
        });
        slot.arm(ticker);
        info!(interval_secs = period.as_secs(), "Token renewal scheduled");

        // The timer must be armed before an immediate attempt can terminate the session
        if self.inner.context.state().is_logged_in() {
            self.spawn_attempt();
        }
    }

    /// Stop the schedule. No-op if already stopped.
    pub fn stop(&self) {
        if self.inner.context.schedule().cancel() {
            info!("Token renewal schedule stopped");
        }
    }

    fn spawn_attempt(&self) -> JoinHandle<bool> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.attempt().await })
    }

    /// Run one renewal attempt. Returns true if the credential was renewed.
    ///
    /// On failure the server session is logged out best-effort and the local
    /// session is terminated regardless of the logout outcome.
    pub async fn attempt(&self) -> bool {
        self.inner.attempts.fetch_add(1, Ordering::Relaxed);
        debug!("Attempting scheduled token renewal");

        let state = self.inner.context.state();
        let started_with = state.credential();

        match self.inner.renewer.renew().await {
            Ok(renewal) => {
                if state.replace_credential(&renewal.previous, renewal.credential) {
                    info!("Token renewed via schedule");
                    self.inner.context.emit(SessionEvent::Renewed);
                    true
                } else {
                    false
                }
            }
            Err(e) => {
                if state.credential() != started_with {
                    debug!(error = %e, "Session changed during renewal, ignoring failure");
                    return false;
                }
                error!(error = %e, "Unable to renew token via schedule");

                if state.is_authenticated() {
                    match self.inner.api.logout().await {
                        Ok(()) => debug!("Server session logged out"),
                        Err(logout_err) => {
                            warn!(error = %logout_err, "Logout call failed, clearing local session anyway")
                        }
                    }
                }

                self.inner
                    .context
                    .terminate(TerminationReason::RenewalFailed(e.to_string()));
                false
            }
        }
    }
}
