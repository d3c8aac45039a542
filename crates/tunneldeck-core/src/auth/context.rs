use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{SessionEvent, SessionState, TerminationReason};

/// Buffer size for the session event channel.
/// Events are rare (login, renewal, logout), 16 leaves ample headroom for slow subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Holds the single renewal timer task.
///
/// Arming always aborts the previous task first, so at most one timer exists.
#[derive(Clone, Default)]
pub struct ScheduleSlot {
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ScheduleSlot {
    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a timer task, aborting any previous one.
    pub fn arm(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Abort the timer task. Returns true if one was armed.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl fmt::Debug for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleSlot").field("armed", &self.is_armed()).finish()
    }
}

/// Everything the middleware and scheduler share: session state, the
/// event channel and the renewal timer slot.
#[derive(Clone, Debug)]
pub struct AuthContext {
    state: SessionState,
    events: broadcast::Sender<SessionEvent>,
    schedule: ScheduleSlot,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    pub fn new() -> Self {
        Self::with_state(SessionState::new())
    }

    pub fn with_state(state: SessionState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state,
            events,
            schedule: ScheduleSlot::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn schedule(&self) -> &ScheduleSlot {
        &self.schedule
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No session event subscribers");
        }
    }

    /// End the session without user involvement.
    ///
    /// Clears the session, stops the renewal schedule and, if there was a
    /// session to clear, broadcasts `SessionEvent::Terminated`. Repeated calls
    /// only notify once, so cascading failures produce a single redirect.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        let cleared = self.state.clear();
        if self.schedule.cancel() {
            info!("Token renewal schedule stopped");
        }

        if cleared {
            warn!(%reason, "Session terminated");
            self.emit(SessionEvent::Terminated(reason));
        } else {
            debug!(%reason, "Session already cleared, nothing to terminate");
        }
        cleared
    }
}
