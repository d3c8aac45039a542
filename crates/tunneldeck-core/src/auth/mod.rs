//! Session credential lifecycle.
//!
//! This module provides:
//! - `SessionState`: shared handle to the current credential and identity
//! - `AuthContext`: session state plus the event channel and renewal timer slot
//! - `Renewer`: single-flight exchange of the credential for a fresh one
//! - `RenewalScheduler`: proactive renewal every 10 minutes by default
//!
//! Credentials live in memory only and are never written to disk.

pub mod context;
pub mod events;
pub mod renewal;
pub mod scheduler;
pub mod session;

pub use context::{AuthContext, ScheduleSlot};
pub use events::{SessionEvent, TerminationReason};
pub use renewal::{Renewal, RenewalError, Renewer};
pub use scheduler::{RenewalScheduler, SchedulerState, DEFAULT_RENEWAL_INTERVAL};
pub use session::{Identity, Session, SessionState};
