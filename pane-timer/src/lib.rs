//! Pane Timer - shared timer service for window actors.
//!
//! One worker thread serves every window. It sleeps until the nearest
//! deadline in a fixed-size timer table, then posts `TIMER` messages into
//! the owning window's mailbox. Each entry carries a request epoch that is
//! bumped on every stop, so a fire that raced a stop can be told apart
//! from a current one with [`TimerService::check`].

mod service;
mod table;

pub use service::{TimerConfig, TimerService};
pub use table::{TimerKind, TimerRequest};

use pane_api::InstanceId;
use thiserror::Error;

/// Mailbox type timers post into.
pub type TimerMailbox = pane_mailbox::Mailbox<pane_api::Message>;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer table full ({0} entries)")]
    TableFull(usize),

    #[error("no timer {id} for owner {owner}")]
    NotFound { owner: InstanceId, id: u32 },

    #[error("timer interval must be non-zero")]
    ZeroInterval,

    #[error("timer service is shut down")]
    ShutDown,

    #[error("failed to spawn timer worker: {0}")]
    Spawn(#[source] std::io::Error),
}
