//! Kernel error types.

use pane_api::{InstanceId, Opcode};
use pane_mailbox::MailboxError;
use pane_timer::TimerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaneError {
    #[error("mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("timer error: {0}")]
    Timer(#[from] TimerError),

    #[error("no live object with id {0}")]
    InvalidTarget(InstanceId),

    #[error("{0} is generated by the core and cannot be posted")]
    Reserved(Opcode),

    #[error("rendering context: {0}")]
    Context(String),

    #[error("failed to spawn window thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("window actor {0} panicked")]
    ActorPanicked(InstanceId),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaneError {
    /// Whether the target has begun terminating (send to a stopped mailbox).
    pub fn is_shutdown(&self) -> bool {
        matches!(self, PaneError::Mailbox(MailboxError::Stopped))
    }
}
