//! Pane Mailbox - bounded message queues between window actors.
//!
//! A mailbox is a fixed-capacity ring buffer guarded by a mutex and two
//! counting semaphores (free slots, filled slots). Senders block when the
//! ring is full, receivers block when it is empty, and a stopped mailbox
//! refuses new sends while still letting its owner drain what is queued.

mod mailbox;
mod ring_buffer;
pub mod sync;

pub use mailbox::{Mailbox, MailboxError, MailboxStats};
pub use ring_buffer::RingBuffer;
pub use sync::Semaphore;
