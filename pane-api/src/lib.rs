//! Pane API - Shared types for the pane windowing core.
//!
//! Everything that crosses a thread boundary lives here: instance ids,
//! the stable opcode table, and the messages that travel through a
//! window's mailbox.

mod event;
mod geometry;
mod id;
mod input;
mod opcode;

pub use event::*;
pub use geometry::*;
pub use id::*;
pub use input::*;
pub use opcode::*;
