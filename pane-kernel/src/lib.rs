//! Pane Kernel - window actors, message dispatch and object lifecycle.
//!
//! A [`Display`] owns a set of windows. Every thread-owning window runs an
//! actor thread that drains a bounded mailbox and dispatches each message
//! to the window, sheet or widget it targets. Child windows, sheets and
//! widgets run on their team leader's thread. Configure and draw requests
//! carry serials so only the newest one is acted on, timer fires carry
//! epochs so a stopped timer never reaches its listener, and sheets or
//! widgets destroyed from a foreign thread are quarantined until the
//! display loop frees them.

mod config;
mod context;
mod dispatch;
mod display;
mod error;
mod event_context;
mod garbage;
mod listener;
mod registry;
mod sheet;
mod stats;
mod widget;
mod window;

pub use config::DisplayConfig;
pub use context::{ContextFactory, HeadlessContext, HeadlessContextFactory, RenderContext};
pub use display::{Display, DisplayHandle, EventSource, SourceStatus};
pub use error::PaneError;
pub use event_context::EventContext;
pub use listener::{SheetListener, WidgetListener, WindowListener};
pub use registry::Handle;
pub use sheet::Sheet;
pub use stats::DispatchStats;
pub use widget::{Widget, WidgetAttributes};
pub use window::{Window, WindowKind};

pub use pane_api as api;
pub use pane_timer::TimerKind;
