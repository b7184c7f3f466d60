//! The display: owner of every window, the timer service and the garbage box.
//!
//! [`Display`] lives on the application's main thread and runs the display
//! loop: it reaps finished actor threads, polls registered event sources
//! and frees quarantined sheets and widgets. [`DisplayHandle`] is the
//! cloneable, thread-safe view handed to actors and event sources.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pane_api::{next_instance_id, Geometry, InstanceId};
use pane_mailbox::sync::lock;
use pane_timer::TimerService;

use crate::config::DisplayConfig;
use crate::context::{ContextFactory, HeadlessContextFactory};
use crate::garbage::GarbageBox;
use crate::listener::WindowListener;
use crate::registry::{Handle, Registry};
use crate::window::{self, Actor, Window, WindowInner, WindowKind};
use crate::PaneError;

pub(crate) enum DisplayRequest {
    /// An actor thread finished; join it.
    Reap(Arc<Actor>),
    Quit,
}

pub(crate) struct DisplayInner {
    pub id: InstanceId,
    pub config: DisplayConfig,
    pub registry: Registry,
    pub garbage: GarbageBox,
    pub timers: TimerService,
    pub frames: Mutex<Vec<Arc<WindowInner>>>,
    pub contexts: Arc<dyn ContextFactory>,
    pub control: Sender<DisplayRequest>,
}

/// Result of one [`EventSource::dispatch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Continue,
    /// Unregister the source.
    Remove,
}

/// Something polled once per display loop iteration, typically a bridge
/// from a platform event queue into window mailboxes.
pub trait EventSource: Send {
    fn name(&self) -> &str;

    fn dispatch(&mut self, display: &DisplayHandle) -> anyhow::Result<SourceStatus>;
}

pub struct Display {
    inner: Arc<DisplayInner>,
    requests: Receiver<DisplayRequest>,
    sources: Vec<Box<dyn EventSource>>,
    running: bool,
    shut_down: bool,
}

impl Display {
    /// Open a display that renders headless.
    pub fn open(config: DisplayConfig) -> Result<Self, PaneError> {
        Self::with_context_factory(config, Arc::new(HeadlessContextFactory::new()))
    }

    pub fn with_context_factory(
        config: DisplayConfig,
        contexts: Arc<dyn ContextFactory>,
    ) -> Result<Self, PaneError> {
        config.validate()?;
        let timers = TimerService::start(config.timer_config())?;
        let (control, requests) = crossbeam_channel::unbounded();

        let inner = Arc::new(DisplayInner {
            id: next_instance_id(),
            config,
            registry: Registry::default(),
            garbage: GarbageBox::default(),
            timers,
            frames: Mutex::new(Vec::new()),
            contexts,
            control,
        });
        tracing::info!(display = %inner.config.name, id = %inner.id, "display opened");

        Ok(Self {
            inner,
            requests,
            sources: Vec::new(),
            running: true,
            shut_down: false,
        })
    }

    pub fn handle(&self) -> DisplayHandle {
        DisplayHandle::from_inner(&self.inner)
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.inner.config
    }

    /// Create a top-level window with its own actor thread.
    pub fn create_frame_window(
        &self,
        name: &str,
        geometry: Geometry,
        listener: impl WindowListener + 'static,
    ) -> Result<Window, PaneError> {
        self.handle().create_frame_window(name, geometry, listener)
    }

    pub fn register_source(&mut self, source: impl EventSource + 'static) {
        tracing::debug!(source = source.name(), "event source registered");
        self.sources.push(Box::new(source));
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One display loop iteration: wait up to `timeout` for a request,
    /// handle every pending request, poll the event sources, then collect
    /// garbage. Returns false once [`DisplayHandle::quit`] was called.
    pub fn dispatch(&mut self, timeout: Duration) -> bool {
        match self.requests.recv_timeout(timeout) {
            Ok(request) => self.handle_request(request),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.running = false,
        }
        while let Ok(request) = self.requests.try_recv() {
            self.handle_request(request);
        }

        self.dispatch_sources();
        self.collect_garbage();
        self.running
    }

    /// Run the display loop until quit.
    pub fn run(&mut self) {
        let interval = self.inner.config.poll_interval();
        while self.dispatch(interval) {}
    }

    /// Free quarantined sheets and widgets. Returns whether anything was freed.
    pub fn collect_garbage(&self) -> bool {
        self.inner.garbage.collect()
    }

    /// Number of sheets and widgets waiting in quarantine.
    pub fn pending_garbage(&self) -> usize {
        self.inner.garbage.pending()
    }

    fn handle_request(&mut self, request: DisplayRequest) {
        match request {
            DisplayRequest::Quit => {
                tracing::debug!(display = %self.inner.config.name, "quit requested");
                self.running = false;
            }
            DisplayRequest::Reap(actor) => {
                if let Err(e) = actor.join() {
                    tracing::error!("{}", e);
                }
            }
        }
    }

    fn dispatch_sources(&mut self) {
        if self.sources.is_empty() {
            return;
        }
        let handle = self.handle();
        self.sources.retain_mut(|source| match source.dispatch(&handle) {
            Ok(SourceStatus::Continue) => true,
            Ok(SourceStatus::Remove) => {
                tracing::debug!(source = source.name(), "event source finished");
                false
            }
            Err(e) => {
                tracing::warn!(source = source.name(), "event source failed: {:#}", e);
                true
            }
        });
    }

    /// Destroy every frame (joining its thread), drain the garbage box and
    /// stop the timer service. Also runs on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.running = false;

        let frames = std::mem::take(&mut *lock(&self.inner.frames));
        tracing::info!(display = %self.inner.config.name, frames = frames.len(), "display shutting down");
        for frame in &frames {
            match frame.destroy() {
                Ok(()) => {}
                Err(PaneError::InvalidTarget(_)) => {
                    if let Err(e) = frame.actor.join() {
                        tracing::error!("{}", e);
                    }
                }
                Err(e) => tracing::warn!(window = %frame.name, "failed to destroy frame: {}", e),
            }
        }
        drop(frames);

        while let Ok(request) = self.requests.try_recv() {
            self.handle_request(request);
        }
        while self.collect_garbage() {}

        self.sources.clear();
        self.inner.timers.shutdown();
        tracing::info!(display = %self.inner.config.name, "display closed");
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Cloneable handle to a display.
#[derive(Clone)]
pub struct DisplayHandle {
    inner: Arc<DisplayInner>,
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHandle")
            .field("name", &self.inner.config.name)
            .field("id", &self.inner.id)
            .finish()
    }
}

impl DisplayHandle {
    pub(crate) fn from_inner(inner: &Arc<DisplayInner>) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.inner.config
    }

    pub fn create_frame_window(
        &self,
        name: &str,
        geometry: Geometry,
        listener: impl WindowListener + 'static,
    ) -> Result<Window, PaneError> {
        let frame = window::create_window(
            &self.inner,
            None,
            WindowKind::ThreadFrame,
            name,
            geometry,
            Box::new(listener),
        )?;
        Ok(Window::from_inner(&frame))
    }

    pub fn frames(&self) -> Vec<Window> {
        lock(&self.inner.frames)
            .iter()
            .map(Window::from_inner)
            .collect()
    }

    /// Resolve an id to a handle, if the object is still registered.
    pub fn lookup(&self, id: InstanceId) -> Option<Handle> {
        let resolved = self.inner.registry.resolve(id)?;
        resolved.is_alive().then(|| Handle::from(&resolved))
    }

    /// Number of registered windows, sheets and widgets.
    pub fn instance_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Timers currently held in the timer table.
    pub fn timer_count(&self) -> usize {
        self.inner.timers.len()
    }

    /// Make [`Display::run`] return after its current iteration.
    pub fn quit(&self) {
        let _ = self.inner.control.send(DisplayRequest::Quit);
    }
}
