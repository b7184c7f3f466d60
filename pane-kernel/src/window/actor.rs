//! The thread behind each thread-owning window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::Sender;
use pane_api::{Event, Geometry, InstanceId, Message};
use pane_mailbox::sync::lock;
use pane_timer::{TimerKind, TimerMailbox, TimerRequest, TimerService};

use super::WindowInner;
use crate::dispatch::{Dispatcher, Flow};
use crate::display::DisplayRequest;
use crate::stats::{bump, unbump, StatsCounters};
use crate::PaneError;

/// State shared by a team: the leader's mailbox, thread and counters.
/// Child windows, sheets and widgets hold the same `Arc<Actor>`.
pub(crate) struct Actor {
    /// Id of the team leader; also the owner key for the team's timers.
    pub leader: InstanceId,
    pub mailbox: Arc<TimerMailbox>,
    pub stats: Arc<StatsCounters>,
    thread: OnceLock<ThreadId>,
    handle: Mutex<Option<JoinHandle<()>>>,
    terminate_requested: AtomicBool,
}

impl Actor {
    pub fn new(leader: InstanceId, capacity: usize) -> Result<Self, PaneError> {
        Ok(Self {
            leader,
            mailbox: Arc::new(TimerMailbox::with_capacity(capacity)?),
            stats: Arc::new(StatsCounters::default()),
            thread: OnceLock::new(),
            handle: Mutex::new(None),
            terminate_requested: AtomicBool::new(false),
        })
    }

    pub fn is_current_thread(&self) -> bool {
        self.thread.get() == Some(&thread::current().id())
    }

    /// Post into the team mailbox. From the actor's own thread this never
    /// blocks and fails with `Full` instead.
    pub fn post_event(&self, target: InstanceId, event: Event) -> Result<(), PaneError> {
        let message = Message::new(target, event);
        let result = if self.is_current_thread() {
            self.mailbox.try_send(message)
        } else {
            self.mailbox.send(message)
        };
        Ok(result?)
    }

    /// Post an application-originated event; lifecycle opcodes are refused.
    pub fn post_input(&self, target: InstanceId, event: Event) -> Result<(), PaneError> {
        let opcode = event.opcode();
        if opcode.is_lifecycle() {
            return Err(PaneError::Reserved(opcode));
        }
        match event {
            Event::UserMsg { kind, payload } => self.send_user_message(target, kind, payload),
            event => self.post_event(target, event),
        }
    }

    pub fn send_user_message(
        &self,
        target: InstanceId,
        kind: u32,
        payload: Option<Vec<u8>>,
    ) -> Result<(), PaneError> {
        // Counted before the receiver can see it, so `handled + dropped`
        // never runs ahead of `sent`.
        bump(&self.stats.user_msg_sent);
        let result = self.post_event(target, Event::UserMsg { kind, payload });
        if result.is_err() {
            unbump(&self.stats.user_msg_sent);
            bump(&self.stats.user_msg_send_failed);
        }
        result
    }

    pub fn create_timer(
        &self,
        timers: &TimerService,
        target: InstanceId,
        group: u32,
        id: u32,
        kind: TimerKind,
        interval: Duration,
    ) -> Result<(), PaneError> {
        timers.create_timer(TimerRequest {
            owner: self.leader,
            target,
            mailbox: Arc::downgrade(&self.mailbox),
            group,
            id,
            kind,
            interval,
        })?;
        Ok(())
    }

    /// Ask the running loop to exit after the current dispatch.
    pub fn request_terminate(&self) {
        self.terminate_requested.store(true, Ordering::Release);
    }

    fn terminate_requested(&self) -> bool {
        self.terminate_requested.load(Ordering::Acquire)
    }

    /// Join the actor thread if nobody else has taken the handle.
    pub fn join(&self) -> Result<(), PaneError> {
        let handle = lock(&self.handle).take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| PaneError::ActorPanicked(self.leader)),
            None => Ok(()),
        }
    }
}

/// Start the actor thread for `window` and wait until its rendering
/// context exists. A context failure is returned to the creator.
pub(crate) fn spawn(window: &Arc<WindowInner>, geometry: Geometry) -> Result<(), PaneError> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
    let thread_window = window.clone();
    let handle = thread::Builder::new()
        .name(format!("pane-{}", window.name))
        .spawn(move || run(thread_window, geometry, ready_tx))
        .map_err(PaneError::Spawn)?;
    *lock(&window.actor.handle) = Some(handle);

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(reason)) => {
            let _ = window.actor.join();
            Err(PaneError::Context(reason))
        }
        Err(_) => {
            let _ = window.actor.join();
            Err(PaneError::ActorPanicked(window.id))
        }
    }
}

fn run(window: Arc<WindowInner>, geometry: Geometry, ready: Sender<Result<(), String>>) {
    let actor = window.actor.clone();
    let _ = actor.thread.set(thread::current().id());

    let render = match window.display.contexts.create(window.id, &window.name, geometry) {
        Ok(render) => render,
        Err(e) => {
            tracing::warn!(window = %window.name, "rendering context failed: {:#}", e);
            let _ = ready.send(Err(format!("{:#}", e)));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    drop(ready);

    tracing::info!(window = %window.name, id = %window.id, kind = ?window.kind, "window actor started");
    let _unwind = UnwindGuard { window: &window };
    let mut dispatcher = Dispatcher::new(window.clone(), render);
    loop {
        let message = match actor.mailbox.receive() {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(window = %window.name, "mailbox receive failed: {}", e);
                break;
            }
        };
        if dispatcher.dispatch(message) == Flow::Exit || actor.terminate_requested() {
            break;
        }
    }
    dispatcher.shutdown();

    let _ = window
        .display
        .control
        .send(DisplayRequest::Reap(actor.clone()));
}

/// Closes the team mailbox if a callback panics and unwinds the actor
/// thread. Senders then fail with `Stopped` instead of queueing for a
/// thread that will never receive again.
struct UnwindGuard<'a> {
    window: &'a Arc<WindowInner>,
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if !thread::panicking() {
            return;
        }
        let window = self.window;
        let actor = &window.actor;
        tracing::error!(window = %window.name, id = %window.id, "window actor panicked");

        let _ = actor.mailbox.stop();
        if let Ok(queued) = actor.mailbox.drain() {
            for message in queued {
                if matches!(message.event, Event::UserMsg { .. }) {
                    bump(&actor.stats.user_msg_dropped);
                }
            }
        }
        window.display.timers.remove_owner(actor.leader);
        let _ = window
            .display
            .control
            .send(DisplayRequest::Reap(actor.clone()));
    }
}
