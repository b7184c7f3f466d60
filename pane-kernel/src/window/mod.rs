//! Windows.
//!
//! Thread frames and thread windows own an actor thread; child windows
//! run on their team leader's thread and share its mailbox. The public
//! [`Window`] is a weak handle: once the window is destroyed every call
//! on it fails with [`PaneError::InvalidTarget`].

mod actor;

pub(crate) use actor::Actor;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use pane_api::{next_instance_id, Event, Geometry, InstanceId};
use pane_mailbox::sync::lock;
use pane_timer::TimerKind;
use serde::{Deserialize, Serialize};

use crate::display::{DisplayHandle, DisplayInner};
use crate::listener::{ListenerSlot, SheetListener, WindowListener};
use crate::registry::Entry;
use crate::sheet::{self, Sheet, SheetInner};
use crate::stats::{DispatchStats, StatsCounters};
use crate::PaneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    /// Top-level window with its own thread.
    ThreadFrame,
    /// Nested window with its own thread.
    ThreadWindow,
    /// Nested window running on its team leader's thread.
    Child,
}

impl WindowKind {
    pub fn owns_thread(self) -> bool {
        !matches!(self, WindowKind::Child)
    }
}

pub(crate) struct WindowInner {
    pub id: InstanceId,
    pub kind: WindowKind,
    pub name: String,
    pub display: Arc<DisplayInner>,
    pub actor: Arc<Actor>,
    pub listener: ListenerSlot<dyn WindowListener>,
    pub initialized: AtomicBool,
    pub configure_serial: AtomicU64,
    pub draw_serial: AtomicU64,
    /// Set by handlers during one dispatch; the dispatcher presents if set.
    pub req_swap_buffers: AtomicBool,
    parent: Weak<WindowInner>,
    leader: Weak<WindowInner>,
    alive: AtomicBool,
    geometry: Mutex<Geometry>,
    children: Mutex<Vec<Arc<WindowInner>>>,
    sheets: Mutex<Vec<Arc<SheetInner>>>,
    active_sheet: Mutex<Option<Arc<SheetInner>>>,
}

impl WindowInner {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn geometry(&self) -> Geometry {
        *lock(&self.geometry)
    }

    /// Store new geometry, returning the previous one.
    pub fn set_geometry(&self, geometry: Geometry) -> Geometry {
        std::mem::replace(&mut *lock(&self.geometry), geometry)
    }

    pub fn active_sheet(&self) -> Option<Arc<SheetInner>> {
        lock(&self.active_sheet)
            .clone()
            .filter(|sheet| sheet.is_alive())
    }

    pub(crate) fn push_sheet(&self, sheet: Arc<SheetInner>) {
        lock(&self.sheets).push(sheet.clone());
        let mut active = lock(&self.active_sheet);
        if active.is_none() {
            *active = Some(sheet);
        }
    }

    pub(crate) fn unlink_sheet(&self, id: InstanceId) {
        lock(&self.sheets).retain(|sheet| sheet.id != id);
        let mut active = lock(&self.active_sheet);
        if active.as_ref().is_some_and(|sheet| sheet.id == id) {
            *active = None;
        }
    }

    fn post(&self, event: Event) -> Result<(), PaneError> {
        self.actor.post_event(self.id, event)
    }

    fn link(self: &Arc<Self>) {
        match self.parent.upgrade() {
            Some(parent) => lock(&parent.children).push(self.clone()),
            None => lock(&self.display.frames).push(self.clone()),
        }
    }

    fn unlink(self: &Arc<Self>) {
        match self.parent.upgrade() {
            Some(parent) => lock(&parent.children).retain(|child| !Arc::ptr_eq(child, self)),
            None => lock(&self.display.frames).retain(|frame| !Arc::ptr_eq(frame, self)),
        }
    }

    /// Undo a creation that failed before the window became reachable.
    fn abandon(self: &Arc<Self>) {
        self.alive.store(false, Ordering::Release);
        self.unlink();
        self.display.registry.remove(self.id);
        if self.kind.owns_thread() {
            let _ = self.actor.mailbox.stop();
            let _ = self.actor.mailbox.drain();
            let _ = self.actor.mailbox.destroy();
        }
    }

    /// Whether the calling thread is the actor of one of this window's
    /// descendants.
    fn called_from_descendant(&self) -> bool {
        let children = lock(&self.children).clone();
        children
            .iter()
            .any(|child| child.actor.is_current_thread() || child.called_from_descendant())
    }

    /// Begin destroying the window. A second call fails.
    ///
    /// Child windows on their leader's thread are torn down at once; from
    /// elsewhere a `TERMINATE` is posted. A thread window destroyed from
    /// another thread is joined before this returns, unless that thread
    /// belongs to a descendant: the window's teardown joins the descendant,
    /// so the display reaps the window instead. Destroyed from its own
    /// thread, its loop exits after the current dispatch.
    pub fn destroy(self: &Arc<Self>) -> Result<(), PaneError> {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return Err(PaneError::InvalidTarget(self.id));
        }
        tracing::debug!(window = %self.name, id = %self.id, kind = ?self.kind, "destroying window");

        let on_owner = self.actor.is_current_thread();
        match self.kind {
            WindowKind::Child if on_owner => {
                self.teardown();
                Ok(())
            }
            WindowKind::Child => ignore_shutdown(self.post(Event::Terminate)),
            _ if on_owner => {
                self.actor.request_terminate();
                Ok(())
            }
            _ if self.called_from_descendant() => ignore_shutdown(self.post(Event::Terminate)),
            _ => {
                ignore_shutdown(self.post(Event::Terminate))?;
                self.actor.join()
            }
        }
    }

    /// Release the window on its owning thread: children, then sheets,
    /// then the window's own `terminate`.
    pub(crate) fn teardown(self: &Arc<Self>) {
        self.alive.store(false, Ordering::Release);

        let children = std::mem::take(&mut *lock(&self.children));
        for child in children {
            if child.kind.owns_thread() {
                match child.destroy() {
                    Ok(()) | Err(PaneError::InvalidTarget(_)) => {}
                    Err(e) => tracing::warn!(window = %child.name, "failed to destroy thread window: {}", e),
                }
            } else {
                child.teardown();
            }
        }

        let sheets = std::mem::take(&mut *lock(&self.sheets));
        *lock(&self.active_sheet) = None;
        for sheet in &sheets {
            sheet.kill();
            sheet::free_sheet(sheet);
        }

        self.listener.terminate();
        self.unlink();
        self.display.registry.remove(self.id);
        tracing::debug!(window = %self.name, id = %self.id, "window torn down");
    }
}

fn ignore_shutdown(result: Result<(), PaneError>) -> Result<(), PaneError> {
    match result {
        Err(e) if e.is_shutdown() => Ok(()),
        other => other,
    }
}

/// Create a window, register it, link it under its parent (or the display),
/// start its thread if it owns one, and queue `INIT` + `CONFIGURE`.
pub(crate) fn create_window(
    display: &Arc<DisplayInner>,
    parent: Option<&Arc<WindowInner>>,
    kind: WindowKind,
    name: &str,
    geometry: Geometry,
    listener: Box<dyn WindowListener>,
) -> Result<Arc<WindowInner>, PaneError> {
    let id = next_instance_id();
    let (actor, parent_leader) = match (kind, parent) {
        (WindowKind::Child, Some(parent)) => (parent.actor.clone(), Some(parent.leader.clone())),
        (WindowKind::Child, None) => return Err(PaneError::InvalidTarget(InstanceId::NONE)),
        _ => (
            Arc::new(Actor::new(id, display.config.mailbox_capacity)?),
            None,
        ),
    };

    let window = Arc::new_cyclic(|me: &Weak<WindowInner>| WindowInner {
        id,
        kind,
        name: name.to_string(),
        display: display.clone(),
        actor,
        listener: ListenerSlot::new(listener),
        initialized: AtomicBool::new(false),
        configure_serial: AtomicU64::new(0),
        draw_serial: AtomicU64::new(0),
        req_swap_buffers: AtomicBool::new(false),
        parent: parent.map(Arc::downgrade).unwrap_or_default(),
        leader: parent_leader.unwrap_or_else(|| me.clone()),
        alive: AtomicBool::new(true),
        geometry: Mutex::new(Geometry::default()),
        children: Mutex::new(Vec::new()),
        sheets: Mutex::new(Vec::new()),
        active_sheet: Mutex::new(None),
    });
    display
        .registry
        .insert(id, Entry::Window(Arc::downgrade(&window)));
    window.link();

    if kind.owns_thread() {
        if let Err(e) = actor::spawn(&window, geometry) {
            window.abandon();
            return Err(e);
        }
    }

    let serial = window.configure_serial.fetch_add(1, Ordering::AcqRel) + 1;
    let queued = window
        .post(Event::Init)
        .and_then(|()| window.post(Event::Configure { serial, geometry }));
    if let Err(e) = queued {
        let _ = window.destroy();
        return Err(e);
    }
    tracing::debug!(window = %window.name, %id, ?kind, "window created");
    Ok(window)
}

/// Handle to a window.
#[derive(Debug, Clone)]
pub struct Window {
    id: InstanceId,
    inner: Weak<WindowInner>,
    stats: Arc<StatsCounters>,
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Window {}

impl Window {
    pub(crate) fn from_inner(inner: &Arc<WindowInner>) -> Self {
        Self {
            id: inner.id,
            inner: Arc::downgrade(inner),
            stats: inner.actor.stats.clone(),
        }
    }

    pub(crate) fn upgrade(&self) -> Result<Arc<WindowInner>, PaneError> {
        self.inner
            .upgrade()
            .filter(|inner| inner.is_alive())
            .ok_or(PaneError::InvalidTarget(self.id))
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.upgrade().is_ok()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.upgrade().map(|inner| inner.name.clone())
    }

    pub fn kind(&self) -> Option<WindowKind> {
        self.inner.upgrade().map(|inner| inner.kind)
    }

    /// Last geometry applied by a `CONFIGURE` or `RESHAPE`.
    pub fn geometry(&self) -> Option<Geometry> {
        self.inner.upgrade().map(|inner| inner.geometry())
    }

    pub fn parent(&self) -> Option<Window> {
        let parent = self.inner.upgrade()?.parent.upgrade()?;
        Some(Window::from_inner(&parent))
    }

    /// The thread-owning window whose thread runs this one.
    pub fn team_leader(&self) -> Option<Window> {
        let leader = self.inner.upgrade()?.leader.upgrade()?;
        Some(Window::from_inner(&leader))
    }

    pub fn children(&self) -> Vec<Window> {
        match self.upgrade() {
            Ok(inner) => lock(&inner.children).iter().map(Window::from_inner).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn display(&self) -> Option<DisplayHandle> {
        let inner = self.inner.upgrade()?;
        Some(DisplayHandle::from_inner(&inner.display))
    }

    /// Counters of the team this window belongs to. Still readable after
    /// the window is destroyed.
    pub fn stats(&self) -> DispatchStats {
        self.stats.snapshot()
    }

    /// Latest `(configure, draw)` serials issued for this window.
    pub fn serials(&self) -> Option<(u64, u64)> {
        let inner = self.inner.upgrade()?;
        Some((
            inner.configure_serial.load(Ordering::Acquire),
            inner.draw_serial.load(Ordering::Acquire),
        ))
    }

    /// Nested window with its own thread, rendering context and mailbox.
    pub fn create_thread_window(
        &self,
        name: &str,
        geometry: Geometry,
        listener: impl WindowListener + 'static,
    ) -> Result<Window, PaneError> {
        self.create_nested(WindowKind::ThreadWindow, name, geometry, Box::new(listener))
    }

    /// Nested window dispatched on this window's team-leader thread.
    pub fn create_child_window(
        &self,
        name: &str,
        geometry: Geometry,
        listener: impl WindowListener + 'static,
    ) -> Result<Window, PaneError> {
        self.create_nested(WindowKind::Child, name, geometry, Box::new(listener))
    }

    fn create_nested(
        &self,
        kind: WindowKind,
        name: &str,
        geometry: Geometry,
        listener: Box<dyn WindowListener>,
    ) -> Result<Window, PaneError> {
        let inner = self.upgrade()?;
        let window = create_window(&inner.display, Some(&inner), kind, name, geometry, listener)?;
        Ok(Window::from_inner(&window))
    }

    pub fn destroy(&self) -> Result<(), PaneError> {
        let inner = self.inner.upgrade().ok_or(PaneError::InvalidTarget(self.id))?;
        inner.destroy()
    }

    /// Queue new geometry. Earlier configure/reshape requests still in the
    /// mailbox become stale. Returns the serial of this request.
    pub fn request_configure(&self, geometry: Geometry) -> Result<u64, PaneError> {
        let inner = self.upgrade()?;
        let serial = inner.configure_serial.fetch_add(1, Ordering::AcqRel) + 1;
        inner.post(Event::Configure { serial, geometry })?;
        Ok(serial)
    }

    pub fn request_reshape(&self, width: i32, height: i32) -> Result<u64, PaneError> {
        let inner = self.upgrade()?;
        let serial = inner.configure_serial.fetch_add(1, Ordering::AcqRel) + 1;
        inner.post(Event::Reshape { serial, width, height })?;
        Ok(serial)
    }

    /// Queue a full redraw; it always presents.
    pub fn request_redraw(&self) -> Result<u64, PaneError> {
        let inner = self.upgrade()?;
        let serial = inner.draw_serial.fetch_add(1, Ordering::AcqRel) + 1;
        inner.post(Event::Redraw { serial })?;
        Ok(serial)
    }

    /// Queue an incremental update; it presents only if a handler asked to.
    pub fn request_update(&self) -> Result<u64, PaneError> {
        let inner = self.upgrade()?;
        let serial = inner.draw_serial.fetch_add(1, Ordering::AcqRel) + 1;
        inner.post(Event::Update { serial })?;
        Ok(serial)
    }

    /// Create or refresh timer `id`. Ids are shared by every window, sheet
    /// and widget on the same team.
    pub fn create_timer(
        &self,
        group: u32,
        id: u32,
        kind: TimerKind,
        interval: Duration,
    ) -> Result<(), PaneError> {
        let inner = self.upgrade()?;
        inner
            .actor
            .create_timer(&inner.display.timers, self.id, group, id, kind, interval)
    }

    pub fn start_timer(&self, id: u32) -> Result<(), PaneError> {
        let inner = self.upgrade()?;
        Ok(inner.display.timers.start_timer(inner.actor.leader, id)?)
    }

    /// Stop timer `id`; fires already queued are discarded on dispatch.
    pub fn stop_timer(&self, id: u32) -> Result<u64, PaneError> {
        let inner = self.upgrade()?;
        Ok(inner.display.timers.stop_timer(inner.actor.leader, id)?)
    }

    pub fn send_user_message(&self, kind: u32, payload: Option<Vec<u8>>) -> Result<(), PaneError> {
        self.upgrade()?.actor.send_user_message(self.id, kind, payload)
    }

    /// Inject an input event. Lifecycle opcodes are rejected.
    pub fn post_event(&self, event: Event) -> Result<(), PaneError> {
        self.upgrade()?.actor.post_input(self.id, event)
    }

    /// Add a sheet. The first sheet becomes the active one.
    pub fn create_sheet(
        &self,
        name: &str,
        listener: impl SheetListener + 'static,
    ) -> Result<Sheet, PaneError> {
        let inner = self.upgrade()?;
        let sheet = sheet::create_sheet(&inner, name, Box::new(listener))?;
        Ok(Sheet::from_inner(&sheet))
    }

    pub fn sheets(&self) -> Vec<Sheet> {
        match self.upgrade() {
            Ok(inner) => lock(&inner.sheets).iter().map(Sheet::from_inner).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn active_sheet(&self) -> Option<Sheet> {
        let sheet = self.upgrade().ok()?.active_sheet()?;
        Some(Sheet::from_inner(&sheet))
    }

    /// Route input and draw events to `sheet`, which must belong to this window.
    pub fn set_active_sheet(&self, sheet: &Sheet) -> Result<(), PaneError> {
        let inner = self.upgrade()?;
        let sheet = sheet.upgrade()?;
        let owned = sheet
            .window()
            .is_some_and(|window| Arc::ptr_eq(&window, &inner));
        if !owned {
            return Err(PaneError::InvalidTarget(sheet.id));
        }
        *lock(&inner.active_sheet) = Some(sheet);
        Ok(())
    }
}
