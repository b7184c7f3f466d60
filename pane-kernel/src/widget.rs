//! Widgets: hit-testable regions of a sheet with their own listener.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use bitflags::bitflags;
use pane_api::{next_instance_id, Event, Geometry, InstanceId};
use pane_mailbox::sync::lock;
use pane_timer::TimerKind;

use crate::display::DisplayInner;
use crate::listener::{ListenerSlot, WidgetListener};
use crate::registry::Entry;
use crate::sheet::{Sheet, SheetInner};
use crate::window::Actor;
use crate::PaneError;

bitflags! {
    /// Routing behavior of a widget.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WidgetAttributes: u32 {
        /// Press and release inside posts `ACTION`.
        const PUSH_ACTION = 1 << 0;
        /// Receives pointer motion, not just enter/leave.
        const POINTER_MOTION = 1 << 1;
        /// Takes keyboard focus when the pointer enters.
        const FOCUS_ON_HOVER = 1 << 2;
        /// Receives `KEY_INPUT` text while focused.
        const TEXT_INPUT = 1 << 3;
    }
}

pub(crate) struct WidgetInner {
    pub id: InstanceId,
    pub name: String,
    pub attributes: WidgetAttributes,
    pub actor: Arc<Actor>,
    pub display: Arc<DisplayInner>,
    pub initialized: AtomicBool,
    pub listener: ListenerSlot<dyn WidgetListener>,
    sheet: Weak<SheetInner>,
    alive: AtomicBool,
    action: AtomicU32,
    geometry: Mutex<Geometry>,
}

impl WidgetInner {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Clear the alive flag. Returns whether this call did it.
    pub fn kill(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    pub fn sheet(&self) -> Option<Arc<SheetInner>> {
        self.sheet.upgrade()
    }

    pub fn geometry(&self) -> Geometry {
        *lock(&self.geometry)
    }

    pub fn action(&self) -> u32 {
        self.action.load(Ordering::Relaxed)
    }

    pub fn hit(&self, x: i32, y: i32) -> bool {
        self.is_alive() && self.geometry().contains(x, y)
    }
}

pub(crate) fn create_widget(
    sheet: &Arc<SheetInner>,
    name: &str,
    attributes: WidgetAttributes,
    geometry: Geometry,
    listener: Box<dyn WidgetListener>,
) -> Result<Arc<WidgetInner>, PaneError> {
    let widget = Arc::new(WidgetInner {
        id: next_instance_id(),
        name: name.to_string(),
        attributes,
        actor: sheet.actor.clone(),
        display: sheet.display.clone(),
        initialized: AtomicBool::new(false),
        listener: ListenerSlot::new(listener),
        sheet: Arc::downgrade(sheet),
        alive: AtomicBool::new(true),
        action: AtomicU32::new(0),
        geometry: Mutex::new(geometry),
    });
    widget
        .display
        .registry
        .insert(widget.id, Entry::Widget(Arc::downgrade(&widget)));
    sheet.push_widget(widget.clone());
    tracing::trace!(widget = %widget.id, name, sheet = %sheet.id, "widget created");

    if let Err(e) = widget.actor.post_event(widget.id, Event::Init) {
        let _ = destroy_widget(&widget);
        return Err(e);
    }
    Ok(widget)
}

pub(crate) fn destroy_widget(widget: &Arc<WidgetInner>) -> Result<(), PaneError> {
    if !widget.kill() {
        return Err(PaneError::InvalidTarget(widget.id));
    }
    if let Some(sheet) = widget.sheet() {
        sheet.unlink_widget(widget.id);
    }

    let garbage = &widget.display.garbage;
    if widget.actor.is_current_thread() || garbage.is_collector_thread() {
        free_widget(widget);
    } else {
        tracing::trace!(widget = %widget.id, "quarantining widget");
        garbage.quarantine_widget(widget.clone());
    }
    Ok(())
}

/// Final release: `terminate` and registry removal. Caller has already
/// cleared the alive flag.
pub(crate) fn free_widget(widget: &Arc<WidgetInner>) {
    widget.listener.terminate();
    widget.display.registry.remove(widget.id);
    tracing::trace!(widget = %widget.id, name = %widget.name, "widget freed");
}

/// Handle to a widget. Stale handles fail with [`PaneError::InvalidTarget`].
#[derive(Debug, Clone)]
pub struct Widget {
    id: InstanceId,
    inner: Weak<WidgetInner>,
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Widget {}

impl Widget {
    pub(crate) fn from_inner(inner: &Arc<WidgetInner>) -> Self {
        Self {
            id: inner.id,
            inner: Arc::downgrade(inner),
        }
    }

    fn upgrade(&self) -> Result<Arc<WidgetInner>, PaneError> {
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

    pub fn attributes(&self) -> WidgetAttributes {
        self.inner
            .upgrade()
            .map(|inner| inner.attributes)
            .unwrap_or_default()
    }

    pub fn sheet(&self) -> Option<Sheet> {
        let sheet = self.inner.upgrade()?.sheet()?;
        Some(Sheet::from_inner(&sheet))
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.inner.upgrade().map(|inner| inner.geometry())
    }

    /// Move or resize the widget. Takes effect for the next hit test.
    pub fn set_geometry(&self, geometry: Geometry) -> Result<(), PaneError> {
        let inner = self.upgrade()?;
        *lock(&inner.geometry) = geometry;
        Ok(())
    }

    /// Code carried by the `ACTION` a push-action widget posts.
    pub fn set_action(&self, action: u32) -> Result<(), PaneError> {
        self.upgrade()?.action.store(action, Ordering::Relaxed);
        Ok(())
    }

    /// Destroy the widget. On its owning thread it is freed at once;
    /// elsewhere it is quarantined until the display collects garbage.
    pub fn destroy(&self) -> Result<(), PaneError> {
        let inner = self.inner.upgrade().ok_or(PaneError::InvalidTarget(self.id))?;
        destroy_widget(&inner)
    }

    /// Timer ids share one namespace per team leader.
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_bits_are_distinct() {
        let all = WidgetAttributes::PUSH_ACTION
            | WidgetAttributes::POINTER_MOTION
            | WidgetAttributes::FOCUS_ON_HOVER
            | WidgetAttributes::TEXT_INPUT;
        assert_eq!(all.bits().count_ones(), 4);
        assert!(WidgetAttributes::default().is_empty());
    }
}
