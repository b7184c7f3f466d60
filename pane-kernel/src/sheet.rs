//! Sheets: a window's content layer and the widgets on it.
//!
//! A sheet tracks which widget is under the pointer, which one is pressed,
//! and which one has keyboard focus. Those are ids, resolved against the
//! sheet's widget list when used, so a destroyed widget drops out without
//! dangling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use pane_api::{next_instance_id, Event, Geometry, InstanceId};
use pane_mailbox::sync::lock;
use pane_timer::TimerKind;

use crate::display::DisplayInner;
use crate::listener::{ListenerSlot, SheetListener, WidgetListener};
use crate::registry::Entry;
use crate::widget::{self, Widget, WidgetAttributes, WidgetInner};
use crate::window::{Actor, Window, WindowInner};
use crate::PaneError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FocusState {
    pub pointer: Option<InstanceId>,
    pub pressed: Option<InstanceId>,
    pub focus: Option<InstanceId>,
    pub selection: Option<InstanceId>,
}

impl FocusState {
    fn forget(&mut self, widget: InstanceId) {
        for slot in [
            &mut self.pointer,
            &mut self.pressed,
            &mut self.focus,
            &mut self.selection,
        ] {
            if *slot == Some(widget) {
                *slot = None;
            }
        }
    }
}

pub(crate) struct SheetInner {
    pub id: InstanceId,
    pub name: String,
    pub actor: Arc<Actor>,
    pub display: Arc<DisplayInner>,
    pub initialized: AtomicBool,
    pub listener: ListenerSlot<dyn SheetListener>,
    window: Weak<WindowInner>,
    alive: AtomicBool,
    widgets: Mutex<Vec<Arc<WidgetInner>>>,
    focus: Mutex<FocusState>,
}

impl SheetInner {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn kill(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    pub fn window(&self) -> Option<Arc<WindowInner>> {
        self.window.upgrade()
    }

    /// Snapshot of the widget list, in creation order.
    pub fn widgets(&self) -> Vec<Arc<WidgetInner>> {
        lock(&self.widgets).clone()
    }

    pub fn widget(&self, id: InstanceId) -> Option<Arc<WidgetInner>> {
        lock(&self.widgets)
            .iter()
            .find(|widget| widget.id == id && widget.is_alive())
            .cloned()
    }

    /// Topmost live widget at `(x, y)`. Later widgets stack above earlier ones.
    pub fn widget_at(&self, x: i32, y: i32) -> Option<Arc<WidgetInner>> {
        lock(&self.widgets)
            .iter()
            .rev()
            .find(|widget| widget.hit(x, y))
            .cloned()
    }

    pub fn focus_state(&self) -> FocusState {
        *lock(&self.focus)
    }

    pub fn swap_pointer(&self, widget: Option<InstanceId>) -> Option<InstanceId> {
        std::mem::replace(&mut lock(&self.focus).pointer, widget)
    }

    pub fn swap_focus(&self, widget: Option<InstanceId>) -> Option<InstanceId> {
        std::mem::replace(&mut lock(&self.focus).focus, widget)
    }

    pub fn set_pressed(&self, widget: Option<InstanceId>) {
        lock(&self.focus).pressed = widget;
    }

    pub fn take_pressed(&self) -> Option<InstanceId> {
        lock(&self.focus).pressed.take()
    }

    pub(crate) fn push_widget(&self, widget: Arc<WidgetInner>) {
        lock(&self.widgets).push(widget);
    }

    pub(crate) fn unlink_widget(&self, id: InstanceId) {
        lock(&self.widgets).retain(|widget| widget.id != id);
        lock(&self.focus).forget(id);
    }
}

pub(crate) fn create_sheet(
    window: &Arc<WindowInner>,
    name: &str,
    listener: Box<dyn SheetListener>,
) -> Result<Arc<SheetInner>, PaneError> {
    let sheet = Arc::new(SheetInner {
        id: next_instance_id(),
        name: name.to_string(),
        actor: window.actor.clone(),
        display: window.display.clone(),
        initialized: AtomicBool::new(false),
        listener: ListenerSlot::new(listener),
        window: Arc::downgrade(window),
        alive: AtomicBool::new(true),
        widgets: Mutex::new(Vec::new()),
        focus: Mutex::new(FocusState::default()),
    });
    sheet
        .display
        .registry
        .insert(sheet.id, Entry::Sheet(Arc::downgrade(&sheet)));
    window.push_sheet(sheet.clone());
    tracing::debug!(sheet = %sheet.id, name, window = %window.id, "sheet created");

    if let Err(e) = sheet.actor.post_event(sheet.id, Event::Init) {
        let _ = destroy_sheet(&sheet);
        return Err(e);
    }
    Ok(sheet)
}

/// Mark the sheet and its widgets dead, unlink it, then free it now (owning
/// thread or collector) or hand it to the garbage box.
pub(crate) fn destroy_sheet(sheet: &Arc<SheetInner>) -> Result<(), PaneError> {
    if !sheet.kill() {
        return Err(PaneError::InvalidTarget(sheet.id));
    }
    for widget in sheet.widgets() {
        widget.kill();
    }
    if let Some(window) = sheet.window() {
        window.unlink_sheet(sheet.id);
    }

    let garbage = &sheet.display.garbage;
    if sheet.actor.is_current_thread() || garbage.is_collector_thread() {
        free_sheet(sheet);
    } else {
        tracing::trace!(sheet = %sheet.id, "quarantining sheet");
        garbage.quarantine_sheet(sheet.clone());
    }
    Ok(())
}

/// Free the widgets, then the sheet itself.
pub(crate) fn free_sheet(sheet: &Arc<SheetInner>) {
    let widgets = std::mem::take(&mut *lock(&sheet.widgets));
    for widget in &widgets {
        widget.kill();
        widget::free_widget(widget);
    }
    sheet.listener.terminate();
    sheet.display.registry.remove(sheet.id);
    tracing::trace!(sheet = %sheet.id, widgets = widgets.len(), "sheet freed");
}

/// Handle to a sheet. Stale handles fail with [`PaneError::InvalidTarget`].
#[derive(Debug, Clone)]
pub struct Sheet {
    id: InstanceId,
    inner: Weak<SheetInner>,
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sheet {}

impl Sheet {
    pub(crate) fn from_inner(inner: &Arc<SheetInner>) -> Self {
        Self {
            id: inner.id,
            inner: Arc::downgrade(inner),
        }
    }

    pub(crate) fn upgrade(&self) -> Result<Arc<SheetInner>, PaneError> {
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

    pub fn window(&self) -> Option<Window> {
        let window = self.inner.upgrade()?.window()?;
        Some(Window::from_inner(&window))
    }

    pub fn create_widget(
        &self,
        name: &str,
        attributes: WidgetAttributes,
        geometry: Geometry,
        listener: impl WidgetListener + 'static,
    ) -> Result<Widget, PaneError> {
        let inner = self.upgrade()?;
        let widget = widget::create_widget(&inner, name, attributes, geometry, Box::new(listener))?;
        Ok(Widget::from_inner(&widget))
    }

    pub fn widgets(&self) -> Vec<Widget> {
        match self.upgrade() {
            Ok(inner) => inner.widgets().iter().map(Widget::from_inner).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn focus_widget_of(&self, pick: impl FnOnce(&FocusState) -> Option<InstanceId>) -> Option<Widget> {
        let inner = self.upgrade().ok()?;
        let id = pick(&inner.focus_state())?;
        inner.widget(id).map(|widget| Widget::from_inner(&widget))
    }

    /// Widget currently under the pointer.
    pub fn pointer_widget(&self) -> Option<Widget> {
        self.focus_widget_of(|state| state.pointer)
    }

    /// Widget holding keyboard focus.
    pub fn focus_widget(&self) -> Option<Widget> {
        self.focus_widget_of(|state| state.focus)
    }

    pub fn selection_widget(&self) -> Option<Widget> {
        self.focus_widget_of(|state| state.selection)
    }

    /// Mark a widget of this sheet as selected, or clear the selection.
    pub fn set_selection(&self, widget: Option<&Widget>) -> Result<(), PaneError> {
        let inner = self.upgrade()?;
        let id = match widget {
            Some(widget) => {
                let found = inner
                    .widget(widget.id())
                    .ok_or(PaneError::InvalidTarget(widget.id()))?;
                Some(found.id)
            }
            None => None,
        };
        lock(&inner.focus).selection = id;
        Ok(())
    }

    /// Destroy the sheet and its widgets. On the owning thread they are
    /// freed at once; elsewhere they are quarantined until the display
    /// collects garbage.
    pub fn destroy(&self) -> Result<(), PaneError> {
        let inner = self.inner.upgrade().ok_or(PaneError::InvalidTarget(self.id))?;
        destroy_sheet(&inner)
    }

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
    fn test_forget_clears_every_reference() {
        let id = InstanceId(9);
        let mut state = FocusState {
            pointer: Some(id),
            pressed: Some(id),
            focus: Some(id),
            selection: Some(InstanceId(3)),
        };
        state.forget(id);
        assert_eq!(state.pointer, None);
        assert_eq!(state.pressed, None);
        assert_eq!(state.focus, None);
        assert_eq!(state.selection, Some(InstanceId(3)));
    }
}
