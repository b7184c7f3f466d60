//! Instance-id registry.
//!
//! Messages carry ids, never references. The dispatcher resolves the id
//! here; an id whose object is gone resolves to nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use pane_api::InstanceId;
use pane_mailbox::sync::lock;

use crate::sheet::{Sheet, SheetInner};
use crate::widget::{Widget, WidgetInner};
use crate::window::{Window, WindowInner};

pub(crate) enum Entry {
    Window(Weak<WindowInner>),
    Sheet(Weak<SheetInner>),
    Widget(Weak<WidgetInner>),
}

/// A registry hit, upgraded.
pub(crate) enum Resolved {
    Window(Arc<WindowInner>),
    Sheet(Arc<SheetInner>),
    Widget(Arc<WidgetInner>),
}

impl Resolved {
    /// The window whose surface the object draws into.
    pub fn window(&self) -> Option<Arc<WindowInner>> {
        match self {
            Resolved::Window(window) => Some(window.clone()),
            Resolved::Sheet(sheet) => sheet.window(),
            Resolved::Widget(widget) => widget.sheet().and_then(|sheet| sheet.window()),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Resolved::Window(window) => window.is_alive(),
            Resolved::Sheet(sheet) => sheet.is_alive(),
            Resolved::Widget(widget) => widget.is_alive(),
        }
    }
}

/// Public handle for any addressable object.
#[derive(Debug, Clone)]
pub enum Handle {
    Window(Window),
    Sheet(Sheet),
    Widget(Widget),
}

impl Handle {
    pub fn id(&self) -> InstanceId {
        match self {
            Handle::Window(window) => window.id(),
            Handle::Sheet(sheet) => sheet.id(),
            Handle::Widget(widget) => widget.id(),
        }
    }
}

impl From<&Resolved> for Handle {
    fn from(resolved: &Resolved) -> Self {
        match resolved {
            Resolved::Window(window) => Handle::Window(Window::from_inner(window)),
            Resolved::Sheet(sheet) => Handle::Sheet(Sheet::from_inner(sheet)),
            Resolved::Widget(widget) => Handle::Widget(Widget::from_inner(widget)),
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: Mutex<HashMap<InstanceId, Entry>>,
}

impl Registry {
    pub fn insert(&self, id: InstanceId, entry: Entry) {
        lock(&self.entries).insert(id, entry);
    }

    pub fn remove(&self, id: InstanceId) {
        lock(&self.entries).remove(&id);
    }

    pub fn resolve(&self, id: InstanceId) -> Option<Resolved> {
        let entries = lock(&self.entries);
        match entries.get(&id)? {
            Entry::Window(weak) => weak.upgrade().map(Resolved::Window),
            Entry::Sheet(weak) => weak.upgrade().map(Resolved::Sheet),
            Entry::Widget(weak) => weak.upgrade().map(Resolved::Widget),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}
