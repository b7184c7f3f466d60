//! Garbage box: quarantine for sheets and widgets destroyed off-thread.
//!
//! Another thread may still be dispatching to an object when it is
//! destroyed, so the object is marked dead and parked here. The display
//! loop frees the parked objects later, outside any actor thread.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use pane_mailbox::sync::lock;

use crate::sheet::{self, SheetInner};
use crate::widget::{self, WidgetInner};

#[derive(Default)]
struct Quarantine {
    sheets: Vec<Arc<SheetInner>>,
    widgets: Vec<Arc<WidgetInner>>,
}

#[derive(Default)]
pub(crate) struct GarbageBox {
    quarantine: Mutex<Quarantine>,
    collector: Mutex<Option<ThreadId>>,
}

impl GarbageBox {
    pub fn quarantine_sheet(&self, sheet: Arc<SheetInner>) {
        lock(&self.quarantine).sheets.push(sheet);
    }

    pub fn quarantine_widget(&self, widget: Arc<WidgetInner>) {
        lock(&self.quarantine).widgets.push(widget);
    }

    pub fn pending(&self) -> usize {
        let quarantine = lock(&self.quarantine);
        quarantine.sheets.len() + quarantine.widgets.len()
    }

    /// True while the calling thread is inside [`GarbageBox::collect`].
    /// Destroys issued from `terminate` callbacks then free immediately.
    pub fn is_collector_thread(&self) -> bool {
        *lock(&self.collector) == Some(thread::current().id())
    }

    /// Free everything quarantined so far: widgets first, then sheets.
    /// Returns whether anything was freed.
    pub fn collect(&self) -> bool {
        let Quarantine { sheets, widgets } = std::mem::take(&mut *lock(&self.quarantine));
        if sheets.is_empty() && widgets.is_empty() {
            return false;
        }

        *lock(&self.collector) = Some(thread::current().id());
        for widget in &widgets {
            widget::free_widget(widget);
        }
        for sheet in &sheets {
            sheet::free_sheet(sheet);
        }
        *lock(&self.collector) = None;

        tracing::debug!(
            sheets = sheets.len(),
            widgets = widgets.len(),
            "collected quarantined objects"
        );
        true
    }
}
