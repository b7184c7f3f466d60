//! Listener traits and the slot that owns a listener.
//!
//! Every callback is optional and returns `anyhow::Result<()>`. A failing
//! callback is logged by the dispatcher and does not stop the actor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use pane_api::{AxisEvent, ButtonEvent, GestureEvent, Geometry, KeyEvent, PointerEvent, TextInput};
use pane_mailbox::sync::lock;

use crate::event_context::EventContext;
use crate::sheet::Sheet;
use crate::widget::Widget;

/// Callbacks for a window. Runs on the window's team-leader thread.
#[allow(unused_variables)]
pub trait WindowListener: Send {
    fn init(&mut self, cx: &mut EventContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn configure(&mut self, cx: &mut EventContext<'_>, geometry: Geometry) -> anyhow::Result<()> {
        Ok(())
    }

    fn reshape(&mut self, cx: &mut EventContext<'_>, width: i32, height: i32) -> anyhow::Result<()> {
        Ok(())
    }

    fn redraw(&mut self, cx: &mut EventContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, cx: &mut EventContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn timer(&mut self, cx: &mut EventContext<'_>, group: u32, id: u32) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_pointer(&mut self, cx: &mut EventContext<'_>, event: &PointerEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_button(&mut self, cx: &mut EventContext<'_>, event: &ButtonEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_axis(&mut self, cx: &mut EventContext<'_>, event: &AxisEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn gesture(&mut self, cx: &mut EventContext<'_>, event: &GestureEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn user_msg(
        &mut self,
        cx: &mut EventContext<'_>,
        kind: u32,
        payload: Option<&[u8]>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn key(&mut self, cx: &mut EventContext<'_>, event: &KeyEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn key_input(&mut self, cx: &mut EventContext<'_>, input: &TextInput) -> anyhow::Result<()> {
        Ok(())
    }

    fn focus(&mut self, cx: &mut EventContext<'_>, focused: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn end_draw(&mut self, cx: &mut EventContext<'_>, serial: u64) -> anyhow::Result<()> {
        Ok(())
    }

    /// Last callback. Runs exactly once, on the owning thread.
    fn terminate(&mut self) {}
}

/// Callbacks for a sheet. Input arrives after the owning window's callback.
#[allow(unused_variables)]
pub trait SheetListener: Send {
    fn init(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet) -> anyhow::Result<()> {
        Ok(())
    }

    fn reshape(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        width: i32,
        height: i32,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn redraw(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet) -> anyhow::Result<()> {
        Ok(())
    }

    fn timer(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet, group: u32, id: u32) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_pointer(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        event: &PointerEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_button(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        event: &ButtonEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_axis(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        event: &AxisEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn gesture(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        event: &GestureEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A push-action widget on this sheet was activated.
    fn action(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        widget: &Widget,
        action: u32,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn user_msg(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        kind: u32,
        payload: Option<&[u8]>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn key(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet, event: &KeyEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn key_input(
        &mut self,
        cx: &mut EventContext<'_>,
        sheet: &Sheet,
        input: &TextInput,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn focus(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet, focused: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn end_draw(&mut self, cx: &mut EventContext<'_>, sheet: &Sheet, serial: u64) -> anyhow::Result<()> {
        Ok(())
    }

    fn terminate(&mut self) {}
}

/// Callbacks for a widget.
#[allow(unused_variables)]
pub trait WidgetListener: Send {
    fn init(&mut self, cx: &mut EventContext<'_>, widget: &Widget) -> anyhow::Result<()> {
        Ok(())
    }

    fn redraw(&mut self, cx: &mut EventContext<'_>, widget: &Widget) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, cx: &mut EventContext<'_>, widget: &Widget) -> anyhow::Result<()> {
        Ok(())
    }

    fn timer(&mut self, cx: &mut EventContext<'_>, widget: &Widget, group: u32, id: u32) -> anyhow::Result<()> {
        Ok(())
    }

    /// Enter/leave always; motion only with `POINTER_MOTION`.
    fn mouse_pointer(
        &mut self,
        cx: &mut EventContext<'_>,
        widget: &Widget,
        event: &PointerEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_button(
        &mut self,
        cx: &mut EventContext<'_>,
        widget: &Widget,
        event: &ButtonEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn mouse_axis(
        &mut self,
        cx: &mut EventContext<'_>,
        widget: &Widget,
        event: &AxisEvent,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn action(&mut self, cx: &mut EventContext<'_>, widget: &Widget, action: u32) -> anyhow::Result<()> {
        Ok(())
    }

    fn user_msg(
        &mut self,
        cx: &mut EventContext<'_>,
        widget: &Widget,
        kind: u32,
        payload: Option<&[u8]>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn key(&mut self, cx: &mut EventContext<'_>, widget: &Widget, event: &KeyEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn key_input(
        &mut self,
        cx: &mut EventContext<'_>,
        widget: &Widget,
        input: &TextInput,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn focus(&mut self, cx: &mut EventContext<'_>, widget: &Widget, focused: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn terminate(&mut self) {}
}

/// Maps each listener trait object to its `terminate` callback.
pub(crate) trait Terminate {
    fn run_terminate(&mut self);
}

impl Terminate for dyn WindowListener {
    fn run_terminate(&mut self) {
        self.terminate();
    }
}

impl Terminate for dyn SheetListener {
    fn run_terminate(&mut self) {
        self.terminate();
    }
}

impl Terminate for dyn WidgetListener {
    fn run_terminate(&mut self) {
        self.terminate();
    }
}

/// Owns a listener and guarantees `terminate` runs exactly once.
///
/// The listener is checked out of the slot while a callback runs, so the
/// mutex is never held across user code. A nested call for the same
/// object finds the slot empty and is skipped. If the object is terminated
/// while its listener is checked out, `terminate` runs when the callback
/// returns.
pub(crate) struct ListenerSlot<L: ?Sized + Terminate> {
    slot: Mutex<Option<Box<L>>>,
    terminated: AtomicBool,
}

impl<L: ?Sized + Terminate> ListenerSlot<L> {
    pub fn new(listener: Box<L>) -> Self {
        Self {
            slot: Mutex::new(Some(listener)),
            terminated: AtomicBool::new(false),
        }
    }

    /// Run `f` with the listener. `None` if it is checked out or gone.
    pub fn invoke<R>(&self, f: impl FnOnce(&mut L) -> R) -> Option<R> {
        if self.terminated.load(Ordering::Acquire) {
            return None;
        }
        let mut listener = lock(&self.slot).take()?;
        let result = f(&mut *listener);

        let mut slot = lock(&self.slot);
        if self.terminated.load(Ordering::Acquire) {
            drop(slot);
            listener.run_terminate();
        } else {
            *slot = Some(listener);
        }
        Some(result)
    }

    /// Run `terminate` now, or after the in-flight callback returns.
    pub fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        let listener = lock(&self.slot).take();
        if let Some(mut listener) = listener {
            listener.run_terminate();
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}
