//! Per-callback context handed to listeners.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pane_api::Geometry;

use crate::context::RenderContext;
use crate::display::DisplayHandle;
use crate::window::{Window, WindowInner};

/// What a listener callback can reach while it runs on the actor thread.
pub struct EventContext<'a> {
    window: Window,
    inner: &'a Arc<WindowInner>,
    render: &'a mut (dyn RenderContext + 'static),
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(inner: &'a Arc<WindowInner>, render: &'a mut (dyn RenderContext + 'static)) -> Self {
        Self {
            window: Window::from_inner(inner),
            inner,
            render,
        }
    }

    /// The window the event was delivered to (or the window owning the
    /// target sheet/widget).
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn geometry(&self) -> Geometry {
        self.inner.geometry()
    }

    /// The team leader's rendering context, already current for this window.
    pub fn render(&mut self) -> &mut (dyn RenderContext + 'static) {
        &mut *self.render
    }

    /// Present this window once the current dispatch returns.
    pub fn request_swap_buffers(&mut self) {
        self.inner.req_swap_buffers.store(true, Ordering::Release);
    }

    pub fn swap_requested(&self) -> bool {
        self.inner.req_swap_buffers.load(Ordering::Acquire)
    }

    pub fn display(&self) -> DisplayHandle {
        DisplayHandle::from_inner(&self.inner.display)
    }
}
