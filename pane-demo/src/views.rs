//! Listeners used by the demo.

use std::time::Duration;

use pane_kernel::api::Geometry;
use pane_kernel::{
    EventContext, Sheet, SheetListener, TimerKind, Widget, WidgetListener, WindowListener,
};

const REDRAW_TIMER: u32 = 1;

/// Redraws on a repeating timer and counts presented frames.
pub struct FrameView {
    interval: Duration,
    redraws: u64,
}

impl FrameView {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            redraws: 0,
        }
    }
}

impl WindowListener for FrameView {
    fn init(&mut self, cx: &mut EventContext<'_>) -> anyhow::Result<()> {
        let window = cx.window();
        window.create_timer(0, REDRAW_TIMER, TimerKind::Repeat, self.interval)?;
        window.start_timer(REDRAW_TIMER)?;
        Ok(())
    }

    fn configure(&mut self, cx: &mut EventContext<'_>, geometry: Geometry) -> anyhow::Result<()> {
        tracing::debug!(window = %cx.window().id(), ?geometry, "configured");
        Ok(())
    }

    fn timer(&mut self, cx: &mut EventContext<'_>, _group: u32, id: u32) -> anyhow::Result<()> {
        if id == REDRAW_TIMER {
            cx.window().request_redraw()?;
        }
        Ok(())
    }

    fn redraw(&mut self, _cx: &mut EventContext<'_>) -> anyhow::Result<()> {
        self.redraws += 1;
        Ok(())
    }

    fn terminate(&mut self) {
        tracing::info!(redraws = self.redraws, "frame view closed");
    }
}

#[derive(Default)]
pub struct PanelView {
    actions: Vec<u32>,
}

impl SheetListener for PanelView {
    fn action(
        &mut self,
        _cx: &mut EventContext<'_>,
        _sheet: &Sheet,
        widget: &Widget,
        action: u32,
    ) -> anyhow::Result<()> {
        tracing::info!(widget = ?widget.name(), action, "button pressed");
        self.actions.push(action);
        Ok(())
    }

    fn terminate(&mut self) {
        tracing::debug!(actions = ?self.actions, "panel closed");
    }
}

pub struct ButtonView;

impl WidgetListener for ButtonView {
    fn focus(&mut self, cx: &mut EventContext<'_>, widget: &Widget, focused: bool) -> anyhow::Result<()> {
        tracing::trace!(widget = ?widget.name(), focused, "focus changed");
        cx.request_swap_buffers();
        Ok(())
    }
}
