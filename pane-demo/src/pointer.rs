//! Synthetic pointer input.

use pane_kernel::api::{ButtonEvent, Event, MouseButton, PointerEvent};
use pane_kernel::{DisplayHandle, EventSource, SourceStatus};

/// Sweeps the pointer across every frame and clicks now and then.
pub struct SyntheticPointer {
    tick: u32,
}

impl SyntheticPointer {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl EventSource for SyntheticPointer {
    fn name(&self) -> &str {
        "synthetic-pointer"
    }

    fn dispatch(&mut self, display: &DisplayHandle) -> anyhow::Result<SourceStatus> {
        self.tick = self.tick.wrapping_add(1);
        let x = (self.tick.wrapping_mul(7) % 320) as i32;
        let y = 200;

        for frame in display.frames() {
            frame.post_event(Event::MousePointer(PointerEvent::motion(x, y)))?;
            if self.tick % 16 == 0 {
                frame.post_event(Event::MouseButton(ButtonEvent::pressed(MouseButton::Left, x, y)))?;
                frame.post_event(Event::MouseButton(ButtonEvent::released(MouseButton::Left, x, y)))?;
            }
        }
        Ok(SourceStatus::Continue)
    }
}
