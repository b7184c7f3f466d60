//! Per-actor message dispatch.
//!
//! One [`Dispatcher`] runs on each team leader's thread. It resolves the
//! message target, drops stale lifecycle messages by serial or timer
//! epoch, runs the window → sheet → widget callbacks, and presents the
//! frame when a handler asked for it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pane_api::{
    ButtonEvent, ButtonState, Event, InstanceId, Message, Opcode, PointerEvent, PointerKind,
};

use crate::context::RenderContext;
use crate::event_context::EventContext;
use crate::listener::{SheetListener, WidgetListener, WindowListener};
use crate::registry::Resolved;
use crate::sheet::{Sheet, SheetInner};
use crate::stats::{bump, unbump, StatsCounters};
use crate::widget::{Widget, WidgetAttributes, WidgetInner};
use crate::window::{WindowInner, WindowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit,
}

pub(crate) struct Dispatcher {
    leader: Arc<WindowInner>,
    render: Box<dyn RenderContext>,
    current: Option<InstanceId>,
    trace_messages: bool,
}

impl Dispatcher {
    pub fn new(leader: Arc<WindowInner>, render: Box<dyn RenderContext>) -> Self {
        let trace_messages = leader.display.config.trace_messages;
        Self {
            leader,
            render,
            current: None,
            trace_messages,
        }
    }

    fn stats(&self) -> &StatsCounters {
        &self.leader.actor.stats
    }

    pub fn dispatch(&mut self, message: Message) -> Flow {
        let Message { target, event } = message;
        let opcode = event.opcode();
        bump(&self.stats().dispatched);
        if self.trace_messages {
            tracing::debug!(window = %self.leader.name, %target, %opcode, "dispatch");
        }

        if target == self.leader.id && matches!(event, Event::Terminate) {
            return Flow::Exit;
        }

        let Some((resolved, window)) = self.resolve(target) else {
            self.drop_unresolved(target, &event);
            return Flow::Continue;
        };

        if let Event::Terminate = event {
            if let Resolved::Window(child) = &resolved {
                if child.kind == WindowKind::Child {
                    child.teardown();
                }
            }
            return Flow::Continue;
        }

        if !resolved.is_alive() || !window.is_alive() {
            tracing::trace!(%target, %opcode, "target is dead, dropping");
            if matches!(event, Event::UserMsg { .. }) {
                bump(&self.stats().user_msg_dropped);
            }
            return Flow::Continue;
        }

        window.req_swap_buffers.store(false, Ordering::Release);
        self.make_current(&window);

        match event {
            Event::Init => self.on_init(&resolved, &window),
            Event::Configure { serial, geometry } => {
                if let Resolved::Window(w) = &resolved {
                    if !self.is_stale(&w.configure_serial, serial, opcode) {
                        let previous = w.set_geometry(geometry);
                        self.call_window(w, opcode, |l, cx| l.configure(cx, geometry));
                        if !previous.same_size(&geometry) {
                            self.resize(w, geometry.width, geometry.height);
                        }
                    }
                }
            }
            Event::Reshape { serial, width, height } => {
                if let Resolved::Window(w) = &resolved {
                    if !self.is_stale(&w.configure_serial, serial, opcode) {
                        let previous = w.geometry();
                        w.set_geometry(previous.resized(width, height));
                        self.resize(w, width, height);
                    }
                }
            }
            Event::Redraw { serial } => self.on_draw(&resolved, serial, true),
            Event::Update { serial } => self.on_draw(&resolved, serial, false),
            Event::Timer { group, id, epoch } => self.on_timer(&resolved, &window, group, id, epoch),
            Event::MousePointer(event) => self.on_pointer(&resolved, &window, &event),
            Event::MouseButton(event) => self.on_button(&resolved, &window, &event),
            Event::MouseAxis(event) => match &resolved {
                Resolved::Window(w) => {
                    self.call_window(w, opcode, |l, cx| l.mouse_axis(cx, &event));
                    if let Some(sheet) = w.active_sheet() {
                        self.route_axis(&window, &sheet, &event);
                    }
                }
                Resolved::Sheet(sheet) => self.route_axis(&window, sheet, &event),
                Resolved::Widget(widget) => {
                    self.call_widget(&window, widget, opcode, |l, cx, h| l.mouse_axis(cx, h, &event))
                }
            },
            Event::Gesture(event) => match &resolved {
                Resolved::Window(w) => {
                    self.call_window(w, opcode, |l, cx| l.gesture(cx, &event));
                    if let Some(sheet) = w.active_sheet() {
                        self.call_sheet(&window, &sheet, opcode, |l, cx, s| l.gesture(cx, s, &event));
                    }
                }
                Resolved::Sheet(sheet) => {
                    self.call_sheet(&window, sheet, opcode, |l, cx, s| l.gesture(cx, s, &event))
                }
                Resolved::Widget(_) => {}
            },
            Event::Action { widget, action } => self.on_action(&window, widget, action),
            Event::UserMsg { kind, payload } => {
                // Counted up front; moved to dropped if the callback never ran.
                bump(&self.stats().user_msg_handled);
                let payload = payload.as_deref();
                let delivered = match &resolved {
                    Resolved::Window(w) => {
                        self.invoke_window(w, opcode, |l, cx| l.user_msg(cx, kind, payload))
                    }
                    Resolved::Sheet(sheet) => self.invoke_sheet(&window, sheet, opcode, |l, cx, s| {
                        l.user_msg(cx, s, kind, payload)
                    }),
                    Resolved::Widget(widget) => self.invoke_widget(&window, widget, opcode, |l, cx, h| {
                        l.user_msg(cx, h, kind, payload)
                    }),
                };
                if !delivered {
                    unbump(&self.stats().user_msg_handled);
                    bump(&self.stats().user_msg_dropped);
                }
            }
            Event::Key(event) => {
                let sheet = self.input_sheet(&resolved, |this, w| {
                    this.call_window(w, opcode, |l, cx| l.key(cx, &event))
                });
                if let Some(sheet) = sheet {
                    self.call_sheet(&window, &sheet, opcode, |l, cx, s| l.key(cx, s, &event));
                    if let Some(focus) = focused_widget(&sheet) {
                        self.call_widget(&window, &focus, opcode, |l, cx, h| l.key(cx, h, &event));
                    }
                } else if let Resolved::Widget(widget) = &resolved {
                    self.call_widget(&window, widget, opcode, |l, cx, h| l.key(cx, h, &event));
                }
            }
            Event::KeyInput(input) => {
                let sheet = self.input_sheet(&resolved, |this, w| {
                    this.call_window(w, opcode, |l, cx| l.key_input(cx, &input))
                });
                if let Some(sheet) = sheet {
                    self.call_sheet(&window, &sheet, opcode, |l, cx, s| l.key_input(cx, s, &input));
                    let focus = focused_widget(&sheet)
                        .filter(|widget| widget.attributes.contains(WidgetAttributes::TEXT_INPUT));
                    if let Some(focus) = focus {
                        self.call_widget(&window, &focus, opcode, |l, cx, h| l.key_input(cx, h, &input));
                    }
                } else if let Resolved::Widget(widget) = &resolved {
                    self.call_widget(&window, widget, opcode, |l, cx, h| l.key_input(cx, h, &input));
                }
            }
            Event::Focus { focused } => match &resolved {
                Resolved::Window(w) => {
                    self.call_window(w, opcode, |l, cx| l.focus(cx, focused));
                    if let Some(sheet) = w.active_sheet() {
                        self.call_sheet(&window, &sheet, opcode, |l, cx, s| l.focus(cx, s, focused));
                    }
                }
                Resolved::Sheet(sheet) => {
                    self.call_sheet(&window, sheet, opcode, |l, cx, s| l.focus(cx, s, focused))
                }
                Resolved::Widget(widget) => {
                    self.call_widget(&window, widget, opcode, |l, cx, h| l.focus(cx, h, focused))
                }
            },
            Event::EndDraw { serial } => {
                if let Resolved::Window(w) = &resolved {
                    self.call_window(w, opcode, |l, cx| l.end_draw(cx, serial));
                    if let Some(sheet) = w.active_sheet() {
                        self.call_sheet(&window, &sheet, opcode, |l, cx, s| l.end_draw(cx, s, serial));
                    }
                }
            }
            Event::Terminate => {}
        }

        self.present(&window);
        Flow::Continue
    }

    /// Resolve `target` to a live registry entry belonging to this team.
    fn resolve(&self, target: InstanceId) -> Option<(Resolved, Arc<WindowInner>)> {
        let resolved = self.leader.display.registry.resolve(target)?;
        let window = resolved.window()?;
        if !Arc::ptr_eq(&window.actor, &self.leader.actor) {
            tracing::warn!(window = %self.leader.name, %target, "message for another team");
            return None;
        }
        Some((resolved, window))
    }

    fn drop_unresolved(&self, target: InstanceId, event: &Event) {
        match event {
            // A child torn down before its TERMINATE arrived.
            Event::Terminate => return,
            Event::UserMsg { .. } => bump(&self.stats().user_msg_dropped),
            _ => {}
        }
        bump(&self.stats().invalid_target);
        tracing::debug!(
            window = %self.leader.name,
            %target,
            opcode = %event.opcode(),
            "no live target, dropping"
        );
    }

    fn is_stale(&self, latest: &AtomicU64, carried: u64, opcode: Opcode) -> bool {
        let latest = latest.load(Ordering::Acquire);
        if latest > carried {
            bump(&self.stats().stale_dropped);
            tracing::trace!(%opcode, carried, latest, "dropping stale request");
            return true;
        }
        false
    }

    fn make_current(&mut self, window: &WindowInner) {
        if self.current == Some(window.id) {
            return;
        }
        match self.render.make_current(window.id) {
            Ok(()) => self.current = Some(window.id),
            Err(e) => tracing::warn!(window = %window.name, "make_current failed: {:#}", e),
        }
    }

    fn present(&mut self, window: &Arc<WindowInner>) {
        if !window.req_swap_buffers.swap(false, Ordering::AcqRel) || !window.is_alive() {
            return;
        }
        if let Err(e) = self.render.swap_buffers(window.id) {
            tracing::warn!(window = %window.name, "swap_buffers failed: {:#}", e);
            return;
        }
        bump(&self.stats().frames_presented);

        let serial = window.draw_serial.load(Ordering::Acquire);
        let end = Message::new(window.id, Event::EndDraw { serial });
        if let Err(e) = window.actor.mailbox.try_send(end) {
            tracing::debug!(window = %window.name, "END_DRAW not queued: {}", e);
        }
    }

    /// Count and log a failed callback. Returns whether the callback ran.
    fn report(&self, name: &str, opcode: Opcode, result: Option<anyhow::Result<()>>) -> bool {
        match result {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                bump(&self.stats().handler_errors);
                tracing::warn!(target_name = name, %opcode, "handler failed: {:#}", e);
                true
            }
            None => false,
        }
    }

    fn call_window<F>(&mut self, window: &Arc<WindowInner>, opcode: Opcode, f: F)
    where
        F: FnOnce(&mut dyn WindowListener, &mut EventContext<'_>) -> anyhow::Result<()>,
    {
        self.invoke_window(window, opcode, f);
    }

    /// Returns whether the callback ran. It is skipped for a dead window
    /// or a listener that is already checked out.
    fn invoke_window<F>(&mut self, window: &Arc<WindowInner>, opcode: Opcode, f: F) -> bool
    where
        F: FnOnce(&mut dyn WindowListener, &mut EventContext<'_>) -> anyhow::Result<()>,
    {
        if !window.is_alive() {
            return false;
        }
        let mut cx = EventContext::new(window, self.render.as_mut());
        let result = window.listener.invoke(|listener| f(listener, &mut cx));
        self.report(&window.name, opcode, result)
    }

    fn call_sheet<F>(&mut self, window: &Arc<WindowInner>, sheet: &Arc<SheetInner>, opcode: Opcode, f: F)
    where
        F: FnOnce(&mut dyn SheetListener, &mut EventContext<'_>, &Sheet) -> anyhow::Result<()>,
    {
        self.invoke_sheet(window, sheet, opcode, f);
    }

    fn invoke_sheet<F>(
        &mut self,
        window: &Arc<WindowInner>,
        sheet: &Arc<SheetInner>,
        opcode: Opcode,
        f: F,
    ) -> bool
    where
        F: FnOnce(&mut dyn SheetListener, &mut EventContext<'_>, &Sheet) -> anyhow::Result<()>,
    {
        if !sheet.is_alive() {
            return false;
        }
        let handle = Sheet::from_inner(sheet);
        let mut cx = EventContext::new(window, self.render.as_mut());
        let result = sheet.listener.invoke(|listener| f(listener, &mut cx, &handle));
        self.report(&sheet.name, opcode, result)
    }

    fn call_widget<F>(
        &mut self,
        window: &Arc<WindowInner>,
        widget: &Arc<WidgetInner>,
        opcode: Opcode,
        f: F,
    ) where
        F: FnOnce(&mut dyn WidgetListener, &mut EventContext<'_>, &Widget) -> anyhow::Result<()>,
    {
        self.invoke_widget(window, widget, opcode, f);
    }

    fn invoke_widget<F>(
        &mut self,
        window: &Arc<WindowInner>,
        widget: &Arc<WidgetInner>,
        opcode: Opcode,
        f: F,
    ) -> bool
    where
        F: FnOnce(&mut dyn WidgetListener, &mut EventContext<'_>, &Widget) -> anyhow::Result<()>,
    {
        if !widget.is_alive() {
            return false;
        }
        let handle = Widget::from_inner(widget);
        let mut cx = EventContext::new(window, self.render.as_mut());
        let result = widget.listener.invoke(|listener| f(listener, &mut cx, &handle));
        self.report(&widget.name, opcode, result)
    }

    /// Run the window callback when the target is a window and return the
    /// sheet that should see the event next.
    fn input_sheet(
        &mut self,
        resolved: &Resolved,
        on_window: impl FnOnce(&mut Self, &Arc<WindowInner>),
    ) -> Option<Arc<SheetInner>> {
        match resolved {
            Resolved::Window(w) => {
                on_window(self, w);
                w.active_sheet()
            }
            Resolved::Sheet(sheet) => Some(sheet.clone()),
            Resolved::Widget(_) => None,
        }
    }

    fn on_init(&mut self, resolved: &Resolved, window: &Arc<WindowInner>) {
        match resolved {
            Resolved::Window(w) => {
                if !w.initialized.swap(true, Ordering::AcqRel) {
                    self.call_window(w, Opcode::Init, |l, cx| l.init(cx));
                }
            }
            Resolved::Sheet(sheet) => {
                if !sheet.initialized.swap(true, Ordering::AcqRel) {
                    self.call_sheet(window, sheet, Opcode::Init, |l, cx, s| l.init(cx, s));
                }
            }
            Resolved::Widget(widget) => {
                if !widget.initialized.swap(true, Ordering::AcqRel) {
                    self.call_widget(window, widget, Opcode::Init, |l, cx, h| l.init(cx, h));
                }
            }
        }
    }

    fn resize(&mut self, window: &Arc<WindowInner>, width: i32, height: i32) {
        if let Err(e) = self.render.resize(window.id, width, height) {
            tracing::warn!(window = %window.name, "resize failed: {:#}", e);
        }
        self.call_window(window, Opcode::Reshape, |l, cx| l.reshape(cx, width, height));
        if let Some(sheet) = window.active_sheet() {
            self.call_sheet(window, &sheet, Opcode::Reshape, |l, cx, s| {
                l.reshape(cx, s, width, height)
            });
        }
    }

    /// `REDRAW` (full) always presents; `UPDATE` presents only if a handler
    /// requested it.
    fn on_draw(&mut self, resolved: &Resolved, serial: u64, full: bool) {
        let Resolved::Window(window) = resolved else {
            return;
        };
        let opcode = if full { Opcode::Redraw } else { Opcode::Update };
        if self.is_stale(&window.draw_serial, serial, opcode) {
            return;
        }

        if full {
            self.call_window(window, opcode, |l, cx| l.redraw(cx));
        } else {
            self.call_window(window, opcode, |l, cx| l.update(cx));
        }
        if let Some(sheet) = window.active_sheet() {
            if full {
                self.call_sheet(window, &sheet, opcode, |l, cx, s| l.redraw(cx, s));
            } else {
                self.call_sheet(window, &sheet, opcode, |l, cx, s| l.update(cx, s));
            }
            for widget in sheet.widgets() {
                if full {
                    self.call_widget(window, &widget, opcode, |l, cx, h| l.redraw(cx, h));
                } else {
                    self.call_widget(window, &widget, opcode, |l, cx, h| l.update(cx, h));
                }
            }
        }
        if full {
            window.req_swap_buffers.store(true, Ordering::Release);
        }
    }

    fn on_timer(
        &mut self,
        resolved: &Resolved,
        window: &Arc<WindowInner>,
        group: u32,
        id: u32,
        epoch: u64,
    ) {
        if !self.leader.display.timers.check(self.leader.actor.leader, id, epoch) {
            bump(&self.stats().stale_dropped);
            tracing::trace!(id, epoch, "dropping timer fire from an old request");
            return;
        }
        match resolved {
            Resolved::Window(w) => self.call_window(w, Opcode::Timer, |l, cx| l.timer(cx, group, id)),
            Resolved::Sheet(sheet) => {
                self.call_sheet(window, sheet, Opcode::Timer, |l, cx, s| l.timer(cx, s, group, id))
            }
            Resolved::Widget(widget) => {
                self.call_widget(window, widget, Opcode::Timer, |l, cx, h| l.timer(cx, h, group, id))
            }
        }
    }

    fn on_pointer(&mut self, resolved: &Resolved, window: &Arc<WindowInner>, event: &PointerEvent) {
        let opcode = Opcode::MousePointer;
        match resolved {
            Resolved::Window(w) => {
                self.call_window(w, opcode, |l, cx| l.mouse_pointer(cx, event));
                if let Some(sheet) = w.active_sheet() {
                    self.route_pointer(window, &sheet, event);
                }
            }
            Resolved::Sheet(sheet) => self.route_pointer(window, sheet, event),
            Resolved::Widget(widget) => {
                self.call_widget(window, widget, opcode, |l, cx, h| l.mouse_pointer(cx, h, event))
            }
        }
    }

    /// Enter/leave tracking for the widget under the pointer. Motion goes
    /// to the hovered widget only if it asked for it.
    fn route_pointer(&mut self, window: &Arc<WindowInner>, sheet: &Arc<SheetInner>, event: &PointerEvent) {
        let opcode = Opcode::MousePointer;
        self.call_sheet(window, sheet, opcode, |l, cx, s| l.mouse_pointer(cx, s, event));

        let hit = match event.kind {
            PointerKind::Leave => None,
            PointerKind::Enter | PointerKind::Motion => sheet.widget_at(event.x, event.y),
        };
        let hit_id = hit.as_ref().map(|widget| widget.id);
        let previous = sheet.swap_pointer(hit_id);

        if previous != hit_id {
            if let Some(old) = previous.and_then(|id| sheet.widget(id)) {
                let leave = PointerEvent::leave();
                self.call_widget(window, &old, opcode, |l, cx, h| l.mouse_pointer(cx, h, &leave));
            }
            if let Some(new) = &hit {
                let enter = PointerEvent::enter(event.x, event.y);
                self.call_widget(window, new, opcode, |l, cx, h| l.mouse_pointer(cx, h, &enter));
                if new.attributes.contains(WidgetAttributes::FOCUS_ON_HOVER) {
                    self.move_focus(window, sheet, Some(new.clone()));
                }
            }
        } else if let Some(widget) = &hit {
            if event.kind == PointerKind::Motion
                && widget.attributes.contains(WidgetAttributes::POINTER_MOTION)
            {
                self.call_widget(window, widget, opcode, |l, cx, h| l.mouse_pointer(cx, h, event));
            }
        }
    }

    fn move_focus(&mut self, window: &Arc<WindowInner>, sheet: &Arc<SheetInner>, next: Option<Arc<WidgetInner>>) {
        let next_id = next.as_ref().map(|widget| widget.id);
        let previous = sheet.swap_focus(next_id);
        if previous == next_id {
            return;
        }
        if let Some(old) = previous.and_then(|id| sheet.widget(id)) {
            self.call_widget(window, &old, Opcode::Focus, |l, cx, h| l.focus(cx, h, false));
        }
        if let Some(new) = &next {
            self.call_widget(window, new, Opcode::Focus, |l, cx, h| l.focus(cx, h, true));
        }
    }

    fn on_button(&mut self, resolved: &Resolved, window: &Arc<WindowInner>, event: &ButtonEvent) {
        let opcode = Opcode::MouseButton;
        match resolved {
            Resolved::Window(w) => {
                self.call_window(w, opcode, |l, cx| l.mouse_button(cx, event));
                if let Some(sheet) = w.active_sheet() {
                    self.route_button(window, &sheet, event);
                }
            }
            Resolved::Sheet(sheet) => self.route_button(window, sheet, event),
            Resolved::Widget(widget) => {
                self.call_widget(window, widget, opcode, |l, cx, h| l.mouse_button(cx, h, event))
            }
        }
    }

    /// Press picks the widget under the pointer and focuses it; release goes
    /// to the pressed widget and, for push-action widgets released inside
    /// their bounds, queues an `ACTION`.
    fn route_button(&mut self, window: &Arc<WindowInner>, sheet: &Arc<SheetInner>, event: &ButtonEvent) {
        let opcode = Opcode::MouseButton;
        self.call_sheet(window, sheet, opcode, |l, cx, s| l.mouse_button(cx, s, event));

        match event.state {
            ButtonState::Pressed => {
                let hit = sheet.widget_at(event.x, event.y);
                sheet.set_pressed(hit.as_ref().map(|widget| widget.id));
                if let Some(widget) = hit {
                    self.call_widget(window, &widget, opcode, |l, cx, h| l.mouse_button(cx, h, event));
                    self.move_focus(window, sheet, Some(widget));
                }
            }
            ButtonState::Released => {
                let Some(widget) = sheet.take_pressed().and_then(|id| sheet.widget(id)) else {
                    return;
                };
                self.call_widget(window, &widget, opcode, |l, cx, h| l.mouse_button(cx, h, event));
                if widget.attributes.contains(WidgetAttributes::PUSH_ACTION)
                    && widget.hit(event.x, event.y)
                {
                    let action = Event::Action {
                        widget: widget.id,
                        action: widget.action(),
                    };
                    if let Err(e) = window.actor.mailbox.try_send(Message::new(sheet.id, action)) {
                        tracing::debug!(widget = %widget.name, "ACTION not queued: {}", e);
                    }
                }
            }
        }
    }

    fn route_axis(&mut self, window: &Arc<WindowInner>, sheet: &Arc<SheetInner>, event: &pane_api::AxisEvent) {
        let opcode = Opcode::MouseAxis;
        self.call_sheet(window, sheet, opcode, |l, cx, s| l.mouse_axis(cx, s, event));
        let hovered = sheet.focus_state().pointer.and_then(|id| sheet.widget(id));
        if let Some(widget) = hovered {
            self.call_widget(window, &widget, opcode, |l, cx, h| l.mouse_axis(cx, h, event));
        }
    }

    /// Widget callback first, then the owning sheet's.
    fn on_action(&mut self, window: &Arc<WindowInner>, widget: InstanceId, action: u32) {
        let Some(Resolved::Widget(widget)) = self.leader.display.registry.resolve(widget) else {
            tracing::debug!(%widget, "ACTION for a widget that is gone");
            return;
        };
        self.call_widget(window, &widget, Opcode::Action, |l, cx, h| l.action(cx, h, action));
        if let Some(sheet) = widget.sheet() {
            let handle = Widget::from_inner(&widget);
            self.call_sheet(window, &sheet, Opcode::Action, |l, cx, s| {
                l.action(cx, s, &handle, action)
            });
        }
    }

    /// Release everything the actor owns. Runs once, on the actor thread,
    /// after the loop exits.
    pub fn shutdown(mut self) {
        let leader = self.leader.clone();
        let mailbox = &leader.actor.mailbox;

        if let Err(e) = mailbox.stop() {
            tracing::warn!(window = %leader.name, "failed to stop mailbox: {}", e);
        }
        let pending = mailbox.drain().unwrap_or_default();
        let dropped_user = pending
            .iter()
            .filter(|message| matches!(message.event, Event::UserMsg { .. }))
            .count() as u64;
        self.stats()
            .user_msg_dropped
            .fetch_add(dropped_user, Ordering::Relaxed);
        if !pending.is_empty() {
            tracing::debug!(window = %leader.name, pending = pending.len(), "discarding queued messages");
        }
        drop(pending);

        leader.teardown();
        let timers = leader.display.timers.remove_owner(leader.id);
        self.render.release();
        self.current = None;

        if let Err(e) = mailbox.destroy() {
            tracing::warn!(window = %leader.name, "failed to destroy mailbox: {}", e);
        }
        tracing::info!(window = %leader.name, timers, "window actor stopped");
    }
}

fn focused_widget(sheet: &SheetInner) -> Option<Arc<WidgetInner>> {
    sheet.focus_state().focus.and_then(|id| sheet.widget(id))
}
