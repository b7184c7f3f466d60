//! Messages carried by a window's mailbox.

use serde::{Deserialize, Serialize};

use crate::{
    AxisEvent, ButtonEvent, Geometry, GestureEvent, InstanceId, KeyEvent, Opcode, PointerEvent,
    TextInput,
};

/// Typed payload for each opcode.
///
/// Heap-owned payloads (`UserMsg` bytes, `KeyInput` text) move with the
/// message; the receiver owns them once the message is taken off the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Init,

    /// New geometry from the compositor or the application.
    Configure {
        serial: u64,
        geometry: Geometry,
    },

    /// Size change request.
    Reshape {
        serial: u64,
        width: i32,
        height: i32,
    },

    /// Full redraw; always presents.
    Redraw {
        serial: u64,
    },

    /// Incremental update; presents only if something drew.
    Update {
        serial: u64,
    },

    Timer {
        group: u32,
        id: u32,
        /// Request epoch of the timer when this fire was generated.
        epoch: u64,
    },

    MousePointer(PointerEvent),
    MouseButton(ButtonEvent),
    MouseAxis(AxisEvent),

    /// A push-action widget was activated.
    Action {
        widget: InstanceId,
        action: u32,
    },

    Gesture(GestureEvent),

    UserMsg {
        kind: u32,
        payload: Option<Vec<u8>>,
    },

    KeyInput(TextInput),

    /// Keyboard focus entered or left the window.
    Focus {
        focused: bool,
    },

    /// The frame presented at `serial` is on screen.
    EndDraw {
        serial: u64,
    },

    Key(KeyEvent),

    Terminate,
}

impl Event {
    pub fn opcode(&self) -> Opcode {
        match self {
            Event::Init => Opcode::Init,
            Event::Configure { .. } => Opcode::Configure,
            Event::Reshape { .. } => Opcode::Reshape,
            Event::Redraw { .. } => Opcode::Redraw,
            Event::Update { .. } => Opcode::Update,
            Event::Timer { .. } => Opcode::Timer,
            Event::MousePointer(_) => Opcode::MousePointer,
            Event::MouseButton(_) => Opcode::MouseButton,
            Event::MouseAxis(_) => Opcode::MouseAxis,
            Event::Action { .. } => Opcode::Action,
            Event::Gesture(_) => Opcode::Gesture,
            Event::UserMsg { .. } => Opcode::UserMsg,
            Event::KeyInput(_) => Opcode::KeyInput,
            Event::Focus { .. } => Opcode::Focus,
            Event::EndDraw { .. } => Opcode::EndDraw,
            Event::Key(_) => Opcode::Key,
            Event::Terminate => Opcode::Terminate,
        }
    }

    /// Whether the payload owns a heap blob.
    pub fn owns_blob(&self) -> bool {
        match self {
            Event::UserMsg { payload, .. } => payload.is_some(),
            Event::KeyInput(_) => true,
            _ => false,
        }
    }
}

/// A message addressed to one object.
///
/// `target` names the window, sheet or widget the event is for; the
/// mailbox it travels through belongs to that object's team leader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub target: InstanceId,
    pub event: Event,
}

impl Message {
    pub fn new(target: InstanceId, event: Event) -> Self {
        Self { target, event }
    }

    pub fn opcode(&self) -> Opcode {
        self.event.opcode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ButtonState, MouseButton};

    #[test]
    fn test_opcode_mapping() {
        let target = InstanceId(7);
        let msg = Message::new(target, Event::Reshape { serial: 3, width: 10, height: 20 });
        assert_eq!(msg.opcode(), Opcode::Reshape);

        let button = ButtonEvent::pressed(MouseButton::Left, 1, 2);
        assert_eq!(button.state, ButtonState::Pressed);
        assert_eq!(Event::MouseButton(button).opcode(), Opcode::MouseButton);
        assert_eq!(Event::Terminate.opcode(), Opcode::Terminate);
        assert_eq!(Event::EndDraw { serial: 1 }.opcode(), Opcode::EndDraw);
    }

    #[test]
    fn test_blob_ownership() {
        let with_blob = Event::UserMsg {
            kind: 1,
            payload: Some(vec![1, 2, 3]),
        };
        let without = Event::UserMsg {
            kind: 1,
            payload: None,
        };
        assert!(with_blob.owns_blob());
        assert!(!without.owns_blob());
        assert!(Event::KeyInput(TextInput::Commit("a".into())).owns_blob());
        assert!(!Event::Init.owns_blob());
    }

    #[test]
    fn test_message_serializes() {
        let msg = Message::new(
            InstanceId(42),
            Event::Timer {
                group: 1,
                id: 2,
                epoch: 3,
            },
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
