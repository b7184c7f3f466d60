//! Input event payloads delivered by the protocol transport.

use serde::{Deserialize, Serialize};

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Enter,
    Leave,
    Motion,
}

/// Pointer position update, in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: i32,
    pub y: i32,
}

impl PointerEvent {
    pub fn motion(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::Motion,
            x,
            y,
        }
    }

    pub fn enter(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::Enter,
            x,
            y,
        }
    }

    pub fn leave() -> Self {
        Self {
            kind: PointerKind::Leave,
            x: 0,
            y: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub button: MouseButton,
    pub state: ButtonState,
    pub x: i32,
    pub y: i32,
}

impl ButtonEvent {
    pub fn pressed(button: MouseButton, x: i32, y: i32) -> Self {
        Self {
            button,
            state: ButtonState::Pressed,
            x,
            y,
        }
    }

    pub fn released(button: MouseButton, x: i32, y: i32) -> Self {
        Self {
            button,
            state: ButtonState::Released,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Scroll wheel or trackpad axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisEvent {
    pub axis: Axis,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    Swipe,
    Pinch,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GesturePhase {
    Begin,
    Update,
    End,
    Cancel,
}

/// Touchpad gesture step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub phase: GesturePhase,
    pub fingers: u32,
    pub dx: f64,
    pub dy: f64,
    /// Pinch scale relative to gesture start; 1.0 for other kinds.
    pub scale: f64,
}

/// Keyboard modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

/// Raw key event (before any input-method composition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Keysym as reported by the keymap.
    pub keysym: u32,
    /// Hardware scancode.
    pub code: u32,
    pub state: KeyState,
    pub modifiers: Modifiers,
}

/// Text produced by an input method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextInput {
    /// Final text to insert.
    Commit(String),
    /// In-progress composition, with cursor offset in bytes.
    Preedit { text: String, cursor: usize },
    /// Delete text around the cursor.
    DeleteSurrounding { before: usize, after: usize },
}
