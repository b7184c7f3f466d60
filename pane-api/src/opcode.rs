//! The stable message opcode table.
//!
//! These integers are the contract between message producers (input
//! handling, timers, application requests) and the dispatch state
//! machine. Values never change once assigned.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Opcode {
    Init = 1,
    Configure = 2,
    Reshape = 3,
    Redraw = 4,
    Update = 5,
    Timer = 6,
    MousePointer = 7,
    MouseButton = 8,
    MouseAxis = 9,
    Action = 10,
    Gesture = 11,
    UserMsg = 12,
    KeyInput = 13,
    Focus = 14,
    EndDraw = 15,
    Key = 16,
    Terminate = 99,
}

/// An integer that is not part of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown opcode {0}")]
pub struct UnknownOpcode(pub u32);

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Opcode; 17] = [
        Opcode::Init,
        Opcode::Configure,
        Opcode::Reshape,
        Opcode::Redraw,
        Opcode::Update,
        Opcode::Timer,
        Opcode::MousePointer,
        Opcode::MouseButton,
        Opcode::MouseAxis,
        Opcode::Action,
        Opcode::Gesture,
        Opcode::UserMsg,
        Opcode::KeyInput,
        Opcode::Focus,
        Opcode::EndDraw,
        Opcode::Key,
        Opcode::Terminate,
    ];

    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Init => "INIT",
            Opcode::Configure => "CONFIGURE",
            Opcode::Reshape => "RESHAPE",
            Opcode::Redraw => "REDRAW",
            Opcode::Update => "UPDATE",
            Opcode::Timer => "TIMER",
            Opcode::MousePointer => "MOUSE_POINTER",
            Opcode::MouseButton => "MOUSE_BUTTON",
            Opcode::MouseAxis => "MOUSE_AXIS",
            Opcode::Action => "ACTION",
            Opcode::Gesture => "GESTURE",
            Opcode::UserMsg => "USER_MSG",
            Opcode::KeyInput => "KEY_INPUT",
            Opcode::Focus => "FOCUS",
            Opcode::EndDraw => "END_DRAW",
            Opcode::Key => "KEY",
            Opcode::Terminate => "TERMINATE",
        }
    }

    /// Opcodes generated by the core itself. Input sources may not post these.
    pub const fn is_lifecycle(self) -> bool {
        matches!(
            self,
            Opcode::Init
                | Opcode::Configure
                | Opcode::Reshape
                | Opcode::Redraw
                | Opcode::Update
                | Opcode::Timer
                | Opcode::EndDraw
                | Opcode::Terminate
        )
    }
}

impl TryFrom<u32> for Opcode {
    type Error = UnknownOpcode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.as_u32() == value)
            .ok_or(UnknownOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_values_are_stable() {
        assert_eq!(Opcode::Init.as_u32(), 1);
        assert_eq!(Opcode::Configure.as_u32(), 2);
        assert_eq!(Opcode::Reshape.as_u32(), 3);
        assert_eq!(Opcode::Redraw.as_u32(), 4);
        assert_eq!(Opcode::Update.as_u32(), 5);
        assert_eq!(Opcode::Timer.as_u32(), 6);
        assert_eq!(Opcode::MousePointer.as_u32(), 7);
        assert_eq!(Opcode::MouseButton.as_u32(), 8);
        assert_eq!(Opcode::MouseAxis.as_u32(), 9);
        assert_eq!(Opcode::Action.as_u32(), 10);
        assert_eq!(Opcode::Gesture.as_u32(), 11);
        assert_eq!(Opcode::UserMsg.as_u32(), 12);
        assert_eq!(Opcode::KeyInput.as_u32(), 13);
        assert_eq!(Opcode::Focus.as_u32(), 14);
        assert_eq!(Opcode::EndDraw.as_u32(), 15);
        assert_eq!(Opcode::Key.as_u32(), 16);
        assert_eq!(Opcode::Terminate.as_u32(), 99);
    }

    #[test]
    fn test_try_from_known_and_unknown() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.as_u32()), Ok(op));
        }
        assert_eq!(Opcode::try_from(0), Err(UnknownOpcode(0)));
        assert_eq!(Opcode::try_from(17), Err(UnknownOpcode(17)));
        assert_eq!(Opcode::try_from(98), Err(UnknownOpcode(98)));
    }

    #[test]
    fn test_display_uses_wire_names() {
        assert_eq!(Opcode::UserMsg.to_string(), "USER_MSG");
        assert_eq!(Opcode::Terminate.to_string(), "TERMINATE");
    }
}
