//! Control-key-state mask codec.
//!
//! The console reports the state of every modifier and lock key as a packed
//! `u32` (`dwControlKeyState`).  Nine bits are defined; everything above
//! `0x0100` is ignored on decode and never produced on encode.
//!
//! | bit      | flag         |
//! |----------|--------------|
//! | `0x0001` | right Alt    |
//! | `0x0002` | left Alt     |
//! | `0x0004` | right Ctrl   |
//! | `0x0008` | left Ctrl    |
//! | `0x0010` | Shift        |
//! | `0x0020` | Num Lock     |
//! | `0x0040` | Scroll Lock  |
//! | `0x0080` | Caps Lock    |
//! | `0x0100` | enhanced key |

use std::fmt;

use serde::Serialize;

/// Decoded control-key state: one boolean per defined mask bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ModifierState {
    pub right_alt_pressed: bool,
    pub left_alt_pressed: bool,
    pub right_ctrl_pressed: bool,
    pub left_ctrl_pressed: bool,
    pub shift_pressed: bool,
    pub num_lock_on: bool,
    pub scroll_lock_on: bool,
    pub caps_lock_on: bool,
    /// The key comes from the extended region (navigation cluster, right-hand
    /// modifiers, numpad Enter) rather than the legacy layout.
    pub enhanced_key: bool,
}

impl ModifierState {
    pub const RIGHT_ALT_PRESSED: u32 = 0x0001;
    pub const LEFT_ALT_PRESSED: u32 = 0x0002;
    pub const RIGHT_CTRL_PRESSED: u32 = 0x0004;
    pub const LEFT_CTRL_PRESSED: u32 = 0x0008;
    pub const SHIFT_PRESSED: u32 = 0x0010;
    pub const NUMLOCK_ON: u32 = 0x0020;
    pub const SCROLLLOCK_ON: u32 = 0x0040;
    pub const CAPSLOCK_ON: u32 = 0x0080;
    pub const ENHANCED_KEY: u32 = 0x0100;

    /// Union of every defined bit.
    pub const DEFINED_BITS: u32 = 0x01FF;

    /// Decodes a raw control-key-state mask.
    pub fn from_mask(mask: u32) -> Self {
        Self {
            right_alt_pressed: mask & Self::RIGHT_ALT_PRESSED != 0,
            left_alt_pressed: mask & Self::LEFT_ALT_PRESSED != 0,
            right_ctrl_pressed: mask & Self::RIGHT_CTRL_PRESSED != 0,
            left_ctrl_pressed: mask & Self::LEFT_CTRL_PRESSED != 0,
            shift_pressed: mask & Self::SHIFT_PRESSED != 0,
            num_lock_on: mask & Self::NUMLOCK_ON != 0,
            scroll_lock_on: mask & Self::SCROLLLOCK_ON != 0,
            caps_lock_on: mask & Self::CAPSLOCK_ON != 0,
            enhanced_key: mask & Self::ENHANCED_KEY != 0,
        }
    }

    /// Packs the state back into a mask.  Never sets bits above `0x0100`.
    pub fn to_mask(&self) -> u32 {
        [
            (self.right_alt_pressed, Self::RIGHT_ALT_PRESSED),
            (self.left_alt_pressed, Self::LEFT_ALT_PRESSED),
            (self.right_ctrl_pressed, Self::RIGHT_CTRL_PRESSED),
            (self.left_ctrl_pressed, Self::LEFT_CTRL_PRESSED),
            (self.shift_pressed, Self::SHIFT_PRESSED),
            (self.num_lock_on, Self::NUMLOCK_ON),
            (self.scroll_lock_on, Self::SCROLLLOCK_ON),
            (self.caps_lock_on, Self::CAPSLOCK_ON),
            (self.enhanced_key, Self::ENHANCED_KEY),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |mask, (_, bit)| mask | bit)
    }

    /// Returns `true` if either Ctrl key is held.
    pub fn ctrl(&self) -> bool {
        self.left_ctrl_pressed || self.right_ctrl_pressed
    }

    /// Returns `true` if either Alt key is held.
    pub fn alt(&self) -> bool {
        self.left_alt_pressed || self.right_alt_pressed
    }
}

impl From<u32> for ModifierState {
    fn from(mask: u32) -> Self {
        Self::from_mask(mask)
    }
}

impl From<ModifierState> for u32 {
    fn from(state: ModifierState) -> Self {
        state.to_mask()
    }
}

impl fmt::Display for ModifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{RightAltPressed: {}, LeftAltPressed: {}, RightCtrlPressed: {}, \
             LeftCtrlPressed: {}, ShiftPressed: {}, NumLockOn: {}, ScrollLockOn: {}, \
             CapsLockOn: {}, EnhancedKey: {}}}",
            self.right_alt_pressed,
            self.left_alt_pressed,
            self.right_ctrl_pressed,
            self.left_ctrl_pressed,
            self.shift_pressed,
            self.num_lock_on,
            self.scroll_lock_on,
            self.caps_lock_on,
            self.enhanced_key,
        )
    }
}
