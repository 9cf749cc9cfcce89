//=========================================================================
// Platform Value Tables
//=========================================================================
//
// Compile-time maps from raw platform numbers to library enums.
//
// Each table is a plain `&[(raw, library)]` slice searched linearly by a
// `const fn`. Tables stay small (largest ~90 rows), so a scan is cheap
// and the rows read like documentation.
//
// Raw values follow the USB HID usage page for scancodes; keycodes are
// the character for printable keys and `scancode | SCANCODE_MASK` for
// everything else.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::event::keys::{Keycode, ModifierKey, Modifiers, MouseButton, Scancode};

//=== Raw Constants =======================================================

/// Bit set on keycodes that have no printable character.
pub const SCANCODE_MASK: u32 = 1 << 30;

/// Raw mouse button indices.
pub mod button {
    pub const LEFT: u8 = 1;
    pub const MIDDLE: u8 = 2;
    pub const RIGHT: u8 = 3;
    pub const X1: u8 = 4;
    pub const X2: u8 = 5;
}

/// Raw modifier mask bits.
pub mod modifier {
    pub const LSHIFT: u16 = 0x0001;
    pub const RSHIFT: u16 = 0x0002;
    pub const LCTRL: u16 = 0x0040;
    pub const RCTRL: u16 = 0x0080;
    pub const LALT: u16 = 0x0100;
    pub const RALT: u16 = 0x0200;
    pub const LGUI: u16 = 0x0400;
    pub const RGUI: u16 = 0x0800;
    pub const NUM: u16 = 0x1000;
    pub const CAPS: u16 = 0x2000;
}

//=== Mouse Buttons =======================================================

pub const MOUSE_BUTTONS: &[(u8, MouseButton)] = &[
    (button::LEFT, MouseButton::Left),
    (button::MIDDLE, MouseButton::Middle),
    (button::RIGHT, MouseButton::Right),
    (button::X1, MouseButton::X1),
    (button::X2, MouseButton::X2),
];

//=== Modifier Bits =======================================================

pub const MODIFIER_BITS: &[(u16, ModifierKey)] = &[
    (modifier::LSHIFT, ModifierKey::Shift),
    (modifier::RSHIFT, ModifierKey::Shift),
    (modifier::LCTRL, ModifierKey::Ctrl),
    (modifier::RCTRL, ModifierKey::Ctrl),
    (modifier::LALT, ModifierKey::Alt),
    (modifier::RALT, ModifierKey::Alt),
    (modifier::LGUI, ModifierKey::Gui),
    (modifier::RGUI, ModifierKey::Gui),
    (modifier::NUM, ModifierKey::NumLock),
    (modifier::CAPS, ModifierKey::CapsLock),
];

//=== Scancodes ===========================================================

pub const SCANCODES: &[(u32, Scancode)] = &[
    //--- Letters ----------------------------------------------------------
    (4, Scancode::KeyA), (5, Scancode::KeyB), (6, Scancode::KeyC),
    (7, Scancode::KeyD), (8, Scancode::KeyE), (9, Scancode::KeyF),
    (10, Scancode::KeyG), (11, Scancode::KeyH), (12, Scancode::KeyI),
    (13, Scancode::KeyJ), (14, Scancode::KeyK), (15, Scancode::KeyL),
    (16, Scancode::KeyM), (17, Scancode::KeyN), (18, Scancode::KeyO),
    (19, Scancode::KeyP), (20, Scancode::KeyQ), (21, Scancode::KeyR),
    (22, Scancode::KeyS), (23, Scancode::KeyT), (24, Scancode::KeyU),
    (25, Scancode::KeyV), (26, Scancode::KeyW), (27, Scancode::KeyX),
    (28, Scancode::KeyY), (29, Scancode::KeyZ),

    //--- Digits -----------------------------------------------------------
    (30, Scancode::Digit1), (31, Scancode::Digit2), (32, Scancode::Digit3),
    (33, Scancode::Digit4), (34, Scancode::Digit5), (35, Scancode::Digit6),
    (36, Scancode::Digit7), (37, Scancode::Digit8), (38, Scancode::Digit9),
    (39, Scancode::Digit0),

    //--- Editing and Punctuation ------------------------------------------
    (40, Scancode::Enter), (41, Scancode::Escape), (42, Scancode::Backspace),
    (43, Scancode::Tab), (44, Scancode::Space), (45, Scancode::Minus),
    (46, Scancode::Equal), (47, Scancode::BracketLeft), (48, Scancode::BracketRight),
    (49, Scancode::Backslash), (51, Scancode::Semicolon), (52, Scancode::Quote),
    (53, Scancode::Backquote), (54, Scancode::Comma), (55, Scancode::Period),
    (56, Scancode::Slash), (57, Scancode::CapsLock),

    //--- Function Keys ----------------------------------------------------
    (58, Scancode::F1), (59, Scancode::F2), (60, Scancode::F3),
    (61, Scancode::F4), (62, Scancode::F5), (63, Scancode::F6),
    (64, Scancode::F7), (65, Scancode::F8), (66, Scancode::F9),
    (67, Scancode::F10), (68, Scancode::F11), (69, Scancode::F12),

    //--- Navigation -------------------------------------------------------
    (70, Scancode::PrintScreen), (71, Scancode::ScrollLock), (72, Scancode::Pause),
    (73, Scancode::Insert), (74, Scancode::Home), (75, Scancode::PageUp),
    (76, Scancode::Delete), (77, Scancode::End), (78, Scancode::PageDown),
    (79, Scancode::ArrowRight), (80, Scancode::ArrowLeft),
    (81, Scancode::ArrowDown), (82, Scancode::ArrowUp),

    //--- Modifiers --------------------------------------------------------
    (224, Scancode::ControlLeft), (225, Scancode::ShiftLeft),
    (226, Scancode::AltLeft), (227, Scancode::SuperLeft),
    (228, Scancode::ControlRight), (229, Scancode::ShiftRight),
    (230, Scancode::AltRight), (231, Scancode::SuperRight),
];

//=== Keycodes ============================================================

const fn masked(scancode: u32) -> u32 {
    scancode | SCANCODE_MASK
}

pub const KEYCODES: &[(u32, Keycode)] = &[
    //--- Letters ----------------------------------------------------------
    (b'a' as u32, Keycode::A), (b'b' as u32, Keycode::B), (b'c' as u32, Keycode::C),
    (b'd' as u32, Keycode::D), (b'e' as u32, Keycode::E), (b'f' as u32, Keycode::F),
    (b'g' as u32, Keycode::G), (b'h' as u32, Keycode::H), (b'i' as u32, Keycode::I),
    (b'j' as u32, Keycode::J), (b'k' as u32, Keycode::K), (b'l' as u32, Keycode::L),
    (b'm' as u32, Keycode::M), (b'n' as u32, Keycode::N), (b'o' as u32, Keycode::O),
    (b'p' as u32, Keycode::P), (b'q' as u32, Keycode::Q), (b'r' as u32, Keycode::R),
    (b's' as u32, Keycode::S), (b't' as u32, Keycode::T), (b'u' as u32, Keycode::U),
    (b'v' as u32, Keycode::V), (b'w' as u32, Keycode::W), (b'x' as u32, Keycode::X),
    (b'y' as u32, Keycode::Y), (b'z' as u32, Keycode::Z),

    //--- Digits -----------------------------------------------------------
    (b'0' as u32, Keycode::Num0), (b'1' as u32, Keycode::Num1),
    (b'2' as u32, Keycode::Num2), (b'3' as u32, Keycode::Num3),
    (b'4' as u32, Keycode::Num4), (b'5' as u32, Keycode::Num5),
    (b'6' as u32, Keycode::Num6), (b'7' as u32, Keycode::Num7),
    (b'8' as u32, Keycode::Num8), (b'9' as u32, Keycode::Num9),

    //--- Editing and Punctuation ------------------------------------------
    (0x0d, Keycode::Return), (0x1b, Keycode::Escape), (0x08, Keycode::Backspace),
    (0x09, Keycode::Tab), (b' ' as u32, Keycode::Space), (b'-' as u32, Keycode::Minus),
    (b'=' as u32, Keycode::Equals), (b'[' as u32, Keycode::LeftBracket),
    (b']' as u32, Keycode::RightBracket), (b'\\' as u32, Keycode::Backslash),
    (b';' as u32, Keycode::Semicolon), (b'\'' as u32, Keycode::Apostrophe),
    (b'`' as u32, Keycode::Grave), (b',' as u32, Keycode::Comma),
    (b'.' as u32, Keycode::Period), (b'/' as u32, Keycode::Slash),
    (masked(57), Keycode::CapsLock),

    //--- Function Keys ----------------------------------------------------
    (masked(58), Keycode::F1), (masked(59), Keycode::F2), (masked(60), Keycode::F3),
    (masked(61), Keycode::F4), (masked(62), Keycode::F5), (masked(63), Keycode::F6),
    (masked(64), Keycode::F7), (masked(65), Keycode::F8), (masked(66), Keycode::F9),
    (masked(67), Keycode::F10), (masked(68), Keycode::F11), (masked(69), Keycode::F12),

    //--- Navigation -------------------------------------------------------
    (masked(70), Keycode::PrintScreen), (masked(71), Keycode::ScrollLock),
    (masked(72), Keycode::Pause), (masked(73), Keycode::Insert),
    (masked(74), Keycode::Home), (masked(75), Keycode::PageUp),
    (0x7f, Keycode::Delete), (masked(77), Keycode::End),
    (masked(78), Keycode::PageDown), (masked(79), Keycode::Right),
    (masked(80), Keycode::Left), (masked(81), Keycode::Down),
    (masked(82), Keycode::Up),

    //--- Modifiers --------------------------------------------------------
    (masked(224), Keycode::LCtrl), (masked(225), Keycode::LShift),
    (masked(226), Keycode::LAlt), (masked(227), Keycode::LGui),
    (masked(228), Keycode::RCtrl), (masked(229), Keycode::RShift),
    (masked(230), Keycode::RAlt), (masked(231), Keycode::RGui),
];

//=== Lookups =============================================================

/// Raw button index → library button. `None` beyond X2.
pub const fn mouse_button(raw: u8) -> Option<MouseButton> {
    let mut i = 0;
    while i < MOUSE_BUTTONS.len() {
        if MOUSE_BUTTONS[i].0 == raw {
            return Some(MOUSE_BUTTONS[i].1);
        }
        i += 1;
    }
    None
}

/// Raw scancode → library scancode, `Unidentified` when unmapped.
pub const fn scancode(raw: u32) -> Scancode {
    let mut i = 0;
    while i < SCANCODES.len() {
        if SCANCODES[i].0 == raw {
            return SCANCODES[i].1;
        }
        i += 1;
    }
    Scancode::Unidentified
}

/// Raw keycode → library keycode, `Unknown` when unmapped.
pub const fn keycode(raw: u32) -> Keycode {
    let mut i = 0;
    while i < KEYCODES.len() {
        if KEYCODES[i].0 == raw {
            return KEYCODES[i].1;
        }
        i += 1;
    }
    Keycode::Unknown
}

/// Raw modifier mask → library modifier state. Unknown bits are ignored.
pub const fn modifiers(mask: u16) -> Modifiers {
    let mut mods = Modifiers::NONE;
    let mut i = 0;
    while i < MODIFIER_BITS.len() {
        if mask & MODIFIER_BITS[i].0 != 0 {
            mods = mods.with(MODIFIER_BITS[i].1);
        }
        i += 1;
    }
    mods
}

//--- Reverse Lookups -----------------------------------------------------
//
// Used by host integrations that start from library enums and need to
// build a raw record.
//

/// Library button → raw button index.
pub fn raw_mouse_button(button: MouseButton) -> u8 {
    MOUSE_BUTTONS
        .iter()
        .find(|(_, b)| *b == button)
        .map(|(raw, _)| *raw)
        .unwrap_or(0)
}

/// Library scancode → raw scancode, 0 for `Unidentified`.
pub fn raw_scancode(code: Scancode) -> u32 {
    SCANCODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(raw, _)| *raw)
        .unwrap_or(0)
}

/// Library modifier state → raw mask, using the left-hand bits.
pub fn raw_modifiers(mods: Modifiers) -> u16 {
    let mut mask = 0;
    if mods.shift {
        mask |= modifier::LSHIFT;
    }
    if mods.ctrl {
        mask |= modifier::LCTRL;
    }
    if mods.alt {
        mask |= modifier::LALT;
    }
    if mods.gui {
        mask |= modifier::LGUI;
    }
    if mods.num_lock {
        mask |= modifier::NUM;
    }
    if mods.caps_lock {
        mask |= modifier::CAPS;
    }
    mask
}

//=========================================================================
// Unit Tests
//=========================================================================
