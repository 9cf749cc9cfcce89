//=========================================================================
// Platform Event Mapper
//
// Converts Winit identifiers into raw platform records, the numeric
// form the event bus queues and the adaptor decodes.
//
// Responsibilities:
// - Translate physical keys, logical keys, buttons and modifier state
// - Provide fallbacks (`Unidentified`, keycode 0) for unmapped inputs
// - Build complete `RawEvent`s for key and mouse button transitions
//
// Everything here is a pure function of its arguments.
//
//=========================================================================

use winit::event::{ElementState, MouseButton as WinitMouseButton};
use winit::keyboard::{Key, KeyCode as WinitKeyCode, ModifiersState, NamedKey, PhysicalKey};

use crate::core::adaptor::tables::{self, SCANCODE_MASK};
use crate::core::adaptor::{EventKind, RawEvent, RawPayload};
use crate::core::event::keys::{Modifiers, MouseButton, Scancode};

//=== Key Conversion ======================================================
//
// Maps `WinitKeyCode` values to the library's physical `Scancode`.
// Keys outside the supported set map to `Unidentified`.
//

impl From<WinitKeyCode> for Scancode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Alphabetic keys --------------------------------------------------
            KeyA => Scancode::KeyA, KeyB => Scancode::KeyB, KeyC => Scancode::KeyC,
            KeyD => Scancode::KeyD, KeyE => Scancode::KeyE, KeyF => Scancode::KeyF,
            KeyG => Scancode::KeyG, KeyH => Scancode::KeyH, KeyI => Scancode::KeyI,
            KeyJ => Scancode::KeyJ, KeyK => Scancode::KeyK, KeyL => Scancode::KeyL,
            KeyM => Scancode::KeyM, KeyN => Scancode::KeyN, KeyO => Scancode::KeyO,
            KeyP => Scancode::KeyP, KeyQ => Scancode::KeyQ, KeyR => Scancode::KeyR,
            KeyS => Scancode::KeyS, KeyT => Scancode::KeyT, KeyU => Scancode::KeyU,
            KeyV => Scancode::KeyV, KeyW => Scancode::KeyW, KeyX => Scancode::KeyX,
            KeyY => Scancode::KeyY, KeyZ => Scancode::KeyZ,

            //--- Numeric keys -----------------------------------------------------
            Digit1 => Scancode::Digit1, Digit2 => Scancode::Digit2,
            Digit3 => Scancode::Digit3, Digit4 => Scancode::Digit4,
            Digit5 => Scancode::Digit5, Digit6 => Scancode::Digit6,
            Digit7 => Scancode::Digit7, Digit8 => Scancode::Digit8,
            Digit9 => Scancode::Digit9, Digit0 => Scancode::Digit0,

            //--- Editing and punctuation ------------------------------------------
            Enter => Scancode::Enter, Escape => Scancode::Escape,
            Backspace => Scancode::Backspace, Tab => Scancode::Tab,
            Space => Scancode::Space, Minus => Scancode::Minus,
            Equal => Scancode::Equal, BracketLeft => Scancode::BracketLeft,
            BracketRight => Scancode::BracketRight, Backslash => Scancode::Backslash,
            Semicolon => Scancode::Semicolon, Quote => Scancode::Quote,
            Backquote => Scancode::Backquote, Comma => Scancode::Comma,
            Period => Scancode::Period, Slash => Scancode::Slash,
            CapsLock => Scancode::CapsLock,

            //--- Function keys ----------------------------------------------------
            F1 => Scancode::F1, F2 => Scancode::F2, F3 => Scancode::F3,
            F4 => Scancode::F4, F5 => Scancode::F5, F6 => Scancode::F6,
            F7 => Scancode::F7, F8 => Scancode::F8, F9 => Scancode::F9,
            F10 => Scancode::F10, F11 => Scancode::F11, F12 => Scancode::F12,

            //--- Navigation -------------------------------------------------------
            PrintScreen => Scancode::PrintScreen, ScrollLock => Scancode::ScrollLock,
            Pause => Scancode::Pause, Insert => Scancode::Insert,
            Home => Scancode::Home, PageUp => Scancode::PageUp,
            Delete => Scancode::Delete, End => Scancode::End,
            PageDown => Scancode::PageDown,
            ArrowRight => Scancode::ArrowRight, ArrowLeft => Scancode::ArrowLeft,
            ArrowDown => Scancode::ArrowDown, ArrowUp => Scancode::ArrowUp,

            //--- Modifier keys ----------------------------------------------------
            ControlLeft => Scancode::ControlLeft, ShiftLeft => Scancode::ShiftLeft,
            AltLeft => Scancode::AltLeft, SuperLeft => Scancode::SuperLeft,
            ControlRight => Scancode::ControlRight, ShiftRight => Scancode::ShiftRight,
            AltRight => Scancode::AltRight, SuperRight => Scancode::SuperRight,

            //--- Fallback ---------------------------------------------------------
            _ => Scancode::Unidentified,
        }
    }
}

/// Physical key → library scancode (`Unidentified` for OS-native codes).
pub(crate) fn scancode(physical: PhysicalKey) -> Scancode {
    match physical {
        PhysicalKey::Code(code) => Scancode::from(code),
        PhysicalKey::Unidentified(_) => Scancode::Unidentified,
    }
}

/// Raw layout keycode for a key press.
///
/// Printable ASCII keys use their (lowercased) character, control keys
/// their ASCII control code, and everything else the masked scancode.
/// Returns 0 when neither side is known.
pub(crate) fn raw_keycode(scancode: Scancode, logical: &Key) -> u32 {
    match logical {
        Key::Character(text) => {
            let mut chars = text.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_ascii() {
                    return c.to_ascii_lowercase() as u32;
                }
            }
        }
        Key::Named(NamedKey::Enter) => return 0x0d,
        Key::Named(NamedKey::Escape) => return 0x1b,
        Key::Named(NamedKey::Backspace) => return 0x08,
        Key::Named(NamedKey::Tab) => return 0x09,
        Key::Named(NamedKey::Space) => return b' ' as u32,
        Key::Named(NamedKey::Delete) => return 0x7f,
        _ => {}
    }

    match tables::raw_scancode(scancode) {
        0 => 0,
        raw => raw | SCANCODE_MASK,
    }
}

//=== Mouse Conversion ====================================================
//
// Maps Winit mouse buttons to the five buttons the library models.
// Back/Forward become X1/X2; anything else has no representation.
//

pub(crate) fn mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        WinitMouseButton::Right => Some(MouseButton::Right),
        WinitMouseButton::Back => Some(MouseButton::X1),
        WinitMouseButton::Forward => Some(MouseButton::X2),
        WinitMouseButton::Other(_) => None,
    }
}

//=== Modifier Conversion =================================================

/// Converts Winit ModifiersState to library Modifiers.
///
/// Winit does not report lock-key toggles here, so those stay clear.
impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            gui: state.super_key(),
            ..Modifiers::NONE
        }
    }
}

/// Winit modifier state → raw modifier mask.
pub(crate) fn modifier_mask(state: ModifiersState) -> u16 {
    tables::raw_modifiers(Modifiers::from(state))
}

//=== Record Construction =================================================

/// Builds a key-down or key-up record.
pub(crate) fn key_record(
    window_id: u32,
    physical: PhysicalKey,
    logical: &Key,
    state: ElementState,
    repeat: bool,
    modifiers: u16,
) -> RawEvent {
    let code = scancode(physical);
    let kind = match state {
        ElementState::Pressed => EventKind::KEY_DOWN,
        ElementState::Released => EventKind::KEY_UP,
    };

    RawEvent::new(
        kind,
        RawPayload::Keyboard {
            window_id,
            which: 0,
            scancode: tables::raw_scancode(code),
            key: raw_keycode(code, logical),
            modifiers,
            repeat,
        },
    )
}

/// Builds a button-down or button-up record at cursor position `(x, y)`.
pub(crate) fn mouse_record(
    window_id: u32,
    button: MouseButton,
    state: ElementState,
    clicks: u8,
    (x, y): (f32, f32),
) -> RawEvent {
    let kind = match state {
        ElementState::Pressed => EventKind::MOUSE_BUTTON_DOWN,
        ElementState::Released => EventKind::MOUSE_BUTTON_UP,
    };

    RawEvent::new(
        kind,
        RawPayload::MouseButton {
            window_id,
            which: 0,
            button: tables::raw_mouse_button(button),
            clicks,
            x,
            y,
        },
    )
}

//=========================================================================
// Unit Tests
//=========================================================================
