//=========================================================================
// Input Identifiers
//
// Library-side enums for everything an input event names: mouse buttons,
// physical scancodes, layout-dependent keycodes and the modifier state.
//
// These types never carry platform values. Translation from the raw
// platform numbers happens in one place, the adaptor's const tables.
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
///
/// The five buttons every supported platform reports. Anything beyond
/// X2 is not representable and the adaptor drops such records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (typically left).
    Left,

    /// Middle button (wheel click).
    Middle,

    /// Secondary button (typically right).
    Right,

    /// First extended button (usually "back").
    X1,

    /// Second extended button (usually "forward").
    X2,
}

//=== Scancode ============================================================

/// Physical key location, independent of keyboard layout.
///
/// `KeyA` is always the same physical key on QWERTY and AZERTY alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scancode {
    //--- Alphabetic Keys --------------------------------------------------
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Numeric Keys -----------------------------------------------------
    Digit1, Digit2, Digit3, Digit4, Digit5,
    Digit6, Digit7, Digit8, Digit9, Digit0,

    //--- Editing and Punctuation ------------------------------------------
    Enter, Escape, Backspace, Tab, Space,
    Minus, Equal, BracketLeft, BracketRight, Backslash,
    Semicolon, Quote, Backquote, Comma, Period, Slash,
    CapsLock,

    //--- Function Keys ----------------------------------------------------
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    //--- Navigation -------------------------------------------------------
    PrintScreen, ScrollLock, Pause, Insert, Home, PageUp,
    Delete, End, PageDown,
    ArrowRight, ArrowLeft, ArrowDown, ArrowUp,

    //--- Modifier Keys ----------------------------------------------------
    ControlLeft, ShiftLeft, AltLeft, SuperLeft,
    ControlRight, ShiftRight, AltRight, SuperRight,

    /// Key the library has no name for.
    Unidentified,
}

//=== Keycode =============================================================

/// Virtual key produced by the current keyboard layout.
///
/// On AZERTY, pressing the physical `Scancode::KeyQ` yields `Keycode::A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keycode {
    //--- Letters ----------------------------------------------------------
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    //--- Digits -----------------------------------------------------------
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,

    //--- Editing and Punctuation ------------------------------------------
    Return, Escape, Backspace, Tab, Space,
    Minus, Equals, LeftBracket, RightBracket, Backslash,
    Semicolon, Apostrophe, Grave, Comma, Period, Slash,
    CapsLock,

    //--- Function Keys ----------------------------------------------------
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    //--- Navigation -------------------------------------------------------
    PrintScreen, ScrollLock, Pause, Insert, Home, PageUp,
    Delete, End, PageDown,
    Right, Left, Down, Up,

    //--- Modifier Keys ----------------------------------------------------
    LCtrl, LShift, LAlt, LGui,
    RCtrl, RShift, RAlt, RGui,

    /// Symbol the library has no name for.
    Unknown,
}

//=== ModifierKey =========================================================

/// A single modifier flag, as named by the adaptor's modifier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
    Gui,
    NumLock,
    CapsLock,
}

//=== Modifiers ===========================================================

/// Modifier key state captured with a keyboard event.
///
/// Left and right variants are merged: either Shift key sets `shift`.
/// Lock keys are reported as toggles, not as held keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Shift key held (either side).
    pub shift: bool,

    /// Ctrl key held (either side).
    pub ctrl: bool,

    /// Alt/Option key held (either side).
    pub alt: bool,

    /// Super/Command/Windows key held (either side).
    pub gui: bool,

    /// Num lock toggled on.
    pub num_lock: bool,

    /// Caps lock toggled on.
    pub caps_lock: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        gui: false,
        num_lock: false,
        caps_lock: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self { shift: true, ..Self::NONE };

    /// Ctrl only.
    pub const CTRL: Self = Self { ctrl: true, ..Self::NONE };

    /// Alt only.
    pub const ALT: Self = Self { alt: true, ..Self::NONE };

    /// Returns a copy with `key` set.
    pub const fn with(mut self, key: ModifierKey) -> Self {
        match key {
            ModifierKey::Shift => self.shift = true,
            ModifierKey::Ctrl => self.ctrl = true,
            ModifierKey::Alt => self.alt = true,
            ModifierKey::Gui => self.gui = true,
            ModifierKey::NumLock => self.num_lock = true,
            ModifierKey::CapsLock => self.caps_lock = true,
        }
        self
    }

    /// Returns `true` if `key` is set.
    pub const fn contains(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Gui => self.gui,
            ModifierKey::NumLock => self.num_lock,
            ModifierKey::CapsLock => self.caps_lock,
        }
    }

    /// Returns `true` if any of Shift, Ctrl, Alt or Gui is held.
    ///
    /// Lock toggles are ignored.
    pub const fn any_held(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.gui
    }
}

//=== Key Markers =========================================================

/// Type-level key name used by [`SpecificKey`](super::SpecificKey).
pub trait KeyMarker: Send + 'static {
    /// The keycode this marker stands for.
    const KEYCODE: Keycode;
}

macro_rules! key_markers {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            #[doc = concat!("Marker for [`Keycode::", stringify!($code), "`].")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name;

            impl KeyMarker for $name {
                const KEYCODE: Keycode = Keycode::$code;
            }
        )*
    };
}

key_markers! {
    Escape => Escape,
    Return => Return,
    Space => Space,
    Tab => Tab,
    Up => Up,
    Down => Down,
    Left => Left,
    Right => Right,
    W => W,
    A => A,
    S => S,
    D => D,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_default_is_none() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
        assert!(!Modifiers::NONE.any_held());
    }

    #[test]
    fn with_sets_single_flag() {
        let mods = Modifiers::NONE.with(ModifierKey::Ctrl);
        assert_eq!(mods, Modifiers::CTRL);
        assert!(mods.contains(ModifierKey::Ctrl));
        assert!(!mods.contains(ModifierKey::Shift));
    }

    #[test]
    fn lock_toggles_are_not_held_keys() {
        let mods = Modifiers::NONE
            .with(ModifierKey::CapsLock)
            .with(ModifierKey::NumLock);
        assert!(!mods.any_held());
        assert!(mods.caps_lock && mods.num_lock);
    }

    #[test]
    fn key_markers_name_their_keycode() {
        assert_eq!(Escape::KEYCODE, Keycode::Escape);
        assert_eq!(W::KEYCODE, Keycode::W);
    }
}
