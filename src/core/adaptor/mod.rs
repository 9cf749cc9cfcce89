//=========================================================================
// Event Adaptor
//=========================================================================
//
// Converts one raw platform record into one owned typed event.
//
// Architecture:
//   RawEvent { kind, timestamp, payload } → convert() → Box<dyn Event>
//                                                    ↘ None (not modelled)
//
// This is the only place where platform numbers meet library enums.
// Stateless: every call depends on its argument alone (plus the
// process-wide user kind registry for range checks).
//
//=========================================================================

//=== Submodules ==========================================================

pub mod tables;

//=== External Dependencies ===============================================

use log::{trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::event::registry::is_user_kind;
use crate::core::event::{
    Event, KeyboardEvent, MouseButtonEvent, QuitEvent, Timestamp, UserEvent,
};

//=== EventKind ===========================================================

/// Platform event kind tags.
///
/// Kinds in `USER..=LAST` are reserved for application events; the
/// generic [`UserEvent`] uses `USER` itself and each
/// [`CustomUserEvent`](crate::core::event::CustomUserEvent) type gets
/// its own kind above it.
pub enum EventKind {}

impl EventKind {
    pub const QUIT: u32 = 0x100;
    pub const KEY_DOWN: u32 = 0x300;
    pub const KEY_UP: u32 = 0x301;
    pub const MOUSE_MOTION: u32 = 0x400;
    pub const MOUSE_BUTTON_DOWN: u32 = 0x401;
    pub const MOUSE_BUTTON_UP: u32 = 0x402;
    pub const MOUSE_WHEEL: u32 = 0x403;
    pub const USER: u32 = 0x8000;
    pub const LAST: u32 = 0xFFFF;

    /// Human-readable kind name, for logs.
    pub fn name(kind: u32) -> &'static str {
        match kind {
            Self::QUIT => "quit",
            Self::KEY_DOWN => "key-down",
            Self::KEY_UP => "key-up",
            Self::MOUSE_MOTION => "mouse-motion",
            Self::MOUSE_BUTTON_DOWN => "mouse-button-down",
            Self::MOUSE_BUTTON_UP => "mouse-button-up",
            Self::MOUSE_WHEEL => "mouse-wheel",
            k if is_user_kind(k) => "user",
            _ => "unknown",
        }
    }
}

//=== RawPayload ==========================================================

/// Kind-specific fields of a raw platform record.
///
/// Values are platform numbers (see [`tables`]), not library enums.
#[derive(Debug)]
pub enum RawPayload {
    /// No fields (quit, or kinds the library does not model).
    None,

    /// Mouse button press or release.
    MouseButton {
        window_id: u32,
        which: u32,
        button: u8,
        clicks: u8,
        x: f32,
        y: f32,
    },

    /// Key press or release.
    Keyboard {
        window_id: u32,
        which: u32,
        scancode: u32,
        key: u32,
        modifiers: u16,
        repeat: bool,
    },

    /// Application event.
    ///
    /// `event` holds the typed instance handed over by
    /// [`EventBus::publish`](crate::core::bus::EventBus::publish);
    /// records synthesised elsewhere leave it empty.
    User {
        window_id: u32,
        code: i32,
        event: Option<Box<dyn Event>>,
    },
}

//=== RawEvent ============================================================

/// One platform event record, as queued by the bus.
#[derive(Debug)]
pub struct RawEvent {
    pub kind: u32,
    pub timestamp: Timestamp,
    pub payload: RawPayload,
}

impl RawEvent {
    /// Creates a record stamped with the current time.
    pub fn new(kind: u32, payload: RawPayload) -> Self {
        Self {
            kind,
            timestamp: Timestamp::now(),
            payload,
        }
    }

    /// Quit request record.
    pub fn quit() -> Self {
        Self::new(EventKind::QUIT, RawPayload::None)
    }

    /// Wraps a published user event so the adaptor can reclaim it.
    pub(crate) fn carrying(kind: u32, window_id: u32, code: i32, event: Box<dyn Event>) -> Self {
        Self::new(
            kind,
            RawPayload::User {
                window_id,
                code,
                event: Some(event),
            },
        )
    }
}

//=== Conversion ==========================================================

/// Converts `raw` into a typed event.
///
/// Returns `None` only for kinds the library does not model, or for a
/// modelled kind whose payload is malformed (wrong shape, button out of
/// range). Kinds in the user range always convert: a carried instance is
/// returned as-is, otherwise a generic [`UserEvent`] is synthesised.
pub fn convert(raw: RawEvent) -> Option<Box<dyn Event>> {
    let RawEvent {
        kind,
        timestamp,
        payload,
    } = raw;

    match kind {
        //--- Lifecycle ----------------------------------------------------
        EventKind::QUIT => Some(Box::new(QuitEvent::at(timestamp))),

        //--- Mouse Buttons ------------------------------------------------
        EventKind::MOUSE_BUTTON_DOWN | EventKind::MOUSE_BUTTON_UP => match payload {
            RawPayload::MouseButton {
                window_id,
                which,
                button,
                clicks,
                x,
                y,
            } => {
                let Some(button) = tables::mouse_button(button) else {
                    trace!(target: "bus", "Dropping press of unmodelled mouse button {}", button);
                    return None;
                };
                let down = kind == EventKind::MOUSE_BUTTON_DOWN;
                let event = MouseButtonEvent::new(window_id, which, x, y, button, down, clicks)
                    .with_timestamp(timestamp);
                Some(Box::new(event))
            }
            other => malformed(kind, &other),
        },

        //--- Keyboard -----------------------------------------------------
        EventKind::KEY_DOWN | EventKind::KEY_UP => match payload {
            RawPayload::Keyboard {
                window_id,
                which,
                scancode,
                key,
                modifiers,
                repeat,
            } => {
                let event = KeyboardEvent::new(
                    window_id,
                    which,
                    tables::scancode(scancode),
                    tables::keycode(key),
                    tables::modifiers(modifiers),
                    kind == EventKind::KEY_DOWN,
                    repeat,
                )
                .with_timestamp(timestamp);
                Some(Box::new(event))
            }
            other => malformed(kind, &other),
        },

        //--- Application Events -------------------------------------------
        k if is_user_kind(k) => match payload {
            RawPayload::User {
                event: Some(event), ..
            } => Some(event),
            RawPayload::User {
                window_id, code, ..
            } => Some(Box::new(
                UserEvent::with_kind(k, code)
                    .with_window(window_id)
                    .with_timestamp(timestamp),
            )),
            _ => Some(Box::new(UserEvent::with_kind(k, 0).with_timestamp(timestamp))),
        },

        //--- Not Modelled -------------------------------------------------
        _ => {
            trace!(target: "bus", "Kind {:#06x} ({}) not modelled", kind, EventKind::name(kind));
            None
        }
    }
}

fn malformed(kind: u32, payload: &RawPayload) -> Option<Box<dyn Event>> {
    warn!(
        target: "bus",
        "Malformed {} record dropped: {:?}",
        EventKind::name(kind),
        payload
    );
    None
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::keys::{Keycode, MouseButton, Scancode};
    use crate::core::event::CustomUserEvent;

    #[derive(Debug, PartialEq)]
    struct Marker {
        tag: &'static str,
    }

    fn mouse(kind: u32, button: u8) -> RawEvent {
        RawEvent::new(
            kind,
            RawPayload::MouseButton {
                window_id: 1,
                which: 0,
                button,
                clicks: 1,
                x: 100.0,
                y: 200.0,
            },
        )
    }

    //=====================================================================
    // Built-in Kinds
    //=====================================================================

    #[test]
    fn quit_keeps_record_timestamp() {
        let mut raw = RawEvent::quit();
        raw.timestamp = Timestamp::from_millis(42);
        let event = convert(raw).unwrap();
        let quit = event.downcast_ref::<QuitEvent>().unwrap();
        assert_eq!(quit.timestamp(), Timestamp::from_millis(42));
    }

    #[test]
    fn mouse_down_converts_fields() {
        let event = convert(mouse(EventKind::MOUSE_BUTTON_DOWN, tables::button::LEFT)).unwrap();
        let click = event.downcast_ref::<MouseButtonEvent>().unwrap();
        assert_eq!(click.position(), (100.0, 200.0));
        assert_eq!(click.button(), MouseButton::Left);
        assert!(click.is_down());
        assert_eq!(click.clicks(), 1);
    }

    #[test]
    fn mouse_up_is_not_down() {
        let event = convert(mouse(EventKind::MOUSE_BUTTON_UP, tables::button::X2)).unwrap();
        let click = event.downcast_ref::<MouseButtonEvent>().unwrap();
        assert!(!click.is_down());
        assert_eq!(click.button(), MouseButton::X2);
    }

    #[test]
    fn out_of_range_button_is_not_representable() {
        assert!(convert(mouse(EventKind::MOUSE_BUTTON_DOWN, 8)).is_none());
    }

    #[test]
    fn keyboard_translates_through_tables() {
        let raw = RawEvent::new(
            EventKind::KEY_UP,
            RawPayload::Keyboard {
                window_id: 3,
                which: 1,
                scancode: 41,
                key: 0x1b,
                modifiers: tables::modifier::LSHIFT,
                repeat: true,
            },
        );
        let event = convert(raw).unwrap();
        let key = event.downcast_ref::<KeyboardEvent>().unwrap();
        assert_eq!(key.scancode(), Scancode::Escape);
        assert_eq!(key.keycode(), Keycode::Escape);
        assert!(key.modifiers().shift);
        assert!(!key.is_down());
        assert!(key.is_repeat());
        assert_eq!(key.window_id(), 3);
    }

    #[test]
    fn mismatched_payload_is_dropped() {
        let raw = RawEvent::new(EventKind::KEY_DOWN, RawPayload::None);
        assert!(convert(raw).is_none());
    }

    #[test]
    fn unmodelled_kind_is_none() {
        assert!(convert(RawEvent::new(EventKind::MOUSE_MOTION, RawPayload::None)).is_none());
        assert!(convert(RawEvent::new(0x7777, RawPayload::None)).is_none());
    }

    //=====================================================================
    // User Range
    //=====================================================================

    #[test]
    fn carried_instance_is_returned_unchanged() {
        let original = CustomUserEvent::new(Marker { tag: "left-top" });
        let kind = original.kind();
        let boxed: Box<dyn Event> = Box::new(original);
        let address = (&*boxed as *const dyn Event).cast::<()>();

        let event = convert(RawEvent::carrying(kind, 0, 0, boxed)).unwrap();

        assert_eq!((&*event as *const dyn Event).cast::<()>(), address);
        let custom = event.downcast_ref::<CustomUserEvent<Marker>>().unwrap();
        assert_eq!(custom.tag, "left-top");
    }

    #[test]
    fn empty_user_record_synthesises_generic_event() {
        let raw = RawEvent::new(
            EventKind::USER + 5,
            RawPayload::User {
                window_id: 9,
                code: -3,
                event: None,
            },
        );
        let event = convert(raw).unwrap();
        let user = event.downcast_ref::<UserEvent>().unwrap();
        assert_eq!(user.kind(), EventKind::USER + 5);
        assert_eq!(user.code(), -3);
        assert_eq!(user.window_id(), 9);
    }

    #[test]
    fn user_kind_without_payload_still_converts() {
        let event = convert(RawEvent::new(EventKind::LAST, RawPayload::None)).unwrap();
        assert!(event.is::<UserEvent>());
    }

    #[test]
    fn kind_names() {
        assert_eq!(EventKind::name(EventKind::QUIT), "quit");
        assert_eq!(EventKind::name(EventKind::USER + 1), "user");
        assert_eq!(EventKind::name(1), "unknown");
    }
}
