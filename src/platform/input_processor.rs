//=========================================================================
// Input Processor
//=========================================================================
//
// Turns Winit window input into raw platform records.
//
// Architecture:
//   Winit Events → InputProcessor → RawEvent → EventBus::deliver
//
// Stateful tracking:
// - Modifier mask cached from ModifiersChanged, stamped on key records
// - Cursor position cached from CursorMoved, stamped on button records
// - Consecutive presses of one button within DOUBLE_CLICK_WINDOW count
//   up (1 = single, 2 = double, ...)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

use winit::{
    event::{ElementState, MouseButton as WinitMouseButton},
    keyboard::{Key, ModifiersState, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::adaptor::RawEvent;
use crate::core::event::keys::MouseButton;

use super::event_mapper;

//=== Constants ===========================================================

/// Maximum gap between presses that still counts as a multi-click.
pub(crate) const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

//=== ClickCounter ========================================================

#[derive(Debug, Default)]
struct ClickCounter {
    last_press: Option<(MouseButton, Instant)>,
    clicks: u8,
}

impl ClickCounter {
    /// Records a press at `now` and returns its click count.
    fn press(&mut self, button: MouseButton, now: Instant) -> u8 {
        self.clicks = match self.last_press {
            Some((last, at)) if last == button && now.duration_since(at) <= DOUBLE_CLICK_WINDOW => {
                self.clicks.saturating_add(1)
            }
            _ => 1,
        };
        self.last_press = Some((button, now));
        self.clicks
    }

    /// Click count reported with a release of `button`.
    fn release(&self, button: MouseButton) -> u8 {
        match self.last_press {
            Some((last, _)) if last == button => self.clicks.max(1),
            _ => 1,
        }
    }
}

//=== InputProcessor ======================================================

/// Converts Winit input into raw records with cached modifier, cursor and
/// click state.
pub(crate) struct InputProcessor {
    window_id: u32,
    modifiers: u16,
    cursor: (f32, f32),
    clicks: ClickCounter,
}

impl InputProcessor {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(window_id: u32) -> Self {
        Self {
            window_id,
            modifiers: 0,
            cursor: (0.0, 0.0),
            clicks: ClickCounter::default(),
        }
    }

    //--- State Tracking ---------------------------------------------------

    /// Updates cached modifier state (applied to subsequent key records).
    pub(crate) fn update_modifiers(&mut self, state: ModifiersState) {
        self.modifiers = event_mapper::modifier_mask(state);
    }

    pub(crate) fn update_cursor(&mut self, x: f32, y: f32) {
        self.cursor = (x, y);
    }

    //--- Event Processing -------------------------------------------------

    /// Builds a key record. Every key is forwarded; unknown keys decode to
    /// `Unidentified`/`Unknown`.
    pub(crate) fn process_key(
        &self,
        physical: PhysicalKey,
        logical: &Key,
        state: ElementState,
        repeat: bool,
    ) -> RawEvent {
        event_mapper::key_record(self.window_id, physical, logical, state, repeat, self.modifiers)
    }

    /// Builds a button record, or `None` for buttons beyond X2.
    pub(crate) fn process_mouse_button(
        &mut self,
        button: WinitMouseButton,
        state: ElementState,
    ) -> Option<RawEvent> {
        self.process_mouse_button_at(button, state, Instant::now())
    }

    fn process_mouse_button_at(
        &mut self,
        button: WinitMouseButton,
        state: ElementState,
        now: Instant,
    ) -> Option<RawEvent> {
        let button = event_mapper::mouse_button(button)?;
        let clicks = match state {
            ElementState::Pressed => self.clicks.press(button, now),
            ElementState::Released => self.clicks.release(button),
        };
        Some(event_mapper::mouse_record(self.window_id, button, state, clicks, self.cursor))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adaptor::{tables, EventKind, RawPayload};
    use winit::keyboard::{KeyCode as WinitKeyCode, NamedKey};

    fn clicks_of(raw: &RawEvent) -> u8 {
        match raw.payload {
            RawPayload::MouseButton { clicks, .. } => clicks,
            ref other => panic!("expected mouse payload, got {:?}", other),
        }
    }

    //=====================================================================
    // Modifier Tracking
    //=====================================================================

    #[test]
    fn starts_with_no_modifiers() {
        let processor = InputProcessor::new(1);
        assert_eq!(processor.modifiers, 0);
        assert_eq!(processor.cursor, (0.0, 0.0));
    }

    #[test]
    fn modifiers_are_sticky_across_keys() {
        let mut processor = InputProcessor::new(1);
        processor.update_modifiers(ModifiersState::SHIFT);

        for _ in 0..2 {
            let raw = processor.process_key(
                PhysicalKey::Code(WinitKeyCode::KeyA),
                &Key::Character("A".into()),
                ElementState::Pressed,
                false,
            );
            match raw.payload {
                RawPayload::Keyboard { modifiers, key, .. } => {
                    assert_eq!(modifiers, tables::modifier::LSHIFT);
                    assert_eq!(key, b'a' as u32);
                }
                other => panic!("expected keyboard payload, got {:?}", other),
            }
        }
    }

    #[test]
    fn key_release_and_repeat_are_forwarded() {
        let processor = InputProcessor::new(4);
        let raw = processor.process_key(
            PhysicalKey::Code(WinitKeyCode::Space),
            &Key::Named(NamedKey::Space),
            ElementState::Released,
            true,
        );
        assert_eq!(raw.kind, EventKind::KEY_UP);
        assert!(matches!(raw.payload, RawPayload::Keyboard { repeat: true, window_id: 4, .. }));
    }

    //=====================================================================
    // Mouse Buttons
    //=====================================================================

    #[test]
    fn button_records_carry_cursor_position() {
        let mut processor = InputProcessor::new(1);
        processor.update_cursor(12.5, 40.0);
        let raw = processor
            .process_mouse_button(WinitMouseButton::Left, ElementState::Pressed)
            .unwrap();
        assert_eq!(raw.kind, EventKind::MOUSE_BUTTON_DOWN);
        assert!(matches!(raw.payload, RawPayload::MouseButton { x, y, .. } if x == 12.5 && y == 40.0));
    }

    #[test]
    fn exotic_buttons_are_filtered() {
        let mut processor = InputProcessor::new(1);
        assert!(processor
            .process_mouse_button(WinitMouseButton::Other(7), ElementState::Pressed)
            .is_none());
    }

    #[test]
    fn quick_presses_count_as_double_click() {
        let mut processor = InputProcessor::new(1);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(120);

        let first = processor
            .process_mouse_button_at(WinitMouseButton::Left, ElementState::Pressed, t0)
            .unwrap();
        let release = processor
            .process_mouse_button_at(WinitMouseButton::Left, ElementState::Released, t0)
            .unwrap();
        let second = processor
            .process_mouse_button_at(WinitMouseButton::Left, ElementState::Pressed, t1)
            .unwrap();

        assert_eq!(clicks_of(&first), 1);
        assert_eq!(clicks_of(&release), 1);
        assert_eq!(clicks_of(&second), 2);
    }

    #[test]
    fn slow_or_different_presses_reset_count() {
        let mut processor = InputProcessor::new(1);
        let t0 = Instant::now();

        processor.process_mouse_button_at(WinitMouseButton::Left, ElementState::Pressed, t0);
        let other = processor
            .process_mouse_button_at(WinitMouseButton::Right, ElementState::Pressed, t0)
            .unwrap();
        let late = processor
            .process_mouse_button_at(
                WinitMouseButton::Right,
                ElementState::Pressed,
                t0 + DOUBLE_CLICK_WINDOW + Duration::from_millis(1),
            )
            .unwrap();

        assert_eq!(clicks_of(&other), 1);
        assert_eq!(clicks_of(&late), 1);
    }
}
