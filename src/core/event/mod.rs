//=========================================================================
// Event Model
//
// Typed value objects for everything the bus can deliver.
//
// Every event is an owned value behind `Box<dyn Event>`. The router keys
// handlers by the concrete `TypeId`; an event may additionally expose
// "base views" (a `CustomUserEvent<T>` can be seen as a `UserEvent`, a
// `SpecificKey` as a `KeyboardEvent`) so handlers registered against the
// base still receive it.
//
// Event Flow:
// ```text
// RawEvent (platform record)
//         ↓ adaptor::convert
//    Box<dyn Event> (this module)
//         ↓ EventRouter
//    handlers keyed by TypeId (+ base views)
// ```
//
//=========================================================================

//=== Submodules ==========================================================

pub mod keys;
pub mod registry;

//=== Standard Library Imports ============================================

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

//=== Internal Imports ====================================================

use crate::core::adaptor::EventKind;
use keys::{KeyMarker, Keycode, Modifiers, MouseButton, Scancode};

//=== Timestamp ===========================================================

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since the process-wide event epoch.
///
/// The epoch is fixed the first time any timestamp is taken. Values are
/// monotonic but two events created in the same millisecond compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Current time relative to the event epoch.
    pub fn now() -> Self {
        let epoch = EPOCH.get_or_init(Instant::now);
        Self(epoch.elapsed().as_millis() as u64)
    }

    /// Builds a timestamp from a raw millisecond count.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

//=== EventAny ============================================================

/// Type-erasure helpers every event gets for free.
///
/// Call these on `&dyn Event`, never on `&Box<dyn Event>`: the blanket
/// impl would otherwise answer for the box itself.
pub trait EventAny: Any {
    /// Upcasts to `&dyn Any` for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts an owned box to `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Runtime type identifier used as the router's dispatch key.
    fn event_type(&self) -> TypeId;

    /// Rust type name, for diagnostics.
    fn event_name(&self) -> &'static str;
}

impl<T: Any> EventAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn event_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn event_name(&self) -> &'static str {
        type_name::<T>()
    }
}

//=== Event ===============================================================

/// An owned, timestamped occurrence delivered through the bus.
///
/// Implement this for any type that should be routable. The only required
/// method is [`Event::timestamp`]. Types that can also be seen as a more
/// general event override [`Event::visit_bases`].
///
/// # Examples
///
/// ```
/// use aetheric_events::core::event::{Event, Timestamp};
///
/// #[derive(Debug)]
/// struct Tick {
///     at: Timestamp,
/// }
///
/// impl Event for Tick {
///     fn timestamp(&self) -> Timestamp {
///         self.at
///     }
/// }
/// ```
pub trait Event: EventAny + fmt::Debug + Send {
    /// When the event was produced.
    fn timestamp(&self) -> Timestamp;

    /// Calls `visitor` once for each base view of this event, nearest first.
    ///
    /// The `TypeId` names the base type and the `&dyn Any` downcasts to it.
    fn visit_bases<'a>(&'a self, _visitor: &mut dyn FnMut(TypeId, &'a dyn Any)) {}
}

impl dyn Event {
    /// Returns `true` if the concrete type is `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.as_any().is::<E>()
    }

    /// Borrows the event as its concrete type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// Recovers the owned concrete event, or hands the box back untouched.
    pub fn downcast<E: Event>(self: Box<Self>) -> Result<Box<E>, Box<dyn Event>> {
        if !(*self).is::<E>() {
            return Err(self);
        }
        Ok(self
            .into_any()
            .downcast::<E>()
            .unwrap_or_else(|_| unreachable!("concrete type checked above")))
    }

    /// Borrows the event as `B`, either directly or through a base view.
    pub fn view<B: Any>(&self) -> Option<&B> {
        if let Some(direct) = self.as_any().downcast_ref::<B>() {
            return Some(direct);
        }
        let mut found = None;
        let wanted = TypeId::of::<B>();
        self.visit_bases(&mut |type_id, view| {
            if found.is_none() && type_id == wanted {
                found = view.downcast_ref::<B>();
            }
        });
        found
    }
}

//=== QuitEvent ===========================================================

/// Application termination request.
///
/// Terminal for [`EventRouter::run`](crate::core::router::EventRouter::run):
/// handlers still see it, then the loop returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuitEvent {
    timestamp: Timestamp,
}

impl QuitEvent {
    pub fn new() -> Self {
        Self::at(Timestamp::now())
    }

    pub fn at(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }
}

impl Default for QuitEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl Event for QuitEvent {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

//=== MouseButtonEvent ====================================================

/// Mouse button pressed or released.
///
/// Coordinates are window-relative, in pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonEvent {
    timestamp: Timestamp,
    window_id: u32,
    device_id: u32,
    x: f32,
    y: f32,
    button: MouseButton,
    down: bool,
    clicks: u8,
}

impl MouseButtonEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        window_id: u32,
        device_id: u32,
        x: f32,
        y: f32,
        button: MouseButton,
        down: bool,
        clicks: u8,
    ) -> Self {
        Self {
            timestamp: Timestamp::now(),
            window_id,
            device_id,
            x,
            y,
            button,
            down,
            clicks,
        }
    }

    /// Replaces the timestamp (consumes self).
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn window_id(&self) -> u32 {
        self.window_id
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Position as `(x, y)`.
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    /// `true` for press, `false` for release.
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// 1 for single click, 2 for double click, and so on.
    pub fn clicks(&self) -> u8 {
        self.clicks
    }
}

impl Event for MouseButtonEvent {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

//=== KeyboardEvent =======================================================

/// Key pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    timestamp: Timestamp,
    window_id: u32,
    device_id: u32,
    scancode: Scancode,
    keycode: Keycode,
    modifiers: Modifiers,
    down: bool,
    repeat: bool,
}

impl KeyboardEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        window_id: u32,
        device_id: u32,
        scancode: Scancode,
        keycode: Keycode,
        modifiers: Modifiers,
        down: bool,
        repeat: bool,
    ) -> Self {
        Self {
            timestamp: Timestamp::now(),
            window_id,
            device_id,
            scancode,
            keycode,
            modifiers,
            down,
            repeat,
        }
    }

    /// Replaces the timestamp (consumes self).
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn window_id(&self) -> u32 {
        self.window_id
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn scancode(&self) -> Scancode {
        self.scancode
    }

    pub fn keycode(&self) -> Keycode {
        self.keycode
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// `true` for press, `false` for release.
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// `true` when generated by key auto-repeat.
    pub fn is_repeat(&self) -> bool {
        self.repeat
    }
}

impl Event for KeyboardEvent {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

//=== SpecificKey =========================================================

/// A keyboard event narrowed to one key and one press state.
///
/// Handlers registered for `KeyboardEvent` also receive these through
/// the base view.
///
/// ```
/// use aetheric_events::core::event::{KeyDown, KeyboardEvent};
/// use aetheric_events::core::event::keys::{self, Keycode, Modifiers, Scancode};
///
/// let raw = KeyboardEvent::new(1, 0, Scancode::Escape, Keycode::Escape,
///                              Modifiers::NONE, true, false);
/// assert!(KeyDown::<keys::Escape>::from_keyboard(&raw).is_some());
/// assert!(KeyDown::<keys::Space>::from_keyboard(&raw).is_none());
/// ```
pub struct SpecificKey<K: KeyMarker, const DOWN: bool> {
    keyboard: KeyboardEvent,
    _key: PhantomData<K>,
}

/// Press of key `K`.
pub type KeyDown<K> = SpecificKey<K, true>;

/// Release of key `K`.
pub type KeyUp<K> = SpecificKey<K, false>;

impl<K: KeyMarker, const DOWN: bool> SpecificKey<K, DOWN> {
    /// Narrows `event` if it is key `K` in state `DOWN`.
    pub fn from_keyboard(event: &KeyboardEvent) -> Option<Self> {
        (event.keycode() == K::KEYCODE && event.is_down() == DOWN).then(|| Self {
            keyboard: *event,
            _key: PhantomData,
        })
    }

    /// The underlying keyboard event.
    pub fn keyboard(&self) -> &KeyboardEvent {
        &self.keyboard
    }
}

impl<K: KeyMarker, const DOWN: bool> Deref for SpecificKey<K, DOWN> {
    type Target = KeyboardEvent;

    fn deref(&self) -> &KeyboardEvent {
        &self.keyboard
    }
}

impl<K: KeyMarker, const DOWN: bool> fmt::Debug for SpecificKey<K, DOWN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificKey")
            .field("key", &K::KEYCODE)
            .field("down", &DOWN)
            .field("keyboard", &self.keyboard)
            .finish()
    }
}

impl<K: KeyMarker, const DOWN: bool> Event for SpecificKey<K, DOWN> {
    fn timestamp(&self) -> Timestamp {
        self.keyboard.timestamp()
    }

    fn visit_bases<'a>(&'a self, visitor: &mut dyn FnMut(TypeId, &'a dyn Any)) {
        visitor(TypeId::of::<KeyboardEvent>(), &self.keyboard);
    }
}

//=== UserEvent ===========================================================

/// Opaque application data attached to a [`UserEvent`].
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Generic application-defined event.
///
/// Carries a free-form `code`, an optional window and optional shared
/// data. The platform kind is `EventKind::USER` unless the event is the
/// base of a [`CustomUserEvent`].
#[derive(Clone)]
pub struct UserEvent {
    timestamp: Timestamp,
    kind: u32,
    window_id: u32,
    code: i32,
    data: Option<UserData>,
}

impl UserEvent {
    pub fn new(code: i32) -> Self {
        Self::with_kind(EventKind::USER, code)
    }

    pub(crate) fn with_kind(kind: u32, code: i32) -> Self {
        Self {
            timestamp: Timestamp::now(),
            kind,
            window_id: 0,
            code,
            data: None,
        }
    }

    /// Associates the event with a window (consumes self).
    pub fn with_window(mut self, window_id: u32) -> Self {
        self.window_id = window_id;
        self
    }

    /// Attaches shared data (consumes self).
    pub fn with_data(mut self, data: UserData) -> Self {
        self.data = Some(data);
        self
    }

    /// Replaces the timestamp (consumes self).
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Platform kind this event travels under.
    pub fn kind(&self) -> u32 {
        self.kind
    }

    pub fn window_id(&self) -> u32 {
        self.window_id
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn data(&self) -> Option<&UserData> {
        self.data.as_ref()
    }

    /// Borrows the attached data as `T`.
    pub fn data_as<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|data| data.downcast_ref::<T>())
    }
}

impl fmt::Debug for UserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEvent")
            .field("timestamp", &self.timestamp)
            .field("kind", &format_args!("{:#06x}", self.kind))
            .field("window_id", &self.window_id)
            .field("code", &self.code)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

impl Event for UserEvent {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

//=== UserEventKind =======================================================

/// Events that may be posted through the bus.
///
/// Implemented by [`UserEvent`] and every [`CustomUserEvent`].
pub trait UserEventKind: Event {
    /// The generic user event this one is (or is built on).
    fn user_event(&self) -> &UserEvent;
}

impl UserEventKind for UserEvent {
    fn user_event(&self) -> &UserEvent {
        self
    }
}

//=== CustomUserEvent =====================================================

/// Strongly typed user event carrying a payload `T`.
///
/// Each distinct `T` travels under its own platform kind, allocated on
/// first use and stable for the life of the process. Publishing and
/// consuming a `CustomUserEvent<T>` hands back the very same instance.
///
/// ```
/// use aetheric_events::core::event::CustomUserEvent;
///
/// #[derive(Debug, PartialEq)]
/// struct Scored { points: u32 }
///
/// let event = CustomUserEvent::new(Scored { points: 3 });
/// assert_eq!(event.points, 3);
/// assert_eq!(event.kind(), CustomUserEvent::<Scored>::event_kind());
/// ```
pub struct CustomUserEvent<T: Send + fmt::Debug + 'static> {
    user: UserEvent,
    payload: T,
}

impl<T: Send + fmt::Debug + 'static> CustomUserEvent<T> {
    pub fn new(payload: T) -> Self {
        Self::with_code(payload, 0)
    }

    /// Creates the event with an explicit user `code`.
    pub fn with_code(payload: T, code: i32) -> Self {
        Self {
            user: UserEvent::with_kind(Self::event_kind(), code),
            payload,
        }
    }

    /// Associates the event with a window (consumes self).
    pub fn with_window(mut self, window_id: u32) -> Self {
        self.user = self.user.with_window(window_id);
        self
    }

    /// The platform kind shared by every `CustomUserEvent<T>`.
    pub fn event_kind() -> u32 {
        registry::kind_of::<T>()
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn kind(&self) -> u32 {
        self.user.kind()
    }

    pub fn window_id(&self) -> u32 {
        self.user.window_id()
    }

    pub fn code(&self) -> i32 {
        self.user.code()
    }
}

impl<T: Send + fmt::Debug + 'static> Deref for CustomUserEvent<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.payload
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for CustomUserEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomUserEvent")
            .field("user", &self.user)
            .field("payload", &self.payload)
            .finish()
    }
}

impl<T: Send + fmt::Debug + 'static> Event for CustomUserEvent<T> {
    fn timestamp(&self) -> Timestamp {
        self.user.timestamp()
    }

    fn visit_bases<'a>(&'a self, visitor: &mut dyn FnMut(TypeId, &'a dyn Any)) {
        visitor(TypeId::of::<UserEvent>(), &self.user);
    }
}

impl<T: Send + fmt::Debug + 'static> UserEventKind for CustomUserEvent<T> {
    fn user_event(&self) -> &UserEvent {
        &self.user
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
