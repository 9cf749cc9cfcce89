//=========================================================================
// Event Router
//=========================================================================
//
// Owns the bus and dispatches each event to every interested handler.
//
// Architecture:
//   EventBus ──wait/poll──► EventRouter ──dispatch──► handlers
//                               │
//                               └─ Rc<RouterCore> ◄── Weak ── EventRegistration
//                                                 ◄── Weak ── RouterHandle
//
// Dispatch order for one event:
//   1. Handlers keyed by the concrete type, in registration order
//   2. Handlers keyed by each base view the event exposes, nearest first
//   3. Catch-all (`dyn Event`) handlers
// Each handler object runs at most once per event even when registered
// under several of these keys.
//
// Re-entrancy:
//   Handlers may register and unregister while an event is in flight.
//   New registrations take effect from the next event; removals take
//   effect immediately for handlers that have not yet run.
//
// State machine:
//   Idle ──run()──► Running ──QuitEvent──► Terminating ──► Idle
//   any ──drop──► Destroyed
//
// The router is single-threaded (`Rc`, `RefCell`). Producers on other
// threads reach it through `EventPublisher`.
//
//=========================================================================

//=== Submodules ==========================================================

mod registration;
mod registry;

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use log::{debug, error, info, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::bus::EventBus;
use crate::core::event::{Event, QuitEvent};
use crate::core::handler::{EventHandler, IntoHandlerResult};

use registry::{
    ErasedHandler, FnHandler, HandlerRecord, HandlerRegistry, Identity, Invocation,
    WeakDynHandler, WeakHandler,
};

//=== Public Re-exports ===================================================

pub use registration::EventRegistration;
pub use registry::HandlerId;

//=== RouterState =========================================================

/// Lifecycle of an [`EventRouter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// Not inside [`EventRouter::run`].
    Idle,

    /// Inside the blocking loop.
    Running,

    /// A quit event was dispatched; the loop is about to return.
    Terminating,

    /// The router has been dropped. Only observable through a
    /// [`RouterHandle`].
    Destroyed,
}

//=== ProcessOutcome ======================================================

/// Result of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing was pending.
    Empty,

    /// A record was consumed but the library does not model its kind.
    Skipped,

    /// An event was dispatched.
    Dispatched,

    /// A quit event was dispatched.
    Quit,
}

//=== RouterCore ==========================================================

/// Shared router state. Registrations and handles refer to it weakly.
pub(crate) struct RouterCore {
    registry: RefCell<HandlerRegistry>,
    state: Cell<RouterState>,
    quit_requested: Cell<bool>,
}

impl RouterCore {
    fn new() -> Self {
        Self {
            registry: RefCell::new(HandlerRegistry::new()),
            state: Cell::new(RouterState::Idle),
            quit_requested: Cell::new(false),
        }
    }

    //--- Registration -----------------------------------------------------

    fn insert(
        self: &Rc<Self>,
        key: TypeId,
        identity: Identity,
        name: &'static str,
        handler: Box<dyn ErasedHandler>,
    ) -> EventRegistration {
        let id = self.registry.borrow_mut().insert(key, identity, name, handler);
        debug!(target: "router", "Registered handler #{} for {}", id, name);
        EventRegistration::new(Rc::downgrade(self), id)
    }

    fn register_dyn_handler<H>(self: &Rc<Self>, handler: &Rc<RefCell<H>>) -> EventRegistration
    where
        H: EventHandler<dyn Event> + 'static,
    {
        self.insert(
            TypeId::of::<dyn Event>(),
            Identity::of(handler),
            "dyn Event",
            Box::new(WeakDynHandler::new(handler)),
        )
    }

    fn register_handler<E, H>(self: &Rc<Self>, handler: &Rc<RefCell<H>>) -> EventRegistration
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        self.insert(
            TypeId::of::<E>(),
            Identity::of(handler),
            std::any::type_name::<E>(),
            Box::new(WeakHandler::<E, H>::new(handler)),
        )
    }

    fn register_fn<E, F, R>(self: &Rc<Self>, callback: F) -> EventRegistration
    where
        E: Event,
        F: FnMut(&E) -> R + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.insert(
            TypeId::of::<E>(),
            Identity::Owned,
            std::any::type_name::<E>(),
            Box::new(FnHandler::<E, F>::new(callback)),
        )
    }

    /// Removes handler `id`. Returns `false` if it was not registered.
    pub(crate) fn unregister(&self, id: HandlerId) -> bool {
        let removed = self.registry.borrow_mut().remove(id);
        match removed {
            Some(record) => {
                debug!(target: "router", "Unregistered handler #{} for {}", id, record.name);
                // Dropped here, after the registry borrow is released.
                drop(record);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_registered(&self, id: HandlerId) -> bool {
        self.registry.borrow().contains(id)
    }

    fn handler_count(&self, key: TypeId) -> usize {
        self.registry.borrow().count(key)
    }

    //--- Dispatch ---------------------------------------------------------

    /// Dispatches and then drops `event`.
    ///
    /// A quit event moves a running router to `Terminating` before its
    /// handlers run, so they can observe the shutdown.
    fn route(&self, event: Box<dyn Event>) -> ProcessOutcome {
        let is_quit = (*event).is::<QuitEvent>();
        if is_quit {
            info!(target: "router", "Quit requested");
            self.quit_requested.set(true);
            if self.state.get() == RouterState::Running {
                self.state.set(RouterState::Terminating);
            }
        }

        self.dispatch(&*event);
        drop(event);

        if is_quit {
            ProcessOutcome::Quit
        } else {
            ProcessOutcome::Dispatched
        }
    }

    fn dispatch(&self, event: &dyn Event) {
        let name = event.event_name();
        trace!(target: "router", "Dispatching {}", name);

        // Keys in dispatch order, each with the view handlers receive.
        let mut keys: Vec<(TypeId, &dyn Any)> = vec![(event.event_type(), event.as_any())];
        event.visit_bases(&mut |type_id, view| {
            if keys.iter().all(|(seen, _)| *seen != type_id) {
                keys.push((type_id, view));
            }
        });
        keys.push((TypeId::of::<dyn Event>(), event.as_any()));

        // Snapshot every list up front so handlers registered during this
        // dispatch, under any key, wait for the next event.
        let batches: Vec<(Vec<Rc<HandlerRecord>>, &dyn Any)> = {
            let registry = self.registry.borrow();
            keys.iter()
                .map(|(key, view)| (registry.snapshot(*key), *view))
                .collect()
        };

        let mut invoked: Vec<usize> = Vec::new();
        for (records, view) in batches {
            for record in records {
                self.invoke(&record, event, view, &mut invoked);
            }
        }
    }

    fn invoke(&self, record: &HandlerRecord, event: &dyn Event, view: &dyn Any, invoked: &mut Vec<usize>) {
        if !record.is_active() {
            return;
        }
        if let Identity::Object(address) = record.identity {
            if invoked.contains(&address) {
                trace!(target: "router", "Handler #{} already saw this event", record.id);
                return;
            }
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| record.invoke(event, view)));
        if let Identity::Object(address) = record.identity {
            invoked.push(address);
        }

        match outcome {
            Ok(Invocation::Ran(Ok(()))) => {}
            Ok(Invocation::Ran(Err(err))) => {
                warn!(
                    target: "router",
                    "Handler #{} failed on {}: {}",
                    record.id,
                    event.event_name(),
                    err
                );
            }
            Ok(Invocation::Gone) => {
                debug!(target: "router", "Handler #{} was dropped by its owner; removing", record.id);
                self.unregister(record.id);
            }
            Ok(Invocation::Busy) => {
                warn!(
                    target: "router",
                    "Handler #{} is already running; skipping nested {}",
                    record.id,
                    event.event_name()
                );
            }
            Ok(Invocation::Mismatch) => {
                error!(
                    target: "router",
                    "Handler #{} registered for {} was offered {}",
                    record.id,
                    record.name,
                    event.event_name()
                );
            }
            Err(payload) => {
                error!(
                    target: "router",
                    "Handler #{} panicked on {}: {}",
                    record.id,
                    event.event_name(),
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

//=== RouterHandle ========================================================

/// Non-owning handle to a router, for registering from inside handlers.
///
/// Cloneable and cheap. Every operation degrades gracefully once the
/// router is gone: registrations come back inert and routing is a no-op.
#[derive(Clone)]
pub struct RouterHandle {
    core: Weak<RouterCore>,
}

impl RouterHandle {
    /// Returns `true` while the router exists.
    pub fn is_alive(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Current router state, [`RouterState::Destroyed`] once dropped.
    pub fn state(&self) -> RouterState {
        self.core
            .upgrade()
            .map_or(RouterState::Destroyed, |core| core.state.get())
    }

    /// See [`EventRouter::register_dyn_handler`].
    #[must_use = "dropping the registration unregisters the handler"]
    pub fn register_dyn_handler<H>(&self, handler: &Rc<RefCell<H>>) -> EventRegistration
    where
        H: EventHandler<dyn Event> + 'static,
    {
        match self.core.upgrade() {
            Some(core) => core.register_dyn_handler(handler),
            None => EventRegistration::inert(),
        }
    }

    /// See [`EventRouter::register_handler`].
    #[must_use = "dropping the registration unregisters the handler"]
    pub fn register_handler<E, H>(&self, handler: &Rc<RefCell<H>>) -> EventRegistration
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        match self.core.upgrade() {
            Some(core) => core.register_handler::<E, H>(handler),
            None => EventRegistration::inert(),
        }
    }

    /// See [`EventRouter::register_fn`].
    #[must_use = "dropping the registration unregisters the handler"]
    pub fn register_fn<E, F, R>(&self, callback: F) -> EventRegistration
    where
        E: Event,
        F: FnMut(&E) -> R + 'static,
        R: IntoHandlerResult + 'static,
    {
        match self.core.upgrade() {
            Some(core) => core.register_fn::<E, F, R>(callback),
            None => EventRegistration::inert(),
        }
    }

    /// Dispatches `event` immediately. Returns `None` if the router is gone.
    pub fn route_event(&self, event: Box<dyn Event>) -> Option<ProcessOutcome> {
        match self.core.upgrade() {
            Some(core) => Some(core.route(event)),
            None => {
                debug!(target: "router", "Router gone; dropping {}", (*event).event_name());
                None
            }
        }
    }
}

//=== EventRouter =========================================================

/// Routes events from its [`EventBus`] to registered handlers.
///
/// # Examples
///
/// ```
/// use aetheric_events::core::bus::create_event_bus;
/// use aetheric_events::core::event::{QuitEvent, UserEvent};
/// use aetheric_events::core::router::EventRouter;
///
/// let mut router = EventRouter::new(create_event_bus());
/// let _registration = router.register_fn(|event: &UserEvent| {
///     println!("user event {}", event.code());
/// });
///
/// router.bus().publish(UserEvent::new(7)).unwrap();
/// router.bus().publish(UserEvent::new(0)).unwrap();
/// router.route_event(Box::new(QuitEvent::new()));
/// while router.has_events() {
///     router.process_next_event();
/// }
/// ```
pub struct EventRouter {
    core: Rc<RouterCore>,
    bus: EventBus,
}

impl EventRouter {
    /// Takes ownership of `bus`.
    pub fn new(bus: EventBus) -> Self {
        info!(target: "router", "Event router created (queue capacity {})", bus.capacity());
        Self {
            core: Rc::new(RouterCore::new()),
            bus,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Weak handle for use inside handlers.
    pub fn handle(&self) -> RouterHandle {
        RouterHandle {
            core: Rc::downgrade(&self.core),
        }
    }

    pub fn state(&self) -> RouterState {
        self.core.state.get()
    }

    /// Returns `true` once a quit event has been dispatched.
    ///
    /// Sticky until [`EventRouter::clear_quit_request`] or the next
    /// [`EventRouter::run`].
    pub fn quit_requested(&self) -> bool {
        self.core.quit_requested.get()
    }

    pub fn clear_quit_request(&self) {
        self.core.quit_requested.set(false);
    }

    /// Number of handlers registered for exactly `E` (not its bases).
    ///
    /// `handler_count::<dyn Event>()` counts catch-all handlers.
    pub fn handler_count<E: ?Sized + 'static>(&self) -> usize {
        self.core.handler_count(TypeId::of::<E>())
    }

    //--- Registration -----------------------------------------------------

    /// Registers `handler` for every event.
    ///
    /// The router holds the handler weakly; dropping the last `Rc` silently
    /// retires the registration.
    #[must_use = "dropping the registration unregisters the handler"]
    pub fn register_dyn_handler<H>(&self, handler: &Rc<RefCell<H>>) -> EventRegistration
    where
        H: EventHandler<dyn Event> + 'static,
    {
        self.core.register_dyn_handler(handler)
    }

    /// Registers `handler` for events of type `E`, or events exposing `E`
    /// as a base view.
    ///
    /// The router holds the handler weakly. One object may be registered
    /// for several types and still runs once per event.
    #[must_use = "dropping the registration unregisters the handler"]
    pub fn register_handler<E, H>(&self, handler: &Rc<RefCell<H>>) -> EventRegistration
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        self.core.register_handler::<E, H>(handler)
    }

    /// Registers a closure for events of type `E`. The router owns it.
    ///
    /// The closure may return `()` or `Result<(), impl Into<HandlerError>>`.
    #[must_use = "dropping the registration unregisters the handler"]
    pub fn register_fn<E, F, R>(&self, callback: F) -> EventRegistration
    where
        E: Event,
        F: FnMut(&E) -> R + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.core.register_fn::<E, F, R>(callback)
    }

    //--- Dispatch ---------------------------------------------------------

    /// Blocks, dispatching events until a [`QuitEvent`] has been handled.
    ///
    /// Records of unknown kind are logged and skipped. Returns immediately
    /// if the router is already running.
    pub fn run(&mut self) {
        let state = self.core.state.get();
        if state != RouterState::Idle {
            warn!(target: "router", "run() ignored: router is {:?}", state);
            return;
        }

        self.core.quit_requested.set(false);
        self.core.state.set(RouterState::Running);
        info!(target: "router", "Event loop started");

        loop {
            match self.bus.wait() {
                Ok(event) => {
                    self.core.route(event);
                }
                Err(err) => warn!(target: "router", "{}; continuing", err),
            }
            // Also set by a quit routed re-entrantly from a handler.
            if self.core.quit_requested.get() {
                break;
            }
        }

        self.core.state.set(RouterState::Idle);
        info!(target: "router", "Event loop stopped");
    }

    /// Returns `true` if the bus has queued records.
    pub fn has_events(&self) -> bool {
        self.bus.has_pending()
    }

    /// Dispatches at most one queued event without blocking.
    pub fn process_next_event(&mut self) -> ProcessOutcome {
        match self.bus.poll() {
            Ok(Some(event)) => self.core.route(event),
            Ok(None) => ProcessOutcome::Empty,
            Err(err) => {
                warn!(target: "router", "{}; skipped", err);
                ProcessOutcome::Skipped
            }
        }
    }

    /// Dispatches `event` immediately, bypassing the queue.
    pub fn route_event(&self, event: Box<dyn Event>) -> ProcessOutcome {
        self.core.route(event)
    }

    /// Makes the bus hand events straight to this router instead of
    /// queueing them (push mode).
    pub fn install_route_callback(&mut self) {
        let handle = self.handle();
        self.bus.set_route_callback(move |event| {
            handle.route_event(event);
        });
        debug!(target: "router", "Route callback installed");
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        self.core.state.set(RouterState::Destroyed);
        self.bus.clear_route_callback();

        let records = self.core.registry.borrow_mut().drain();
        let count = records.len();
        // Dropped after the borrow; owned closures may hold registrations.
        drop(records);

        info!(target: "router", "Event router destroyed ({} handlers released)", count);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adaptor::{EventKind, RawEvent, RawPayload};
    use crate::core::bus::{create_event_bus, EventBusBuilder};
    use crate::core::event::keys::{self, Keycode, Modifiers, Scancode};
    use crate::core::event::{CustomUserEvent, KeyDown, KeyboardEvent, UserEvent};
    use crate::core::handler::HandlerResult;

    #[derive(Debug)]
    struct Ping(u32);

    type Log = Rc<RefCell<Vec<String>>>;

    fn router() -> EventRouter {
        EventRouter::new(create_event_bus())
    }

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn ping(n: u32) -> Box<dyn Event> {
        Box::new(CustomUserEvent::new(Ping(n)))
    }

    fn escape_down() -> KeyboardEvent {
        KeyboardEvent::new(0, 0, Scancode::Escape, Keycode::Escape, Modifiers::NONE, true, false)
    }

    /// Handler object recording every event it sees.
    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl EventHandler<dyn Event> for Recorder {
        fn handle_event(&mut self, event: &dyn Event) -> HandlerResult {
            self.log.borrow_mut().push(format!("{}:{}", self.name, event.event_name()));
            Ok(())
        }
    }

    impl EventHandler<UserEvent> for Recorder {
        fn handle_event(&mut self, event: &UserEvent) -> HandlerResult {
            self.log.borrow_mut().push(format!("{}:user:{}", self.name, event.code()));
            Ok(())
        }
    }

    impl EventHandler<CustomUserEvent<Ping>> for Recorder {
        fn handle_event(&mut self, event: &CustomUserEvent<Ping>) -> HandlerResult {
            self.log.borrow_mut().push(format!("{}:ping:{}", self.name, event.0));
            Ok(())
        }
    }

    //=====================================================================
    // Ordering
    //=====================================================================

    #[test]
    fn handlers_run_in_registration_order() {
        let router = router();
        let log = log();
        let mut registrations = Vec::new();
        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            registrations.push(router.register_fn(move |_: &QuitEvent| log.borrow_mut().push(name.into())));
        }

        router.route_event(Box::new(QuitEvent::new()));
        assert_eq!(*log.borrow(), ["first", "second", "third"]);
    }

    #[test]
    fn concrete_then_base_then_catch_all() {
        let router = router();
        let log = log();

        let l = Rc::clone(&log);
        let _all = router.register_fn(move |_: &QuitEvent| l.borrow_mut().push("never".into()));
        let l = Rc::clone(&log);
        let _base = router.register_fn(move |e: &UserEvent| l.borrow_mut().push(format!("base:{}", e.code())));
        let l = Rc::clone(&log);
        let _concrete =
            router.register_fn(move |e: &CustomUserEvent<Ping>| l.borrow_mut().push(format!("concrete:{}", e.0)));
        let catch_all = Rc::new(RefCell::new(Recorder { name: "all", log: Rc::clone(&log) }));
        let _dyn = router.register_dyn_handler(&catch_all);

        router.route_event(Box::new(CustomUserEvent::with_code(Ping(4), 9)));

        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0], "concrete:4");
        assert_eq!(log[1], "base:9");
        assert!(log[2].starts_with("all:"));
    }

    #[test]
    fn specific_key_reaches_keyboard_handlers() {
        let router = router();
        let seen = Rc::new(Cell::new(0));

        let s = Rc::clone(&seen);
        let _keyboard = router.register_fn(move |e: &KeyboardEvent| {
            assert_eq!(e.keycode(), Keycode::Escape);
            s.set(s.get() + 1);
        });
        let s = Rc::clone(&seen);
        let _escape = router.register_fn(move |_: &KeyDown<keys::Escape>| s.set(s.get() + 10));

        let narrowed = KeyDown::<keys::Escape>::from_keyboard(&escape_down()).unwrap();
        router.route_event(Box::new(narrowed));
        assert_eq!(seen.get(), 11);
    }

    //=====================================================================
    // Once Per Event
    //=====================================================================

    #[test]
    fn object_registered_for_several_types_runs_once() {
        let router = router();
        let log = log();
        let recorder = Rc::new(RefCell::new(Recorder { name: "r", log: Rc::clone(&log) }));

        let _a = router.register_handler::<CustomUserEvent<Ping>, _>(&recorder);
        let _b = router.register_handler::<UserEvent, _>(&recorder);
        let _c = router.register_dyn_handler(&recorder);

        router.route_event(ping(1));
        assert_eq!(*log.borrow(), ["r:ping:1"]);

        // A plain user event only matches the base and catch-all keys.
        router.route_event(Box::new(UserEvent::new(3)));
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[1], "r:user:3");
    }

    #[test]
    fn distinct_closures_are_not_deduplicated() {
        let router = router();
        let count = Rc::new(Cell::new(0));
        let c1 = Rc::clone(&count);
        let c2 = Rc::clone(&count);
        let _a = router.register_fn(move |_: &UserEvent| c1.set(c1.get() + 1));
        let _b = router.register_fn(move |_: &UserEvent| c2.set(c2.get() + 1));

        router.route_event(Box::new(UserEvent::new(0)));
        assert_eq!(count.get(), 2);
    }

    //=====================================================================
    // Registration Lifetime
    //=====================================================================

    #[test]
    fn dropping_registration_stops_delivery() {
        let router = router();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let registration = router.register_fn(move |_: &QuitEvent| c.set(c.get() + 1));

        router.route_event(Box::new(QuitEvent::new()));
        drop(registration);
        router.route_event(Box::new(QuitEvent::new()));

        assert_eq!(count.get(), 1);
        assert_eq!(router.handler_count::<QuitEvent>(), 0);
    }

    #[test]
    fn dropped_handler_object_is_retired() {
        let router = router();
        let log = log();
        let recorder = Rc::new(RefCell::new(Recorder { name: "r", log: Rc::clone(&log) }));
        let registration = router.register_dyn_handler(&recorder);

        drop(recorder);
        router.route_event(Box::new(QuitEvent::new()));

        assert!(log.borrow().is_empty());
        assert!(!registration.is_registered());
        assert_eq!(router.handler_count::<dyn Event>(), 0);
    }

    #[test]
    fn handle_survives_router() {
        let router = router();
        let handle = router.handle();
        assert!(handle.is_alive());
        assert_eq!(handle.state(), RouterState::Idle);

        drop(router);
        assert!(!handle.is_alive());
        assert_eq!(handle.state(), RouterState::Destroyed);

        let registration = handle.register_fn(|_: &QuitEvent| {});
        assert!(!registration.is_registered());
        assert_eq!(handle.route_event(Box::new(QuitEvent::new())), None);
    }

    #[test]
    fn closure_owning_registration_drops_cleanly_with_router() {
        let router = router();
        let inner = router.register_fn(|_: &UserEvent| {});
        let _outer = router.register_fn(move |_: &QuitEvent| {
            let _keep = &inner;
        });
        drop(router);
    }

    //=====================================================================
    // Fault Isolation
    //=====================================================================

    #[test]
    fn failing_handler_does_not_stop_others() {
        let router = router();
        let reached = Rc::new(Cell::new(false));
        let _fails = router.register_fn(|_: &QuitEvent| -> Result<(), &'static str> { Err("nope") });
        let r = Rc::clone(&reached);
        let _after = router.register_fn(move |_: &QuitEvent| r.set(true));

        router.route_event(Box::new(QuitEvent::new()));
        assert!(reached.get());
    }

    #[test]
    fn panicking_handler_does_not_stop_others() {
        let router = router();
        let reached = Rc::new(Cell::new(false));
        let _panics = router.register_fn(|_: &QuitEvent| -> () { panic!("handler exploded") });
        let r = Rc::clone(&reached);
        let _after = router.register_fn(move |_: &QuitEvent| r.set(true));

        router.route_event(Box::new(QuitEvent::new()));
        assert!(reached.get());
    }

    #[test]
    fn panic_message_extracts_strings() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    //=====================================================================
    // Re-entrancy
    //=====================================================================

    #[test]
    fn registration_during_dispatch_waits_for_next_event() {
        let router = router();
        let handle = router.handle();
        let late_calls = Rc::new(Cell::new(0));
        let held: Rc<RefCell<Vec<EventRegistration>>> = Rc::default();

        let (calls, keep) = (Rc::clone(&late_calls), Rc::clone(&held));
        let _registrar = router.register_fn(move |_: &UserEvent| {
            let calls = Rc::clone(&calls);
            let late = handle.register_fn(move |_: &UserEvent| calls.set(calls.get() + 1));
            keep.borrow_mut().push(late);
        });

        router.route_event(Box::new(UserEvent::new(0)));
        assert_eq!(late_calls.get(), 0);

        router.route_event(Box::new(UserEvent::new(0)));
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn unregistration_during_dispatch_is_immediate() {
        let router = router();
        let victim_ran = Rc::new(Cell::new(false));
        let victim: Rc<RefCell<EventRegistration>> = Rc::default();

        let slot = Rc::clone(&victim);
        let _killer = router.register_fn(move |_: &QuitEvent| slot.borrow_mut().unregister());
        let ran = Rc::clone(&victim_ran);
        *victim.borrow_mut() = router.register_fn(move |_: &QuitEvent| ran.set(true));

        router.route_event(Box::new(QuitEvent::new()));
        assert!(!victim_ran.get());
        assert!(!victim.borrow().is_registered());
    }

    #[test]
    fn handler_may_unregister_itself() {
        let router = router();
        let count = Rc::new(Cell::new(0));
        let own: Rc<RefCell<EventRegistration>> = Rc::default();

        let (c, slot) = (Rc::clone(&count), Rc::clone(&own));
        *own.borrow_mut() = router.register_fn(move |_: &QuitEvent| {
            c.set(c.get() + 1);
            slot.borrow_mut().unregister();
        });

        router.route_event(Box::new(QuitEvent::new()));
        router.route_event(Box::new(QuitEvent::new()));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn nested_route_skips_running_handler() {
        let router = router();
        let handle = router.handle();
        let depth = Rc::new(Cell::new(0));

        let d = Rc::clone(&depth);
        let _nested = router.register_fn(move |e: &UserEvent| {
            d.set(d.get() + 1);
            if e.code() == 0 {
                handle.route_event(Box::new(UserEvent::new(1)));
            }
        });

        router.route_event(Box::new(UserEvent::new(0)));
        assert_eq!(depth.get(), 1);
    }

    //=====================================================================
    // Loop Control
    //=====================================================================

    #[test]
    fn process_next_event_reports_outcomes() {
        let mut router = router();
        assert_eq!(router.process_next_event(), ProcessOutcome::Empty);

        router.bus().publish(UserEvent::new(1)).unwrap();
        assert!(router.has_events());
        assert_eq!(router.process_next_event(), ProcessOutcome::Dispatched);
        assert!(!router.has_events());
    }

    #[test]
    fn run_stops_after_quit_and_leaves_rest_queued() {
        let mut router = EventRouter::new(EventBusBuilder::new().with_capacity(8).build());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let _pings = router.register_fn(move |e: &CustomUserEvent<Ping>| s.borrow_mut().push(e.0));
        let publisher = router.bus().publisher();

        publisher.publish(CustomUserEvent::new(Ping(1))).unwrap();
        router.bus().inject_event(RawPayload::None, EventKind::QUIT).unwrap();
        publisher.publish(CustomUserEvent::new(Ping(2))).unwrap();

        router.run();

        assert_eq!(*seen.borrow(), [1]);
        assert_eq!(router.state(), RouterState::Idle);
        assert!(router.quit_requested());
        assert!(router.has_events());
    }

    #[test]
    fn quit_handlers_observe_terminating() {
        let mut router = router();
        let handle = router.handle();
        let during_user = Rc::new(Cell::new(RouterState::Idle));
        let during_quit = Rc::new(Cell::new(RouterState::Idle));

        let (h, seen) = (handle.clone(), Rc::clone(&during_user));
        let _user = router.register_fn(move |_: &UserEvent| seen.set(h.state()));
        let seen = Rc::clone(&during_quit);
        let _quit = router.register_fn(move |_: &QuitEvent| seen.set(handle.state()));

        router.bus().publish(UserEvent::new(0)).unwrap();
        router.bus().inject_event(RawPayload::None, EventKind::QUIT).unwrap();
        router.run();

        assert_eq!(during_user.get(), RouterState::Running);
        assert_eq!(during_quit.get(), RouterState::Terminating);
        assert_eq!(router.state(), RouterState::Idle);
    }

    #[test]
    fn quit_outside_run_leaves_state_idle() {
        let router = router();
        let handle = router.handle();
        let during_quit = Rc::new(Cell::new(RouterState::Destroyed));

        let seen = Rc::clone(&during_quit);
        let _quit = router.register_fn(move |_: &QuitEvent| seen.set(handle.state()));

        assert_eq!(router.route_event(Box::new(QuitEvent::new())), ProcessOutcome::Quit);
        assert_eq!(during_quit.get(), RouterState::Idle);
        assert_eq!(router.state(), RouterState::Idle);
        assert!(router.quit_requested());
    }

    #[test]
    fn quit_routed_from_handler_ends_run() {
        let mut router = router();
        let handle = router.handle();
        let states = Rc::new(RefCell::new(Vec::new()));

        let seen = Rc::clone(&states);
        let _user = router.register_fn(move |e: &UserEvent| {
            seen.borrow_mut().push((e.code(), handle.state()));
            if e.code() == 1 {
                handle.route_event(Box::new(QuitEvent::new()));
            }
        });

        router.bus().publish(UserEvent::new(1)).unwrap();
        router.bus().publish(UserEvent::new(2)).unwrap();
        router.bus().inject_event(RawPayload::None, EventKind::QUIT).unwrap();
        router.run();

        assert_eq!(*states.borrow(), [(1, RouterState::Running)]);
        assert_eq!(router.state(), RouterState::Idle);
        assert!(router.quit_requested());
        assert!(router.has_events(), "later events stay queued");
    }

    #[test]
    fn push_mode_routes_without_queueing() {
        let mut router = router();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _quit = router.register_fn(move |_: &QuitEvent| c.set(c.get() + 1));

        router.install_route_callback();
        router.bus_mut().deliver(RawEvent::quit());

        assert_eq!(count.get(), 1);
        assert!(!router.has_events());
        assert!(router.quit_requested());
    }

    #[test]
    fn handler_count_tracks_exact_key() {
        let router = router();
        let _a = router.register_fn(|_: &UserEvent| {});
        let _b = router.register_fn(|_: &UserEvent| {});
        let _c = router.register_fn(|_: &CustomUserEvent<Ping>| {});
        assert_eq!(router.handler_count::<UserEvent>(), 2);
        assert_eq!(router.handler_count::<CustomUserEvent<Ping>>(), 1);
        assert_eq!(router.handler_count::<dyn Event>(), 0);
    }
}
