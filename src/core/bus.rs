//=========================================================================
// Event Bus
//
// Source of typed events and sink for application-posted ones.
//
// Architecture:
// ```text
//   any thread                        event thread
//   ┌────────────────────┐           ┌───────────────────────────────┐
//   │ EventPublisher     │           │ EventBus                      │
//   │  publish(E) ───────┼──► queue ─┼─► wait()/poll() ─► adaptor ─► │ Box<dyn Event>
//   └────────────────────┘    (raw)  │                               │
//   host loop ── deliver(raw) ───────┼─► route callback (push mode)  │
//                                    └───────────────────────────────┘
// ```
//
// The queue is a bounded crossbeam channel of `RawEvent` records. A
// published event travels inside its record and the adaptor hands the
// same instance back out, so subclass fields survive the round trip.
//
// Thread Safety:
// `EventPublisher` (and `EventBus::publish` through it) is the only
// surface meant for other threads. The bus itself is `!Send` and stays
// on the event thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use log::{debug, error, info, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::adaptor::{self, EventKind, RawEvent, RawPayload};
use crate::core::error::{BusError, PublishError, PublishReason};
use crate::core::event::{Event, UserEventKind};

//=== Constants ===========================================================

/// Default number of raw records the queue holds before `publish` fails.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

//=== Type Aliases ========================================================

/// Sink for converted events in push mode.
pub type RouteCallback = Box<dyn FnMut(Box<dyn Event>)>;

type Waker = Arc<dyn Fn() + Send + Sync>;

//=== EventBusBuilder =====================================================

/// Builder for configuring and constructing an [`EventBus`].
///
/// # Default Values
///
/// - **Queue capacity**: 4096 raw records
///
/// # Examples
///
/// ```
/// use aetheric_events::core::bus::EventBusBuilder;
///
/// let bus = EventBusBuilder::new()
///     .with_capacity(256)
///     .build();
/// assert_eq!(bus.capacity(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct EventBusBuilder {
    capacity: usize,
}

impl EventBusBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Sets how many records may be queued before posting fails.
    ///
    /// Larger values absorb bursts from background producers at the cost
    /// of memory; the channel allocates its slots up front.
    ///
    /// Default: 4096
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Queue capacity must be positive");
        self.capacity = capacity;
        self
    }

    /// Builds the bus.
    pub fn build(self) -> EventBus {
        info!(target: "bus", "Event bus created (capacity: {})", self.capacity);

        let (sender, receiver) = bounded(self.capacity);
        EventBus {
            sender,
            receiver,
            route_callback: None,
            waker: Arc::new(OnceLock::new()),
            capacity: self.capacity,
        }
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a bus with default settings.
pub fn create_event_bus() -> EventBus {
    EventBusBuilder::new().build()
}

//=== EventPublisher ======================================================

/// Cloneable, thread-safe handle for posting user events to a bus.
///
/// Each publisher preserves its own posting order; events from different
/// publishers interleave in arrival order.
#[derive(Clone)]
pub struct EventPublisher {
    sender: Sender<RawEvent>,
    waker: Arc<OnceLock<Waker>>,
}

impl EventPublisher {
    /// Posts `event` for delivery on the event thread.
    ///
    /// Ownership moves into the queue; the consumer receives this exact
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] holding `event` if the queue is full or
    /// the bus is gone.
    pub fn publish<E: UserEventKind>(&self, event: E) -> Result<(), PublishError<E>> {
        let user = event.user_event();
        let (kind, window_id, code) = (user.kind(), user.window_id(), user.code());
        let raw = RawEvent::carrying(kind, window_id, code, Box::new(event));

        match self.sender.try_send(raw) {
            Ok(()) => {
                trace!(target: "bus", "Published user event (kind {:#06x})", kind);
                if let Some(wake) = self.waker.get() {
                    wake();
                }
                Ok(())
            }
            Err(err) => {
                let reason = match &err {
                    TrySendError::Full(_) => PublishReason::QueueFull,
                    TrySendError::Disconnected(_) => PublishReason::Disconnected,
                };
                warn!(target: "bus", "Publish of kind {:#06x} rejected: {}", kind, reason);
                Err(PublishError::new(reclaim(err.into_inner()), reason))
            }
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("queued", &self.sender.len())
            .field("has_waker", &self.waker.get().is_some())
            .finish()
    }
}

/// Takes the typed event back out of a record `publish` just built.
fn reclaim<E: Event>(raw: RawEvent) -> E {
    match raw.payload {
        RawPayload::User {
            event: Some(event), ..
        } => match event.downcast::<E>() {
            Ok(event) => *event,
            Err(_) => unreachable!("record carries the event publish put in it"),
        },
        _ => unreachable!("publish always builds a carrying user record"),
    }
}

//=== EventBus ============================================================

/// Produces typed events from the platform queue.
///
/// # Modes
///
/// - **Pull**: the owner calls [`wait`](Self::wait) or [`poll`](Self::poll).
/// - **Push**: a host loop calls [`deliver`](Self::deliver) with each raw
///   record; with a route callback installed the converted event goes
///   straight to it. [`pump`](Self::pump) flushes queued records (posted
///   user events) through the same callback.
pub struct EventBus {
    sender: Sender<RawEvent>,
    receiver: Receiver<RawEvent>,
    route_callback: Option<RouteCallback>,
    waker: Arc<OnceLock<Waker>>,
    capacity: usize,
}

impl EventBus {
    //--- Pull Mode --------------------------------------------------------

    /// Blocks until an event is available and returns it.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownEventKind`] if the record is not modelled; the
    /// record is consumed and the caller should simply wait again.
    pub fn wait(&mut self) -> Result<Box<dyn Event>, BusError> {
        match self.receiver.recv() {
            Ok(raw) => Self::convert(raw),
            Err(_) => fatal_disconnect(),
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<Box<dyn Event>>, BusError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(raw) => Self::convert(raw).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => fatal_disconnect(),
        }
    }

    /// Returns the next event without blocking, `None` if the queue is empty.
    ///
    /// # Errors
    ///
    /// Same as [`wait`](Self::wait).
    pub fn poll(&mut self) -> Result<Option<Box<dyn Event>>, BusError> {
        match self.receiver.try_recv() {
            Ok(raw) => Self::convert(raw).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => fatal_disconnect(),
        }
    }

    /// Returns `true` if at least one record is queued.
    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Number of queued records.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Queue capacity this bus was built with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    //--- Publishing -------------------------------------------------------

    /// Posts a user event. See [`EventPublisher::publish`].
    pub fn publish<E: UserEventKind>(&self, event: E) -> Result<(), PublishError<E>> {
        self.publisher().publish(event)
    }

    /// Returns a handle other threads can publish through.
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            sender: self.sender.clone(),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Installs a hook every publisher calls after a successful post.
    ///
    /// Push-mode hosts use it to wake their loop. Only the first call
    /// takes effect; returns `false` if a waker was already set.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) -> bool {
        self.waker.set(Arc::new(waker)).is_ok()
    }

    //--- Push Mode --------------------------------------------------------

    /// Installs the sink used by [`deliver`](Self::deliver) and
    /// [`pump`](Self::pump), replacing any previous one.
    pub fn set_route_callback(&mut self, callback: impl FnMut(Box<dyn Event>) + 'static) {
        debug!(target: "bus", "Route callback installed");
        self.route_callback = Some(Box::new(callback));
    }

    /// Removes the route callback; `deliver` falls back to queueing.
    pub fn clear_route_callback(&mut self) {
        self.route_callback = None;
    }

    /// Returns `true` if a route callback is installed.
    pub fn has_route_callback(&self) -> bool {
        self.route_callback.is_some()
    }

    /// Hands one raw record from the host loop to the bus.
    ///
    /// With a route callback the converted event is passed to it
    /// synchronously; without one the record is queued for pull mode.
    /// Unknown records are logged and dropped.
    pub fn deliver(&mut self, raw: RawEvent) {
        let Some(callback) = self.route_callback.as_mut() else {
            if let Err(err) = self.sender.try_send(raw) {
                warn!(
                    target: "bus",
                    "Queue rejected {} record, dropping it",
                    EventKind::name(err.into_inner().kind)
                );
            }
            return;
        };

        match Self::convert(raw) {
            Ok(event) => callback(event),
            Err(err) => debug!(target: "bus", "Dropped delivered record: {}", err),
        }
    }

    /// Routes every record queued at call time through the callback.
    ///
    /// Records posted while pumping wait for the next call. Returns the
    /// number of events handed to the callback; 0 without a callback.
    pub fn pump(&mut self) -> usize {
        let Some(callback) = self.route_callback.as_mut() else {
            return 0;
        };

        let mut routed = 0;
        for _ in 0..self.receiver.len() {
            let raw = match self.receiver.try_recv() {
                Ok(raw) => raw,
                Err(_) => break,
            };
            match Self::convert(raw) {
                Ok(event) => {
                    callback(event);
                    routed += 1;
                }
                Err(err) => debug!(target: "bus", "Dropped queued record: {}", err),
            }
        }
        routed
    }

    //--- Testing Back Door ------------------------------------------------

    /// Queues a synthetic raw record as if the platform produced it.
    ///
    /// Intended for tests and tooling; the record takes the same path
    /// through the adaptor as a real one.
    ///
    /// # Errors
    ///
    /// Returns the record if the queue is full.
    pub fn inject_event(&self, payload: RawPayload, kind: u32) -> Result<(), PublishError<RawEvent>> {
        self.sender
            .try_send(RawEvent::new(kind, payload))
            .map_err(|err| match err {
                TrySendError::Full(raw) => PublishError::new(raw, PublishReason::QueueFull),
                TrySendError::Disconnected(raw) => {
                    PublishError::new(raw, PublishReason::Disconnected)
                }
            })
    }

    //--- Internal Helpers -------------------------------------------------

    fn convert(raw: RawEvent) -> Result<Box<dyn Event>, BusError> {
        let kind = raw.kind;
        adaptor::convert(raw).ok_or(BusError::UnknownEventKind { kind })
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("pending", &self.receiver.len())
            .field("push_mode", &self.route_callback.is_some())
            .finish()
    }
}

/// The bus owns a sender, so its own receiver can never disconnect.
/// Reaching this means the queue is corrupt; there is nothing to recover.
fn fatal_disconnect() -> ! {
    error!(target: "bus", "Event queue disconnected while the bus is alive, aborting");
    std::process::abort()
}

//=========================================================================
// Unit Tests
//=========================================================================
