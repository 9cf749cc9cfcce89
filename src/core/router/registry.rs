//=========================================================================
// Handler Registry
//=========================================================================
//
// Ordered, type-keyed storage for handler records.
//
// Architecture:
//   lists: HashMap<TypeId, HandlerList>        (dispatch lookup)
//            └─ slots: Vec<Option<Rc<HandlerRecord>>>   (registration order)
//   index: HashMap<HandlerId, (TypeId, slot)>  (O(1) removal)
//
// Removal leaves a tombstone so every other slot index stays valid; a
// list is compacted once tombstones outnumber live records. Iteration
// always walks slots front to back, which is registration order.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

//=== Internal Dependencies ===============================================

use crate::core::event::Event;
use crate::core::handler::{EventHandler, HandlerResult, IntoHandlerResult};

//=== Constants ===========================================================

/// Tombstones tolerated in one list before compaction is considered.
const COMPACT_MIN_TOMBSTONES: usize = 16;

//=== Identifiers =========================================================

/// Router-unique handler id, increasing with each registration.
pub type HandlerId = u64;

/// What makes two records "the same handler" for once-per-event dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Identity {
    /// Externally owned object, by address.
    Object(usize),

    /// Router-owned closure; never equal to anything else.
    Owned,
}

impl Identity {
    pub(crate) fn of<H>(handler: &Rc<RefCell<H>>) -> Self {
        Self::Object(Rc::as_ptr(handler).cast::<()>() as usize)
    }
}

//=== Erased Handlers =====================================================

/// Result of offering an event to one record.
pub(crate) enum Invocation {
    /// The handler ran.
    Ran(HandlerResult),

    /// Externally owned handler was dropped by its owner.
    Gone,

    /// Handler object is already borrowed (re-entrant dispatch).
    Busy,

    /// View did not match the record's event type.
    Mismatch,
}

/// Object-safe face of every handler kind.
///
/// `event` is the arriving event; `view` is the event itself or the
/// base view the record is keyed under.
pub(crate) trait ErasedHandler {
    fn invoke(&mut self, event: &dyn Event, view: &dyn Any) -> Invocation;
}

//--- Closure --------------------------------------------------------------

pub(crate) struct FnHandler<E, F> {
    callback: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnHandler<E, F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            callback,
            _event: PhantomData,
        }
    }
}

impl<E, F, R> ErasedHandler for FnHandler<E, F>
where
    E: Any,
    F: FnMut(&E) -> R,
    R: IntoHandlerResult,
{
    fn invoke(&mut self, _event: &dyn Event, view: &dyn Any) -> Invocation {
        match view.downcast_ref::<E>() {
            Some(event) => Invocation::Ran((self.callback)(event).into_handler_result()),
            None => Invocation::Mismatch,
        }
    }
}

//--- Typed External Handler ----------------------------------------------

pub(crate) struct WeakHandler<E, H> {
    handler: Weak<RefCell<H>>,
    _event: PhantomData<fn(&E)>,
}

impl<E, H> WeakHandler<E, H> {
    pub(crate) fn new(handler: &Rc<RefCell<H>>) -> Self {
        Self {
            handler: Rc::downgrade(handler),
            _event: PhantomData,
        }
    }
}

impl<E, H> ErasedHandler for WeakHandler<E, H>
where
    E: Any,
    H: EventHandler<E>,
{
    fn invoke(&mut self, _event: &dyn Event, view: &dyn Any) -> Invocation {
        let Some(handler) = self.handler.upgrade() else {
            return Invocation::Gone;
        };
        let Ok(mut handler) = handler.try_borrow_mut() else {
            return Invocation::Busy;
        };
        match view.downcast_ref::<E>() {
            Some(event) => Invocation::Ran(handler.handle_event(event)),
            None => Invocation::Mismatch,
        }
    }
}

//--- Catch-All External Handler ------------------------------------------

pub(crate) struct WeakDynHandler<H> {
    handler: Weak<RefCell<H>>,
}

impl<H> WeakDynHandler<H> {
    pub(crate) fn new(handler: &Rc<RefCell<H>>) -> Self {
        Self {
            handler: Rc::downgrade(handler),
        }
    }
}

impl<H> ErasedHandler for WeakDynHandler<H>
where
    H: EventHandler<dyn Event>,
{
    fn invoke(&mut self, event: &dyn Event, _view: &dyn Any) -> Invocation {
        let Some(handler) = self.handler.upgrade() else {
            return Invocation::Gone;
        };
        let Ok(mut handler) = handler.try_borrow_mut() else {
            return Invocation::Busy;
        };
        Invocation::Ran(handler.handle_event(event))
    }
}

//=== HandlerRecord =======================================================

/// One registration.
pub(crate) struct HandlerRecord {
    pub(crate) id: HandlerId,
    pub(crate) identity: Identity,
    pub(crate) name: &'static str,
    active: Cell<bool>,
    handler: RefCell<Box<dyn ErasedHandler>>,
}

impl HandlerRecord {
    /// Returns `false` once the record has been removed from the registry.
    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Offers the event to the handler, unless it is already running.
    pub(crate) fn invoke(&self, event: &dyn Event, view: &dyn Any) -> Invocation {
        match self.handler.try_borrow_mut() {
            Ok(mut handler) => handler.invoke(event, view),
            Err(_) => Invocation::Busy,
        }
    }
}

//=== HandlerList =========================================================

#[derive(Default)]
struct HandlerList {
    slots: Vec<Option<Rc<HandlerRecord>>>,
    live: usize,
}

impl HandlerList {
    fn tombstones(&self) -> usize {
        self.slots.len() - self.live
    }

    fn should_compact(&self) -> bool {
        let dead = self.tombstones();
        dead >= COMPACT_MIN_TOMBSTONES && dead > self.live
    }
}

//=== HandlerRegistry =====================================================

/// Per-event-type ordered handler lists plus a reverse index.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    lists: HashMap<TypeId, HandlerList>,
    index: HashMap<HandlerId, (TypeId, usize)>,
    last_id: HandlerId,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a handler under `key` and returns its fresh id.
    pub(crate) fn insert(
        &mut self,
        key: TypeId,
        identity: Identity,
        name: &'static str,
        handler: Box<dyn ErasedHandler>,
    ) -> HandlerId {
        self.last_id += 1;
        let id = self.last_id;

        let list = self.lists.entry(key).or_default();
        let slot = list.slots.len();
        list.slots.push(Some(Rc::new(HandlerRecord {
            id,
            identity,
            name,
            active: Cell::new(true),
            handler: RefCell::new(handler),
        })));
        list.live += 1;
        self.index.insert(id, (key, slot));

        id
    }

    /// Removes handler `id` and returns its record.
    ///
    /// The record is marked inactive. Callers drop it outside any borrow
    /// of the registry, since dropping a closure may drop further tokens.
    pub(crate) fn remove(&mut self, id: HandlerId) -> Option<Rc<HandlerRecord>> {
        let (key, slot) = self.index.remove(&id)?;
        let list = self.lists.get_mut(&key)?;
        let record = list.slots.get_mut(slot)?.take()?;
        record.active.set(false);
        list.live -= 1;

        if list.live == 0 {
            self.lists.remove(&key);
        } else if list.should_compact() {
            Self::compact(key, list, &mut self.index);
        }

        Some(record)
    }

    /// Removes every record, returning them for dropping by the caller.
    pub(crate) fn drain(&mut self) -> Vec<Rc<HandlerRecord>> {
        self.index.clear();
        let records: Vec<_> = self
            .lists
            .drain()
            .flat_map(|(_, list)| list.slots.into_iter().flatten())
            .collect();
        for record in &records {
            record.active.set(false);
        }
        records
    }

    pub(crate) fn contains(&self, id: HandlerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Live records under `key`, in registration order.
    pub(crate) fn snapshot(&self, key: TypeId) -> Vec<Rc<HandlerRecord>> {
        self.lists
            .get(&key)
            .map(|list| list.slots.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of live records under `key`.
    pub(crate) fn count(&self, key: TypeId) -> usize {
        self.lists.get(&key).map_or(0, |list| list.live)
    }

    fn compact(key: TypeId, list: &mut HandlerList, index: &mut HashMap<HandlerId, (TypeId, usize)>) {
        list.slots.retain(Option::is_some);
        for (slot, record) in list.slots.iter().flatten().enumerate() {
            index.insert(record.id, (key, slot));
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
