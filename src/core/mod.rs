//=========================================================================
// Core Event Systems
//
// Everything between a raw platform record and a handler call.
//
// Architecture:
// ```text
//   platform / publishers
//          │  RawEvent
//          ▼
//   bus ──── adaptor::convert ───► Box<dyn Event>
//          │
//          ▼
//   router ──► handlers (EventHandler<E>, closures)
// ```
//
// Modules:
// - `event`: typed events, input identifiers, user kind registry
// - `adaptor`: raw record layout and conversion tables
// - `bus`: bounded multi-producer queue, publishers, push mode
// - `router`: handler registry, dispatch, RAII registrations
// - `handler`: handler traits and results
// - `error`: bus and publish errors
//
//=========================================================================

pub mod adaptor;
pub mod bus;
pub mod error;
pub mod event;
pub mod handler;
pub mod router;
