//=========================================================================
// Aetheric Events — Library Root
//
// Typed event bus and router for the Aetheric multimedia layer.
//
// Responsibilities:
// - Turn raw platform records into owned, typed events
// - Queue events from any thread and hand them to one consuming thread
// - Dispatch each event to the handlers registered for its type, its
//   base views, and `dyn Event`, with RAII handler lifetimes
//
// Typical usage:
// ```no_run
// use aetheric_events::prelude::*;
//
// let mut router = EventRouter::new(create_event_bus());
// let _on_quit = router.register_fn(|_: &QuitEvent| println!("bye"));
// router.run();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the event model, bus and router. It has no dependency on a
// windowing system and is usable headless.
//
// `platform` hosts a router inside a Winit window and event loop.
//
pub mod core;
pub mod platform;
pub mod prelude;
