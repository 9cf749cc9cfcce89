//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_events::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Events
pub use crate::core::event::keys::{Keycode, Modifiers, MouseButton, Scancode};
pub use crate::core::event::{
    CustomUserEvent, Event, KeyDown, KeyUp, KeyboardEvent, MouseButtonEvent, QuitEvent,
    Timestamp, UserEvent,
};

// Bus
pub use crate::core::bus::{create_event_bus, EventBus, EventBusBuilder, EventPublisher};
pub use crate::core::error::{BusError, PublishError, PublishReason};

// Router and handlers
pub use crate::core::handler::{EventHandler, HandlerError, HandlerResult};
pub use crate::core::router::{EventRegistration, EventRouter, ProcessOutcome, RouterHandle, RouterState};

// Platform host
pub use crate::platform::{run as run_platform, HostConfig, PlatformError};
