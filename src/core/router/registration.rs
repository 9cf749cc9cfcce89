//=========================================================================
// Event Registration
//=========================================================================
//
// RAII token tying a handler record to a scope.
//
// The token refers to its router weakly, so it may outlive the router:
// once the router is gone every operation is a no-op and
// `is_registered()` reports `false`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::rc::Weak;

//=== Internal Dependencies ===============================================

use super::registry::HandlerId;
use super::RouterCore;

//=== EventRegistration ===================================================

/// Keeps a handler registered for as long as it lives.
///
/// Move-only. Dropping it unregisters the handler; so does
/// [`EventRegistration::unregister`], which is idempotent. The
/// [`Default`] value is an inert token, handy as a placeholder and for
/// `std::mem::take`.
///
/// # Examples
///
/// ```
/// use aetheric_events::core::bus::create_event_bus;
/// use aetheric_events::core::event::QuitEvent;
/// use aetheric_events::core::router::EventRouter;
///
/// let router = EventRouter::new(create_event_bus());
/// let mut registration = router.register_fn(|_: &QuitEvent| {});
/// assert!(registration.is_registered());
///
/// registration.unregister();
/// registration.unregister();
/// assert!(!registration.is_registered());
/// ```
#[must_use = "dropping the registration unregisters the handler"]
#[derive(Default)]
pub struct EventRegistration {
    router: Weak<RouterCore>,
    id: Option<HandlerId>,
}

impl EventRegistration {
    pub(crate) fn new(router: Weak<RouterCore>, id: HandlerId) -> Self {
        Self {
            router,
            id: Some(id),
        }
    }

    /// Token bound to nothing, returned when the router no longer exists.
    pub(crate) fn inert() -> Self {
        Self::default()
    }

    /// Removes the handler now. Safe to call repeatedly, and from inside
    /// a handler during dispatch.
    pub fn unregister(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(router) = self.router.upgrade() {
            router.unregister(id);
        }
        self.router = Weak::new();
    }

    /// Returns `true` while the router exists and still holds the handler.
    pub fn is_registered(&self) -> bool {
        let Some(id) = self.id else {
            return false;
        };
        self.router
            .upgrade()
            .is_some_and(|router| router.is_registered(id))
    }

    /// Router-assigned id, or `None` for an inert or unregistered token.
    pub fn id(&self) -> Option<HandlerId> {
        self.id
    }
}

impl Drop for EventRegistration {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl fmt::Debug for EventRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistration")
            .field("id", &self.id)
            .field("registered", &self.is_registered())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::create_event_bus;
    use crate::core::event::QuitEvent;
    use crate::core::router::EventRouter;

    #[test]
    fn inert_token_is_never_registered() {
        let mut token = EventRegistration::inert();
        assert!(!token.is_registered());
        assert_eq!(token.id(), None);
        token.unregister();
    }

    #[test]
    fn unregister_is_idempotent() {
        let router = EventRouter::new(create_event_bus());
        let mut token = router.register_fn(|_: &QuitEvent| {});
        assert!(token.id().is_some());

        token.unregister();
        token.unregister();
        assert!(!token.is_registered());
        assert_eq!(token.id(), None);
        assert_eq!(router.handler_count::<QuitEvent>(), 0);
    }

    #[test]
    fn move_transfers_ownership() {
        let router = EventRouter::new(create_event_bus());
        let mut source = router.register_fn(|_: &QuitEvent| {});
        let id = source.id();

        let target = std::mem::take(&mut source);
        assert!(!source.is_registered());
        assert!(target.is_registered());
        assert_eq!(target.id(), id);

        drop(source);
        assert_eq!(router.handler_count::<QuitEvent>(), 1);
        drop(target);
        assert_eq!(router.handler_count::<QuitEvent>(), 0);
    }

    #[test]
    fn token_outliving_router_is_harmless() {
        let router = EventRouter::new(create_event_bus());
        let mut token = router.register_fn(|_: &QuitEvent| {});
        drop(router);

        assert!(!token.is_registered());
        token.unregister();
    }

    #[test]
    fn debug_shows_state() {
        let token = EventRegistration::inert();
        assert_eq!(format!("{:?}", token), "EventRegistration { id: None, registered: false }");
    }
}
