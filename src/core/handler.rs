//=========================================================================
// Handler Traits
//=========================================================================
//
// What a receiver of events looks like to the router.
//
// - `EventHandler<E>`: an object that handles `E` (or `dyn Event` for
//   every event). Registered by `Rc<RefCell<_>>`, held weakly.
// - Closures: any `FnMut(&E) -> R` where `R: IntoHandlerResult`,
//   owned by the router.
//
//=========================================================================

//=== Handler Results =====================================================

/// Error a handler reports to the router. Logged, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Lets closures return either `()` or a `Result`.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E: Into<HandlerError>> IntoHandlerResult for Result<(), E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

//=== EventHandler ========================================================

/// Receiver for events of type `E`.
///
/// `E` may be a concrete event, a base other events expose a view of
/// (`UserEvent`, `KeyboardEvent`), or `dyn Event` to receive everything.
/// One type may implement several `EventHandler<_>` and be registered
/// once per event type; it is still invoked at most once per event.
///
/// # Examples
///
/// ```
/// use aetheric_events::core::event::QuitEvent;
/// use aetheric_events::core::handler::{EventHandler, HandlerResult};
///
/// #[derive(Default)]
/// struct Shutdown {
///     requested: bool,
/// }
///
/// impl EventHandler<QuitEvent> for Shutdown {
///     fn handle_event(&mut self, _event: &QuitEvent) -> HandlerResult {
///         self.requested = true;
///         Ok(())
///     }
/// }
/// ```
pub trait EventHandler<E: ?Sized> {
    fn handle_event(&mut self, event: &E) -> HandlerResult;
}

//=========================================================================
// Unit Tests
//=========================================================================
