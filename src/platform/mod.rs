//=========================================================================
// Platform Subsystem
//
// Hosts an `EventRouter` inside the Winit event loop.
//
// Architecture:
// ```text
//  Main Thread:
//  ┌──────────────────────────────────────────────────────────┐
//  │  Winit Event Loop                                        │
//  │   ├─ WindowEvent ─► InputProcessor ─► RawEvent           │
//  │   │                                     ↓                │
//  │   │                            EventBus::deliver ──┐     │
//  │   │                                                ↓     │
//  │   └─ user_event (woken) ─► EventBus::pump ─► EventRouter │
//  └──────────────────────────────────────────────────────────┘
//             ↑
//   EventPublisher::publish (any thread) → queue → proxy wake-up
// ```
//
// Key Design Decisions:
// - **Push mode**: The router's route callback is installed for the
//   lifetime of the loop, so window input is dispatched as it arrives
//   instead of being queued
// - **Cross-thread wake-up**: Publishers wake the loop through an
//   `EventLoopProxy`; the loop then pumps the queue
// - **Quit closes the loop**: After every delivery the host checks
//   whether a `QuitEvent` was dispatched and exits if so
// - **Main thread requirement**: Winit mandates the main thread on
//   macOS/iOS, so `run` must be called from it
//
//=========================================================================

//=== Submodules ==========================================================

mod event_mapper;
mod input_processor;

//=== External Crates =====================================================

use std::sync::Mutex;

use log::*;
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    error::{EventLoopError, OsError},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::adaptor::RawEvent;
use crate::core::router::EventRouter;
use input_processor::InputProcessor;

//=== Constants ===========================================================

/// Window id reported in records from the host's only window.
pub const MAIN_WINDOW_ID: u32 = 1;

//=== HostConfig ==========================================================

/// Window settings for [`run`].
///
/// # Default Values
///
/// - **Title**: "Aetheric"
/// - **Size**: 800x600 logical pixels
///
/// # Examples
///
/// ```
/// use aetheric_events::platform::HostConfig;
///
/// let config = HostConfig::new().with_title("Demo").with_size(1280, 720);
/// assert_eq!(config.size(), (1280, 720));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    title: String,
    width: u32,
    height: u32,
}

impl HostConfig {
    /// Creates a config with default settings.
    pub fn new() -> Self {
        Self {
            title: String::from("Aetheric"),
            width: 800,
            height: 600,
        }
    }

    /// Sets the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the inner window size in logical pixels.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Window size must be positive, got {}x{}", width, height);
        self.width = width;
        self.height = height;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn window_attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height))
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
///
/// All are fatal for [`run`]: without an event loop and a window there is
/// no input to route.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to create event loop (rare, indicates OS-level issue).
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(#[source] EventLoopError),

    /// Event loop execution error.
    #[error("event loop error: {0}")]
    EventLoopExecution(#[source] EventLoopError),

    /// The OS refused to create the window.
    #[error("window creation failed: {0}")]
    WindowCreation(#[source] OsError),
}

//=== run() ===============================================================

/// Opens a window and routes its input through `router` until a
/// [`QuitEvent`](crate::core::event::QuitEvent) is dispatched or the
/// window is closed.
///
/// Closing the window delivers a quit record, so quit handlers always run.
/// Events published from other threads while the loop runs are dispatched
/// on this thread.
///
/// # Errors
///
/// Returns [`PlatformError`] if the event loop or the window cannot be
/// created, or if the loop fails while running.
///
/// # Panics
///
/// Panics if called off the main thread (macOS/iOS Winit requirement).
pub fn run(router: &mut EventRouter, config: HostConfig) -> Result<(), PlatformError> {
    debug!(target: "platform", "Starting Winit event loop");

    let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;

    let proxy = Mutex::new(event_loop.create_proxy());
    let installed = router.bus().set_waker(move || {
        if let Ok(proxy) = proxy.lock() {
            // Fails only once the loop has exited; nothing left to wake.
            let _ = proxy.send_event(());
        }
    });
    if !installed {
        debug!(target: "platform", "Bus waker already installed; keeping it");
    }

    router.clear_quit_request();
    router.install_route_callback();

    let mut host = Host::new(router, config);
    let result = event_loop.run_app(&mut host);
    let window_error = host.window_error.take();
    drop(host);

    router.bus_mut().clear_route_callback();
    info!(target: "platform", "Event loop finished");

    result.map_err(PlatformError::EventLoopExecution)?;
    match window_error {
        Some(err) => Err(PlatformError::WindowCreation(err)),
        None => Ok(()),
    }
}

//=== Host ================================================================

/// Winit application driving one router.
///
/// Not Send/Sync: lives on the main thread for the whole loop.
struct Host<'r> {
    router: &'r mut EventRouter,
    config: HostConfig,
    window: Option<Window>,
    input: InputProcessor,
    window_error: Option<OsError>,
}

impl<'r> Host<'r> {
    fn new(router: &'r mut EventRouter, config: HostConfig) -> Self {
        info!(target: "platform", "Platform host initialized");
        Self {
            router,
            config,
            window: None,
            input: InputProcessor::new(MAIN_WINDOW_ID),
            window_error: None,
        }
    }

    //--- Delivery ---------------------------------------------------------

    /// Routes one record and stops the loop if it was a quit.
    fn deliver(&mut self, event_loop: &ActiveEventLoop, raw: RawEvent) {
        self.router.bus_mut().deliver(raw);
        self.exit_if_quit(event_loop);
    }

    /// Routes everything publishers queued since the last wake-up.
    fn pump(&mut self, event_loop: &ActiveEventLoop) {
        let routed = self.router.bus_mut().pump();
        if routed > 0 {
            trace!(target: "platform", "Pumped {} queued events", routed);
        }
        self.exit_if_quit(event_loop);
    }

    fn exit_if_quit(&self, event_loop: &ActiveEventLoop) {
        if self.router.quit_requested() && !event_loop.exiting() {
            info!(target: "platform", "Quit dispatched; closing event loop");
            event_loop.exit();
        }
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Host<'_> {
    /// Called when app becomes active (startup or mobile resume).
    ///
    /// Creates the window if it doesn't exist yet.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        match event_loop.create_window(self.config.window_attributes()) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.window_error = Some(e);
                self.deliver(event_loop, RawEvent::quit());
                event_loop.exit();
            }
        }
    }

    /// Cross-thread wake-up from an `EventPublisher`.
    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: ()) {
        self.pump(event_loop);
    }

    /// Handles per-window events.
    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.deliver(event_loop, RawEvent::quit());
                event_loop.exit();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                trace!(target: "platform::input", "Modifiers changed: {:?}", modifiers);
                self.input.update_modifiers(modifiers.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.update_cursor(position.x as f32, position.y as f32);
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let raw = self.input.process_key(
                    key_event.physical_key,
                    &key_event.logical_key,
                    key_event.state,
                    key_event.repeat,
                );
                self.deliver(event_loop, raw);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                match self.input.process_mouse_button(button, state) {
                    Some(raw) => self.deliver(event_loop, raw),
                    None => trace!(target: "platform::input", "Unmapped mouse button {:?} ignored", button),
                }
            }

            _ => {
                // Ignore: Resized, Focused, RedrawRequested, etc.
            }
        }
    }

    /// Catches anything published without a wake-up (e.g. before the
    /// waker was installed).
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.router.has_events() {
            self.pump(event_loop);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
