//! One mirroring session: the owned state object behind a screen.
//!
//! ```text
//!                    SessionEvent (arrival order)
//!                               │
//!                               ▼
//!   ┌────────────────────────────────────────────────────────┐
//!   │ ScreenSession                                          │
//!   │                                                        │
//!   │  Lifecycle ──power/gate──► RenderLoop ──► ScreenView   │
//!   │      │                        │                        │
//!   │      └──attach/detach──► InputForwarder ──► Control    │
//!   │                                                        │
//!   │  Scaler · Viewport · Rotation                          │
//!   └───────────────────┬────────────────────────────────────┘
//!                       │ load / cancel
//!                       ▼
//!                  FrameSource
//! ```
//!
//! The session does no I/O of its own. Everything that happens to it
//! arrives as a [`SessionEvent`] through [`ScreenSession::handle`], which
//! makes it equally usable from a UI event loop or from the tokio actor
//! in [`runtime`](crate::runtime).

use tracing::{debug, info, warn};

use crate::error::{FrameLoadError, MirrorError};
use crate::frame::{Frame, FrameSource, FrameTicket};
use crate::geometry::{Rotation, Scaler, Viewport};
use crate::input::{Disposition, InputForwarder, InputOptions, KeyInput, PointerEvent, PointerSpace};
use crate::layout::RotationStrategy;
use crate::lifecycle::{GateChange, Lifecycle, PowerChange, PowerState, Signals};
use crate::protocol::ControlChannel;
use crate::render::{RenderLoop, RenderPhase};
use crate::view::ScreenView;

// ── Configuration ────────────────────────────────────────────────

/// Per-session settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    /// How the canvas is turned when the device rotates.
    pub rotation_strategy: RotationStrategy,
    /// Which input halves are forwarded.
    pub input: InputOptions,
    /// Signal values the session starts with.
    pub signals: Signals,
}

/// Device display descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Base URL frames are fetched from.
    pub url: String,
    /// Native width in device pixels.
    pub width: u32,
    /// Native height in device pixels.
    pub height: u32,
}

impl DisplayInfo {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }
}

// ── Events ───────────────────────────────────────────────────────

/// Everything a session reacts to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The frame source produced the image for `ticket`.
    FrameLoaded { ticket: FrameTicket, frame: Frame },
    /// The frame source failed to produce the image for `ticket`.
    FrameFailed {
        ticket: FrameTicket,
        error: FrameLoadError,
    },
    DeviceInUse(bool),
    VisibilityChanged { hidden: bool },
    CanView(bool),
    ShowScreen(bool),
    /// The container changed size; the session re-measures the view.
    Resized,
    /// The device reported a new rotation in degrees.
    Rotated(i32),
    DisplayChanged(DisplayInfo),
    Pointer(PointerEvent),
    Key(KeyInput),
    /// Permanent teardown.
    Destroy,
}

/// Externally observable state, published after every event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionStatus {
    pub power: PowerState,
    pub phase: RenderPhase,
    /// A frame failed and nothing has been drawn since.
    pub display_error: bool,
    /// Recent frames per second, if enough frames were drawn.
    pub fps: Option<f64>,
    pub frames_drawn: u64,
}

// ── ScreenSession ────────────────────────────────────────────────

pub struct ScreenSession<S, C, V> {
    lifecycle: Lifecycle,
    render: RenderLoop,
    input: InputForwarder,
    scaler: Scaler,
    display_url: String,
    viewport: Viewport,
    rotation: Rotation,
    source: S,
    control: C,
    view: V,
}

impl<S, C, V> ScreenSession<S, C, V>
where
    S: FrameSource,
    C: ControlChannel,
    V: ScreenView,
{
    /// Build a session and power it on if the initial signals ask for it.
    pub fn new(
        config: SessionConfig,
        display: DisplayInfo,
        source: S,
        control: C,
        view: V,
    ) -> Result<Self, MirrorError> {
        let scaler = Scaler::new(display.width, display.height)?;
        let mut session = Self {
            lifecycle: Lifecycle::new(config.signals),
            render: RenderLoop::new(config.rotation_strategy),
            input: InputForwarder::new(config.input),
            scaler,
            display_url: display.url,
            viewport: Viewport::default(),
            rotation: Rotation::Deg0,
            source,
            control,
            view,
        };
        if let Some(change) = session.lifecycle.reconcile() {
            session.apply_power(change)?;
        }
        Ok(session)
    }

    /// Process one event.
    ///
    /// Errors are only ever `Configuration` or `InvalidRotation`; the event
    /// that caused one leaves the previous state in place.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Disposition, MirrorError> {
        match event {
            SessionEvent::FrameLoaded { ticket, frame } => self.frame_loaded(ticket, &frame)?,
            SessionEvent::FrameFailed { ticket, error } => {
                self.render.fail(ticket, &error);
            }
            SessionEvent::DeviceInUse(in_use) => {
                let change = self.lifecycle.set_device_in_use(in_use);
                self.apply_power_opt(change)?;
            }
            SessionEvent::VisibilityChanged { hidden } => {
                let change = self.lifecycle.set_tab_visible(!hidden);
                self.apply_power_opt(change)?;
            }
            SessionEvent::CanView(can_view) => {
                let change = self.lifecycle.set_can_view(can_view);
                self.apply_gate(change)?;
            }
            SessionEvent::ShowScreen(show) => {
                let change = self.lifecycle.set_show_screen(show);
                self.apply_gate(change)?;
            }
            SessionEvent::Resized => self.resized()?,
            SessionEvent::Rotated(degrees) => {
                let rotation = Rotation::from_degrees(degrees)?;
                if rotation != self.rotation {
                    debug!(from = %self.rotation, to = %rotation, "device rotated");
                    self.rotation = rotation;
                }
            }
            SessionEvent::DisplayChanged(info) => {
                let (width, height) = (info.width, info.height);
                self.scaler = Scaler::new(width, height)?;
                self.display_url = info.url;
                info!(width, height, "device display changed");
            }
            SessionEvent::Pointer(event) => {
                let space = PointerSpace {
                    scaler: &self.scaler,
                    viewport: self.viewport,
                    rotation: self.rotation,
                };
                return self
                    .input
                    .pointer(event, &space, &mut self.view, &mut self.control);
            }
            SessionEvent::Key(input) => {
                return Ok(self.input.key(input, &mut self.control));
            }
            SessionEvent::Destroy => self.destroy(),
        }
        Ok(Disposition::Default)
    }

    /// Tear down unconditionally: the same steps as powering off, and no
    /// later event can power the session back on.
    pub fn destroy(&mut self) {
        if !self.lifecycle.is_destroyed() {
            info!("screen session destroyed");
        }
        self.lifecycle.destroy();
        self.power_off();
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            power: self.lifecycle.power(),
            phase: self.render.phase(),
            display_error: self.render.display_error(),
            fps: self.render.fps(),
            frames_drawn: self.render.frames_drawn(),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn render(&self) -> &RenderLoop {
        &self.render
    }

    pub fn input(&self) -> &InputForwarder {
        &self.input
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn display_url(&self) -> &str {
        &self.display_url
    }

    /// Last measured container size; zero until first powered on.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    // ── Frames ───────────────────────────────────────────────────

    fn frame_loaded(&mut self, ticket: FrameTicket, frame: &Frame) -> Result<(), MirrorError> {
        if !self.render.settle(ticket) {
            return Ok(());
        }
        if !self.lifecycle.wants_frames() {
            debug!(%ticket, "nothing to show, frame dropped");
            return Ok(());
        }
        self.render
            .apply(&mut self.view, frame, self.viewport, self.rotation, &self.scaler)?;
        self.maybe_request()
    }

    fn maybe_request(&mut self) -> Result<(), MirrorError> {
        if !self.lifecycle.wants_frames() {
            return Ok(());
        }
        self.render
            .request(&mut self.source, &self.display_url, self.viewport)?;
        Ok(())
    }

    // ── Power ────────────────────────────────────────────────────

    fn apply_power_opt(&mut self, change: Option<PowerChange>) -> Result<(), MirrorError> {
        match change {
            Some(change) => self.apply_power(change),
            None => Ok(()),
        }
    }

    fn apply_power(&mut self, change: PowerChange) -> Result<(), MirrorError> {
        match change {
            PowerChange::On => self.power_on(),
            PowerChange::Off => {
                info!("screen powered off");
                self.power_off();
                Ok(())
            }
        }
    }

    fn power_on(&mut self) -> Result<(), MirrorError> {
        let viewport = match self.view.bounds().ensure_positive() {
            Ok(viewport) => viewport,
            Err(e) => {
                warn!("cannot power on: {e}");
                self.lifecycle.abort_power_on();
                return Err(e);
            }
        };
        self.viewport = viewport;
        info!(%viewport, "screen powered on");
        self.input.start();
        self.maybe_request()
    }

    fn power_off(&mut self) {
        self.input.stop(&mut self.view);
        self.render.cancel(&mut self.source);
        self.render.halt();
    }

    fn apply_gate(&mut self, change: Option<GateChange>) -> Result<(), MirrorError> {
        match change {
            Some(GateChange::Opened) => self.maybe_request(),
            Some(GateChange::Closed) => {
                debug!("screen gated off, frame requests halted");
                self.render.halt();
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn resized(&mut self) -> Result<(), MirrorError> {
        if !self.lifecycle.is_on() {
            // Measured on the next power-on; this also retries a power-on
            // that was refused for an empty container.
            return match self.lifecycle.reconcile() {
                Some(change) => self.apply_power(change),
                None => Ok(()),
            };
        }
        let viewport = self.view.bounds().ensure_positive()?;
        if viewport != self.viewport {
            debug!(from = %self.viewport, to = %viewport, "container resized");
            self.viewport = viewport;
        }
        Ok(())
    }
}

impl<S, C, V> std::fmt::Debug for ScreenSession<S, C, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenSession")
            .field("power", &self.lifecycle.power())
            .field("phase", &self.render.phase())
            .field("viewport", &self.viewport)
            .field("rotation", &self.rotation)
            .field("display_url", &self.display_url)
            .finish_non_exhaustive()
    }
}
