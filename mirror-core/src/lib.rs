//! # mirror-core
//!
//! Core library for mirroring a remote device's screen into a local
//! canvas and forwarding local input back to the device.
//!
//! This crate contains:
//! - **Geometry**: `Scaler` maps container pixels to proportional device
//!   coordinates and computes the projected canvas size per `Rotation`
//! - **Layout**: `FrameCache` decides when the canvas must be restyled
//! - **Render**: `RenderLoop`, the single-flight fetch → draw → fetch cycle
//! - **Lifecycle**: `Lifecycle`, the power / gating state machine
//! - **Input**: `InputForwarder`, pointer gestures and key events → `ControlEvent`
//! - **Session**: `ScreenSession`, one owned state object fed by `SessionEvent`s
//! - **Runtime**: a tokio actor, `SessionHandle` and async `FrameFetcher`
//! - **Protocol**: serializable `ControlEvent` and the `ControlChannel` seam
//! - **Error**: `MirrorError`, typed, `thiserror`-based error hierarchy

pub mod error;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod lifecycle;
pub mod protocol;
pub mod render;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod view;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use error::{FrameLoadError, MirrorError};
pub use frame::{CacheBuster, Frame, FrameRequest, FrameSource, FrameTicket};
pub use geometry::{Point, ProportionalPoint, Rotation, Scaler, Size, Viewport};
pub use input::{
    Disposition, InputForwarder, InputOptions, KeyInput, PointerEvent, PointerKind, PointerSpace,
};
pub use layout::{CanvasRotation, FrameCache, LayoutKey, RotationStrategy};
pub use lifecycle::{GateChange, Lifecycle, PowerChange, PowerState, Signals};
pub use protocol::{ControlChannel, ControlEvent, ControlKind, MAX_EVENT_PAYLOAD};
pub use render::{RenderLoop, RenderPhase};
pub use runtime::{FetchPolicy, FetchSource, FrameFetcher, SessionHandle, spawn_session};
pub use session::{DisplayInfo, ScreenSession, SessionConfig, SessionEvent, SessionStatus};
pub use stats::FpsMeter;
pub use view::ScreenView;
