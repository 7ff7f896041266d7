//! Protocol definitions shared with device-side transports.
//!
//! Payloads are serialized with `serde` + `bincode`.

pub mod control;

pub use control::{ControlChannel, ControlEvent, ControlKind, MAX_EVENT_PAYLOAD};
