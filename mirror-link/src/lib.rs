//! # mirror-link: viewer-side adapters
//!
//! Wires a [`mirror_core`] session to the outside world: reads the
//! TOML viewer configuration, installs the tracing subscriber, and
//! writes forwarded input events to the device over a TCP control
//! stream.

pub mod config;
pub mod connection;
pub mod logging;
pub mod viewer;

pub use config::ViewerConfig;
pub use connection::{DeviceConnection, read_event};
pub use viewer::Viewer;
