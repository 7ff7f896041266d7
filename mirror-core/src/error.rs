//! Domain-specific error types for the mirroring core.
//!
//! All fallible operations return `Result<T, MirrorError>`.
//! Frame load failures are typed separately so the render loop can
//! recover from them locally without touching the fatal variants.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the mirroring core.
#[derive(Debug, Error)]
pub enum MirrorError {
    // ── Configuration Errors ─────────────────────────────────────
    /// A dimension that must be positive was zero.
    ///
    /// Raised for zero-size containers and zero native device sizes.
    /// Not recoverable by retrying: the host is misconfigured.
    #[error("configuration error: {what} must have positive dimensions (got {width}x{height})")]
    Configuration {
        what: &'static str,
        width: u32,
        height: u32,
    },

    /// A rotation outside {0, 90, 180, 270} was reported.
    #[error("invalid rotation: {0} (expected 0, 90, 180 or 270)")]
    InvalidRotation(i32),

    // ── Frame Errors ─────────────────────────────────────────────
    /// The frame source could not produce an image.
    #[error("frame load error: {0}")]
    FrameLoad(#[from] FrameLoadError),

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Serialization Errors ─────────────────────────────────────
    /// Encoding or decoding of a control event failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl MirrorError {
    /// Zero-size container error.
    pub fn empty_viewport(width: u32, height: u32) -> Self {
        MirrorError::Configuration {
            what: "container",
            width,
            height,
        }
    }

    /// Zero-size device display error.
    pub fn empty_display(width: u32, height: u32) -> Self {
        MirrorError::Configuration {
            what: "device display",
            width,
            height,
        }
    }

    /// Whether this error must abort the session rather than be
    /// surfaced and recovered from.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MirrorError::Configuration { .. } | MirrorError::InvalidRotation(_)
        )
    }
}

// ── FrameLoadError ────────────────────────────────────────────────

/// Typed error for a single frame fetch.
///
/// Never escapes the render loop: it only flips the display-error flag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameLoadError {
    /// The source reported a failure (bad response, undecodable image…).
    #[error("frame fetch failed: {0}")]
    Failed(String),

    /// A single fetch attempt exceeded the configured timeout.
    #[error("frame fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The fetch was abandoned before it resolved.
    #[error("frame fetch was cancelled")]
    Cancelled,
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for MirrorError {
    fn from(s: String) -> Self {
        MirrorError::Other(s)
    }
}

impl From<&str> for MirrorError {
    fn from(s: &str) -> Self {
        MirrorError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MirrorError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        MirrorError::ChannelClosed
    }
}

impl From<Box<bincode::ErrorKind>> for MirrorError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        MirrorError::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = MirrorError::empty_viewport(0, 800);
        assert!(e.to_string().contains("container"));
        assert!(e.to_string().contains("0x800"));

        let e = MirrorError::InvalidRotation(45);
        assert!(e.to_string().contains("45"));
    }

    #[test]
    fn fatal_classification() {
        assert!(MirrorError::empty_display(0, 0).is_fatal());
        assert!(MirrorError::InvalidRotation(-90).is_fatal());
        assert!(!MirrorError::FrameLoad(FrameLoadError::Cancelled).is_fatal());
        assert!(!MirrorError::ChannelClosed.is_fatal());
    }

    #[test]
    fn from_string() {
        let e: MirrorError = "something broke".into();
        assert!(matches!(e, MirrorError::Other(_)));
    }

    #[test]
    fn from_frame_load() {
        let e: MirrorError = FrameLoadError::Timeout(Duration::from_secs(2)).into();
        assert!(matches!(e, MirrorError::FrameLoad(FrameLoadError::Timeout(_))));
        assert!(e.to_string().contains("timed out"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: MirrorError = io_err.into();
        assert!(matches!(e, MirrorError::Connection(_)));
    }
}
