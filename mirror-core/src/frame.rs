//! Frames, frame requests and the frame source seam.
//!
//! A [`FrameSource`] is callback-shaped: [`load`](FrameSource::load)
//! starts a fetch and the outcome comes back later as a
//! [`SessionEvent`](crate::session::SessionEvent) carrying the same
//! [`FrameTicket`]. The render loop uses the ticket to discard
//! resolutions that belong to a request it no longer waits for.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::geometry::Viewport;

// ── Frame ────────────────────────────────────────────────────────

/// A decoded device screen image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Decoded pixel data, layout defined by the frame source.
    pub pixels: Bytes,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// A frame with dimensions but no pixel payload.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, Bytes::new())
    }
}

// ── FrameRequest ─────────────────────────────────────────────────

/// Parameters of one frame fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRequest {
    /// Device display URL the parameters are appended to.
    pub base_url: String,
    /// Container width the device should scale the image for.
    pub width: u32,
    /// Container height the device should scale the image for.
    pub height: u32,
    /// Cache-busting timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl FrameRequest {
    pub fn new(base_url: impl Into<String>, viewport: Viewport, timestamp_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            width: viewport.width,
            height: viewport.height,
            timestamp_ms,
        }
    }

    /// Full URL: `base?width=W&height=H&time=T`.
    pub fn url(&self) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}width={}&height={}&time={}",
            self.base_url, separator, self.width, self.height, self.timestamp_ms
        )
    }
}

impl fmt::Display for FrameRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

// ── FrameTicket ──────────────────────────────────────────────────

/// Identifies one issued frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket {
    /// Power-cycle epoch the request was issued in.
    pub generation: u64,
    /// Per-session request counter.
    pub id: u64,
}

impl fmt::Display for FrameTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.id, self.generation)
    }
}

// ── FrameSource ──────────────────────────────────────────────────

/// Starts frame fetches on behalf of the render loop.
pub trait FrameSource {
    /// Begin fetching `request`. The outcome must be reported back to the
    /// session as `FrameLoaded` or `FrameFailed` with this `ticket`.
    fn load(&mut self, ticket: FrameTicket, request: FrameRequest);

    /// Drop interest in any outstanding fetch. Must be idempotent.
    fn cancel(&mut self);
}

// ── CacheBuster ──────────────────────────────────────────────────

/// Wall-clock millisecond timestamps that never repeat within a session.
#[derive(Debug, Clone, Default)]
pub struct CacheBuster {
    last: u64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp: now, or one past the previous value if the clock
    /// has not advanced (or went backwards).
    pub fn next(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.next_at(now)
    }

    /// Same as [`next`](Self::next) with an explicit clock reading.
    pub fn next_at(&mut self, now_ms: u64) -> u64 {
        self.last = now_ms.max(self.last + 1);
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_carries_size_and_time() {
        let req = FrameRequest::new("http://device/screen.jpg", Viewport::new(400, 800), 1234);
        assert_eq!(
            req.url(),
            "http://device/screen.jpg?width=400&height=800&time=1234"
        );
    }

    #[test]
    fn request_url_extends_existing_query() {
        let req = FrameRequest::new("http://device/screen?serial=abc", Viewport::new(1, 2), 3);
        assert_eq!(req.url(), "http://device/screen?serial=abc&width=1&height=2&time=3");
    }

    #[test]
    fn cache_buster_is_strictly_increasing() {
        let mut cb = CacheBuster::new();
        assert_eq!(cb.next_at(1000), 1000);
        assert_eq!(cb.next_at(1000), 1001);
        assert_eq!(cb.next_at(900), 1002);
        assert_eq!(cb.next_at(5000), 5000);
    }

    #[test]
    fn cache_buster_uses_wall_clock() {
        let mut cb = CacheBuster::new();
        let a = cb.next();
        let b = cb.next();
        assert!(a > 1_600_000_000_000);
        assert!(b > a);
    }

    #[test]
    fn ticket_display() {
        let t = FrameTicket { generation: 2, id: 7 };
        assert_eq!(t.to_string(), "#7@2");
    }
}
