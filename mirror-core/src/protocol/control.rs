//! Input events sent to the device, and the channel seam that carries them.
//!
//! # Wire Protocol
//!
//! Transports that put events on a byte stream frame each one as:
//!
//! ```text
//! ┌────────┬──────────────┬──────────────────────────┐
//! │ kind   │ len (u16 LE) │ ControlEvent (bincode)   │
//! │ 1 byte │ 2 bytes      │ len bytes                │
//! └────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! Touch coordinates are proportional (`0.0..=1.0`) device coordinates.
//! Events are fire-and-forget; there is no acknowledgement.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::MirrorError;
use crate::geometry::ProportionalPoint;

/// Largest payload the framing's `u16` length field can describe.
pub const MAX_EVENT_PAYLOAD: usize = u16::MAX as usize;

// ── ControlKind ──────────────────────────────────────────────────

/// One-byte discriminant written ahead of every framed event.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    TouchDown = 0x01,
    TouchMove = 0x02,
    TouchUp = 0x03,
    KeyDown = 0x10,
    KeyUp = 0x11,
    Type = 0x20,
    Paste = 0x21,
}

impl TryFrom<u8> for ControlKind {
    type Error = MirrorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(ControlKind::TouchDown),
            0x02 => Ok(ControlKind::TouchMove),
            0x03 => Ok(ControlKind::TouchUp),
            0x10 => Ok(ControlKind::KeyDown),
            0x11 => Ok(ControlKind::KeyUp),
            0x20 => Ok(ControlKind::Type),
            0x21 => Ok(ControlKind::Paste),
            other => Err(MirrorError::Encoding(format!(
                "unknown control kind: {other:#04x}"
            ))),
        }
    }
}

// ── ControlEvent ─────────────────────────────────────────────────

/// A single input event forwarded to the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// Finger down; `seq` is always 0 for the first event of a gesture.
    TouchDown { seq: u32, x: f64, y: f64 },
    TouchMove { seq: u32, x: f64, y: f64 },
    TouchUp { seq: u32, x: f64, y: f64 },
    /// Raw key code pressed.
    KeyDown(u32),
    /// Raw key code released.
    KeyUp(u32),
    /// Typed character(s).
    Type(String),
    /// Pasted clipboard text.
    Paste(String),
}

impl ControlEvent {
    pub fn touch_down(seq: u32, at: ProportionalPoint) -> Self {
        ControlEvent::TouchDown {
            seq,
            x: at.x,
            y: at.y,
        }
    }

    pub fn touch_move(seq: u32, at: ProportionalPoint) -> Self {
        ControlEvent::TouchMove {
            seq,
            x: at.x,
            y: at.y,
        }
    }

    pub fn touch_up(seq: u32, at: ProportionalPoint) -> Self {
        ControlEvent::TouchUp {
            seq,
            x: at.x,
            y: at.y,
        }
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            ControlEvent::TouchDown { .. } => ControlKind::TouchDown,
            ControlEvent::TouchMove { .. } => ControlKind::TouchMove,
            ControlEvent::TouchUp { .. } => ControlKind::TouchUp,
            ControlEvent::KeyDown(_) => ControlKind::KeyDown,
            ControlEvent::KeyUp(_) => ControlKind::KeyUp,
            ControlEvent::Type(_) => ControlKind::Type,
            ControlEvent::Paste(_) => ControlKind::Paste,
        }
    }

    /// Gesture sequence number, for touch events.
    pub fn seq(&self) -> Option<u32> {
        match self {
            ControlEvent::TouchDown { seq, .. }
            | ControlEvent::TouchMove { seq, .. }
            | ControlEvent::TouchUp { seq, .. } => Some(*seq),
            _ => None,
        }
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MirrorError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MirrorError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Encode as one wire frame: kind + length + payload.
    pub fn to_frame(&self) -> Result<Vec<u8>, MirrorError> {
        let payload = self.to_bytes()?;
        if payload.len() > MAX_EVENT_PAYLOAD {
            return Err(MirrorError::Encoding(format!(
                "control event too large: {} bytes (max {MAX_EVENT_PAYLOAD})",
                payload.len()
            )));
        }

        let mut frame = Vec::with_capacity(3 + payload.len());
        frame.push(self.kind() as u8);
        frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode a payload read off the wire, checking it against the
    /// kind byte that preceded it.
    pub fn from_frame(kind: u8, payload: &[u8]) -> Result<Self, MirrorError> {
        let kind = ControlKind::try_from(kind)?;
        let event = Self::from_bytes(payload)?;
        if event.kind() != kind {
            return Err(MirrorError::Encoding(format!(
                "control kind mismatch: header says {kind:?}, payload is {:?}",
                event.kind()
            )));
        }
        Ok(event)
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEvent::TouchDown { seq, x, y } => write!(f, "touchDown({seq}, {x:.4}, {y:.4})"),
            ControlEvent::TouchMove { seq, x, y } => write!(f, "touchMove({seq}, {x:.4}, {y:.4})"),
            ControlEvent::TouchUp { seq, x, y } => write!(f, "touchUp({seq}, {x:.4}, {y:.4})"),
            ControlEvent::KeyDown(code) => write!(f, "keyDown({code})"),
            ControlEvent::KeyUp(code) => write!(f, "keyUp({code})"),
            ControlEvent::Type(text) => write!(f, "type({text:?})"),
            ControlEvent::Paste(text) => write!(f, "paste({} chars)", text.chars().count()),
        }
    }
}

// ── ControlChannel ───────────────────────────────────────────────

/// Fire-and-forget sink for control events.
///
/// Implementations must deliver events in the order they are sent.
pub trait ControlChannel {
    fn send(&mut self, event: ControlEvent);

    fn touch_down(&mut self, seq: u32, at: ProportionalPoint) {
        self.send(ControlEvent::touch_down(seq, at));
    }

    fn touch_move(&mut self, seq: u32, at: ProportionalPoint) {
        self.send(ControlEvent::touch_move(seq, at));
    }

    fn touch_up(&mut self, seq: u32, at: ProportionalPoint) {
        self.send(ControlEvent::touch_up(seq, at));
    }

    fn key_down(&mut self, code: u32) {
        self.send(ControlEvent::KeyDown(code));
    }

    fn key_up(&mut self, code: u32) {
        self.send(ControlEvent::KeyUp(code));
    }

    fn type_text(&mut self, text: &str) {
        self.send(ControlEvent::Type(text.to_string()));
    }

    fn paste(&mut self, text: String) {
        self.send(ControlEvent::Paste(text));
    }
}

impl ControlChannel for mpsc::UnboundedSender<ControlEvent> {
    fn send(&mut self, event: ControlEvent) {
        if let Err(e) = mpsc::UnboundedSender::send(self, event) {
            tracing::debug!("control channel closed, dropping {}", e.0);
        }
    }
}

impl ControlChannel for Vec<ControlEvent> {
    fn send(&mut self, event: ControlEvent) {
        self.push(event);
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let event = ControlEvent::KeyDown(66);
        let frame = event.to_frame().unwrap();
        assert_eq!(frame[0], ControlKind::KeyDown as u8);
        let len = u16::from_le_bytes([frame[1], frame[2]]) as usize;
        assert_eq!(len, frame.len() - 3);
        assert_eq!(ControlEvent::from_frame(frame[0], &frame[3..]).unwrap(), event);
    }

    #[test]
    fn touch_frame_preserves_coordinates() {
        let event = ControlEvent::touch_move(7, ProportionalPoint { x: 0.25, y: 0.75 });
        let frame = event.to_frame().unwrap();
        let decoded = ControlEvent::from_frame(frame[0], &frame[3..]).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.seq(), Some(7));
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        let frame = ControlEvent::KeyUp(1).to_frame().unwrap();
        let err = ControlEvent::from_frame(ControlKind::KeyDown as u8, &frame[3..]).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            ControlKind::try_from(0xFF),
            Err(MirrorError::Encoding(_))
        ));
    }

    #[test]
    fn truncated_payload_is_an_encoding_error() {
        let bytes = ControlEvent::Paste("hello".into()).to_bytes().unwrap();
        let err = ControlEvent::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, MirrorError::Encoding(_)));
    }

    #[test]
    fn oversized_paste_is_rejected() {
        let event = ControlEvent::Paste("x".repeat(MAX_EVENT_PAYLOAD + 1));
        assert!(matches!(event.to_frame(), Err(MirrorError::Encoding(_))));
    }

    #[test]
    fn unbounded_sender_keeps_order() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        for seq in 0..5 {
            let event = ControlEvent::touch_move(seq, ProportionalPoint::default());
            ControlChannel::send(&mut tx, event);
        }
        for seq in 0..5 {
            assert_eq!(rx.try_recv().unwrap().seq(), Some(seq));
        }
    }

    #[test]
    fn closed_channel_is_not_an_error() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ControlChannel::send(&mut tx, ControlEvent::KeyUp(13));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(ControlEvent::KeyDown(13).to_string(), "keyDown(13)");
        assert_eq!(ControlEvent::Paste("hello".into()).to_string(), "paste(5 chars)");
    }
}
