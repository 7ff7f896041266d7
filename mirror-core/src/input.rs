//! Local pointer / keyboard input → device control events.
//!
//! Only one gesture is tracked at a time. A gesture starts on pointer-down,
//! numbers its events from 0, and ends on pointer-up or when the pointer
//! leaves the surface. Coordinates are mapped with the rotation and
//! viewport current at each event, not the ones seen at gesture start.

use tracing::debug;

use crate::error::MirrorError;
use crate::geometry::{Point, ProportionalPoint, Rotation, Scaler, Viewport};
use crate::protocol::ControlChannel;
use crate::view::ScreenView;

// ── Events ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Pointer left the surface; ends the gesture like `Up`.
    Leave,
}

/// A raw pointer event in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub point: Point,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    pub fn leave(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Leave, x, y)
    }

    fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            point: Point::new(x, y),
        }
    }
}

/// A raw keyboard / text event from the capture input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Down(u32),
    Up(u32),
    /// A character produced by a key press.
    Char(char),
    /// Clipboard text pasted into the capture input.
    Paste(String),
}

/// What the host should do with the native event after forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Let the platform handle the event as usual.
    #[default]
    Default,
    /// Suppress the platform's default action (text insertion, selection…).
    PreventDefault,
}

/// Which halves of the forwarder are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOptions {
    pub pointer: bool,
    pub keyboard: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            pointer: true,
            keyboard: true,
        }
    }
}

/// Geometry used to map one pointer event.
#[derive(Debug, Clone, Copy)]
pub struct PointerSpace<'a> {
    pub scaler: &'a Scaler,
    pub viewport: Viewport,
    pub rotation: Rotation,
}

impl PointerSpace<'_> {
    fn map(&self, point: Point) -> Result<ProportionalPoint, MirrorError> {
        self.scaler
            .to_device_proportional(self.viewport, point, self.rotation)
    }
}

// ── InputForwarder ───────────────────────────────────────────────

/// Forwards input while attached; ignores everything while detached.
#[derive(Debug, Clone, Default)]
pub struct InputForwarder {
    options: InputOptions,
    attached: bool,
    touching: bool,
    seq: u32,
}

impl InputForwarder {
    pub fn new(options: InputOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether a gesture is in progress.
    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Sequence number the next touch event will carry.
    pub fn next_seq(&self) -> u32 {
        self.seq
    }

    /// Attach the pointer-down and keyboard listeners.
    pub fn start(&mut self) {
        if !self.attached {
            debug!("input attached");
        }
        self.attached = true;
    }

    /// Detach all listeners and abort any gesture without sending `touchUp`.
    ///
    /// Safe to call any number of times.
    pub fn stop<V: ScreenView>(&mut self, view: &mut V) {
        if self.attached {
            debug!("input detached");
        }
        self.attached = false;
        if self.touching {
            debug!(seq = self.seq, "gesture aborted");
            self.end_gesture(view);
        }
    }

    /// Handle one pointer event.
    ///
    /// A mapping error aborts the event before any state changes or any
    /// control event is sent.
    pub fn pointer<V: ScreenView, C: ControlChannel>(
        &mut self,
        event: PointerEvent,
        space: &PointerSpace<'_>,
        view: &mut V,
        control: &mut C,
    ) -> Result<Disposition, MirrorError> {
        if !self.attached || !self.options.pointer {
            return Ok(Disposition::Default);
        }

        match event.kind {
            PointerKind::Down if self.touching => {
                debug!("pointer down during a gesture, ignored");
                Ok(Disposition::PreventDefault)
            }
            PointerKind::Down => {
                let at = space.map(event.point)?;
                view.focus_input();
                view.set_touch_active(true);
                self.touching = true;
                let seq = self.advance(view, event.point);
                control.touch_down(seq, at);
                Ok(Disposition::PreventDefault)
            }
            // Move/up listeners only exist while a gesture is active.
            _ if !self.touching => Ok(Disposition::Default),
            PointerKind::Move => {
                let at = space.map(event.point)?;
                let seq = self.advance(view, event.point);
                control.touch_move(seq, at);
                Ok(Disposition::Default)
            }
            PointerKind::Up | PointerKind::Leave => {
                let at = space.map(event.point)?;
                let seq = self.advance(view, event.point);
                control.touch_up(seq, at);
                self.end_gesture(view);
                Ok(Disposition::Default)
            }
        }
    }

    /// Handle one keyboard / text event.
    pub fn key<C: ControlChannel>(&mut self, input: KeyInput, control: &mut C) -> Disposition {
        if !self.attached || !self.options.keyboard {
            return Disposition::Default;
        }

        match input {
            KeyInput::Down(code) => {
                control.key_down(code);
                Disposition::Default
            }
            KeyInput::Up(code) => {
                control.key_up(code);
                Disposition::Default
            }
            KeyInput::Char(c) => {
                control.type_text(c.encode_utf8(&mut [0; 4]));
                Disposition::PreventDefault
            }
            KeyInput::Paste(text) => {
                control.paste(text);
                Disposition::PreventDefault
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Move the finger indicator and hand out the next sequence number.
    fn advance<V: ScreenView>(&mut self, view: &mut V, point: Point) -> u32 {
        view.move_finger(point);
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn end_gesture<V: ScreenView>(&mut self, view: &mut V) {
        view.set_touch_active(false);
        self.touching = false;
        self.seq = 0;
    }
}

// ── Tests ────────────────────────────────────────────────────────
