//! The local screen surface the session draws into.

use crate::frame::Frame;
use crate::geometry::{Point, Size, Viewport};

/// Host-side canvas, container and touch overlay.
///
/// Canvas methods are only called by the render loop; overlay methods only
/// by the input forwarder. All calls happen on the session's own task.
pub trait ScreenView {
    /// Measure the hosting container.
    fn bounds(&self) -> Viewport;

    // ── Canvas ───────────────────────────────────────────────────

    /// Set the canvas' logical (pixel buffer) size.
    fn resize_buffer(&mut self, width: u32, height: u32);

    /// Set the canvas' on-screen size before rotation.
    fn set_display_size(&mut self, size: Size);

    /// Set the canvas rotation transform, in degrees (clockwise positive).
    fn set_rotation(&mut self, degrees: i32);

    fn draw(&mut self, frame: &Frame);

    // ── Touch overlay ────────────────────────────────────────────

    /// Toggle the "finger is down" visual state.
    fn set_touch_active(&mut self, active: bool);

    /// Move the finger indicator to a container point.
    fn move_finger(&mut self, point: Point);

    /// Give keyboard focus to the text input that captures key events.
    fn focus_input(&mut self);
}
