//! Frame cache tracking and canvas rotation.
//!
//! Restyling the canvas on every frame is expensive, and frames can arrive
//! many times per second. [`FrameCache`] remembers the layout that is
//! currently applied so the render loop only touches canvas size, display
//! size and rotation when something actually changed.

use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::geometry::{Rotation, Viewport};

// ── LayoutKey ────────────────────────────────────────────────────

/// Everything the canvas layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    pub container_width: u32,
    pub container_height: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub rotation: Rotation,
}

impl LayoutKey {
    pub fn new(viewport: Viewport, frame: &Frame, rotation: Rotation) -> Self {
        Self {
            container_width: viewport.width,
            container_height: viewport.height,
            image_width: frame.width,
            image_height: frame.height,
            rotation,
        }
    }
}

// ── FrameCache ───────────────────────────────────────────────────

/// Last layout applied to the canvas.
///
/// Only [`commit`](Self::commit) changes it, and the render loop calls that
/// right after restyling the canvas, so the cached key always matches
/// what is on screen.
#[derive(Debug, Clone, Default)]
pub struct FrameCache {
    applied: Option<LayoutKey>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `key` differs from the applied layout in any field, or no
    /// layout has been applied yet.
    pub fn needs_layout_update(&self, key: &LayoutKey) -> bool {
        self.applied.as_ref() != Some(key)
    }

    /// Record `key` as the layout now on the canvas.
    pub fn commit(&mut self, key: LayoutKey) {
        self.applied = Some(key);
    }

    pub fn applied(&self) -> Option<&LayoutKey> {
        self.applied.as_ref()
    }
}

// ── Rotation transform ───────────────────────────────────────────

/// How the canvas angle moves between orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Assign the fixed angle for each orientation.
    ///
    /// Non-adjacent steps in the table (e.g. 180° → 270°, which goes from
    /// -180° to +90°) animate the long way round.
    #[default]
    Direct,
    /// Accumulate the angle so each change turns by at most 180°.
    ShortestPath,
}

/// Fixed canvas angle that turns a captured image upright.
pub const fn upright_angle(rotation: Rotation) -> i32 {
    match rotation {
        Rotation::Deg0 => 0,
        Rotation::Deg90 => -90,
        Rotation::Deg180 => -180,
        Rotation::Deg270 => 90,
    }
}

/// Tracks the angle last written to the canvas transform.
#[derive(Debug, Clone, Default)]
pub struct CanvasRotation {
    strategy: RotationStrategy,
    angle: Option<i32>,
}

impl CanvasRotation {
    pub fn new(strategy: RotationStrategy) -> Self {
        Self {
            strategy,
            angle: None,
        }
    }

    /// Angle currently on the canvas, if any has been applied.
    pub fn current(&self) -> Option<i32> {
        self.angle
    }

    /// Compute (and remember) the canvas angle for `rotation`.
    pub fn angle_for(&mut self, rotation: Rotation) -> i32 {
        let target = upright_angle(rotation);
        let angle = match (self.strategy, self.angle) {
            (RotationStrategy::ShortestPath, Some(current)) => {
                let mut delta = (target - current).rem_euclid(360);
                if delta > 180 {
                    delta -= 360;
                }
                current + delta
            }
            _ => target,
        };
        self.angle = Some(angle);
        angle
    }
}
