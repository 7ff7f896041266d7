//! Coordinate mapping between the local container and the remote device.
//!
//! The device image is drawn into a canvas that is letterboxed inside the
//! container and visually rotated to counter the device orientation. The
//! [`Scaler`] knows the device's native size and converts container pixels
//! into proportional device coordinates using the same geometry.

use std::fmt;

use crate::error::MirrorError;

// ── Rotation ─────────────────────────────────────────────────────

/// Device orientation as reported by the device, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// All four orientations in cycle order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Parse a reported orientation, rejecting anything off the cycle.
    pub fn from_degrees(degrees: i32) -> Result<Self, MirrorError> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(MirrorError::InvalidRotation(other)),
        }
    }

    pub const fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether the device is on its side (width and height swap on screen).
    pub const fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = MirrorError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

// ── Plain geometry types ─────────────────────────────────────────

/// Size of the hosting container in CSS-like pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the viewport unchanged, or a configuration error if either
    /// dimension is zero.
    pub fn ensure_positive(self) -> Result<Self, MirrorError> {
        if self.is_empty() {
            return Err(MirrorError::empty_viewport(self.width, self.height));
        }
        Ok(self)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A whole-pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// A point relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point expressed as fractions of the device's native width/height.
///
/// Both components are always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProportionalPoint {
    pub x: f64,
    pub y: f64,
}

// ── Scaler ───────────────────────────────────────────────────────

/// Maps between container space and device space for one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
    native_width: u32,
    native_height: u32,
}

impl Scaler {
    /// Create a scaler for a device of the given native size.
    pub fn new(native_width: u32, native_height: u32) -> Result<Self, MirrorError> {
        if native_width == 0 || native_height == 0 {
            return Err(MirrorError::empty_display(native_width, native_height));
        }
        Ok(Self {
            native_width,
            native_height,
        })
    }

    pub fn native_width(&self) -> u32 {
        self.native_width
    }

    pub fn native_height(&self) -> u32 {
        self.native_height
    }

    fn ratio(&self) -> f64 {
        f64::from(self.native_width) / f64::from(self.native_height)
    }

    /// Size the canvas must be styled to so that, once rotated, it fills
    /// the container as much as possible without distorting the image.
    ///
    /// The result is in the canvas' own (unrotated) orientation, which is
    /// why width and height are swapped for 90° and 270°.
    pub fn projected_size(
        &self,
        viewport: Viewport,
        rotation: Rotation,
    ) -> Result<Size, MirrorError> {
        let viewport = viewport.ensure_positive()?;
        let (w, h) = oriented(viewport, rotation);
        let ratio = self.ratio();

        let (width, height) = if ratio > w / h {
            (w, w / ratio)
        } else {
            (h * ratio, h)
        };

        Ok(Size {
            width: width.floor() as u32,
            height: height.floor() as u32,
        })
    }

    /// Convert a container point into proportional device coordinates.
    ///
    /// The point is clamped to the container first; points that fall in the
    /// letterbox bars clamp to the nearest device edge.
    pub fn to_device_proportional(
        &self,
        viewport: Viewport,
        point: Point,
        rotation: Rotation,
    ) -> Result<ProportionalPoint, MirrorError> {
        let viewport = viewport.ensure_positive()?;
        let bw = f64::from(viewport.width);
        let bh = f64::from(viewport.height);
        let px = finite_or_zero(point.x).clamp(0.0, bw);
        let py = finite_or_zero(point.y).clamp(0.0, bh);

        // Undo the canvas rotation: express the point in the canvas' own axes.
        let (mut w, mut h, mut x, mut y) = match rotation {
            Rotation::Deg0 => (bw, bh, px, py),
            Rotation::Deg90 => (bh, bw, bh - py, px),
            Rotation::Deg180 => (bw, bh, bw - px, bh - py),
            Rotation::Deg270 => (bh, bw, py, bw - px),
        };

        // Undo the letterboxing.
        let ratio = self.ratio();
        if ratio > w / h {
            let scaled = w / ratio;
            y -= (h - scaled) / 2.0;
            h = scaled;
        } else {
            let scaled = h * ratio;
            x -= (w - scaled) / 2.0;
            w = scaled;
        }

        Ok(ProportionalPoint {
            x: (x / w).clamp(0.0, 1.0),
            y: (y / h).clamp(0.0, 1.0),
        })
    }
}

/// NaN and infinities carry no position; treat them as the origin.
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Container dimensions as seen from the canvas' own axes.
fn oriented(viewport: Viewport, rotation: Rotation) -> (f64, f64) {
    let bw = f64::from(viewport.width);
    let bh = f64::from(viewport.height);
    if rotation.is_sideways() {
        (bh, bw)
    } else {
        (bw, bh)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn phone() -> Scaler {
        Scaler::new(1080, 1920).unwrap()
    }

    #[test]
    fn rotation_parsing() {
        assert_eq!(Rotation::from_degrees(0).unwrap(), Rotation::Deg0);
        assert_eq!(Rotation::try_from(270).unwrap(), Rotation::Deg270);
        assert!(matches!(
            Rotation::from_degrees(45),
            Err(MirrorError::InvalidRotation(45))
        ));
        assert!(matches!(
            Rotation::from_degrees(360),
            Err(MirrorError::InvalidRotation(360))
        ));
        assert!(Rotation::from_degrees(-90).is_err());
    }

    #[test]
    fn zero_native_size_is_rejected() {
        assert!(matches!(
            Scaler::new(0, 1920),
            Err(MirrorError::Configuration { .. })
        ));
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let scaler = phone();
        assert!(scaler
            .projected_size(Viewport::new(0, 800), Rotation::Deg0)
            .is_err());
        assert!(scaler
            .to_device_proportional(Viewport::new(400, 0), Point::new(1.0, 1.0), Rotation::Deg0)
            .is_err());
    }

    #[test]
    fn center_click_maps_to_center() {
        let viewport = Viewport::new(400, 800);
        let p = phone()
            .to_device_proportional(viewport, Point::new(200.0, 400.0), Rotation::Deg0)
            .unwrap();
        assert!((p.x - 0.5).abs() < EPS, "x = {}", p.x);
        assert!((p.y - 0.5).abs() < EPS, "y = {}", p.y);
    }

    #[test]
    fn non_finite_points_map_to_the_origin_corner() {
        let viewport = Viewport::new(400, 800);
        let scaler = phone();
        let nan = scaler
            .to_device_proportional(viewport, Point::new(f64::NAN, f64::NAN), Rotation::Deg0)
            .unwrap();
        let origin = scaler
            .to_device_proportional(viewport, Point::new(0.0, 0.0), Rotation::Deg0)
            .unwrap();
        assert_eq!(nan, origin);

        let inf = scaler
            .to_device_proportional(viewport, Point::new(f64::INFINITY, 400.0), Rotation::Deg0)
            .unwrap();
        assert!(inf.x.is_finite() && inf.y.is_finite());
        assert_eq!(inf.x, 0.0);
    }

    #[test]
    fn center_is_fixed_under_every_rotation() {
        let scaler = phone();
        let viewports = [
            Viewport::new(400, 800),
            Viewport::new(800, 400),
            Viewport::new(500, 500),
        ];
        for viewport in viewports {
            let center = Point::new(
                f64::from(viewport.width) / 2.0,
                f64::from(viewport.height) / 2.0,
            );
            for rotation in Rotation::ALL {
                let p = scaler.to_device_proportional(viewport, center, rotation).unwrap();
                assert!((p.x - 0.5).abs() < EPS, "{viewport} {rotation}: x = {}", p.x);
                assert!((p.y - 0.5).abs() < EPS, "{viewport} {rotation}: y = {}", p.y);
            }
        }
    }

    #[test]
    fn corners_follow_the_canvas_rotation() {
        // Square device in a square container: no letterboxing, so the
        // container's top-left corner lands exactly on a device corner.
        let scaler = Scaler::new(100, 100).unwrap();
        let viewport = Viewport::new(100, 100);
        let top_left = Point::new(0.0, 0.0);

        let cases = [
            (Rotation::Deg0, (0.0, 0.0)),
            // Canvas turned -90°: its top-right corner is now top-left.
            (Rotation::Deg90, (1.0, 0.0)),
            (Rotation::Deg180, (1.0, 1.0)),
            // Canvas turned +90°: its bottom-left corner is now top-left.
            (Rotation::Deg270, (0.0, 1.0)),
        ];

        for (rotation, (ex, ey)) in cases {
            let p = scaler.to_device_proportional(viewport, top_left, rotation).unwrap();
            assert!((p.x - ex).abs() < EPS && (p.y - ey).abs() < EPS, "{rotation}: {p:?}");
        }
    }

    #[test]
    fn points_outside_the_container_are_clamped() {
        let scaler = phone();
        let viewport = Viewport::new(400, 800);
        let p = scaler
            .to_device_proportional(viewport, Point::new(-50.0, 10_000.0), Rotation::Deg0)
            .unwrap();
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 1.0);

        // Inside the container but in the letterbox bar above the image.
        let p = scaler
            .to_device_proportional(viewport, Point::new(200.0, 5.0), Rotation::Deg0)
            .unwrap();
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn projected_size_fills_the_limiting_axis() {
        let scaler = phone();
        let size = scaler
            .projected_size(Viewport::new(400, 800), Rotation::Deg0)
            .unwrap();
        assert_eq!(size, Size { width: 400, height: 711 });

        let size = scaler
            .projected_size(Viewport::new(400, 800), Rotation::Deg90)
            .unwrap();
        assert_eq!(size, Size { width: 225, height: 400 });
    }

    #[test]
    fn projected_size_preserves_aspect_ratio_for_all_rotations() {
        let scaler = phone();
        let ratio = 1080.0 / 1920.0;
        let viewports = [
            Viewport::new(400, 800),
            Viewport::new(1280, 720),
            Viewport::new(333, 333),
            Viewport::new(1, 1000),
            Viewport::new(2000, 37),
        ];

        for viewport in viewports {
            for rotation in Rotation::ALL {
                let size = scaler.projected_size(viewport, rotation).unwrap();

                // On screen the rotated canvas swaps its footprint iff sideways.
                let (on_w, on_h) = if rotation.is_sideways() {
                    (size.height, size.width)
                } else {
                    (size.width, size.height)
                };
                assert!(
                    on_w <= viewport.width && on_h <= viewport.height,
                    "{viewport} {rotation}: {size:?}"
                );
                assert!(
                    on_w == viewport.width || on_h == viewport.height,
                    "{viewport} {rotation}: {size:?} does not touch the container"
                );

                // Flooring loses at most one pixel on the derived axis.
                let (w, h) = (f64::from(size.width), f64::from(size.height));
                if size.height > 0 {
                    assert!(
                        (w - h * ratio).abs() <= 1.0 || (h - w / ratio).abs() <= 1.0,
                        "{viewport} {rotation}: {size:?}"
                    );
                }
            }
        }
    }
}
