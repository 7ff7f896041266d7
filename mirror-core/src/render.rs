//! Continuous fetch → draw → fetch loop.
//!
//! ```text
//!   Idle ──request──► Requesting ──settle──► Applying ──draw──► Idle ─► (next request)
//!    ▲                    │
//!    └──── fail/cancel ───┘
//! ```
//!
//! At most one request is outstanding. A resolution is accepted only if it
//! carries the ticket of that request; [`cancel`](RenderLoop::cancel)
//! forgets the ticket, which turns any late resolution into a no-op.

use tracing::{debug, trace, warn};

use crate::error::{FrameLoadError, MirrorError};
use crate::frame::{CacheBuster, Frame, FrameRequest, FrameSource, FrameTicket};
use crate::geometry::{Rotation, Scaler, Viewport};
use crate::layout::{CanvasRotation, FrameCache, LayoutKey, RotationStrategy};
use crate::stats::FpsMeter;
use crate::view::ScreenView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPhase {
    #[default]
    Idle,
    Requesting,
    Applying,
}

/// Owns the canvas layout state and the single outstanding request.
#[derive(Debug, Clone, Default)]
pub struct RenderLoop {
    phase: RenderPhase,
    generation: u64,
    next_id: u64,
    outstanding: Option<FrameTicket>,
    cache: FrameCache,
    rotation: CanvasRotation,
    display_error: bool,
    fps: FpsMeter,
    frames_drawn: u64,
    cache_buster: CacheBuster,
}

impl RenderLoop {
    pub fn new(strategy: RotationStrategy) -> Self {
        Self {
            rotation: CanvasRotation::new(strategy),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// The loading flag: a request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn outstanding(&self) -> Option<FrameTicket> {
        self.outstanding
    }

    /// Power-cycle epoch for new tickets.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Set by a failed frame, cleared by the next drawn frame.
    pub fn display_error(&self) -> bool {
        self.display_error
    }

    pub fn fps(&self) -> Option<f64> {
        self.fps.fps()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Issue the next frame request unless one is already outstanding.
    ///
    /// Returns whether a request was issued. Fails fast, without issuing
    /// anything, if the viewport is empty.
    pub fn request<S: FrameSource>(
        &mut self,
        source: &mut S,
        base_url: &str,
        viewport: Viewport,
    ) -> Result<bool, MirrorError> {
        if let Some(ticket) = self.outstanding {
            trace!(%ticket, "request skipped, frame already in flight");
            return Ok(false);
        }
        let viewport = viewport.ensure_positive()?;

        let ticket = FrameTicket {
            generation: self.generation,
            id: self.next_id,
        };
        self.next_id += 1;
        let request = FrameRequest::new(base_url, viewport, self.cache_buster.next());
        trace!(%ticket, url = %request, "requesting frame");

        self.outstanding = Some(ticket);
        self.phase = RenderPhase::Requesting;
        source.load(ticket, request);
        Ok(true)
    }

    /// Accept a resolution for `ticket`. Returns `false`, changing nothing,
    /// if it is not the outstanding request.
    pub fn settle(&mut self, ticket: FrameTicket) -> bool {
        if self.outstanding != Some(ticket) {
            debug!(%ticket, "ignoring stale frame resolution");
            return false;
        }
        self.outstanding = None;
        self.phase = RenderPhase::Idle;
        true
    }

    /// Record a failed fetch. The loop stays idle until re-triggered.
    pub fn fail(&mut self, ticket: FrameTicket, error: &FrameLoadError) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        if !self.display_error {
            warn!(%ticket, "screen unavailable: {error}");
        } else {
            debug!(%ticket, "screen still unavailable: {error}");
        }
        self.display_error = true;
        true
    }

    /// Draw a settled frame, restyling the canvas first if its layout changed.
    pub fn apply<V: ScreenView>(
        &mut self,
        view: &mut V,
        frame: &Frame,
        viewport: Viewport,
        rotation: Rotation,
        scaler: &Scaler,
    ) -> Result<(), MirrorError> {
        let key = LayoutKey::new(viewport, frame, rotation);
        let relayout = if self.cache.needs_layout_update(&key) {
            Some(scaler.projected_size(viewport, rotation)?)
        } else {
            None
        };

        self.phase = RenderPhase::Applying;
        if let Some(size) = relayout {
            let angle = self.rotation.angle_for(rotation);
            debug!(
                image = %format_args!("{}x{}", frame.width, frame.height),
                projected = %format_args!("{}x{}", size.width, size.height),
                angle,
                "canvas layout updated"
            );
            view.resize_buffer(frame.width, frame.height);
            view.set_display_size(size);
            view.set_rotation(angle);
            self.cache.commit(key);
        }

        view.draw(frame);
        self.frames_drawn += 1;
        self.fps.record();
        if self.display_error {
            debug!("screen recovered");
            self.display_error = false;
        }
        self.phase = RenderPhase::Idle;
        Ok(())
    }

    /// Stop halting: forget the outstanding request and tell the source.
    ///
    /// Safe to call any number of times.
    pub fn cancel<S: FrameSource>(&mut self, source: &mut S) {
        if let Some(ticket) = self.outstanding.take() {
            debug!(%ticket, "in-flight frame abandoned");
        }
        self.generation += 1;
        self.phase = RenderPhase::Idle;
        source.cancel();
    }

    /// The screen is no longer shown: clear the frame-rate metric.
    pub fn halt(&mut self) {
        self.fps.reset();
    }
}

// ── Tests ────────────────────────────────────────────────────────
