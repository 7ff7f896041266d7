//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mirror_core::{
    DisplayInfo, Frame, FrameRequest, FrameSource, FrameTicket, Point, ScreenSession, ScreenView,
    SessionConfig, SessionEvent, Signals, Size, Viewport,
};

pub const DEVICE_URL: &str = "http://device.local/screen.jpg";

// ── RecordingView ────────────────────────────────────────────────

/// A screen view that remembers every call made on it.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub bounds: Viewport,
    pub buffer: Option<(u32, u32)>,
    pub display: Option<Size>,
    pub angles: Vec<i32>,
    pub draws: u32,
    pub touch_active: bool,
    pub finger: Option<Point>,
    pub focused: u32,
}

impl RecordingView {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            bounds: Viewport::new(width, height),
            ..Self::default()
        }
    }
}

impl ScreenView for RecordingView {
    fn bounds(&self) -> Viewport {
        self.bounds
    }
    fn resize_buffer(&mut self, width: u32, height: u32) {
        self.buffer = Some((width, height));
    }
    fn set_display_size(&mut self, size: Size) {
        self.display = Some(size);
    }
    fn set_rotation(&mut self, degrees: i32) {
        self.angles.push(degrees);
    }
    fn draw(&mut self, _frame: &Frame) {
        self.draws += 1;
    }
    fn set_touch_active(&mut self, active: bool) {
        self.touch_active = active;
    }
    fn move_finger(&mut self, point: Point) {
        self.finger = Some(point);
    }
    fn focus_input(&mut self) {
        self.focused += 1;
    }
}

/// A [`RecordingView`] the test can inspect while a runtime owns it.
#[derive(Debug, Clone, Default)]
pub struct SharedView(pub Arc<Mutex<RecordingView>>);

impl SharedView {
    pub fn sized(width: u32, height: u32) -> Self {
        Self(Arc::new(Mutex::new(RecordingView::sized(width, height))))
    }

    pub fn draws(&self) -> u32 {
        self.0.lock().unwrap().draws
    }
}

impl ScreenView for SharedView {
    fn bounds(&self) -> Viewport {
        self.0.lock().unwrap().bounds()
    }
    fn resize_buffer(&mut self, width: u32, height: u32) {
        self.0.lock().unwrap().resize_buffer(width, height);
    }
    fn set_display_size(&mut self, size: Size) {
        self.0.lock().unwrap().set_display_size(size);
    }
    fn set_rotation(&mut self, degrees: i32) {
        self.0.lock().unwrap().set_rotation(degrees);
    }
    fn draw(&mut self, frame: &Frame) {
        self.0.lock().unwrap().draw(frame);
    }
    fn set_touch_active(&mut self, active: bool) {
        self.0.lock().unwrap().set_touch_active(active);
    }
    fn move_finger(&mut self, point: Point) {
        self.0.lock().unwrap().move_finger(point);
    }
    fn focus_input(&mut self) {
        self.0.lock().unwrap().focus_input();
    }
}

// ── ManualSource ─────────────────────────────────────────────────

/// A frame source the test resolves by hand.
#[derive(Debug, Default)]
pub struct ManualSource {
    /// Every request ever issued, in order.
    pub requests: Vec<(FrameTicket, FrameRequest)>,
    /// The request the source is still working on.
    pub pending: Option<FrameTicket>,
    /// Loads issued while another was still pending.
    pub overlapping: u32,
    pub cancels: u32,
}

impl ManualSource {
    pub fn last_ticket(&self) -> Option<FrameTicket> {
        self.requests.last().map(|(ticket, _)| *ticket)
    }

    pub fn last_request(&self) -> Option<&FrameRequest> {
        self.requests.last().map(|(_, request)| request)
    }
}

impl FrameSource for ManualSource {
    fn load(&mut self, ticket: FrameTicket, request: FrameRequest) {
        if self.pending.is_some() {
            self.overlapping += 1;
        }
        self.pending = Some(ticket);
        self.requests.push((ticket, request));
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.pending = None;
    }
}

// ── Sessions ─────────────────────────────────────────────────────

pub type TestSession = ScreenSession<ManualSource, Vec<mirror_core::ControlEvent>, RecordingView>;

pub fn display() -> DisplayInfo {
    DisplayInfo::new(DEVICE_URL, 1080, 1920)
}

/// Signals of a device in use whose screen should be shown.
pub fn showing() -> Signals {
    Signals {
        device_in_use: true,
        tab_visible: true,
        can_view: true,
        show_screen: true,
    }
}

pub fn session_with(signals: Signals, view: RecordingView) -> TestSession {
    let config = SessionConfig {
        signals,
        ..SessionConfig::default()
    };
    ScreenSession::new(config, display(), ManualSource::default(), Vec::new(), view).unwrap()
}

/// A 400x800 session that is powered on and has one request in flight.
pub fn showing_session() -> TestSession {
    session_with(showing(), RecordingView::sized(400, 800))
}

/// Resolve the pending request with a frame.
pub fn deliver(session: &mut TestSession, frame: Frame) -> FrameTicket {
    let ticket = session
        .source_mut()
        .pending
        .take()
        .expect("no request pending");
    session
        .handle(SessionEvent::FrameLoaded { ticket, frame })
        .unwrap();
    ticket
}

pub fn device_frame() -> Frame {
    Frame::blank(1080, 1920)
}
