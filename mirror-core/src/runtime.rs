//! Tokio actor that drives a [`ScreenSession`].
//!
//! ```text
//!   SessionHandle ──Command──► mailbox (mpsc) ──► SessionActor ──► ScreenSession
//!        ▲                          ▲                  │
//!        │                          │                  └─► watch<SessionStatus>
//!        │                   FrameLoaded/Failed
//!        │                          │
//!        │                 fetch task (spawned) ◄── FetchSource::load
//!        └──────────────── status()
//! ```
//!
//! The actor owns the session and processes commands one at a time, in
//! arrival order. Fetches run on their own tasks and only ever talk back
//! through the mailbox. [`FetchSource`] holds the mailbox weakly, so the
//! actor stops (and tears the session down) once every handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{FrameLoadError, MirrorError};
use crate::frame::{Frame, FrameRequest, FrameSource, FrameTicket};
use crate::input::{Disposition, KeyInput, PointerEvent};
use crate::protocol::ControlChannel;
use crate::session::{DisplayInfo, ScreenSession, SessionConfig, SessionEvent, SessionStatus};
use crate::view::ScreenView;

// ── FrameFetcher ─────────────────────────────────────────────────

/// Fetches and decodes one device screen image.
#[async_trait]
pub trait FrameFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Frame, FrameLoadError>;
}

// ── FetchPolicy ──────────────────────────────────────────────────

/// Timeout and retry behaviour for a single frame request.
///
/// Retries happen inside one request, so the session still sees exactly
/// one resolution per ticket. The default never times out and never
/// retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Per-attempt deadline.
    pub timeout: Option<Duration>,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            retries: 0,
            backoff: Duration::from_millis(250),
        }
    }
}

impl FetchPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }

    /// Run `fetcher` for `url` under this policy.
    pub async fn fetch<F>(&self, fetcher: &F, url: &str) -> Result<Frame, FrameLoadError>
    where
        F: FrameFetcher + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let result = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, fetcher.fetch(url)).await {
                    Ok(result) => result,
                    Err(_) => Err(FrameLoadError::Timeout(limit)),
                },
                None => fetcher.fetch(url).await,
            };

            match result {
                Ok(frame) => return Ok(frame),
                Err(FrameLoadError::Cancelled) => return Err(FrameLoadError::Cancelled),
                Err(e) if attempt < self.retries => {
                    let delay = self.delay_for(attempt);
                    debug!(attempt = attempt + 1, ?delay, "frame fetch failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ── Mailbox ──────────────────────────────────────────────────────

struct Command {
    event: SessionEvent,
    reply: Option<oneshot::Sender<Disposition>>,
}

impl Command {
    fn post(event: SessionEvent) -> Self {
        Self { event, reply: None }
    }
}

// ── FetchSource ──────────────────────────────────────────────────

/// [`FrameSource`] that runs a [`FrameFetcher`] on a spawned task and
/// posts the outcome back to the session's mailbox.
pub struct FetchSource<F> {
    fetcher: Arc<F>,
    policy: FetchPolicy,
    mailbox: mpsc::WeakUnboundedSender<Command>,
    inflight: Option<JoinHandle<()>>,
}

impl<F: FrameFetcher> FetchSource<F> {
    fn new(
        fetcher: Arc<F>,
        policy: FetchPolicy,
        mailbox: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        Self {
            fetcher,
            policy,
            mailbox,
            inflight: None,
        }
    }
}

impl<F: FrameFetcher> FrameSource for FetchSource<F> {
    fn load(&mut self, ticket: FrameTicket, request: FrameRequest) {
        if let Some(previous) = self.inflight.take() {
            previous.abort();
        }

        let fetcher = Arc::clone(&self.fetcher);
        let policy = self.policy;
        let mailbox = self.mailbox.clone();
        self.inflight = Some(tokio::spawn(async move {
            let url = request.url();
            let event = match policy.fetch(fetcher.as_ref(), &url).await {
                Ok(frame) => SessionEvent::FrameLoaded { ticket, frame },
                Err(error) => SessionEvent::FrameFailed { ticket, error },
            };
            match mailbox.upgrade() {
                Some(tx) => {
                    let _ = tx.send(Command::post(event));
                }
                None => debug!(%ticket, "session gone, dropping frame result"),
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }
}

impl<F> Drop for FetchSource<F> {
    fn drop(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }
}

// ── SessionHandle ────────────────────────────────────────────────

/// Cloneable handle used by the host to feed a running session.
///
/// Once every handle is dropped the session is destroyed.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    /// Post an event without waiting for it to be processed.
    pub fn send(&self, event: SessionEvent) -> Result<(), MirrorError> {
        self.tx.send(Command::post(event))?;
        Ok(())
    }

    /// Post an event and wait for the session to process it.
    pub async fn dispatch(&self, event: SessionEvent) -> Result<Disposition, MirrorError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command {
            event,
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| MirrorError::ChannelClosed)
    }

    pub fn set_device_in_use(&self, in_use: bool) -> Result<(), MirrorError> {
        self.send(SessionEvent::DeviceInUse(in_use))
    }

    pub fn set_hidden(&self, hidden: bool) -> Result<(), MirrorError> {
        self.send(SessionEvent::VisibilityChanged { hidden })
    }

    pub fn set_can_view(&self, can_view: bool) -> Result<(), MirrorError> {
        self.send(SessionEvent::CanView(can_view))
    }

    pub fn set_show_screen(&self, show: bool) -> Result<(), MirrorError> {
        self.send(SessionEvent::ShowScreen(show))
    }

    pub fn resized(&self) -> Result<(), MirrorError> {
        self.send(SessionEvent::Resized)
    }

    pub fn rotated(&self, degrees: i32) -> Result<(), MirrorError> {
        self.send(SessionEvent::Rotated(degrees))
    }

    pub fn display_changed(&self, display: DisplayInfo) -> Result<(), MirrorError> {
        self.send(SessionEvent::DisplayChanged(display))
    }

    /// Forward a pointer event; the host should honour the returned
    /// disposition on the native event.
    pub async fn pointer(&self, event: PointerEvent) -> Result<Disposition, MirrorError> {
        self.dispatch(SessionEvent::Pointer(event)).await
    }

    pub async fn key(&self, input: KeyInput) -> Result<Disposition, MirrorError> {
        self.dispatch(SessionEvent::Key(input)).await
    }

    /// Destroy the session. The actor exits once this is processed.
    pub fn destroy(&self) -> Result<(), MirrorError> {
        self.send(SessionEvent::Destroy)
    }

    /// Latest published status.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// A receiver that is notified whenever the status changes.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ── SessionActor ─────────────────────────────────────────────────

struct SessionActor<F, C, V> {
    session: ScreenSession<FetchSource<F>, C, V>,
    mailbox: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SessionStatus>,
}

impl<F, C, V> SessionActor<F, C, V>
where
    F: FrameFetcher,
    C: ControlChannel,
    V: ScreenView,
{
    async fn run(mut self) -> Result<(), MirrorError> {
        while let Some(Command { event, reply }) = self.mailbox.recv().await {
            let destroy = matches!(event, SessionEvent::Destroy);

            match self.session.handle(event) {
                Ok(disposition) => {
                    if let Some(reply) = reply {
                        let _ = reply.send(disposition);
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!("screen session aborted: {e}");
                    self.session.destroy();
                    self.publish();
                    return Err(e);
                }
                Err(e) => warn!("event failed: {e}"),
            }
            self.publish();

            if destroy {
                return Ok(());
            }
        }

        info!("all session handles dropped");
        self.session.destroy();
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        let next = self.session.status();
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Start a session on the current tokio runtime.
///
/// Fails without spawning anything if the display or the initial power-on
/// is misconfigured. The returned task resolves when the session ends,
/// with the fatal error if one stopped it.
pub fn spawn_session<F, C, V>(
    config: SessionConfig,
    display: DisplayInfo,
    fetcher: F,
    policy: FetchPolicy,
    control: C,
    view: V,
) -> Result<(SessionHandle, JoinHandle<Result<(), MirrorError>>), MirrorError>
where
    F: FrameFetcher,
    C: ControlChannel + Send + 'static,
    V: ScreenView + Send + 'static,
{
    let (tx, mailbox) = mpsc::unbounded_channel();
    let source = FetchSource::new(Arc::new(fetcher), policy, tx.downgrade());
    let session = ScreenSession::new(config, display, source, control, view)?;

    let (status_tx, status_rx) = watch::channel(session.status());
    let actor = SessionActor {
        session,
        mailbox,
        status: status_tx,
    };
    let task = tokio::spawn(actor.run());

    Ok((
        SessionHandle {
            tx,
            status: status_rx,
        },
        task,
    ))
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl FrameFetcher for Flaky {
        async fn fetch(&self, _url: &str) -> Result<Frame, FrameLoadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FrameLoadError::Failed(format!("attempt {call}")))
            } else {
                Ok(Frame::blank(4, 4))
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl FrameFetcher for Stalled {
        async fn fetch(&self, _url: &str) -> Result<Frame, FrameLoadError> {
            std::future::pending().await
        }
    }

    fn quick(retries: u32) -> FetchPolicy {
        FetchPolicy {
            timeout: Some(Duration::from_millis(20)),
            retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let policy = FetchPolicy {
            backoff: Duration::from_millis(100),
            ..FetchPolicy::default()
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert!(policy.delay_for(64) >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn default_policy_does_not_retry() {
        let fetcher = Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
        };
        let result = FetchPolicy::default().fetch(&fetcher, "u").await;
        assert!(matches!(result, Err(FrameLoadError::Failed(_))));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let fetcher = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let frame = quick(2).fetch(&fetcher, "u").await.unwrap();
        assert_eq!(frame.width, 4);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let fetcher = Flaky {
            failures: 10,
            calls: AtomicU32::new(0),
        };
        assert!(quick(2).fetch(&fetcher, "u").await.is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let result = quick(0).fetch(&Stalled, "u").await;
        assert_eq!(result, Err(FrameLoadError::Timeout(Duration::from_millis(20))));
    }
}
