//! Glue: config → control connection → running session.

use mirror_core::{FrameFetcher, MirrorError, ScreenView, SessionHandle, spawn_session};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ViewerConfig;
use crate::connection::DeviceConnection;

/// A running session and the task writing its control events.
pub struct Viewer {
    handle: SessionHandle,
    session: JoinHandle<Result<(), MirrorError>>,
    writer: JoinHandle<Result<(), MirrorError>>,
}

impl Viewer {
    /// Connect the control stream and start a session for `view`.
    pub async fn launch<F, V>(
        config: &ViewerConfig,
        fetcher: F,
        view: V,
    ) -> Result<Self, MirrorError>
    where
        F: FrameFetcher,
        V: ScreenView + Send + 'static,
    {
        let connection = DeviceConnection::connect(config).await?;
        let (control, writer) = connection.spawn_writer();
        let (handle, session) = spawn_session(
            config.session_config(),
            config.display_info(),
            fetcher,
            config.fetch_policy(),
            control,
            view,
        )?;
        info!(url = %config.screen.url, "viewer started");
        Ok(Self {
            handle,
            session,
            writer,
        })
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Destroy the session and wait for both tasks to finish.
    ///
    /// Returns the session's error if it had already failed, otherwise
    /// the writer's.
    pub async fn shutdown(self) -> Result<(), MirrorError> {
        let Self {
            handle,
            session,
            writer,
        } = self;

        // Already gone if a fatal error stopped it.
        let _ = handle.destroy();
        drop(handle);

        let session = session.await.map_err(|e| MirrorError::Other(e.to_string()))?;
        // The session owned the last control sender, so the writer drains and exits.
        let writer = writer.await.map_err(|e| MirrorError::Other(e.to_string()))?;
        info!("viewer stopped");
        session.and(writer)
    }
}
