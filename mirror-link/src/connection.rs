//! TCP control connection to the device.
//!
//! Every [`ControlEvent`] is written as one tagged frame:
//! `kind(1) + len(u16 LE) + bincode payload`. The device never answers
//! on this stream.

use std::net::SocketAddr;
use std::time::Duration;

use mirror_core::{ControlEvent, MirrorError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;

/// Write side of the device control stream.
pub struct DeviceConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl DeviceConnection {
    /// Connect to the configured control address.
    pub async fn connect(config: &ViewerConfig) -> Result<Self, MirrorError> {
        Self::connect_to(config.control_addr()?, config.connect_timeout()).await
    }

    pub async fn connect_to(addr: SocketAddr, timeout: Duration) -> Result<Self, MirrorError> {
        info!("connecting to device control at {addr}");
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| MirrorError::Timeout(timeout))??;
        stream.set_nodelay(true)?;
        Ok(Self { stream, peer: addr })
    }

    /// Write one event.
    pub async fn send_event(&mut self, event: &ControlEvent) -> Result<(), MirrorError> {
        let frame = event.to_frame()?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Move the connection onto a writer task fed by an unbounded channel.
    ///
    /// The sender is a ready-made control channel for a session. The task
    /// ends when every sender is dropped, or on the first write error.
    pub fn spawn_writer(
        mut self,
    ) -> (
        mpsc::UnboundedSender<ControlEvent>,
        JoinHandle<Result<(), MirrorError>>,
    ) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ControlEvent>();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match self.send_event(&event).await {
                    Ok(()) => debug!("sent {event}"),
                    Err(MirrorError::Encoding(e)) => {
                        warn!("dropping unencodable {:?} event: {e}", event.kind());
                    }
                    Err(e) => {
                        warn!("control stream to {} failed: {e}", self.peer);
                        return Err(e);
                    }
                }
            }
            self.stream.shutdown().await?;
            debug!("control stream to {} closed", self.peer);
            Ok::<(), MirrorError>(())
        });
        (tx, task)
    }
}

/// Read one framed event.
///
/// Returns `None` when the stream ends on a frame boundary. A stream cut
/// anywhere inside a frame, header included, is an error.
pub async fn read_event<R>(reader: &mut R) -> Result<Option<ControlEvent>, MirrorError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 3];
    if reader.read(&mut header[..1]).await? == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut header[1..]).await?;
    let len = u16::from_le_bytes([header[1], header[2]]) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    ControlEvent::from_frame(header[0], &payload).map(Some)
}
