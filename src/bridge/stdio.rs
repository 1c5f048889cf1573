//! JSON-lines transport over any async byte stream
//!
//! One JSON object per line in each direction: [`OutboundMessage`] from us,
//! [`HostEvent`] from the host. Used by the probe binary over stdin/stdout and
//! by integration tests over an in-memory duplex.

use super::envelope::{HostEvent, OutboundMessage};
use super::{Bridge, CommandChannel};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Command channel that queues messages for the writer task
#[derive(Clone)]
pub struct StdioChannel {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl CommandChannel for StdioChannel {
    fn send(&self, message: OutboundMessage) -> BridgeResult<()> {
        self.tx
            .send(message)
            .map_err(|_| BridgeError::Transport("host connection closed".into()))
    }
}

/// Spawn the writer task serializing queued messages onto `writer`
pub fn spawn_writer<W>(writer: W) -> (StdioChannel, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();

    let handle = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(message) = rx.recv().await {
            let mut line = match serde_json::to_string(&message) {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to encode '{}': {}", message.command, e);
                    continue;
                }
            };
            line.push('\n');

            if let Err(e) = writer.write_all(line.as_bytes()).await {
                log::error!("Host write failed: {}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                log::error!("Host flush failed: {}", e);
                break;
            }
        }
        log::debug!("Host writer stopped");
    });

    (StdioChannel { tx }, handle)
}

/// Spawn the reader task feeding host events into `bridge`
///
/// On end of stream every pending request is rejected with a transport error.
pub fn spawn_reader<R>(reader: R, bridge: Arc<Bridge>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<HostEvent>(line) {
                        Ok(event) => bridge.handle_event(event),
                        Err(e) => log::warn!("Ignoring malformed host line: {}", e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Host read failed: {}", e);
                    break;
                }
            }
        }
        log::info!("Native host connection closed");
        bridge
            .correlator()
            .fail_all(BridgeError::Transport("host connection closed".into()));
    })
}

/// Background tasks owned by a stdio bridge
pub struct StdioTasks {
    pub reader: JoinHandle<()>,
    pub writer: JoinHandle<()>,
}

impl StdioTasks {
    pub fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Wire a bridge to a host speaking JSON lines on `reader`/`writer`
pub fn connect<R, W>(config: BridgeConfig, reader: R, writer: W) -> (Arc<Bridge>, StdioTasks)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (channel, writer) = spawn_writer(writer);
    let bridge = Arc::new(Bridge::new(
        config,
        Some(Arc::new(channel) as Arc<dyn CommandChannel>),
    ));
    let reader = spawn_reader(reader, bridge.clone());
    (bridge, StdioTasks { reader, writer })
}
