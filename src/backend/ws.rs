use super::socketio::{self, Packet};
use super::types::{FinishedEvent, RunAction, StatusEvent};
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

/// Events emitted by the backend push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Status(StatusEvent),
    Finished(FinishedEvent),
    Disconnected(String),
}

/// How a single connection ended.
enum Flow {
    /// Server or transport closed the socket; reconnect.
    Closed,
    /// The consumer side is gone; stop for good.
    Shutdown,
}

pub struct PipelineChannel {
    url: String,
    reconnect_delay: Duration,
}

impl PipelineChannel {
    pub fn new(url: &str, reconnect_delay: Duration) -> Self {
        Self {
            url: url.to_string(),
            reconnect_delay,
        }
    }

    /// Connect and run the Socket.IO loop, reconnecting until the event
    /// receiver or the outbound sender side goes away. Run requests sent on
    /// `outbound` before the namespace is joined stay queued.
    pub async fn run(&self, mut outbound: mpsc::Receiver<RunAction>, tx: mpsc::Sender<ChannelEvent>) {
        loop {
            match self.connect_and_listen(&mut outbound, &tx).await {
                Ok(Flow::Shutdown) => {
                    tracing::debug!("pipeline channel shut down");
                    return;
                }
                Ok(Flow::Closed) => {
                    tracing::warn!("pipeline channel closed, reconnecting...");
                    if tx
                        .send(ChannelEvent::Disconnected("conexión cerrada".to_string()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "pipeline channel error: {:#}, reconnecting in {}s...",
                        e,
                        self.reconnect_delay.as_secs()
                    );
                    if tx
                        .send(ChannelEvent::Disconnected(format!("{:#}", e)))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn connect_and_listen(
        &self,
        outbound: &mut mpsc::Receiver<RunAction>,
        tx: &mpsc::Sender<ChannelEvent>,
    ) -> Result<Flow> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .context("WS connection failed")?;
        let (mut write, mut read) = ws_stream.split();
        tracing::debug!(url = %self.url, "pipeline channel transport open");

        let mut joined = false;
        loop {
            tokio::select! {
                msg = read.next() => {
                    let Some(msg) = msg else {
                        return Ok(Flow::Closed);
                    };
                    let text = match msg.context("WS read error")? {
                        Message::Text(text) => text,
                        Message::Ping(data) => {
                            write.send(Message::Pong(data)).await?;
                            continue;
                        }
                        Message::Close(_) => {
                            tracing::debug!("pipeline channel received close frame");
                            return Ok(Flow::Closed);
                        }
                        _ => continue,
                    };

                    let packet = match socketio::decode(&text) {
                        Ok(packet) => packet,
                        Err(e) => {
                            tracing::warn!("socket.io parse error: {:#}", e);
                            continue;
                        }
                    };

                    match packet {
                        Packet::Open(handshake) => {
                            tracing::debug!(sid = %handshake["sid"], "engine.io handshake");
                            write
                                .send(Message::Text(socketio::encode(&Packet::connect())))
                                .await
                                .context("namespace connect failed")?;
                        }
                        Packet::Connect { .. } => {
                            joined = true;
                            tracing::info!("connected to pipeline channel");
                            if tx.send(ChannelEvent::Connected).await.is_err() {
                                return Ok(Flow::Shutdown);
                            }
                        }
                        Packet::Ping => {
                            write
                                .send(Message::Text(socketio::encode(&Packet::Pong)))
                                .await
                                .context("pong failed")?;
                        }
                        Packet::Event { name, args, .. } => {
                            if let Some(event) = decode_event(&name, args) {
                                if tx.send(event).await.is_err() {
                                    return Ok(Flow::Shutdown);
                                }
                            }
                        }
                        Packet::ConnectError { data, .. } => {
                            anyhow::bail!("namespace connect refused: {}", data.unwrap_or_default());
                        }
                        Packet::Close | Packet::Disconnect { .. } => return Ok(Flow::Closed),
                        Packet::Pong | Packet::Noop | Packet::Other(_) => {}
                    }
                }
                action = outbound.recv(), if joined => {
                    let Some(action) = action else {
                        return Ok(Flow::Shutdown);
                    };
                    let text = socketio::encode(&Packet::event(action.event_name(), Vec::new()));
                    write
                        .send(Message::Text(text))
                        .await
                        .context("run request emit failed")?;
                    tracing::info!(event = action.event_name(), "run request sent");
                }
            }
        }
    }
}

fn decode_event(name: &str, args: Vec<Value>) -> Option<ChannelEvent> {
    let payload = args.into_iter().next().unwrap_or(Value::Null);
    match name {
        "status" => match serde_json::from_value::<StatusEvent>(payload) {
            Ok(ev) => Some(ChannelEvent::Status(ev)),
            Err(e) => {
                tracing::warn!("malformed status event: {}", e);
                None
            }
        },
        "pipeline_finished" => {
            if payload.is_null() {
                return Some(ChannelEvent::Finished(FinishedEvent::default()));
            }
            match serde_json::from_value::<FinishedEvent>(payload) {
                Ok(ev) => Some(ChannelEvent::Finished(ev)),
                Err(e) => {
                    tracing::warn!("malformed pipeline_finished event: {}", e);
                    None
                }
            }
        }
        other => {
            tracing::trace!(event = other, "unhandled channel event");
            None
        }
    }
}

/// Live subscription to the pipeline channel. Dropping the handle stops the
/// channel task, which closes the event stream; nothing is delivered after.
pub struct ChannelHandle {
    outbound: mpsc::Sender<RunAction>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    pub fn spawn(channel: PipelineChannel, events: mpsc::Sender<ChannelEvent>) -> Self {
        let (outbound, outbound_rx) = mpsc::channel(8);
        let task = tokio::spawn(async move { channel.run(outbound_rx, events).await });
        Self { outbound, task }
    }

    /// Sender for run requests; each becomes a `run_*` emit.
    pub fn sender(&self) -> mpsc::Sender<RunAction> {
        self.outbound.clone()
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
