//! WebSocket client and connection supervisor.
//!
//! The public [`WebSocketClient`] is a cheap handle; the real work
//! happens in a dedicated supervisor task that owns the transport
//! handle, the lifecycle state machine and the outbound queue. Caller
//! operations (`connect`, `send`, `disconnect`) post commands to that
//! task and never block; transport events (open, message, error, close)
//! are reacted to on the same task, so there is exactly one writer for
//! every piece of connection state.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect()──> Connecting ──open──> Connected
//!      ^                          │                    │
//!      │                        error                error/close
//!      │                          v                    v
//!      └──── retry timer ───── Errored ──close──> Disconnected
//! ```
//!
//! Automatic reconnection is bounded: after a close, up to
//! `max_reconnect_attempts` retries are scheduled `reconnect_delay`
//! apart. The budget resets on every successful open. An explicit
//! `disconnect()` suppresses all automatic retries until the next
//! explicit `connect()`.

use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::core::callbacks::CloseEvent;
use crate::core::config::ClientConfig;
use crate::core::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::queue::OutboundQueue;
use crate::traits::{ResockError, Result, WsMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Internal command messages for client control
#[derive(Debug)]
enum Command {
    /// Establish a connection if none is live
    Connect,
    /// Write a message, or queue it while no connection is writable
    Send(WsMessage),
    /// Close the connection and disable automatic reconnection
    Disconnect,
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub queued_messages: u64,
    pub connection_state: ConnectionState,
}

/// Resilient WebSocket client
///
/// Maintains a single logical message stream over an unreliable
/// transport: the underlying connection is re-established automatically
/// on failure (bounded by the configured attempt budget) and messages
/// sent while no connection is live are queued and flushed, in
/// submission order, once a connection comes up.
///
/// # Thread Safety
///
/// The handle is `Send + Sync`-friendly through cloneable internals;
/// every operation is non-blocking. `status()` and `is_connected()`
/// are lock-free atomic reads.
pub struct WebSocketClient {
    /// Client configuration (shared with the supervisor task)
    config: Arc<ClientConfig>,
    /// Atomic connection state
    state: Arc<AtomicConnectionState>,
    /// Atomic metrics
    metrics: Arc<AtomicMetrics>,
    /// Command channel into the supervisor task
    command_tx: mpsc::UnboundedSender<Command>,
    /// Supervisor task handle
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl WebSocketClient {
    /// Create a new client from configuration and spawn its supervisor
    ///
    /// This is called by the builder's `build()` method. Use
    /// [`resock::builder()`](crate::core::builder()) to create a client.
    pub(crate) fn new(config: ClientConfig) -> Self {
        let config = Arc::new(config);
        let state = Arc::new(AtomicConnectionState::default());
        let metrics = Arc::new(AtomicMetrics::new());

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task_handle = tokio::spawn(
            Supervisor::new(
                Arc::clone(&config),
                Arc::clone(&state),
                Arc::clone(&metrics),
                command_rx,
            )
            .run(),
        );

        Self {
            config,
            state,
            metrics,
            command_tx,
            task_handle: Some(task_handle),
        }
    }

    /// Establish the connection
    ///
    /// Idempotent: a no-op while a live connection exists. A connect
    /// after an explicit `disconnect()` re-arms automatic reconnection.
    /// Returns immediately; observe progress through `status()` and the
    /// configured callbacks.
    pub fn connect(&self) -> Result<()> {
        self.post(Command::Connect)
    }

    /// Close the connection and disable automatic reconnection
    ///
    /// Cancels any pending retry timer and discards messages still
    /// queued. Safe to call repeatedly, and safe to call when never
    /// connected. The client remains usable: a later `connect()`
    /// re-arms it.
    pub fn disconnect(&self) -> Result<()> {
        self.post(Command::Disconnect)
    }

    /// Send a text or binary message
    ///
    /// Written immediately while connected; queued for the next
    /// successful connection otherwise. Queueing is defined behavior,
    /// not an error, so this never fails for a disconnected client.
    pub fn send(&self, message: impl Into<WsMessage>) -> Result<()> {
        self.post(Command::Send(message.into()))
    }

    /// Serialize a structured value through the codec and send it
    ///
    /// Values that serialize to a plain string travel unchanged;
    /// everything else is encoded by the configured codec.
    pub fn send_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| ResockError::Encode(e.to_string()))?;
        let message = self.config.codec.encode(&value)?;
        self.post(Command::Send(message))
    }

    /// Get the current connection state
    #[inline]
    pub fn status(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Get a reference to the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
            queued_messages: self.metrics.queued_messages(),
            connection_state: self.state.get(),
        }
    }

    /// Shut down the client and wait for the supervisor task to exit
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down WebSocket client");
        let _ = self.command_tx.send(Command::Disconnect);

        // Dropping the handle closes the command channel, which lets the
        // supervisor drain remaining commands and exit
        let handle = self.task_handle.take();
        drop(self);

        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }

    fn post(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| ResockError::ChannelSend(e.to_string()))
    }
}

/// A live transport handle: the split halves of one WebSocket stream
struct Connection {
    write: WsSink,
    read: WsSource,
}

/// What woke the supervisor up
enum Step {
    Command(Option<Command>),
    Transport(Option<std::result::Result<Message, WsError>>),
    ReconnectDue,
}

/// Owner of all connection state
///
/// Exactly one supervisor runs per client instance, and it is the only
/// writer of the state machine, the transport handle, the retry counter
/// and the outbound queue.
struct Supervisor {
    config: Arc<ClientConfig>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    /// The live transport handle; at most one exists at any time
    conn: Option<Connection>,
    /// Messages awaiting a writable connection
    queue: OutboundQueue,
    /// Automatic retries used in the current failure sequence
    reconnect_attempts: usize,
    /// Cleared by an explicit disconnect, re-armed by an explicit connect
    should_reconnect: bool,
    /// Deadline of the pending retry timer, when one is armed
    reconnect_at: Option<Instant>,
    /// Close frame details captured before the stream ends
    pending_close: Option<CloseEvent>,
}

impl Supervisor {
    fn new(
        config: Arc<ClientConfig>,
        state: Arc<AtomicConnectionState>,
        metrics: Arc<AtomicMetrics>,
        command_rx: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            config,
            state,
            metrics,
            command_rx,
            conn: None,
            queue: OutboundQueue::new(),
            reconnect_attempts: 0,
            should_reconnect: true,
            reconnect_at: None,
            pending_close: None,
        }
    }

    async fn run(mut self) {
        loop {
            match self.next_step().await {
                Step::Command(Some(command)) => self.on_command(command).await,
                Step::Command(None) => break,
                Step::Transport(item) => self.on_transport(item).await,
                Step::ReconnectDue => self.on_reconnect_due().await,
            }
        }

        if let Some(mut conn) = self.conn.take() {
            let _ = conn.write.close().await;
        }
        debug!("Supervisor task exiting");
    }

    /// Wait for the next command, transport event or timer expiry
    ///
    /// Which sources are armed depends on the current state: the
    /// transport is only polled while a connection is live, and the
    /// retry timer only while one is scheduled.
    async fn next_step(&mut self) -> Step {
        match (&mut self.conn, self.reconnect_at) {
            (Some(conn), _) => tokio::select! {
                command = self.command_rx.recv() => Step::Command(command),
                item = conn.read.next() => Step::Transport(item),
            },
            (None, Some(deadline)) => tokio::select! {
                command = self.command_rx.recv() => Step::Command(command),
                _ = tokio::time::sleep_until(deadline) => Step::ReconnectDue,
            },
            (None, None) => Step::Command(self.command_rx.recv().await),
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Connect => {
                if self.conn.is_some() {
                    debug!("Connect ignored, connection already live");
                    return;
                }
                // An explicit connect re-arms automatic reconnection and
                // replaces any pending retry timer
                self.should_reconnect = true;
                self.reconnect_at = None;
                self.attempt_connect().await;
            }
            Command::Send(message) => self.on_send(message).await,
            Command::Disconnect => self.on_disconnect().await,
        }
    }

    async fn on_send(&mut self, message: WsMessage) {
        if let Some(conn) = self.conn.as_mut() {
            match conn.write.send(message.clone().into_tungstenite()).await {
                Ok(()) => {
                    self.metrics.increment_sent();
                    return;
                }
                Err(e) => {
                    warn!("Live write failed, message returns to the queue: {}", e);
                    self.queue.push_front(message);
                    self.metrics.set_queued(self.queue.len());
                    self.fail_connection(e.to_string()).await;
                    return;
                }
            }
        }

        debug!("Not connected, queueing outbound message");
        self.queue.enqueue(message);
        self.metrics.set_queued(self.queue.len());
    }

    async fn on_disconnect(&mut self) {
        self.should_reconnect = false;
        self.reconnect_at = None;

        let discarded = self.queue.clear();
        if discarded > 0 {
            debug!("Discarded {} queued messages on disconnect", discarded);
        }
        self.metrics.set_queued(0);

        let had_connection = self.conn.is_some();
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.write.close().await;
        }
        self.pending_close = None;
        self.state.set(ConnectionState::Disconnected);

        if had_connection {
            self.config
                .callbacks
                .close(&CloseEvent::normal("client disconnect"));
        }
        info!("Disconnected, automatic reconnection disabled");
    }

    async fn on_reconnect_due(&mut self) {
        self.reconnect_at = None;

        // A disconnect may have landed between scheduling and expiry
        if !self.should_reconnect {
            debug!("Reconnect timer fired after disconnect, ignoring");
            return;
        }
        if self.conn.is_some() {
            return;
        }
        self.attempt_connect().await;
    }

    async fn attempt_connect(&mut self) {
        self.state.set(ConnectionState::Connecting);
        debug!("Connecting to {}", self.config.url);

        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                // Construction failure is surfaced once; the close path
                // and its retry budget never run for this
                error!("Failed to build connection request: {}", e);
                self.state.set(ConnectionState::Errored);
                self.config.callbacks.error(&e);
                return;
            }
        };

        match connect_async(request).await {
            Ok((stream, _response)) => {
                let (write, read) = stream.split();
                self.conn = Some(Connection { write, read });
                self.state.set(ConnectionState::Connected);
                self.reconnect_attempts = 0;
                info!("Connected to {}", self.config.url);
                self.config.callbacks.open();
                self.flush_queue().await;
            }
            Err(e) => {
                error!("Connection attempt failed: {}", e);
                self.state.set(ConnectionState::Errored);
                let err = ResockError::WebSocket(e.to_string());
                self.config.callbacks.error(&err);
                self.handle_close(CloseEvent::abnormal(e.to_string())).await;
            }
        }
    }

    fn build_request(&self) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ResockError::InvalidAddress(format!("{}: {}", self.config.url, e)))?;

        if !self.config.protocols.is_empty() {
            let offered = self.config.protocols.join(", ");
            let value = HeaderValue::from_str(&offered)
                .map_err(|e| ResockError::InvalidAddress(format!("bad protocol list: {}", e)))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        Ok(request)
    }

    /// Drain the outbound queue into the live connection, oldest first
    async fn flush_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let Some(conn) = self.conn.as_mut() else {
            return;
        };

        match self.queue.flush(&mut conn.write).await {
            Ok(flushed) => {
                self.metrics.set_queued(self.queue.len());
                if flushed > 0 {
                    self.metrics.add_sent(flushed as u64);
                    debug!("Flushed {} queued messages", flushed);
                }
            }
            Err(e) => {
                warn!("Queue flush interrupted: {}", e);
                self.metrics.set_queued(self.queue.len());
                self.fail_connection(e.to_string()).await;
            }
        }
    }

    async fn on_transport(&mut self, item: Option<std::result::Result<Message, WsError>>) {
        match item {
            Some(Ok(frame)) => self.on_frame(frame),
            Some(Err(e)) => {
                error!("WebSocket error: {}", e);
                self.fail_connection(e.to_string()).await;
            }
            None => {
                debug!("WebSocket stream ended");
                let event = self
                    .pending_close
                    .take()
                    .unwrap_or_else(|| CloseEvent::abnormal("stream ended".to_string()));
                self.handle_close(event).await;
            }
        }
    }

    fn on_frame(&mut self, frame: Message) {
        if let Message::Close(close_frame) = frame {
            debug!("Close frame received: {:?}", close_frame);
            self.pending_close = Some(match close_frame {
                Some(frame) => CloseEvent {
                    code: Some(u16::from(frame.code)),
                    reason: frame.reason.to_string(),
                },
                None => CloseEvent::abnormal("closed by remote".to_string()),
            });
            return;
        }

        if let Some(message) = WsMessage::from_tungstenite(frame) {
            self.metrics.increment_received();
            let payload = self.config.codec.decode(message);
            self.config.callbacks.message(payload);
        }
        // ping/pong control frames are answered by the transport itself
    }

    /// Transport error reaction: report it, then run the close path
    async fn fail_connection(&mut self, detail: String) {
        self.state.set(ConnectionState::Errored);
        let err = ResockError::WebSocket(detail.clone());
        self.config.callbacks.error(&err);
        self.handle_close(CloseEvent::abnormal(detail)).await;
    }

    /// Close reaction: release the handle, notify, maybe schedule a retry
    async fn handle_close(&mut self, event: CloseEvent) {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.write.close().await;
        }
        self.pending_close = None;
        self.state.set(ConnectionState::Disconnected);
        self.config.callbacks.close(&event);

        if self.should_reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts {
            self.reconnect_attempts += 1;
            self.metrics.increment_reconnects();
            info!(
                "Scheduling reconnect attempt {}/{} in {:?}",
                self.reconnect_attempts,
                self.config.max_reconnect_attempts,
                self.config.reconnect_delay
            );
            self.reconnect_at = Some(Instant::now() + self.config.reconnect_delay);
        } else if self.should_reconnect && self.config.max_reconnect_attempts > 0 {
            warn!(
                "Reconnect attempts exhausted ({}), staying disconnected",
                self.config.max_reconnect_attempts
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::ClientBuilder;
    use std::time::Duration;

    #[tokio::test]
    async fn new_client_starts_disconnected() {
        let client = ClientBuilder::new().url("ws://127.0.0.1:1").build();

        assert_eq!(client.status(), ConnectionState::Disconnected);
        assert!(!client.is_connected());

        let snapshot = client.metrics();
        assert_eq!(snapshot.messages_sent, 0);
        assert_eq!(snapshot.messages_received, 0);
        assert_eq!(snapshot.reconnect_count, 0);
        assert_eq!(snapshot.queued_messages, 0);
    }

    #[tokio::test]
    async fn send_while_disconnected_queues_without_error() {
        let client = ClientBuilder::new().url("ws://127.0.0.1:1").build();

        client.send("one").unwrap();
        client.send_json(&serde_json::json!({ "n": 2 })).unwrap();

        // Queue mutations happen on the supervisor task
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.metrics().queued_messages, 2);
        assert_eq!(client.status(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_safe() {
        let client = ClientBuilder::new().url("ws://127.0.0.1:1").build();

        client.disconnect().unwrap();
        client.disconnect().unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.status(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn shutdown_completes() {
        let client = ClientBuilder::new().url("ws://127.0.0.1:1").build();
        client.shutdown().await.unwrap();
    }
}
