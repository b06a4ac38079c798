//! Common test utilities for resock integration tests
//!
//! This module provides a controllable mock WebSocket server: it echoes
//! text and binary frames, records everything it receives, counts
//! accepted connections, can greet new connections with scripted
//! payloads, and can drop its connections on command to provoke
//! reconnection.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// What the server has observed so far
#[derive(Default)]
struct ServerLog {
    received: Mutex<Vec<String>>,
    connections: AtomicUsize,
}

/// A controllable mock WebSocket server for testing
pub struct MockWsServer {
    pub addr: SocketAddr,
    log: Arc<ServerLog>,
    shutdown: Arc<Notify>,
    kick: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        Self::start_with(Vec::new()).await
    }

    /// Start a server that greets every new connection with the given
    /// text payloads, in order, before echoing
    pub async fn start_with(greetings: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, greetings)
    }

    /// Rebind on a known address, e.g. to come back after an outage
    pub async fn start_on(addr: SocketAddr, greetings: Vec<String>) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener, greetings)
    }

    fn serve(listener: TcpListener, greetings: Vec<String>) -> Self {
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(ServerLog::default());
        let shutdown = Arc::new(Notify::new());
        let kick = Arc::new(Notify::new());
        let greetings = Arc::new(greetings);

        {
            let log = Arc::clone(&log);
            let shutdown = Arc::clone(&shutdown);
            let kick = Arc::clone(&kick);

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        result = listener.accept() => {
                            match result {
                                Ok((stream, _)) => {
                                    let log = Arc::clone(&log);
                                    let shutdown = Arc::clone(&shutdown);
                                    let kick = Arc::clone(&kick);
                                    let greetings = Arc::clone(&greetings);
                                    tokio::spawn(async move {
                                        handle_connection(stream, log, greetings, shutdown, kick)
                                            .await;
                                    });
                                }
                                Err(e) => {
                                    eprintln!("Accept error: {}", e);
                                    break;
                                }
                            }
                        }
                        _ = shutdown.notified() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            addr,
            log,
            shutdown,
            kick,
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Text messages received so far, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.log.received.lock().unwrap().clone()
    }

    /// Total connections accepted since start
    pub fn connection_count(&self) -> usize {
        self.log.connections.load(Ordering::SeqCst)
    }

    /// Close every live connection (the server keeps accepting)
    pub fn kick_connections(&self) {
        self.kick.notify_waiters();
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_connection(
    stream: TcpStream,
    log: Arc<ServerLog>,
    greetings: Arc<Vec<String>>,
    shutdown: Arc<Notify>,
    kick: Arc<Notify>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    log.connections.fetch_add(1, Ordering::SeqCst);

    let (mut write, mut read) = ws_stream.split();

    for greeting in greetings.iter() {
        if write.send(Message::Text(greeting.clone())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        log.received.lock().unwrap().push(text.clone());
                        // Echo the message back
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        if write.send(Message::Binary(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let pong = Message::Pong(data);
                        if write.send(pong).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = kick.notified() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            _ = shutdown.notified() => {
                break;
            }
        }
    }
}

/// Reserve an address with nothing listening on it
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll a condition until it holds or the deadline passes
pub async fn wait_for(deadline: Duration, condition: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
