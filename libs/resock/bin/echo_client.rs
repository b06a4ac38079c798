//! Minimal client against any echo-style WebSocket server.
//!
//! Usage: `echo-client [url]` (defaults to ws://127.0.0.1:9001).
//! Logs lifecycle events and keeps the connection alive, reconnecting
//! automatically, until Ctrl-C.

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:9001".to_string());

    let client = resock::builder()
        .url(url)
        .reconnect_delay(Duration::from_secs(2))
        .max_reconnect_attempts(10)
        .on_open(|| info!("Connection open"))
        .on_message(|payload| info!("Received: {:?}", payload))
        .on_close(|event| info!("Closed: {} (code {:?})", event.reason, event.code))
        .on_error(|err| error!("Transport error: {}", err))
        .build();

    client.connect()?;
    client.send("hello from resock")?;
    client.send_json(&serde_json::json!({ "op": "ping" }))?;

    tokio::signal::ctrl_c().await?;
    client.shutdown().await?;
    Ok(())
}
