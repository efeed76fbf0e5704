//! One-shot serial capture.
//!
//! Connects to an already-running emulator (no spawn, no retry loop), drains
//! the transport for a bounded duration, and writes the raw bytes to stdout.
//! Progress and the final byte count go to stderr so the captured stream can
//! be piped or redirected cleanly.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::error::BridgeError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const READ_BUFFER_SIZE: usize = 1024;

/// Capture up to `duration` worth of serial output. Returns the number of
/// bytes received.
pub async fn capture(host: &str, port: u16, duration: Duration) -> Result<u64, BridgeError> {
    eprintln!("Connecting to {host}:{port}...");
    let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
        .await
        .map_err(|_| BridgeError::ConnectionFailure { attempts: 1 })?
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::ConnectionRefused {
                BridgeError::ConnectionFailure { attempts: 1 }
            } else {
                BridgeError::TransportIo(err)
            }
        })?;
    eprintln!("Connected.");

    let mut stdout = tokio::io::stdout();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;
    let deadline = Instant::now() + duration;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, stream.read(&mut buf)).await {
            Err(_) => break,
            Ok(Ok(0)) => {
                tracing::debug!("peer closed during capture");
                break;
            }
            Ok(Ok(n)) => {
                total += n as u64;
                stdout.write_all(&buf[..n]).await?;
                stdout.flush().await?;
            }
            Ok(Err(err)) => {
                eprintln!("\nRead error: {err}");
                break;
            }
        }
    }

    eprintln!("\nTotal bytes received: {total}");
    Ok(total)
}
