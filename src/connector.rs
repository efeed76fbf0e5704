//! Serial transport connection with bounded retry.

use std::io::{self, Write};
use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::BridgeError;

/// Connect to the emulator's virtual serial port.
///
/// Retries on connection refusal, waiting `retry_interval` between attempts,
/// up to `max_attempts`. Emits one progress dot per refused attempt so the
/// operator can see the emulator is still coming up. Any I/O failure other
/// than refusal is returned immediately.
pub async fn connect(
    host: &str,
    port: u16,
    max_attempts: u32,
    retry_interval: Duration,
) -> Result<TcpStream, BridgeError> {
    let addr = format!("{host}:{port}");

    for attempt in 1..=max_attempts {
        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                tracing::info!(%addr, attempt, "serial transport connected");
                // Keystrokes are forwarded one at a time; don't batch them.
                let _ = stream.set_nodelay(true);
                return Ok(stream);
            }
            Err(err) if err.kind() == io::ErrorKind::ConnectionRefused => {
                tracing::debug!(%addr, attempt, "connection refused");
                print!(".");
                let _ = io::stdout().flush();
                if attempt < max_attempts {
                    tokio::time::sleep(retry_interval).await;
                }
            }
            Err(err) => {
                tracing::error!(%addr, attempt, %err, "serial connect failed");
                return Err(BridgeError::TransportIo(err));
            }
        }
    }

    tracing::error!(%addr, attempts = max_attempts, "serial connection attempts exhausted");
    Err(BridgeError::ConnectionFailure {
        attempts: max_attempts,
    })
}
