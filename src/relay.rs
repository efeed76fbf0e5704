//! Output relay: the single reader of the serial transport.
//!
//! Runs as a background task for the lifetime of the session. Every read is
//! bounded by a short timeout so the loop observes the running flag promptly;
//! there is no separate cancellation channel. Received bytes are echoed to the
//! operator immediately (lossy-decoded, never buffered for display) and fed to
//! the prompt detector until it latches.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::prompt::PromptDetector;
use crate::state::SessionState;

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const READ_BUFFER_SIZE: usize = 4096;

pub struct OutputRelay<R> {
    reader: R,
    state: Arc<SessionState>,
    detector: PromptDetector,
}

impl<R: AsyncRead + Unpin> OutputRelay<R> {
    pub fn new(reader: R, state: Arc<SessionState>) -> Self {
        Self {
            reader,
            state,
            detector: PromptDetector::new(),
        }
    }

    /// Drain the transport until the session stops or the peer disappears.
    ///
    /// A zero-length read means the peer closed the connection (the emulator
    /// exited or dropped the serial line): the running flag is tripped and the
    /// task ends. Any other I/O failure is treated the same way, with the
    /// cause surfaced to the operator.
    pub async fn run(mut self) {
        let mut stdout = tokio::io::stdout();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        while self.state.is_running() {
            match tokio::time::timeout(READ_TIMEOUT, self.reader.read(&mut buf)).await {
                Err(_) => continue,
                Ok(Ok(0)) => {
                    if self.state.is_running() {
                        tracing::warn!("serial connection closed by peer");
                        let _ = stdout
                            .write_all(b"\r\n[serial connection closed, emulator may have quit]\r\n")
                            .await;
                        let _ = stdout.flush().await;
                        self.state.stop();
                    }
                    break;
                }
                Ok(Ok(n)) => {
                    let text = String::from_utf8_lossy(&buf[..n]);
                    let _ = stdout.write_all(text.as_bytes()).await;
                    let _ = stdout.flush().await;
                    if self.detector.observe(&text) {
                        self.state.mark_prompt_ready();
                    }
                }
                Ok(Err(err)) => {
                    if self.state.is_running() {
                        tracing::error!(%err, "serial read failed");
                        let message = format!("\r\n[serial read error: {err}]\r\n");
                        let _ = stdout.write_all(message.as_bytes()).await;
                        let _ = stdout.flush().await;
                        self.state.stop();
                    }
                    break;
                }
            }
        }
    }
}
