//! Session controller.
//!
//! Sequences startup (spawn emulator, connect with retry, start the relay,
//! wait for the prompt), runs the input/output loop, and performs cleanup
//! exactly once on every exit path: relay joined with a bounded wait, socket
//! halves dropped, emulator process group terminated with graceful-then-
//! forceful escalation.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::tty::IsTty;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::task::JoinHandle;

use crate::config::BridgeConfig;
use crate::connector;
use crate::error::BridgeError;
use crate::input::{self, CommandOutcome, RawModeGuard};
use crate::relay::OutputRelay;
use crate::state::SessionState;
use crate::supervisor::EmulatorProcess;

/// How long cleanup waits for the relay task before abandoning it.
const RELAY_JOIN_TIMEOUT: Duration = Duration::from_secs(1);
/// Pause after each committed command so remote output lands before the next
/// local read.
const SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Bound on every local input wait, so relay liveness is re-checked promptly.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Granularity of the emulator startup progress indicator.
const STARTUP_TICK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Connecting,
    WaitingForPrompt,
    Active,
    Terminating,
    Closed,
}

pub struct Session {
    config: BridgeConfig,
    state: Arc<SessionState>,
    phase: SessionPhase,
    emulator: Option<EmulatorProcess>,
    relay: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: Arc::new(SessionState::new()),
            phase: SessionPhase::Idle,
            emulator: None,
            relay: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Run the session to completion. Cleanup executes on every path,
    /// including errors raised during startup.
    pub async fn run(&mut self) -> Result<(), BridgeError> {
        let result = self.run_inner().await;
        self.cleanup().await;
        result
    }

    async fn run_inner(&mut self) -> Result<(), BridgeError> {
        self.advance(SessionPhase::Connecting);

        println!("Starting emulator...");
        self.emulator = Some(EmulatorProcess::spawn(&self.config.emulator_command)?);
        self.wait_for_startup().await;

        print!(
            "Connecting to serial port ({}:{})...",
            self.config.host, self.config.port
        );
        let _ = io::stdout().flush();
        let stream = match connector::connect(
            &self.config.host,
            self.config.port,
            self.config.connect_attempts,
            self.config.retry_interval(),
        )
        .await
        {
            Ok(stream) => {
                println!(" connected");
                stream
            }
            Err(err) => {
                println!(" failed");
                return Err(err);
            }
        };

        // The read half belongs to the relay for the rest of the session; the
        // write half stays here with the foreground loop.
        let (read_half, mut write_half) = stream.into_split();

        self.advance(SessionPhase::WaitingForPrompt);
        let relay = OutputRelay::new(read_half, Arc::clone(&self.state));
        self.relay = Some(tokio::spawn(relay.run()));

        let prompt_seen = self
            .state
            .wait_prompt_ready(self.config.prompt_timeout())
            .await;
        if !prompt_seen && self.state.is_running() {
            tracing::warn!("monitor prompt not detected within timeout, continuing anyway");
            println!("\r\n[warning: monitor prompt not detected, continuing anyway]");
        }

        self.advance(SessionPhase::Active);
        if io::stdin().is_tty() {
            self.interactive_loop(&mut write_half).await
        } else {
            self.line_loop(&mut write_half).await
        }
    }

    /// Raw-mode keystroke loop. Each printable key is forwarded as typed; the
    /// remote monitor echoes it back over the serial line.
    async fn interactive_loop(&mut self, writer: &mut OwnedWriteHalf) -> Result<(), BridgeError> {
        let _raw = RawModeGuard::new().map_err(BridgeError::Terminal)?;
        let mut line = String::new();

        loop {
            if !self.state.is_running() {
                print!("\r\n[connection lost, exiting]\r\n");
                let _ = io::stdout().flush();
                break;
            }

            let key = match tokio::task::spawn_blocking(|| input::poll_key(INPUT_POLL_INTERVAL))
                .await
            {
                Ok(Ok(key)) => key,
                Ok(Err(err)) => return Err(BridgeError::Terminal(err)),
                Err(err) => {
                    tracing::error!(%err, "input poll task failed");
                    break;
                }
            };
            let Some(key) = key else { continue };

            match input::handle_key(writer, key, &mut line).await {
                Ok(None) => {}
                Ok(Some(CommandOutcome::Submitted(command))) => {
                    if input::is_exit_keyword(command.trim()) {
                        print!("\r\nExiting debug session...\r\n");
                        let _ = io::stdout().flush();
                        break;
                    }
                    tokio::time::sleep(SETTLE_DELAY).await;
                }
                Ok(Some(CommandOutcome::EndOfInput)) => {
                    print!("\r\nExiting debug session...\r\n");
                    let _ = io::stdout().flush();
                    break;
                }
                Ok(Some(CommandOutcome::Interrupted)) => {
                    print!("\r\nUse 'quit' to exit, or Ctrl-D\r\n");
                    let _ = io::stdout().flush();
                }
                Err(err) => {
                    tracing::error!(%err, "serial write failed");
                    print!("\r\n[failed to send: {err}]\r\n");
                    let _ = io::stdout().flush();
                    self.state.stop();
                    break;
                }
            }
        }

        Ok(())
    }

    /// Line-buffered loop for piped input. Exit keywords end the session
    /// without being forwarded; EOF ends it normally.
    async fn line_loop(&mut self, writer: &mut OwnedWriteHalf) -> Result<(), BridgeError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            if !self.state.is_running() {
                println!("\n[connection lost, exiting]");
                break;
            }

            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match input::forward_line(writer, &line).await {
                        Ok(true) => tokio::time::sleep(SETTLE_DELAY).await,
                        Ok(false) => {
                            println!("Exiting debug session...");
                            break;
                        }
                        Err(err) => {
                            tracing::error!(%err, "serial write failed");
                            println!("\n[failed to send: {err}]");
                            self.state.stop();
                            break;
                        }
                    },
                    Ok(None) => break,
                    Err(err) => return Err(BridgeError::Terminal(err)),
                },
                _ = tokio::signal::ctrl_c() => {
                    println!("\nInterrupted, shutting down...");
                    break;
                }
                // Periodic wakeup so a dead relay is noticed even while the
                // operator side is quiet.
                _ = tokio::time::sleep(INPUT_POLL_INTERVAL) => {}
            }
        }

        Ok(())
    }

    async fn wait_for_startup(&self) {
        let mut remaining = self.config.startup_delay();
        if remaining.is_zero() {
            return;
        }
        print!("Waiting for emulator to initialize...");
        let _ = io::stdout().flush();
        while !remaining.is_zero() {
            let step = remaining.min(STARTUP_TICK);
            tokio::time::sleep(step).await;
            remaining -= step;
            print!(".");
            let _ = io::stdout().flush();
        }
        println!(" ok");
    }

    /// Tear everything down, in bounded total time. Idempotent by
    /// construction: each resource is taken out of its slot before release.
    async fn cleanup(&mut self) {
        self.advance(SessionPhase::Terminating);
        println!("Cleaning up...");
        self.state.stop();

        if let Some(mut relay) = self.relay.take() {
            if tokio::time::timeout(RELAY_JOIN_TIMEOUT, &mut relay)
                .await
                .is_err()
            {
                tracing::warn!("relay task did not stop in time, abandoning it");
                relay.abort();
            }
        }

        if let Some(mut emulator) = self.emulator.take() {
            emulator.terminate(self.config.shutdown_grace()).await;
        }

        self.advance(SessionPhase::Closed);
        println!("Done.");
    }

    fn advance(&mut self, phase: SessionPhase) {
        self.phase = phase;
        tracing::debug!(?phase, "session phase");
    }
}
