//! Emulator process supervision.
//!
//! The emulator is spawned in a fresh process group so the whole tree (the
//! emulator may fork helpers) can be signaled as a unit, and so signals aimed
//! at the bridge never hit it by accident. Teardown escalates: SIGTERM to the
//! group, a bounded wait, then SIGKILL to the group.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::error::BridgeError;

/// How long to wait for the reap after a SIGKILL. Best effort only.
const KILL_REAP_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct EmulatorProcess {
    child: Child,
    pgid: i32,
}

impl EmulatorProcess {
    /// Spawn `command` in its own process group, with stdout/stderr discarded
    /// (the serial transport is the only channel the bridge cares about).
    pub fn spawn(command: &[String]) -> Result<Self, BridgeError> {
        let (program, args) = command.split_first().ok_or_else(|| BridgeError::Spawn {
            command: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty emulator command"),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            command: command.join(" "),
            source,
        })?;

        // With process_group(0) the child's pid doubles as its pgid.
        let pgid = child.id().map(|id| id as i32).unwrap_or(0);
        tracing::info!(pgid, command = %command.join(" "), "emulator started");

        Ok(Self { child, pgid })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Terminate the emulator's process group.
    ///
    /// Sends SIGTERM to the group and waits up to `grace`; if the process is
    /// still alive after that, sends SIGKILL to the group and reaps best
    /// effort. Safe to call from multiple cleanup paths and on a process that
    /// already exited; never errors.
    pub async fn terminate(&mut self, grace: Duration) {
        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::debug!(?status, "emulator already exited");
            return;
        }

        self.signal_group(libc::SIGTERM);
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(?status, "emulator exited after SIGTERM");
            }
            Ok(Err(err)) => {
                tracing::warn!(%err, "wait on emulator failed");
            }
            Err(_) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "emulator ignored SIGTERM, escalating to SIGKILL"
                );
                self.signal_group(libc::SIGKILL);
                let _ = tokio::time::timeout(KILL_REAP_TIMEOUT, self.child.wait()).await;
            }
        }
    }

    fn signal_group(&self, signal: i32) {
        if self.pgid <= 0 {
            return;
        }
        let rc = unsafe { libc::killpg(self.pgid, signal) };
        if rc != 0 {
            // ESRCH here just means the group is already gone.
            tracing::debug!(
                pgid = self.pgid,
                signal,
                err = %io::Error::last_os_error(),
                "killpg failed"
            );
        }
    }
}
