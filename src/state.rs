//! Shared session state: the running flag and the prompt-ready signal.
//!
//! Both are observed by the foreground loop and the output relay task. The
//! running flag trips exactly once (true to false); the prompt signal fires at
//! most once and stays latched for the rest of the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

pub struct SessionState {
    running: AtomicBool,
    prompt_ready: AtomicBool,
    notify: Notify,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            prompt_ready: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Trip the running flag. Monotonic: once stopped, the session never
    /// resumes. Wakes anyone blocked in [`wait_prompt_ready`](Self::wait_prompt_ready).
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::debug!("session running flag tripped");
            self.notify.notify_waiters();
        }
    }

    pub fn prompt_seen(&self) -> bool {
        self.prompt_ready.load(Ordering::SeqCst)
    }

    /// Latch the prompt-ready signal. Only the first call has any effect.
    pub fn mark_prompt_ready(&self) {
        if !self.prompt_ready.swap(true, Ordering::SeqCst) {
            tracing::debug!("monitor prompt detected");
            self.notify.notify_waiters();
        }
    }

    /// Wait for the prompt signal, up to `limit`.
    ///
    /// Returns `true` if the prompt was seen, `false` on timeout or if the
    /// session stopped while waiting. Never hangs past the limit.
    pub async fn wait_prompt_ready(&self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            // Subscribe to Notify BEFORE checking the flags to avoid a TOCTOU
            // race: a signal between the check and the await would otherwise
            // find no subscribers and the notification would be lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.prompt_seen() {
                return true;
            }
            if !self.is_running() {
                return false;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if tokio::time::timeout(remaining, notified).await.is_err() {
                return false;
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
