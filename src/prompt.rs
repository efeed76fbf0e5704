//! Heuristic prompt detection.
//!
//! The serial stream carries unstructured text with no framing, so readiness
//! of the remote monitor is inferred from the shape of trailing output: the
//! prompt glyph followed by a space. The detector keeps a small window of the
//! most recent chunks so a prompt split across reads is still recognized.
//!
//! Known limitation: output that legitimately ends in the prompt glyph plus
//! whitespace will false-positive. Without a real framing protocol on the
//! remote side this cannot be fully disambiguated; the signal is best-effort
//! and only used to decide when the session may start accepting input.

use std::collections::VecDeque;

/// Trailing pattern the monitor emits when ready for a command.
pub const PROMPT_MARKER: &str = "> ";

/// Number of recent chunks retained for matching.
const WINDOW_CHUNKS: usize = 10;

#[derive(Debug)]
pub struct PromptDetector {
    window: VecDeque<String>,
    fired: bool,
}

impl PromptDetector {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_CHUNKS),
            fired: false,
        }
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Feed one received chunk. Returns `true` exactly once, on the chunk
    /// that completes the prompt pattern; the detector stays latched after
    /// that and later prompts are not re-detected.
    pub fn observe(&mut self, chunk: &str) -> bool {
        if self.fired {
            return false;
        }

        if self.window.len() == WINDOW_CHUNKS {
            self.window.pop_front();
        }
        self.window.push_back(chunk.to_string());

        let combined: String = self.window.iter().map(String::as_str).collect();
        if Self::matches(&combined) {
            self.fired = true;
            return true;
        }
        false
    }

    fn matches(text: &str) -> bool {
        if text.contains("> \n") || text.ends_with(PROMPT_MARKER) {
            return true;
        }
        // Prompt followed by trailing whitespace only (e.g. a stray CR).
        text.contains('>') && text.trim_end().ends_with('>')
    }
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::new()
    }
}
