//! Local input capture and forwarding.
//!
//! Interactive mode forwards each printable key to the transport as it is
//! typed: the remote monitor runs its own line editor and echoes the
//! characters back over the serial line, so the local terminal stays raw and
//! silent. Enter sends a bare carriage return (the line-commit signal), not
//! the accumulated line. Non-interactive mode works in whole lines.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Local keywords that end the session without being forwarded (line mode)
/// or after line commit (interactive mode).
pub const EXIT_KEYWORDS: [&str; 3] = ["quit", "exit", "q"];

/// Switches the local terminal to raw (unbuffered, unechoed) mode and
/// restores it when dropped, on every exit path including panic unwind.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Result of applying keystrokes to the current command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Line committed with Enter. The characters and the trailing `\r` have
    /// already been forwarded; the text is kept only for the local exit-keyword
    /// check.
    Submitted(String),
    /// Ctrl-D: end of local input.
    EndOfInput,
    /// Ctrl-C: abandon the current line and keep the session going.
    Interrupted,
}

pub fn is_exit_keyword(line: &str) -> bool {
    EXIT_KEYWORDS.iter().any(|kw| line.eq_ignore_ascii_case(kw))
}

/// Poll for the next key press, blocking up to `timeout`.
///
/// Returns `Ok(None)` on timeout or on a non-key event, so the caller can
/// re-check session liveness between keys. Key releases are ignored.
pub fn poll_key(timeout: Duration) -> io::Result<Option<KeyEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
        _ => Ok(None),
    }
}

/// Apply one key press to the in-progress command line.
///
/// Printable characters are forwarded immediately, one write per key. Returns
/// `Some(outcome)` when the key commits, cancels, or ends input; `None` while
/// the line is still being built. Navigation keys other than Backspace are
/// dropped: the remote line editor has no use for them.
pub async fn handle_key<W: AsyncWrite + Unpin>(
    writer: &mut W,
    key: KeyEvent,
    line: &mut String,
) -> io::Result<Option<CommandOutcome>> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('d') => Ok(Some(CommandOutcome::EndOfInput)),
            KeyCode::Char('c') => {
                line.clear();
                Ok(Some(CommandOutcome::Interrupted))
            }
            _ => Ok(None),
        };
    }

    match key.code {
        KeyCode::Enter => {
            // The monitor only needs the line-commit signal; it already has
            // the characters.
            writer.write_all(b"\r").await?;
            writer.flush().await?;
            Ok(Some(CommandOutcome::Submitted(std::mem::take(line))))
        }
        KeyCode::Char(ch) => {
            let mut utf8 = [0u8; 4];
            writer.write_all(ch.encode_utf8(&mut utf8).as_bytes()).await?;
            writer.flush().await?;
            line.push(ch);
            Ok(None)
        }
        KeyCode::Backspace => {
            writer.write_all(b"\x08").await?;
            writer.flush().await?;
            line.pop();
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Forward one line of non-interactive input, with its terminator, as a
/// single write.
///
/// Returns `false` when the line is a local exit keyword: the session should
/// end and nothing is forwarded. Empty lines are skipped.
pub async fn forward_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<bool> {
    if is_exit_keyword(line.trim()) {
        return Ok(false);
    }

    if !line.is_empty() {
        let mut framed = Vec::with_capacity(line.len() + 1);
        framed.extend_from_slice(line.as_bytes());
        framed.push(b'\n');
        writer.write_all(&framed).await?;
        writer.flush().await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_are_case_insensitive() {
        assert!(is_exit_keyword("quit"));
        assert!(is_exit_keyword("QUIT"));
        assert!(is_exit_keyword("Exit"));
        assert!(is_exit_keyword("q"));
        assert!(!is_exit_keyword("quit now"));
        assert!(!is_exit_keyword("r D0"));
        assert!(!is_exit_keyword(""));
    }
}
