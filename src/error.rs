//! Error taxonomy for the bridge.
//!
//! Transport- and process-level failures are detected by the component that
//! observes them and converted into the shared running flag; only fatal
//! conditions (connection never established, emulator failed to start) are
//! propagated to the binary boundary.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while running a bridge session.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The serial transport was never established after bounded retries.
    #[error("serial connection failed after {attempts} attempt(s)")]
    ConnectionFailure { attempts: u32 },

    /// The emulator command could not be started.
    #[error("failed to start emulator command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A serial read or write failed after the connection was established.
    #[error("serial I/O error: {0}")]
    TransportIo(#[from] io::Error),

    /// The local terminal could not be switched or restored.
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_and_display_transparently() {
        let err = BridgeError::from(ConfigError::Validation {
            message: "connect_attempts must be at least 1".to_string(),
        });
        assert!(matches!(err, BridgeError::Config(_)));
        assert_eq!(
            err.to_string(),
            "config validation failed: connect_attempts must be at least 1"
        );
    }
}
