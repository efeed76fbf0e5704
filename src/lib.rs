//! serlink — interactive serial bridge to an emulated target's debug monitor.
//!
//! Launches an emulator hosting a firmware debug monitor, connects to the
//! emulator's virtual serial port over TCP, and bridges the operator's
//! terminal to the monitor: keystrokes forwarded as typed, remote output
//! echoed as it arrives, readiness inferred from the monitor's prompt.

pub mod capture;
pub mod config;
pub mod connector;
pub mod error;
pub mod input;
pub mod prompt;
pub mod relay;
pub mod session;
pub mod state;
pub mod supervisor;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use session::Session;
