use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use serlink::{capture, BridgeConfig, BridgeError, Session};

#[derive(Parser)]
#[command(
    name = "serlink",
    version,
    about = "Interactive serial bridge to an emulated target's debug monitor"
)]
struct Cli {
    /// Serial port host (overrides the config file).
    #[arg(long)]
    host: Option<String>,

    /// Serial port TCP port (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Emulator launch command, e.g. --emulator "make run".
    #[arg(long)]
    emulator: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to an already-running emulator and dump serial output for a
    /// bounded time, without launching anything.
    Capture {
        /// How long to capture, in seconds.
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

impl Cli {
    fn apply(&self, config: &mut BridgeConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(emulator) = &self.emulator {
            config.emulator_command = emulator.split_whitespace().map(str::to_string).collect();
        }
    }
}

/// Initialize tracing with optional file output.
///
/// Disabled by default: the terminal is the operator's display and log lines
/// would corrupt it. Set `SERLINK_LOG` to a file path to enable logging.
fn init_tracing() {
    let Ok(log_path) = std::env::var("SERLINK_LOG") else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Ok(file) = std::fs::File::create(&log_path) else {
        eprintln!("Warning: failed to create log file: {log_path}");
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = BridgeConfig::load().map_err(BridgeError::Config)?;
    cli.apply(&mut config);
    config.validate().map_err(BridgeError::Config)?;

    match cli.command {
        Some(Command::Capture { seconds }) => {
            capture::capture(&config.host, config.port, Duration::from_secs(seconds)).await?;
            Ok(())
        }
        None => {
            let mut session = Session::new(config);
            session.run().await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
