mod animation;
mod character;
mod config;
mod constants;
mod daemon;
mod drag;
mod geometry;
mod host;
mod ipc;
mod overlay;
mod scheduler;
#[cfg(test)]
mod testing;
mod types;
mod x11_utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use config::Settings;
use ipc::{ControlClient, ControlRequest, ControlResponse};
use types::Edge;

/// A cat that peeks in from the edges of your screen
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Edge to start on (overrides the config file)
    #[arg(long, value_enum)]
    edge: Option<Edge>,

    /// Starting position along the edge, 0.0 - 1.0
    #[arg(long)]
    offset: Option<f64>,

    /// Never peek on its own, only react to commands
    #[arg(long)]
    no_autopilot: bool,

    /// Control a running overlay instead of starting one
    #[command(subcommand)]
    command: Option<ControlCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum ControlCommand {
    /// Slide the cat in and keep it there
    Show,
    /// Slide the cat out
    Hide,
    /// Show, stay for a while, hide
    Peek,
    /// Hide if visible, otherwise peek
    Toggle,
    /// Retreat and come back on another edge
    Move {
        #[arg(value_enum)]
        edge: Edge,

        /// Position along the new edge, 0.0 - 1.0 (keeps the current one if omitted)
        #[arg(long)]
        offset: Option<f64>,
    },
    /// Remove the overlay and exit
    Close,
    /// Print edge, offset and phase as JSON
    Status,
    /// Check that an overlay is running
    Ping,
}

impl From<ControlCommand> for ControlRequest {
    fn from(command: ControlCommand) -> Self {
        match command {
            ControlCommand::Show => ControlRequest::Show,
            ControlCommand::Hide => ControlRequest::Hide,
            ControlCommand::Peek => ControlRequest::Peek,
            ControlCommand::Toggle => ControlRequest::Toggle,
            ControlCommand::Move { edge, offset } => ControlRequest::MoveToEdge { edge, offset },
            ControlCommand::Close => ControlRequest::Close,
            ControlCommand::Status => ControlRequest::Status,
            ControlCommand::Ping => ControlRequest::Ping,
        }
    }
}

impl Cli {
    /// Command-line flags win over the config file and environment
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(edge) = self.edge {
            settings.edge = edge;
        }
        if let Some(offset) = self.offset {
            settings.offset = offset;
        }
        if self.no_autopilot {
            settings.autopilot.enabled = false;
        }
    }
}

fn send_command(command: ControlCommand) -> Result<()> {
    let mut client = ControlClient::connect()?;
    let response = client
        .request(&command.into())
        .context("Overlay did not answer")?;
    match response {
        ControlResponse::Ack => println!("ok"),
        ControlResponse::Pong => println!("pong"),
        ControlResponse::Status(state) => {
            println!("{}", serde_json::to_string_pretty(&state).context("Failed to format status")?);
        }
        ControlResponse::Error(message) => anyhow::bail!("Overlay rejected command: {message}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    if let Some(command) = cli.command.clone() {
        send_command(command)?;
        return Ok(());
    }

    let mut settings = Settings::load()?;
    cli.apply_to(&mut settings);
    settings.validate_and_clamp();
    info!(edge = %settings.edge, offset = %settings.offset, autopilot = settings.autopilot.enabled, "Starting overlay");

    daemon::run_daemon(settings)?;
    Ok(())
}
