//! Porthole - live screencast viewer for headless browser containers.
//!
//! Main entry point for the porthole CLI.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use porthole_cdp::controller::{self, ControllerConfig, ControllerEvent, ControllerState};
use porthole_containers::{ContainerDirectory, DirectoryConfig};
use porthole_server::{AppState, ServerConfig};

/// Porthole CLI.
#[derive(Parser)]
#[command(name = "porthole")]
#[command(about = "Live screencast viewer for headless browser containers")]
#[command(version)]
struct Cli {
    /// Directory for rotated log files (console only when absent)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the viewer UI and container API (default)
    Serve(ServeCommand),

    /// Follow one CDP endpoint from the terminal, logging frames instead of rendering them
    Watch {
        /// CDP host
        #[arg(long, default_value = "127.0.0.1", env = "PORTHOLE_CDP_HOST")]
        host: String,

        /// CDP port
        #[arg(long, default_value_t = 9222, env = "PORTHOLE_CDP_PORT")]
        port: u16,
    },
}

/// Arguments for `serve`; the bare invocation parses these too, so the
/// PORTHOLE_* fallbacks apply either way.
#[derive(Parser)]
struct ServeCommand {
    /// Server host
    #[arg(long, default_value = "127.0.0.1", env = "PORTHOLE_HOST")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 3000, env = "PORTHOLE_PORT")]
    port: u16,

    /// Image a container must run to show up in the picker
    #[arg(long, default_value = "browser:latest", env = "PORTHOLE_IMAGE")]
    image: String,

    /// Container CLI binary used to list the fleet
    #[arg(long, default_value = "container", env = "PORTHOLE_CONTAINER_CLI")]
    container_cli: String,
}

/// Initialize tracing with console output and, when a directory is given,
/// daily-rotated file output.
fn init_tracing(log_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("porthole")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard must live for the whole program or buffered lines are
            // dropped on exit.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            registry
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        // Default: serve, with the same env fallbacks as the explicit subcommand.
        None => serve(ServeCommand::parse_from(["porthole"])).await,
        Some(Commands::Serve(command)) => serve(command).await,
        Some(Commands::Watch { host, port }) => watch(host, port).await,
    }
}

/// Run the viewer server in the foreground.
async fn serve(command: ServeCommand) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting porthole v{}", env!("CARGO_PKG_VERSION"));

    let directory = ContainerDirectory::new(DirectoryConfig {
        program: command.container_cli,
        image: command.image,
        ..Default::default()
    });
    info!("Listing containers running image {}", directory.image());

    let state = AppState::new(directory)?;
    let config = ServerConfig {
        host: command.host,
        port: command.port,
    };

    porthole_server::run(config, state).await?;
    Ok(())
}

/// Follow a single CDP endpoint and log what the viewer would render.
async fn watch(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting porthole v{}", env!("CARGO_PKG_VERSION"));
    info!("Watching CDP endpoint {}:{}", host, port);

    let (events_tx, mut events) = tokio::sync::mpsc::unbounded_channel();
    let config = ControllerConfig {
        host,
        port,
        ..Default::default()
    };
    let handle = controller::spawn(config, events_tx);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                log_event(event);
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn log_event(event: ControllerEvent) {
    match event {
        ControllerEvent::State(ControllerState::Error(message)) => {
            warn!("Controller error: {}", message);
        }
        ControllerEvent::State(state) => info!("State: {}", state.as_str()),
        ControllerEvent::Tabs(tabs) => {
            info!("{} open tab(s)", tabs.len());
            for tab in &tabs {
                info!("  - {} ({})", tab.title, tab.url);
            }
        }
        ControllerEvent::ActiveTab(Some(id)) => info!("Active tab: {}", id),
        ControllerEvent::ActiveTab(None) => info!("No active tab"),
        ControllerEvent::Frame(frame) => {
            // One line per second of video is plenty for a terminal.
            if frame.frames % 30 == 1 {
                info!(
                    "Frame #{} {}x{} at {:.1} fps",
                    frame.frames, frame.width, frame.height, frame.fps
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
