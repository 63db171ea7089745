/// CubeDeck - Bookmark carousel in the terminal
///
/// Every cube face holds a web page. Controls:
///   - Left/Right: Rotate the active cube
///   - Up/Down: Previous/next cube
///   - Enter or click: Open the active face
///   - + / b / c / x: Add cube, bind, change, remove page
///   - Esc: Close the open page
///   - Q: Quit
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use cubedeck_core::{FaceBindingStore, FileGateway, PersistenceGateway};
use cubedeck_terminal::net::{BackgroundSaver, HttpGateway, ProxyClient};
use cubedeck_terminal::{AppConfig, Result, TerminalApp, TerminalError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cubedeck", version, about = "Browse bookmarked pages on a carousel of cubes")]
struct Cli {
    /// Backend serving /get_data, /save_data and /proxy/
    #[arg(long)]
    backend: Option<String>,

    /// Collection file used when no backend is given
    #[arg(long = "data-file", default_value = "cube_data.json")]
    data_file: PathBuf,

    #[arg(long = "log-file", default_value = "cubedeck.log")]
    log_file: PathBuf,

    /// Filter used when RUST_LOG is unset
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,

    /// Milliseconds a page is shown before it is captured
    #[arg(long = "view-dwell-ms", default_value_t = 1500)]
    view_dwell_ms: u64,

    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=120))]
    fps: u32,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .map_err(|err| TerminalError::LogFilter(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    init_logging(&cli)?;

    let gateway: Box<dyn PersistenceGateway> = match &cli.backend {
        Some(base) => {
            tracing::info!(backend = %base, "using HTTP backend");
            Box::new(BackgroundSaver::spawn(HttpGateway::new(base)?))
        }
        None => {
            tracing::info!(path = %cli.data_file.display(), "using collection file");
            Box::new(BackgroundSaver::spawn(FileGateway::new(&cli.data_file)))
        }
    };
    let pages = ProxyClient::new(cli.backend.as_deref())?;
    let config = AppConfig {
        view_dwell: Duration::from_millis(cli.view_dwell_ms),
        fps: cli.fps,
        ..AppConfig::default()
    };

    let mut app = TerminalApp::new(FaceBindingStore::open(gateway), Box::new(pages), config)?;
    app.run()?;
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cubedeck: {err}");
            ExitCode::FAILURE
        }
    }
}
