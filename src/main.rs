//! Streamprobe CLI Entry Point
//!
//! This is the main entry point for the streamprobe binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use streamprobe::cli::config::Config;
use streamprobe::connection::websocket::StreamClient;

#[derive(Parser)]
#[command(name = "streamprobe")]
#[command(author, version, about = "Streamprobe - WebSocket streaming test client for the audio conversion service")]
struct Cli {
    /// Path to configuration file (built-in defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the source file to the conversion service
    Stream {
        /// Source audio file to stream
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Capture file for the service's responses
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// WebSocket URL of the conversion service
        #[arg(short, long)]
        url: Option<String>,

        /// Print the transfer report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default_config(),
    };

    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Stream {
            source,
            output,
            url,
            json,
        } => {
            run_stream(config, url, source, output, json).await?;
        }
        Commands::Version => {
            show_version();
        }
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let log_level = if verbose {
        Level::DEBUG
    } else {
        config
            .logging
            .level
            .parse()
            .unwrap_or(Level::INFO)
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true);

    match config.logging.format.as_str() {
        "json" => tracing::subscriber::set_global_default(builder.json().finish())?,
        "compact" => tracing::subscriber::set_global_default(builder.compact().finish())?,
        _ => tracing::subscriber::set_global_default(builder.finish())?,
    }

    Ok(())
}

async fn run_stream(
    mut config: Config,
    url: Option<String>,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    config.apply_overrides(url, source, output);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.stream.source.display(),
        output = %config.stream.output.display(),
        chunk_size = config.stream.chunk_size,
        "Starting streaming session"
    );

    let client = StreamClient::new(&config);
    let report = client.run().await?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

fn show_version() {
    println!("streamprobe {}", env!("CARGO_PKG_VERSION"));
    println!("WebSocket streaming test client for the audio conversion service");
    println!();
    println!("Defaults:");
    println!("  - Endpoint: ws://127.0.0.1:3001/ws");
    println!("  - Chunk size: 8092 bytes, one frame every 100 ms");
    println!("  - Source: file_example_WAV_2MG.wav -> Capture: output3.flac");
}
