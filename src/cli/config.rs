//! Configuration module
//!
//! Handles loading and validating client configuration from TOML files.
//! Every value has a built-in default matching the conversion service's
//! test setup, so the client runs with no config file at all.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the streamprobe client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Conversion service endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Streaming behavior settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conversion service endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// WebSocket URL of the conversion service
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Streaming behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Source audio file streamed to the service
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Capture file that accumulates the service's responses
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Bytes per outbound binary frame
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay between outbound frames in milliseconds
    #[serde(default = "default_send_interval")]
    pub send_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_endpoint_url() -> String {
    "ws://127.0.0.1:3001/ws".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_source() -> PathBuf {
    PathBuf::from("file_example_WAV_2MG.wav")
}

fn default_output() -> PathBuf {
    PathBuf::from("output3.flac")
}

// The service's read buffer is 8092 bytes, not 8192. Kept in lockstep.
fn default_chunk_size() -> usize {
    8092
}

fn default_send_interval() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            chunk_size: default_chunk_size(),
            send_interval_ms: default_send_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        source: Option<PathBuf>,
        output: Option<PathBuf>,
    ) {
        if let Some(url) = url {
            self.endpoint.url = url;
        }
        if let Some(source) = source {
            self.stream.source = source;
        }
        if let Some(output) = output {
            self.stream.output = output;
        }
    }

    /// Validate that the configuration values make sense
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.url.is_empty() {
            return Err(anyhow::anyhow!("Endpoint URL cannot be empty"));
        }

        if self.stream.chunk_size == 0 {
            return Err(anyhow::anyhow!("Chunk size must be greater than 0"));
        }

        Ok(())
    }
}
