//! Streamprobe Library
//!
//! This crate provides the core functionality for the streamprobe test
//! client: a manual integration-test harness that streams a local audio
//! file to the WAV-to-FLAC conversion service over WebSocket and captures
//! the converted bytes it gets back.

pub mod cli;
pub mod connection;
pub mod session;
pub mod stream;

// Re-exports for convenience
pub use cli::config::Config;
pub use connection::websocket::StreamClient;
pub use session::report::TransferReport;
pub use session::state::{SessionState, SessionStateManager};
pub use stream::chunker::Chunker;
pub use stream::sink::CaptureSink;
