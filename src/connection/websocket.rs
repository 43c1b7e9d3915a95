//! WebSocket Client
//!
//! Drives one streaming session against the conversion service: connect,
//! spawn the sender task that paces the source file out in binary frames,
//! and append every binary response to the capture file.
//!
//! There is deliberately no reconnect or retry logic. A failed connect or
//! a mid-stream error ends the run; this mirrors the throwaway nature of
//! the test harness.

use anyhow::{Context, Result};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::cli::config::Config;
use crate::session::report::TransferReport;
use crate::session::state::SessionStateManager;
use crate::stream::chunker::Chunker;
use crate::stream::sink::CaptureSink;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// WebSocket client streaming one source file to the conversion service
pub struct StreamClient {
    url: String,
    source: PathBuf,
    output: PathBuf,
    chunk_size: usize,
    send_interval: Duration,
    connect_timeout: Duration,
    state: SessionStateManager,
}

impl StreamClient {
    /// Create a new client from the loaded configuration
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.endpoint.url.clone(),
            source: config.stream.source.clone(),
            output: config.stream.output.clone(),
            chunk_size: config.stream.chunk_size,
            send_interval: Duration::from_millis(config.stream.send_interval_ms),
            connect_timeout: Duration::from_secs(config.endpoint.connect_timeout_secs),
            state: SessionStateManager::new(),
        }
    }

    /// Access the session state manager
    pub fn state(&self) -> &SessionStateManager {
        &self.state
    }

    /// Run the session to completion and return the transfer report
    pub async fn run(&self) -> Result<TransferReport> {
        self.state.set_connecting();
        info!(url = %self.url, session_id = %self.state.session_id(), "Connecting to conversion service");

        let connect = timeout(self.connect_timeout, connect_async(self.url.as_str())).await;
        let ws_stream = match connect {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                self.state.set_failed(format!("Connect failed: {}", e));
                return Err(e).context("Failed to connect to conversion service");
            }
            Err(_) => {
                self.state.set_failed("Connect timeout".to_string());
                anyhow::bail!("Timed out connecting to {}", self.url);
            }
        };

        info!("WebSocket connection established");
        self.state.set_streaming();

        let (write, mut read) = ws_stream.split();

        // One fire-and-forget sender; the receive loop below keeps the
        // read half and multiplexes over both until the session ends.
        let mut sender = tokio::spawn(stream_source(
            write,
            self.source.clone(),
            self.chunk_size,
            self.send_interval,
            self.state.clone(),
        ));
        let mut sender_done = false;

        let mut sink = CaptureSink::new(&self.output);

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Binary(payload))) => {
                            debug!(bytes = payload.len(), "Received converted chunk");
                            if let Err(e) = sink.append(&payload).await {
                                self.state.set_failed(format!("Capture write failed: {}", e));
                                return Err(e).with_context(|| {
                                    format!("Failed to append to capture file: {}", sink.path().display())
                                });
                            }
                            self.state.record_frame_received(payload.len());
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "Received close frame");
                            break;
                        }
                        Some(Ok(Message::Ping(_))) => {
                            debug!("Received ping");
                        }
                        Some(Ok(Message::Pong(_))) => {
                            debug!("Received pong");
                        }
                        Some(Ok(other)) => {
                            debug!(kind = %message_kind(&other), "Ignoring non-binary message");
                        }
                        Some(Err(e)) => {
                            self.state.set_failed(format!("WebSocket error: {}", e));
                            return Err(e).context("WebSocket error while receiving");
                        }
                        None => {
                            info!("WebSocket stream ended");
                            break;
                        }
                    }
                }

                res = &mut sender, if !sender_done => {
                    sender_done = true;
                    match res {
                        Ok(Ok(())) => {
                            self.state.set_draining();
                            info!("Source fully sent, draining responses");
                        }
                        Ok(Err(e)) => {
                            self.state.set_failed(e.to_string());
                            return Err(e).context("Sender task failed");
                        }
                        Err(e) => {
                            self.state.set_failed("Sender task panicked".to_string());
                            return Err(e).context("Sender task panicked");
                        }
                    }
                }
            }
        }

        if !sender_done {
            // Server closed before the source was fully sent. The original
            // harness leaves this undefined, so just stop the sender and
            // record the session as incomplete.
            warn!("Connection closed before source was fully sent");
            sender.abort();
            let _ = sender.await;
            self.state
                .set_failed("Server closed before source was fully sent".to_string());
        } else {
            self.state.set_closed();
        }
        let report = TransferReport::from_snapshot(&self.state.snapshot(), &self.url);
        info!(
            frames_sent = report.frames_sent,
            frames_received = report.frames_received,
            bytes_captured = sink.bytes_appended(),
            "Session finished"
        );
        Ok(report)
    }
}

/// Stream the source file through the write half, one paced binary frame
/// per chunk, then close the connection. The file handle lives only for
/// the duration of this task.
async fn stream_source(
    mut write: WsSink,
    source: PathBuf,
    chunk_size: usize,
    send_interval: Duration,
    state: SessionStateManager,
) -> Result<()> {
    let file = tokio::fs::File::open(&source)
        .await
        .with_context(|| format!("Failed to open source file: {}", source.display()))?;

    let mut chunker = Chunker::new(file, chunk_size);

    while let Some(chunk) = chunker
        .next_chunk()
        .await
        .with_context(|| format!("Failed to read source file: {}", source.display()))?
    {
        let len = chunk.len();
        write
            .send(Message::binary(chunk))
            .await
            .context("Failed to send audio chunk")?;
        state.record_frame_sent(len);
        debug!(bytes = len, "Sent audio chunk");

        // Crude rate limiting, applied after every frame
        sleep(send_interval).await;
    }

    info!("Source file exhausted, closing connection");
    write
        .close()
        .await
        .context("Failed to close WebSocket connection")?;

    Ok(())
}

fn message_kind(msg: &Message) -> &'static str {
    match msg {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "frame",
    }
}
