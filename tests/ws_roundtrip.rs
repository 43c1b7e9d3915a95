//! End-to-end tests driving the client against an in-process WebSocket
//! server on a loopback port.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use streamprobe::cli::config::Config;
use streamprobe::connection::websocket::StreamClient;
use streamprobe::session::state::SessionState;

/// Spawn a one-shot WebSocket server that collects every binary frame it
/// receives and, when `echo` is set, sends each one straight back.
async fn spawn_server(echo: bool) -> (SocketAddr, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let mut received = Vec::new();
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Binary(payload)) => {
                    received.push(payload.clone());
                    if echo {
                        ws.send(Message::Binary(payload)).await.unwrap();
                    }
                }
                Ok(Message::Close(_)) => {
                    let _ = ws.close(None).await;
                    // `close` is rejected once the peer's close frame has been
                    // read; flush to push out the auto-queued close reply so
                    // the peer sees a clean handshake instead of a reset.
                    let _ = ws.flush().await;
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        received
    });

    (addr, handle)
}

/// Spawn a WebSocket server that closes the connection after receiving a
/// fixed number of binary frames, cutting the sender off mid-stream.
async fn spawn_server_closing_after(frames: usize) -> (SocketAddr, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let mut received = Vec::new();
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Binary(payload)) => {
                    received.push(payload);
                    if received.len() >= frames {
                        let _ = ws.close(None).await;
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    let _ = ws.close(None).await;
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        received
    });

    (addr, handle)
}

fn test_config(addr: SocketAddr, source: &Path, output: &Path) -> Config {
    let mut config = Config::default_config();
    config.endpoint.url = format!("ws://{}/ws", addr);
    config.stream.source = source.to_path_buf();
    config.stream.output = output.to_path_buf();
    // Keep the tests fast; the production default is 100 ms
    config.stream.send_interval_ms = 1;
    config
}

fn patterned_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn round_trip_through_echo_server() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("input.wav");
    let output_path = dir.path().join("capture.flac");

    // Two full chunks plus a 10-byte tail
    let source = patterned_bytes(8092 * 2 + 10);
    tokio::fs::write(&source_path, &source).await.unwrap();

    let (addr, server) = spawn_server(true).await;
    let client = StreamClient::new(&test_config(addr, &source_path, &output_path));

    let report = client.run().await.unwrap();
    assert_eq!(report.frames_sent, 3);
    assert_eq!(report.bytes_sent, source.len() as u64);
    assert_eq!(report.frames_received, 3);
    assert!(report.completed);
    assert_eq!(client.state().current_state(), SessionState::Closed);

    // The server saw the exact source bytes, chunked at 8092
    let frames = server.await.unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].len(), 8092);
    assert_eq!(frames[2].len(), 10);
    assert_eq!(frames.concat(), source);

    // The capture file is the concatenation of every echoed frame
    let captured = tokio::fs::read(&output_path).await.unwrap();
    assert_eq!(captured, source);
}

#[tokio::test]
async fn exact_chunk_multiple_sends_one_full_frame() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("input.wav");
    let output_path = dir.path().join("capture.flac");

    tokio::fs::write(&source_path, patterned_bytes(8092)).await.unwrap();

    let (addr, server) = spawn_server(false).await;
    let client = StreamClient::new(&test_config(addr, &source_path, &output_path));

    let report = client.run().await.unwrap();
    assert_eq!(report.frames_sent, 1);
    assert_eq!(report.bytes_sent, 8092);

    let frames = server.await.unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), 8092);
}

#[tokio::test]
async fn empty_source_sends_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("input.wav");
    let output_path = dir.path().join("capture.flac");

    tokio::fs::write(&source_path, b"").await.unwrap();

    let (addr, server) = spawn_server(true).await;
    let client = StreamClient::new(&test_config(addr, &source_path, &output_path));

    let report = client.run().await.unwrap();
    assert_eq!(report.frames_sent, 0);
    assert_eq!(report.frames_received, 0);
    assert!(report.completed);

    assert!(server.await.unwrap().is_empty());
    // No inbound frames means the capture file is never created
    assert!(!output_path.exists());
}

#[tokio::test]
async fn silent_server_leaves_no_capture_file() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("input.wav");
    let output_path = dir.path().join("capture.flac");

    tokio::fs::write(&source_path, patterned_bytes(100)).await.unwrap();

    let (addr, server) = spawn_server(false).await;
    let client = StreamClient::new(&test_config(addr, &source_path, &output_path));

    let report = client.run().await.unwrap();
    assert_eq!(report.frames_sent, 1);
    assert_eq!(report.frames_received, 0);

    assert_eq!(server.await.unwrap().len(), 1);
    assert!(!output_path.exists());
}

#[tokio::test]
async fn early_server_close_reports_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("input.wav");
    let output_path = dir.path().join("capture.flac");

    // Twenty chunks, paced slowly enough that the server's close lands
    // long before the source is fully sent
    tokio::fs::write(&source_path, patterned_bytes(8092 * 20)).await.unwrap();

    let (addr, server) = spawn_server_closing_after(1).await;
    let mut config = test_config(addr, &source_path, &output_path);
    config.stream.send_interval_ms = 20;

    let client = StreamClient::new(&config);
    let report = client.run().await.unwrap();

    assert!(!report.completed);
    assert!(report.frames_sent < 20);
    assert_eq!(client.state().current_state(), SessionState::Failed);
    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_fails_without_retry() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("input.wav");
    let output_path = dir.path().join("capture.flac");
    tokio::fs::write(&source_path, patterned_bytes(100)).await.unwrap();

    // Grab a free port, then close the listener so the connect is refused
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = StreamClient::new(&test_config(addr, &source_path, &output_path));
    let result = client.run().await;

    assert!(result.is_err());
    assert_eq!(client.state().current_state(), SessionState::Failed);
    assert!(!output_path.exists());
}

#[tokio::test]
async fn missing_source_file_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("does-not-exist.wav");
    let output_path = dir.path().join("capture.flac");

    let (addr, _server) = spawn_server(true).await;
    let client = StreamClient::new(&test_config(addr, &source_path, &output_path));

    let result = client.run().await;
    assert!(result.is_err());
    assert_eq!(client.state().current_state(), SessionState::Failed);
}
