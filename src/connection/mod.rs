//! Connection module
//!
//! This module handles the WebSocket session with the conversion service:
//! connecting, streaming the source file out, and capturing responses.

pub mod websocket;
