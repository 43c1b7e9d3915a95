//! Transfer Report
//!
//! End-of-run summary of a streaming session, printable as text or JSON.

use serde::Serialize;

use crate::session::state::{SessionSnapshot, SessionState};

/// Summary of one completed (or failed) streaming session
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub session_id: String,
    pub endpoint: String,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub duration_ms: u64,
    pub completed: bool,
}

impl TransferReport {
    /// Build a report from a session snapshot
    pub fn from_snapshot(snapshot: &SessionSnapshot, endpoint: &str) -> Self {
        let duration_ms = match (snapshot.started_at, snapshot.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds().max(0) as u64,
            _ => 0,
        };

        Self {
            session_id: snapshot.session_id.clone(),
            endpoint: endpoint.to_string(),
            frames_sent: snapshot.frames_sent,
            bytes_sent: snapshot.bytes_sent,
            frames_received: snapshot.frames_received,
            bytes_received: snapshot.bytes_received,
            duration_ms,
            completed: snapshot.state == SessionState::Closed,
        }
    }

    /// Serialize the report to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for TransferReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Session {}", self.session_id)?;
        writeln!(f, "  Endpoint:  {}", self.endpoint)?;
        writeln!(
            f,
            "  Sent:      {} frames / {} bytes",
            self.frames_sent, self.bytes_sent
        )?;
        writeln!(
            f,
            "  Received:  {} frames / {} bytes",
            self.frames_received, self.bytes_received
        )?;
        writeln!(f, "  Duration:  {} ms", self.duration_ms)?;
        write!(
            f,
            "  Result:    {}",
            if self.completed { "completed" } else { "incomplete" }
        )
    }
}
