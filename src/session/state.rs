//! Session State Management
//!
//! Provides the state machine for a single streaming session and the
//! transfer counters updated by the sender task and the receive loop.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

/// Represents the possible states of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection has been attempted yet
    Idle,
    /// Session is connecting to the conversion service
    Connecting,
    /// Connected; the sender task is streaming the source file
    Streaming,
    /// Source file exhausted; waiting for remaining responses and close
    Draining,
    /// Session ended normally
    Closed,
    /// Session ended with an error
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::Streaming => write!(f, "Streaming"),
            SessionState::Draining => write!(f, "Draining"),
            SessionState::Closed => write!(f, "Closed"),
            SessionState::Failed => write!(f, "Failed"),
        }
    }
}

/// State transition information
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Point-in-time view of the session used for reporting
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Internal state data
struct SessionInner {
    current: SessionState,
    session_id: String,
    frames_sent: u64,
    bytes_sent: u64,
    frames_received: u64,
    bytes_received: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    transitions: Vec<StateTransition>,
}

/// Thread-safe session state manager
#[derive(Clone)]
pub struct SessionStateManager {
    inner: Arc<RwLock<SessionInner>>,
}

impl SessionStateManager {
    /// Create a new state manager starting in Idle state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                current: SessionState::Idle,
                session_id: Uuid::new_v4().to_string(),
                frames_sent: 0,
                bytes_sent: 0,
                frames_received: 0,
                bytes_received: 0,
                started_at: None,
                finished_at: None,
                transitions: Vec::new(),
            })),
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> SessionState {
        self.inner.read().current
    }

    /// Get the session identifier
    pub fn session_id(&self) -> String {
        self.inner.read().session_id.clone()
    }

    /// Transition to a new state
    pub fn transition_to(&self, new_state: SessionState, reason: Option<String>) -> bool {
        let mut inner = self.inner.write();

        if !is_valid_transition(inner.current, new_state) {
            return false;
        }

        let transition = StateTransition {
            from: inner.current,
            to: new_state,
            timestamp: Utc::now(),
            reason,
        };

        let old_state = inner.current;
        inner.current = new_state;

        match new_state {
            SessionState::Streaming => {
                if inner.started_at.is_none() {
                    inner.started_at = Some(Utc::now());
                }
            }
            SessionState::Closed | SessionState::Failed => {
                inner.finished_at = Some(Utc::now());
            }
            _ => {}
        }

        inner.transitions.push(transition);

        tracing::info!(
            from = %old_state,
            to = %new_state,
            "Session state transition"
        );

        true
    }

    /// Set state to connecting
    pub fn set_connecting(&self) {
        self.transition_to(SessionState::Connecting, Some("Initiating connection".to_string()));
    }

    /// Set state to streaming
    pub fn set_streaming(&self) {
        self.transition_to(SessionState::Streaming, Some("Connection established".to_string()));
    }

    /// Set state to draining
    pub fn set_draining(&self) {
        self.transition_to(SessionState::Draining, Some("Source file exhausted".to_string()));
    }

    /// Set state to closed
    pub fn set_closed(&self) {
        self.transition_to(SessionState::Closed, Some("Session ended".to_string()));
    }

    /// Set state to failed
    pub fn set_failed(&self, reason: String) {
        self.transition_to(SessionState::Failed, Some(reason));
    }

    /// Record one outbound binary frame
    pub fn record_frame_sent(&self, bytes: usize) {
        let mut inner = self.inner.write();
        inner.frames_sent += 1;
        inner.bytes_sent += bytes as u64;
    }

    /// Record one inbound binary frame
    pub fn record_frame_received(&self, bytes: usize) {
        let mut inner = self.inner.write();
        inner.frames_received += 1;
        inner.bytes_received += bytes as u64;
    }

    /// Get recent state transitions
    pub fn recent_transitions(&self, count: usize) -> Vec<StateTransition> {
        let inner = self.inner.read();
        inner.transitions.iter().rev().take(count).cloned().collect()
    }

    /// Take a snapshot of the session for reporting
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read();
        SessionSnapshot {
            session_id: inner.session_id.clone(),
            state: inner.current,
            frames_sent: inner.frames_sent,
            bytes_sent: inner.bytes_sent,
            frames_received: inner.frames_received,
            bytes_received: inner.bytes_received,
            started_at: inner.started_at,
            finished_at: inner.finished_at,
        }
    }

    /// Check if the session reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(
            self.current_state(),
            SessionState::Closed | SessionState::Failed
        )
    }
}

/// Check if a state transition is valid
fn is_valid_transition(from: SessionState, to: SessionState) -> bool {
    // Self-transition is always allowed
    if from == to {
        return true;
    }

    matches!(
        (from, to),
        // From Idle
        (SessionState::Idle, SessionState::Connecting) |
        // From Connecting
        (SessionState::Connecting, SessionState::Streaming) |
        (SessionState::Connecting, SessionState::Failed) |
        // From Streaming
        (SessionState::Streaming, SessionState::Draining) |
        (SessionState::Streaming, SessionState::Closed) |
        (SessionState::Streaming, SessionState::Failed) |
        // From Draining
        (SessionState::Draining, SessionState::Closed) |
        (SessionState::Draining, SessionState::Failed)
    )
}

impl Default for SessionStateManager {
    fn default() -> Self {
        Self::new()
    }
}
