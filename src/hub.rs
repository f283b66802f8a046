//! Session hub tracking connected viewer sessions.
//!
//! Broadcasts are best-effort: a session whose channel is gone gets dropped
//! and the remaining sessions still receive the message. Inbound telemetry is
//! dispatched by its `type` discriminant; collision telemetry is only logged
//! because the server-side detector is the single authoritative collision
//! source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::protocol::{CaptureImage, InboundMessage, ViewerCommand};

pub type SessionId = u64;

/// Outbound half of a viewer session; the WebSocket task drains the other
/// end, so a hub broadcast never waits on network I/O.
pub type SessionSender = mpsc::UnboundedSender<String>;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no simulators connected")]
    NoSessions,
    #[error("no capture response within {0:?}")]
    Timeout(Duration),
    #[error("capture channel closed before a response arrived")]
    Closed,
}

#[derive(Default)]
pub struct Hub {
    sessions: Mutex<HashMap<SessionId, SessionSender>>,
    next_session: AtomicU64,
    pending_capture: Mutex<Option<oneshot::Sender<CaptureImage>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, sender: SessionSender) -> SessionId {
        let session = self.next_session.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().await.insert(session, sender);
        info!(session, "viewer session registered");
        session
    }

    pub async fn unregister(&self, session: SessionId) {
        if self.sessions.lock().await.remove(&session).is_some() {
            info!(session, "viewer session removed");
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Deliver `message` to every registered session. Returns how many
    /// sessions it was handed to; unreachable sessions are dropped without
    /// affecting the rest.
    pub async fn broadcast<T: Serialize>(&self, message: &T) -> usize {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(err) => {
                warn!("failed to encode broadcast: {err}");
                return 0;
            }
        };

        let mut sessions = self.sessions.lock().await;
        let mut delivered = 0;
        let mut unreachable = Vec::new();
        for (session, sender) in sessions.iter() {
            if sender.send(text.clone()).is_ok() {
                delivered += 1;
            } else {
                unreachable.push(*session);
            }
        }
        for session in unreachable {
            sessions.remove(&session);
            warn!(session, "dropping unreachable viewer session");
        }
        delivered
    }

    /// Broadcast a capture command and wait for the first
    /// `capture_image_response` from any session.
    pub async fn capture(&self, timeout: Duration) -> Result<CaptureImage, CaptureError> {
        if self.session_count().await == 0 {
            return Err(CaptureError::NoSessions);
        }
        let (sender, receiver) = oneshot::channel();
        // A stale request that never got answered is replaced here.
        *self.pending_capture.lock().await = Some(sender);
        self.broadcast(&ViewerCommand::CaptureImage).await;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(capture)) => Ok(capture),
            Ok(Err(_)) => Err(CaptureError::Closed),
            Err(_) => {
                self.pending_capture.lock().await.take();
                Err(CaptureError::Timeout(timeout))
            }
        }
    }

    pub async fn handle_inbound(&self, session: SessionId, text: &str) {
        let message = match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => message,
            Err(err) => {
                warn!(session, "unparseable viewer message: {err}");
                return;
            }
        };
        match message {
            InboundMessage::Confirmation { message } => {
                debug!(session, ?message, "viewer confirmation");
            }
            InboundMessage::Collision { .. } => {
                debug!(
                    session,
                    "collision telemetry ignored; server detection is authoritative"
                );
            }
            InboundMessage::GoalReached { .. } => {
                debug!(session, "viewer reported goal reached");
            }
            InboundMessage::CaptureImageResponse { capture } => {
                match self.pending_capture.lock().await.take() {
                    Some(sender) => {
                        let _ = sender.send(capture);
                    }
                    None => debug!(session, "capture response with no pending request"),
                }
            }
        }
    }
}
