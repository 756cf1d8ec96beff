//! Workflow event types and EventBus
//!
//! Every state transition made by the upload controller is broadcast as a
//! `WorkflowEvent::StateChanged`, so observers can replay the full progress
//! sequence. Signals that leave state untouched (rejected drop, rejected
//! submit) are broadcast too.

use crate::models::WorkflowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default channel capacity for a client session
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Workflow events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// Controller moved to a new state or progress value
    StateChanged {
        /// Submission the change belongs to (`None` for selection changes)
        attempt_id: Option<Uuid>,
        state: WorkflowState,
        /// Displayed progress after the change
        progress: u8,
        timestamp: DateTime<Utc>,
    },

    /// A dropped file was refused; selection and state are unchanged
    InvalidFileType {
        file_name: String,
        mime_type: String,
        timestamp: DateTime<Utc>,
    },

    /// A submit was refused before reaching the network
    SubmissionRejected {
        /// Display text of the refusal
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// Progress carried by a state change, if this is one
    pub fn progress(&self) -> Option<u8> {
        match self {
            WorkflowEvent::StateChanged { progress, .. } => Some(*progress),
            _ => None,
        }
    }
}

/// Broadcast channel for workflow events
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` are buffered.
    ///
    /// # Examples
    ///
    /// ```
    /// use vidsum_client::events::{EventBus, WorkflowEvent};
    ///
    /// let event_bus = EventBus::new(64);
    /// let mut rx = event_bus.subscribe();
    /// event_bus.emit_lossy(WorkflowEvent::SubmissionRejected {
    ///     reason: "Please select a video file".to_string(),
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// assert!(rx.try_recv().is_ok());
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Rendering is optional; the workflow never depends on an observer.
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        for progress in [0u8, 18, 35] {
            bus.emit_lossy(WorkflowEvent::StateChanged {
                attempt_id: None,
                state: WorkflowState::Idle,
                progress,
                timestamp: Utc::now(),
            });
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(rx.recv().await.unwrap().progress().unwrap());
        }
        assert_eq!(seen, vec![0, 18, 35]);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        let event = WorkflowEvent::SubmissionRejected {
            reason: "Please select a video file".to_string(),
            timestamp: Utc::now(),
        };

        // Nobody listening: dropped silently
        bus.emit_lossy(event.clone());

        // A later subscriber sees only what follows
        let mut rx = bus.subscribe();
        bus.emit_lossy(event.clone());
        assert_eq!(rx.try_recv().unwrap(), event);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = WorkflowEvent::InvalidFileType {
            file_name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "InvalidFileType");
        assert_eq!(json["mime_type"], "application/pdf");
        assert!(event.progress().is_none());
    }
}
