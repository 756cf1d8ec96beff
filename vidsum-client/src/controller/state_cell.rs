//! Shared workflow state
//!
//! Holds the current `WorkflowSnapshot` and the busy flag behind one lock.
//! Every mutation publishes the new snapshot on a watch channel; changes of
//! state variant or progress value are also broadcast on the `EventBus`,
//! while still under the lock so subscribers see them in order.
//!
//! Updates carry the attempt id they belong to. Updates for an attempt that
//! is no longer current, or that arrive after a terminal transition, are
//! dropped.

use crate::error::WorkflowError;
use crate::events::{EventBus, WorkflowEvent};
use crate::models::{SelectedFile, SummaryResult, WorkflowSnapshot, WorkflowState};
use crate::progress::upload_percent;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct Inner {
    snapshot: WorkflowSnapshot,
    busy: bool,
}

pub(crate) struct StateCell {
    inner: Mutex<Inner>,
    watch_tx: watch::Sender<WorkflowSnapshot>,
    event_bus: EventBus,
}

impl StateCell {
    pub(crate) fn new(event_bus: EventBus) -> Self {
        let (watch_tx, _) = watch::channel(WorkflowSnapshot::default());
        Self {
            inner: Mutex::new(Inner {
                snapshot: WorkflowSnapshot::default(),
                busy: false,
            }),
            watch_tx,
            event_bus,
        }
    }

    pub(crate) fn snapshot(&self) -> WorkflowSnapshot {
        self.inner.lock().snapshot.clone()
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.inner.lock().busy
    }

    pub(crate) fn watch(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.watch_tx.subscribe()
    }

    pub(crate) fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Claim the controller for a new attempt and enter `Uploading`
    pub(crate) fn try_begin(&self, file: &SelectedFile) -> Result<Uuid, WorkflowError> {
        let mut inner = self.inner.lock();
        if inner.busy {
            return Err(WorkflowError::SubmissionInProgress);
        }

        let attempt_id = Uuid::new_v4();
        inner.busy = true;
        inner.snapshot = WorkflowSnapshot {
            attempt_id: Some(attempt_id),
            state: WorkflowState::Uploading {
                file: file.clone(),
                bytes_sent: 0,
                bytes_total: file.size,
            },
            progress: 0,
        };

        info!(%attempt_id, file = %file.name, size = file.size, "Submission started");
        self.publish(&inner, true);
        Ok(attempt_id)
    }

    /// Record upload byte progress, scaled into `0..=floor`
    pub(crate) fn apply_upload_progress(
        &self,
        attempt_id: Uuid,
        bytes_sent: u64,
        bytes_total: u64,
        floor: u8,
    ) {
        let mut inner = self.inner.lock();
        if !is_current(&inner, attempt_id) {
            return;
        }

        let WorkflowState::Uploading { file, .. } = &inner.snapshot.state else {
            return;
        };

        let state = WorkflowState::Uploading {
            file: file.clone(),
            bytes_sent,
            bytes_total,
        };
        let previous = inner.snapshot.progress;
        let progress = previous.max(upload_percent(bytes_sent, bytes_total, floor));

        inner.snapshot.state = state;
        inner.snapshot.progress = progress;
        self.publish(&inner, progress != previous);
    }

    /// Upload accepted: enter `ServerProcessing` at the floor
    pub(crate) fn enter_processing(&self, attempt_id: Uuid, floor: u8) {
        let mut inner = self.inner.lock();
        if !is_current(&inner, attempt_id) {
            return;
        }

        let progress = inner.snapshot.progress.max(floor);
        inner.snapshot.state = WorkflowState::ServerProcessing {
            estimated_progress: progress,
        };
        inner.snapshot.progress = progress;

        debug!(%attempt_id, progress, "Waiting for server processing");
        self.publish(&inner, true);
    }

    /// Apply one synthetic progress value
    ///
    /// Only honored while the attempt is in `ServerProcessing`; values at or
    /// below the current progress are ignored.
    pub(crate) fn apply_estimate(&self, attempt_id: Uuid, value: u8) {
        let mut inner = self.inner.lock();
        if !is_current(&inner, attempt_id) {
            return;
        }
        if !matches!(inner.snapshot.state, WorkflowState::ServerProcessing { .. }) {
            return;
        }
        if value <= inner.snapshot.progress {
            return;
        }

        inner.snapshot.state = WorkflowState::ServerProcessing {
            estimated_progress: value,
        };
        inner.snapshot.progress = value;
        self.publish(&inner, true);
    }

    /// Result received: pass through `ServerProcessing(100)` to `Succeeded`
    pub(crate) fn finish_success(&self, attempt_id: Uuid, result: SummaryResult) {
        let mut inner = self.inner.lock();
        if !is_current(&inner, attempt_id) {
            return;
        }

        inner.snapshot.progress = 100;
        inner.snapshot.state = WorkflowState::ServerProcessing {
            estimated_progress: 100,
        };
        self.publish(&inner, true);

        inner.snapshot.state = WorkflowState::Succeeded { result };
        inner.busy = false;
        self.publish(&inner, true);

        info!(%attempt_id, "Submission succeeded");
    }

    /// Abandon the attempt with a display message; progress stays where it was
    pub(crate) fn finish_failure(&self, attempt_id: Uuid, message: String) {
        let mut inner = self.inner.lock();
        if !is_current(&inner, attempt_id) {
            return;
        }

        warn!(%attempt_id, progress = inner.snapshot.progress, %message, "Submission failed");

        inner.snapshot.state = WorkflowState::Failed { message };
        inner.busy = false;
        self.publish(&inner, true);
    }

    /// Reflect a selection change while nothing is in flight
    ///
    /// Terminal states stay on display until the next submit replaces them.
    pub(crate) fn note_selection(&self, file: Option<&SelectedFile>) {
        let mut inner = self.inner.lock();
        if inner.busy {
            return;
        }
        if !matches!(
            inner.snapshot.state,
            WorkflowState::Idle | WorkflowState::FileReady { .. }
        ) {
            return;
        }

        let state = match file {
            Some(file) => WorkflowState::FileReady { file: file.clone() },
            None => WorkflowState::Idle,
        };
        if inner.snapshot.state == state {
            return;
        }

        inner.snapshot = WorkflowSnapshot {
            attempt_id: None,
            state,
            progress: 0,
        };
        self.publish(&inner, true);
    }

    fn publish(&self, inner: &Inner, broadcast: bool) {
        self.watch_tx.send_replace(inner.snapshot.clone());

        if broadcast {
            self.event_bus.emit_lossy(WorkflowEvent::StateChanged {
                attempt_id: inner.snapshot.attempt_id,
                state: inner.snapshot.state.clone(),
                progress: inner.snapshot.progress,
                timestamp: Utc::now(),
            });
        }
    }
}

/// The attempt owns the controller and has not reached a terminal state
fn is_current(inner: &Inner, attempt_id: Uuid) -> bool {
    inner.busy && inner.snapshot.attempt_id == Some(attempt_id)
}
