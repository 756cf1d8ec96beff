//! Progress estimation
//!
//! Displayed progress spans two phases with different observability:
//! - Upload: real byte counts, scaled into `0..=floor`
//! - Server processing: no feedback from the service, so a timed estimator
//!   creeps from `floor` towards `ceiling` (never 100; 100 means a confirmed
//!   result)
//!
//! # Cancellation
//! The estimator task and its handle share a gate. `cancel()` closes the gate
//! under its lock, and each tick is emitted while holding the same lock, so
//! once `cancel()` returns no further value reaches the sink, even if a tick
//! had already fired.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vidsum_common::config::ProgressConfig;

/// Scale upload byte progress into `0..=share`, rounding half up
///
/// `bytes_total == 0` reports 0; `bytes_sent` above the total is clamped.
///
/// # Examples
///
/// ```
/// use vidsum_client::progress::upload_percent;
///
/// assert_eq!(upload_percent(350, 500, 70), 49);
/// ```
pub fn upload_percent(bytes_sent: u64, bytes_total: u64, share: u8) -> u8 {
    if bytes_total == 0 {
        return 0;
    }

    let sent = u128::from(bytes_sent.min(bytes_total));
    let total = u128::from(bytes_total);
    let scaled = sent * u128::from(share);

    // round(scaled / total) without floating point
    ((scaled * 2 + total) / (total * 2)) as u8
}

/// Synthetic progress source for the server-processing phase
#[derive(Debug, Clone, Copy)]
pub struct ProgressEstimator {
    config: ProgressConfig,
}

impl ProgressEstimator {
    pub fn new(config: ProgressConfig) -> Self {
        Self { config }
    }

    /// Start ticking from the floor
    ///
    /// `sink` receives `floor + 1`, `floor + 2`, ... one value per tick period
    /// and stops after delivering `ceiling`. Must be called inside a tokio
    /// runtime.
    pub fn start<F>(&self, sink: F) -> EstimatorHandle
    where
        F: FnMut(u8) + Send + 'static,
    {
        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(Gate {
            open: true,
            sink: Box::new(sink),
        }));

        let task = tokio::spawn(run_estimator(self.config, gate.clone(), token.clone()));

        debug!(
            floor = self.config.floor,
            ceiling = self.config.ceiling,
            tick_ms = self.config.tick_interval_ms,
            "Progress estimator started"
        );

        EstimatorHandle {
            gate,
            token,
            task: Some(task),
        }
    }
}

struct Gate {
    open: bool,
    sink: Box<dyn FnMut(u8) + Send>,
}

async fn run_estimator(config: ProgressConfig, gate: Arc<Mutex<Gate>>, token: CancellationToken) {
    let period = config.tick_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut value = config.floor;

    while value < config.ceiling {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        value += 1;

        let mut guard = gate.lock();
        if !guard.open {
            return;
        }
        (guard.sink)(value);
    }

    debug!(value, "Progress estimator holding at ceiling");
}

/// Handle to a running estimator
///
/// Dropping the handle cancels the estimator.
pub struct EstimatorHandle {
    gate: Arc<Mutex<Gate>>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl EstimatorHandle {
    /// Stop the estimator; idempotent
    ///
    /// After this returns the sink is never called again.
    pub fn cancel(&self) {
        let mut gate = self.gate.lock();
        if gate.open {
            gate.open = false;
            debug!("Progress estimator cancelled");
        }
        drop(gate);
        self.token.cancel();
    }

    #[cfg(test)]
    fn is_cancelled(&self) -> bool {
        !self.gate.lock().open
    }

    /// Cancel and wait for the task to exit
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for EstimatorHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
