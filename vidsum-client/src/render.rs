//! Terminal rendering of workflow progress and results

use crate::error::ServiceError;
use crate::models::{SummaryResult, WorkflowSnapshot, WorkflowState};
use crate::service::SummaryService;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const BAR_WIDTH: usize = 30;

/// One status line for the current snapshot
///
/// `[#########.....]  49% Uploading` while the bar is shown, the stage or
/// outcome text otherwise.
pub fn progress_line(snapshot: &WorkflowSnapshot) -> String {
    if snapshot.state.is_in_flight() && snapshot.shows_progress_bar() {
        let filled = BAR_WIDTH * usize::from(snapshot.progress) / 100;
        let label = snapshot.state.stage_label().unwrap_or_default();
        return format!(
            "[{}{}] {:>3}% {}",
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            snapshot.progress,
            label
        );
    }

    match &snapshot.state {
        WorkflowState::Idle => "No file selected".to_string(),
        WorkflowState::FileReady { file } => format!("Ready: {} ({} bytes)", file.name, file.size),
        WorkflowState::Failed { message } => format!("Error: {}", message),
        state => state.stage_label().unwrap_or_default().to_string(),
    }
}

/// Redraw the status line on stderr whenever the snapshot changes
///
/// The task ends after drawing a terminal snapshot or when the sender is gone.
pub fn spawn_status_line(mut snapshots: watch::Receiver<WorkflowSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_line = String::new();
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            let line = progress_line(&snapshot);
            if line != last_line {
                eprint!("\r\x1b[2K{}", line);
                let _ = std::io::stderr().flush();
                last_line = line;
            }
            if snapshot.state.is_terminal() {
                break;
            }
        }
        eprintln!();
    })
}

/// Wait for the status line task, logging a panic or cancellation
pub async fn finish_status_line(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        warn!(error = %e, "Progress renderer stopped abnormally");
    }
}

/// Plain-text report of a summary
pub fn render_summary(result: &SummaryResult) -> String {
    let mut out = String::new();

    out.push_str("Summary\n=======\n");
    out.push_str(&result.summary_text);
    out.push_str("\n\n");

    if !result.key_frame_ids.is_empty() {
        out.push_str("Key frames\n==========\n");
        for (index, frame_id) in result.key_frame_ids.iter().enumerate() {
            out.push_str(&format!("{:>3}. {}\n", index + 1, frame_id));
        }
        out.push('\n');
    }

    // The service words the no-audio case itself; print it as sent
    out.push_str("Transcript\n==========\n");
    out.push_str(&result.transcript);
    out.push('\n');

    out
}

/// Local file name for a frame id: its last path component only
fn frame_file_name(frame_id: &str) -> Option<&str> {
    Path::new(frame_id)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
}

/// Save every key frame of `result` into `dir`
///
/// Frames are fetched in display order. A failed frame is logged and
/// skipped; the returned paths cover the frames that were written.
pub async fn download_frames(
    service: &dyn SummaryService,
    result: &SummaryResult,
    dir: &Path,
) -> Result<Vec<PathBuf>, ServiceError> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(result.key_frame_ids.len());

    for frame_id in &result.key_frame_ids {
        let Some(file_name) = frame_file_name(frame_id) else {
            warn!(%frame_id, "Skipping frame with unusable name");
            continue;
        };

        match service.fetch_frame(frame_id).await {
            Ok(bytes) => {
                let path = dir.join(file_name);
                tokio::fs::write(&path, &bytes).await?;
                info!(%frame_id, path = %path.display(), bytes = bytes.len(), "Frame saved");
                written.push(path);
            }
            Err(e) => {
                warn!(%frame_id, error = %e, "Frame download failed");
            }
        }
    }

    Ok(written)
}
