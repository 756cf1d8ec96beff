//! Test Helper Utilities
//!
//! Shared utilities for testing vidsum-client

#![allow(dead_code)]

pub mod fake_server;
pub mod fake_service;

pub use fake_server::FakeServer;
pub use fake_service::{FakeService, FetchScript, UploadScript};

use std::io::Write;
use tempfile::NamedTempFile;
use vidsum_client::{SelectedFile, SummaryResult, WorkflowEvent, WorkflowState};

pub const TEN_MIB: u64 = 10 * 1024 * 1024;

/// The `clip.mp4` of the reference scenario: 10 MiB, video/mp4
pub fn clip_mp4() -> SelectedFile {
    SelectedFile::new("clip.mp4", "video/mp4", TEN_MIB, "/videos/clip.mp4")
}

pub fn sample_result() -> SummaryResult {
    SummaryResult {
        summary_text: "...".to_string(),
        transcript: "...".to_string(),
        key_frame_ids: vec!["f1.jpg".to_string(), "f2.jpg".to_string()],
        source_filename: None,
        has_audio: None,
    }
}

/// A real MP4 on disk: `ftyp isom` header padded to `len` bytes
pub fn write_mp4(len: usize) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();

    let mut bytes = vec![
        0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
        0x00, b'i', b's', b'o', b'm', b'm', b'p', b'4', b'1',
    ];
    bytes.resize(len.max(bytes.len()), 0xAB);

    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Everything already buffered on a subscription
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Progress values of the state changes in `events`
pub fn progress_values(events: &[WorkflowEvent]) -> Vec<u8> {
    events.iter().filter_map(|e| e.progress()).collect()
}

/// States of the state changes in `events`
pub fn states(events: &[WorkflowEvent]) -> Vec<WorkflowState> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::StateChanged { state, .. } => Some(state.clone()),
            _ => None,
        })
        .collect()
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
