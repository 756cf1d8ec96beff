//! Data model of the upload-and-poll workflow

mod selected_file;
mod summary;
mod workflow_state;

pub use selected_file::{mime_from_extension, SelectedFile, ACCEPTED_EXTENSIONS};
pub use summary::{SummaryResult, UploadHandle};
pub use workflow_state::{WorkflowSnapshot, WorkflowState};
