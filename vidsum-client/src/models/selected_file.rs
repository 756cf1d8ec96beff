//! The video chosen for submission

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use vidsum_common::{Error, Result};

/// Containers the summary service accepts, with their MIME types
pub const ACCEPTED_EXTENSIONS: [(&str, &str); 4] = [
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
];

/// Bytes read from the head of a file for content sniffing
const SNIFF_LEN: u64 = 8192;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A local file selected for upload
///
/// Description of the blob plus where to read it from. The controller only
/// ever reads it; the selection manager owns the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    /// Display and upload name (final path component)
    pub name: String,
    /// MIME type, e.g. `video/mp4`
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Location of the content on disk
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            path: path.into(),
        }
    }

    /// Describe a file on disk
    ///
    /// Size comes from metadata. The MIME type is sniffed from the file's
    /// leading bytes, then guessed from the extension, then falls back to
    /// `application/octet-stream`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("No file name in {}", path.display())))?;

        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        tokio::fs::File::open(path)
            .await?
            .take(SNIFF_LEN)
            .read_to_end(&mut head)
            .await?;

        let mime_type = infer::get(&head)
            .map(|kind| kind.mime_type())
            .or_else(|| mime_from_extension(&name))
            .unwrap_or(FALLBACK_MIME);

        tracing::debug!(
            file = %name,
            mime_type,
            size = metadata.len(),
            "Described selected file"
        );

        Ok(Self::new(name, mime_type, metadata.len(), path))
    }

    /// True for any `video/*` MIME type
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Lower-cased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Whether the service will accept this container
    ///
    /// Informational only; the manual picker never blocks on it.
    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .map(|ext| ACCEPTED_EXTENSIONS.iter().any(|(known, _)| *known == ext))
            .unwrap_or(false)
    }
}

/// MIME type for one of the accepted container extensions
pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_string_lossy().to_lowercase();
    ACCEPTED_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}
