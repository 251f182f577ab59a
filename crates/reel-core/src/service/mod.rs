//! Remote extraction service boundary.
//!
//! The runner needs exactly three operations from the service: upload a
//! local file, poll an upload until it is usable, and submit one generation
//! request. Everything else about the wire protocol is the concrete
//! client's business.

pub mod gemini;
pub mod retry;

use crate::error::JobError;
use async_trait::async_trait;
use std::path::Path;

/// Server-side handle for an uploaded file.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    /// Resource name used for status polls (e.g. "files/abc123")
    pub name: String,
    /// URI referenced in generation requests
    pub uri: String,
    /// MIME type declared at upload time
    pub mime_type: String,
}

impl MediaHandle {
    /// The reference a generation request carries for this upload.
    pub fn media_ref(&self) -> MediaRef {
        MediaRef::Uploaded {
            uri: self.uri.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Media reference carried by a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// A file previously uploaded to the service
    Uploaded { uri: String, mime_type: String },
    /// A remote URL the service fetches itself (no upload step)
    External { url: String },
}

/// Remote processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Pending,
    Active,
    Failed,
}

/// Outcome of a generation call, decided once when the response is parsed
/// rather than re-inspected per call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Textual segments, in response order
    Text(Vec<String>),
    /// The model returned inline media instead of text
    InlineMedia(Vec<InlinePart>),
    /// The response carried no parts at all
    Empty,
}

/// One inline media part from a generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Trait the runner drives the remote service through.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the runner holds an `Arc<dyn ExtractionService>`).
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Service name for logging (e.g. "gemini").
    fn name(&self) -> &str;

    /// Upload a local file; the returned handle may still be processing.
    async fn upload(&self, path: &Path) -> Result<MediaHandle, JobError>;

    /// Current remote processing state of an upload.
    async fn poll_status(&self, handle: &MediaHandle) -> Result<MediaState, JobError>;

    /// Submit one generation request.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        media: &MediaRef,
    ) -> Result<GenerateOutcome, JobError>;
}

/// Guess a video MIME type from the file extension.
///
/// Defaults to video/mp4 when the extension is missing or unknown.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mpeg" | "mpg") => "video/mpeg",
        _ => "video/mp4",
    }
}
