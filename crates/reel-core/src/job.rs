//! Job model and run reporting.
//!
//! A `Job` is one video-to-markdown extraction task. Jobs are constructed
//! when the configuration is loaded, are read-only thereafter, and carry no
//! state across the batch.

use crate::error::{JobError, JobResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the media comes from. Exactly one variant per job, enforced at
/// config load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    /// Local video file, uploaded to the service before extraction
    Local(PathBuf),
    /// Remote URL the service can fetch directly (no upload step)
    Remote(String),
}

/// One unit of work: a media source, an output destination, and the
/// metadata interpolated into the prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Optional identifier used by the CLI job filter
    pub id: Option<String>,

    /// Media source (local file or remote URL)
    pub source: MediaSource,

    /// Output markdown path; parent directories are created as needed
    pub destination: PathBuf,

    /// Free-text title, substituted for `{title}` in the prompt
    pub title: String,

    /// Free-text section, substituted for `{section}` in the prompt
    pub section: String,
}

impl Job {
    /// Human-readable label for logs and summaries.
    pub fn label(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        if !self.title.is_empty() {
            return self.title.clone();
        }
        self.source_str()
    }

    /// The source as a display string.
    pub fn source_str(&self) -> String {
        match &self.source {
            MediaSource::Local(path) => path.display().to_string(),
            MediaSource::Remote(url) => url.clone(),
        }
    }

    /// Whether a filter identifier selects this job.
    ///
    /// Matches the job id, the local path, or the remote URL.
    pub fn matches(&self, ident: &str) -> bool {
        if self.id.as_deref() == Some(ident) {
            return true;
        }
        match &self.source {
            MediaSource::Local(path) => path.to_string_lossy() == ident,
            MediaSource::Remote(url) => url == ident,
        }
    }
}

/// Outcome of one job: the written destination on success, or the terminal
/// error for that job.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: Job,
    pub result: JobResult<PathBuf>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// The error kind label, if the job failed.
    pub fn error_kind(&self) -> Option<&'static str> {
        self.result.as_ref().err().map(JobError::kind)
    }
}

/// Final report for a batch run, enumerating every job's outcome in order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Iterate over failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}
