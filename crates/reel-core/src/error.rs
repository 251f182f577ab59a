//! Error types for the reel extraction pipeline.
//!
//! Two severities: fatal errors (`ConfigError`) abort the run before any job
//! executes, while `JobError` is terminal for a single job only — the batch
//! continues with the next job.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for reel operations.
#[derive(Error, Debug)]
pub enum ReelError {
    /// Configuration-related errors (fatal, pre-run)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-job processing errors
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// No API credential in the environment or on the command line
    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(String),
}

/// Per-job errors. None of these abort the batch.
#[derive(Error, Debug)]
pub enum JobError {
    /// Uploaded media never reached the active state within the wait bound
    #[error("Media for {path} not active after {waited_ms}ms")]
    MediaTimeout { path: PathBuf, waited_ms: u64 },

    /// Upload or remote-side media processing failed
    #[error("Upload failed for {path}: {message}")]
    UploadFailed { path: PathBuf, message: String },

    /// Remote overload or unavailability; eligible for retry
    #[error("Transient service error: {message}")]
    Transient {
        message: String,
        status_code: Option<u16>,
    },

    /// The service refused the prompt or media on content-policy grounds
    #[error("Request rejected on content-policy grounds: {reason}")]
    SafetyRejected { reason: String },

    /// The request succeeded but the response carried no extractable text
    #[error("Extraction produced no text")]
    EmptyResult,

    /// Any other remote or protocol failure; not retried
    #[error("Service error: {message}")]
    Service {
        message: String,
        status_code: Option<u16>,
    },

    /// Filesystem failure while persisting the result
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Short kind label for run reports and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::MediaTimeout { .. } => "media-timeout",
            JobError::UploadFailed { .. } => "upload-failed",
            JobError::Transient { .. } => "transient",
            JobError::SafetyRejected { .. } => "safety-rejected",
            JobError::EmptyResult => "empty-result",
            JobError::Service { .. } => "service",
            JobError::Io(_) => "io",
        }
    }
}

/// Convenience type alias for reel results.
pub type Result<T> = std::result::Result<T, ReelError>;

/// Convenience type alias for per-job results.
pub type JobResult<T> = std::result::Result<T, JobError>;
