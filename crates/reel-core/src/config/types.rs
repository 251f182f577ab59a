//! Sub-configuration structs with defaults matching the shipped
//! `reel.example.toml` template.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Remote extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Model identifier passed to the remote service
    pub model: String,

    /// Base URL of the remote service
    pub endpoint: String,

    /// Pause between jobs in seconds. Applied between jobs only, never
    /// after the final one. Free-tier accounts typically need 30-60s.
    pub rate_limit_delay_secs: u64,

    /// Interval between upload-readiness polls in seconds
    pub upload_poll_interval_secs: u64,

    /// Upper bound on the total upload-readiness wait in seconds
    pub upload_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            rate_limit_delay_secs: 2,
            upload_poll_interval_secs: 2,
            upload_timeout_secs: 600,
        }
    }
}

/// Retry settings for the generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per submission, including the first
    pub max_attempts: u32,

    /// Base backoff delay in seconds; doubles on each further attempt
    pub base_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 2,
        }
    }
}

/// Prompt and output-format templates.
///
/// Placeholders `{title}`, `{section}`, `{course_context}` and
/// `{output_format}` are substituted per job; unresolved placeholders are
/// left verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// The extraction prompt sent alongside the media
    pub prompt: String,

    /// Output-format instructions, substituted for `{output_format}`
    pub output_format: String,

    /// Free-text course context, substituted for `{course_context}`
    pub course_context: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            prompt: "You are analyzing a course video titled \"{title}\" from the \
                     section \"{section}\".\n{course_context}\nExtract the key \
                     frameworks, concrete steps, and actionable advice as \
                     structured markdown.\n{output_format}"
                .to_string(),
            output_format: "Use ## headings per topic and bullet lists for steps. \
                            Keep the speaker's terminology."
                .to_string(),
            course_context: String::new(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prepend a markdown metadata header (title, section, date, source)
    /// to each written file. Off by default: the file then contains the
    /// extracted text byte-for-byte.
    pub front_matter: bool,
}

/// One raw job table from the `[[jobs]]` array.
///
/// Exactly one of `path` / `url` must be set; this is checked during
/// validation, not by serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    /// Optional identifier used by the CLI job filter
    pub id: Option<String>,

    /// Local video file to upload
    pub path: Option<PathBuf>,

    /// Remote URL the service fetches directly
    pub url: Option<String>,

    /// Output markdown path
    pub output: PathBuf,

    /// Title substituted into the prompt template
    pub title: String,

    /// Section substituted into the prompt template
    pub section: String,
}
