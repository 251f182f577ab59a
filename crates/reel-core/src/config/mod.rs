//! Configuration management for reel.
//!
//! Configuration is a declarative TOML document: global settings plus an
//! ordered `[[jobs]]` array. It is read once at startup and immutable for
//! the run; loading touches nothing but the config file itself.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::job::Job;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote extraction settings
    pub extraction: ExtractionConfig,

    /// Retry settings for the generation call
    pub retry: RetryConfig,

    /// Prompt and output-format templates
    pub templates: TemplateConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Ordered job list
    pub jobs: Vec<JobSpec>,
}

impl Config {
    /// Load and validate configuration from a file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The full validated job list, in config order.
    pub fn jobs(&self) -> Result<Vec<Job>, ConfigError> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.resolve(index))
            .collect()
    }

    /// The job list restricted to the given identifiers.
    ///
    /// An empty filter selects every job. Identifiers match a job's id,
    /// local path, or remote URL. Original config order is preserved
    /// regardless of filter order; unknown identifiers are silently
    /// ignored.
    pub fn select_jobs(&self, idents: &[String]) -> Result<Vec<Job>, ConfigError> {
        let mut jobs = self.jobs()?;
        if !idents.is_empty() {
            jobs.retain(|job| idents.iter().any(|ident| job.matches(ident)));
        }
        Ok(jobs)
    }
}
