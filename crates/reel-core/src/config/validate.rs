//! Configuration validation, including per-job source checks.

use crate::error::ConfigError;
use crate::job::{Job, MediaSource};

use super::{Config, JobSpec};

impl Config {
    /// Validate configuration values and every job table.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.model.is_empty() {
            return Err(ConfigError::ValidationError(
                "extraction.model must not be empty".into(),
            ));
        }
        if self.extraction.upload_poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.upload_poll_interval_secs must be > 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be >= 1".into(),
            ));
        }
        for (index, spec) in self.jobs.iter().enumerate() {
            spec.resolve(index)?;
        }
        Ok(())
    }
}

impl JobSpec {
    /// Convert a raw job table into a validated `Job`.
    ///
    /// Rejected here, at load time: both or neither of `path`/`url` set,
    /// and an empty `output`.
    pub(crate) fn resolve(&self, index: usize) -> Result<Job, ConfigError> {
        let source = match (&self.path, &self.url) {
            (Some(path), None) => MediaSource::Local(path.clone()),
            (None, Some(url)) => MediaSource::Remote(url.clone()),
            (Some(_), Some(_)) => {
                return Err(ConfigError::ValidationError(format!(
                    "jobs[{index}]: set exactly one of `path` or `url`, not both"
                )));
            }
            (None, None) => {
                return Err(ConfigError::ValidationError(format!(
                    "jobs[{index}]: one of `path` or `url` is required"
                )));
            }
        };
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "jobs[{index}]: `output` is required"
            )));
        }
        Ok(Job {
            id: self.id.clone(),
            source,
            destination: self.output.clone(),
            title: self.title.clone(),
            section: self.section.clone(),
        })
    }
}
