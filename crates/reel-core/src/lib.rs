//! Reel core — embeddable video-to-markdown extraction pipeline.
//!
//! Reel drives a remote video-understanding service through a strictly
//! sequential batch: each configured job uploads (or references) a video,
//! submits one generation request, and persists the extracted text as a
//! markdown file.
//!
//! # Architecture
//!
//! ```text
//! Config (TOML) → Jobs → [upload → poll active] → prompt → generate → .md
//!                          (local sources only)      ↑ retry on overload
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use reel_core::{Config, GeminiService, Runner, RunnerOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_from("reel.toml".as_ref())?;
//!     let service = Arc::new(GeminiService::new(&api_key, &config.extraction.endpoint));
//!     let runner = Runner::new(service, RunnerOptions::from_config(&config));
//!     let report = runner.run(&config.jobs()?, |_| {}).await;
//!     println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod job;
pub mod output;
pub mod runner;
pub mod service;
pub mod template;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, JobError, JobResult, ReelError, Result};
pub use job::{Job, JobOutcome, MediaSource, RunReport};
pub use runner::{Runner, RunnerOptions, SLEEP_AFTER_FINAL_JOB};
pub use service::gemini::GeminiService;
pub use service::retry::RetryPolicy;
pub use service::{ExtractionService, GenerateOutcome, MediaHandle, MediaRef, MediaState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
