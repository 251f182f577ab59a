//! CLI command modules.

pub mod jobs;
pub mod run;
