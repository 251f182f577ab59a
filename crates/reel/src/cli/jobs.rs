//! The `reel jobs` command: list configured jobs without touching the network.

use clap::Args;
use reel_core::{Config, Job, MediaSource};
use std::path::PathBuf;

/// Arguments for the `jobs` command.
#[derive(Args, Debug)]
pub struct JobsArgs {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "reel.toml")]
    pub config: PathBuf,
}

/// Execute the jobs command.
pub fn execute(args: JobsArgs) -> anyhow::Result<()> {
    let config = Config::load_from(&args.config)?;
    let jobs = config.jobs()?;

    if jobs.is_empty() {
        println!("No jobs configured in {:?}", args.config);
        return Ok(());
    }

    for (index, job) in jobs.iter().enumerate() {
        println!("{}", format_job_line(index, job));
    }
    println!("\n{} job(s)", jobs.len());

    Ok(())
}

/// One listing line: index, label, source kind and path, destination.
fn format_job_line(index: usize, job: &Job) -> String {
    let kind = match &job.source {
        MediaSource::Local(_) => "file",
        MediaSource::Remote(_) => "url",
    };
    format!(
        "{:>3}. {:<24} [{kind}] {} -> {}",
        index + 1,
        job.label(),
        job.source_str(),
        job.destination.display()
    )
}
