//! The `reel run` command: execute the configured extraction batch.

use clap::Args;
use reel_core::{Config, ConfigError, GeminiService, RunReport, Runner, RunnerOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Environment variable holding the service credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "reel.toml")]
    pub config: PathBuf,

    /// Job identifiers to restrict the run to (id, path, or URL);
    /// all configured jobs run when omitted
    #[arg(value_name = "JOB")]
    pub jobs: Vec<String>,

    /// API key for the extraction service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Execute the run command.
///
/// Configuration and credential failures abort with a non-zero exit before
/// any job runs. Per-job failures are handled inside the runner, so a run
/// that completes — even with failed jobs — exits 0.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let config = Config::load_from(&args.config)?;
    let api_key = resolve_api_key(args.api_key.clone())?;

    let jobs = config.select_jobs(&args.jobs)?;
    if jobs.is_empty() {
        tracing::warn!("No jobs to process");
        return Ok(());
    }
    tracing::info!(
        "Processing {} job(s) with model {}",
        jobs.len(),
        config.extraction.model
    );

    let service = Arc::new(GeminiService::new(&api_key, &config.extraction.endpoint));
    let runner = Runner::new(service, RunnerOptions::from_config(&config));

    let progress = create_progress_bar(jobs.len() as u64);
    let start = Instant::now();

    let pb = progress.clone();
    let report = runner
        .run(&jobs, move |outcome| {
            pb.inc(1);
            pb.set_message(outcome.job.label());
        })
        .await;

    progress.finish_and_clear();
    print_summary(&report, start.elapsed());

    Ok(())
}

/// The credential must be present before any job runs.
fn resolve_api_key(flag: Option<String>) -> Result<String, ConfigError> {
    flag.filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(API_KEY_ENV.to_string()))
}

/// Create a progress bar for the batch loop.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the batch.
fn print_summary(report: &RunReport, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", report.succeeded());
    if report.failed() > 0 {
        eprintln!("    Failed:       {:>8}", report.failed());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", report.total());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");

    if report.failed() > 0 {
        eprintln!();
        eprintln!("  Failed jobs:");
        for outcome in report.failures() {
            eprintln!(
                "    - {} ({})",
                outcome.job.label(),
                outcome.error_kind().unwrap_or("unknown")
            );
        }
    }
}
