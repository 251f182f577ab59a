//! Sequential extraction runner.
//!
//! One job at a time, in config order: resolve the media handle, render the
//! prompt, submit through the retry wrapper, persist the text. A failed job
//! is recorded and the batch moves on; only the inter-job throttle, the
//! upload poll loop, and retry backoff ever suspend the runner.

use crate::config::{Config, TemplateConfig};
use crate::error::{JobError, JobResult};
use crate::job::{Job, JobOutcome, MediaSource, RunReport};
use crate::service::retry::{submit_with_retry, RetryPolicy};
use crate::service::{ExtractionService, GenerateOutcome, MediaRef, MediaState};
use crate::{output, template};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The inter-job rate-limit pause is applied between jobs only — the final
/// job is never followed by a pause.
pub const SLEEP_AFTER_FINAL_JOB: bool = false;

/// Runner settings resolved from `Config`.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Model identifier for generation requests
    pub model: String,
    /// Pause between jobs
    pub rate_limit_delay: Duration,
    /// Interval between upload-readiness polls
    pub upload_poll_interval: Duration,
    /// Upper bound on the total upload-readiness wait
    pub upload_timeout: Duration,
    /// Retry policy for the generation call
    pub retry: RetryPolicy,
    /// Prompt and output-format templates
    pub templates: TemplateConfig,
    /// Prepend a metadata header to written files
    pub front_matter: bool,
}

impl RunnerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.extraction.model.clone(),
            rate_limit_delay: Duration::from_secs(config.extraction.rate_limit_delay_secs),
            upload_poll_interval: Duration::from_secs(config.extraction.upload_poll_interval_secs),
            upload_timeout: Duration::from_secs(config.extraction.upload_timeout_secs),
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                base_delay: Duration::from_secs(config.retry.base_delay_secs),
            },
            templates: config.templates.clone(),
            front_matter: config.output.front_matter,
        }
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Sequential extraction runner over a remote service.
pub struct Runner {
    service: Arc<dyn ExtractionService>,
    options: RunnerOptions,
}

impl Runner {
    pub fn new(service: Arc<dyn ExtractionService>, options: RunnerOptions) -> Self {
        Self { service, options }
    }

    /// Execute jobs strictly in order, calling `on_result` after each one.
    ///
    /// Per-job failures are recorded in the report and never abort the
    /// batch. The rate-limit pause runs between jobs (see
    /// [`SLEEP_AFTER_FINAL_JOB`]).
    pub async fn run<F>(&self, jobs: &[Job], on_result: F) -> RunReport
    where
        F: Fn(&JobOutcome),
    {
        let mut report = RunReport::default();

        for (index, job) in jobs.iter().enumerate() {
            tracing::info!("[{}/{}] Processing {}", index + 1, jobs.len(), job.label());

            let result = self.run_job(job).await;
            match &result {
                Ok(destination) => {
                    tracing::info!(job = %job.label(), "Extracted to {:?}", destination)
                }
                Err(error) => tracing::error!(job = %job.label(), "Job failed: {error}"),
            }

            let outcome = JobOutcome {
                job: job.clone(),
                result,
            };
            on_result(&outcome);
            report.outcomes.push(outcome);

            let is_last = index + 1 == jobs.len();
            if (!is_last || SLEEP_AFTER_FINAL_JOB) && !self.options.rate_limit_delay.is_zero() {
                tracing::debug!("Rate-limit pause: {:?}", self.options.rate_limit_delay);
                tokio::time::sleep(self.options.rate_limit_delay).await;
            }
        }

        report
    }

    /// Run one job end to end, returning the written destination.
    pub async fn run_job(&self, job: &Job) -> JobResult<PathBuf> {
        let media = self.resolve_media(job).await?;
        let prompt = self.render_prompt(job);

        let outcome = submit_with_retry(
            self.service.as_ref(),
            &self.options.model,
            &prompt,
            &media,
            &self.options.retry,
        )
        .await?;

        let text = match outcome {
            GenerateOutcome::Text(segments) => segments.join("\n"),
            GenerateOutcome::InlineMedia(_) | GenerateOutcome::Empty => {
                return Err(JobError::EmptyResult);
            }
        };
        // Segments that join to nothing but whitespace carry no extractable
        // text either
        if text.trim().is_empty() {
            return Err(JobError::EmptyResult);
        }

        output::write_markdown(job, &text, self.options.front_matter).await?;
        Ok(job.destination.clone())
    }

    /// Acquire the media reference for a job.
    ///
    /// Remote URLs pass straight through. Local files are uploaded, then
    /// polled on a fixed interval until active, bounded by
    /// `upload_timeout`.
    async fn resolve_media(&self, job: &Job) -> JobResult<MediaRef> {
        let path = match &job.source {
            MediaSource::Remote(url) => {
                return Ok(MediaRef::External { url: url.clone() });
            }
            MediaSource::Local(path) => path,
        };

        let handle = self.service.upload(path).await?;
        tracing::debug!("Uploaded {:?} as {}", path, handle.name);

        let started = Instant::now();
        loop {
            match self.service.poll_status(&handle).await? {
                MediaState::Active => return Ok(handle.media_ref()),
                MediaState::Failed => {
                    return Err(JobError::UploadFailed {
                        path: path.clone(),
                        message: "remote processing failed".to_string(),
                    });
                }
                MediaState::Pending => {}
            }
            if started.elapsed() >= self.options.upload_timeout {
                return Err(JobError::MediaTimeout {
                    path: path.clone(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(self.options.upload_poll_interval).await;
        }
    }

    fn render_prompt(&self, job: &Job) -> String {
        let templates = &self.options.templates;
        template::render(
            &templates.prompt,
            &[
                ("title", job.title.as_str()),
                ("section", job.section.as_str()),
                ("course_context", templates.course_context.as_str()),
                ("output_format", templates.output_format.as_str()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{InlinePart, MediaHandle};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    type GenerateFn = Box<dyn Fn(u32) -> JobResult<GenerateOutcome> + Send + Sync>;
    type PollFn = Box<dyn Fn(u32) -> JobResult<MediaState> + Send + Sync>;

    /// Configurable mock service. The factories receive the per-method call
    /// index so tests can vary behavior across attempts.
    struct MockService {
        generate_fn: GenerateFn,
        poll_fn: PollFn,
        upload_calls: Arc<AtomicU32>,
        poll_calls: Arc<AtomicU32>,
        generate_calls: Arc<AtomicU32>,
    }

    impl MockService {
        fn new(generate_fn: GenerateFn) -> Self {
            Self {
                generate_fn,
                poll_fn: Box::new(|_| Ok(MediaState::Active)),
                upload_calls: Arc::new(AtomicU32::new(0)),
                poll_calls: Arc::new(AtomicU32::new(0)),
                generate_calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn text(segments: &[&str]) -> Self {
            let segments: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
            Self::new(Box::new(move |_| {
                Ok(GenerateOutcome::Text(segments.clone()))
            }))
        }

        fn with_poll(mut self, poll_fn: PollFn) -> Self {
            self.poll_fn = poll_fn;
            self
        }

        fn counters(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>, Arc<AtomicU32>) {
            (
                self.upload_calls.clone(),
                self.poll_calls.clone(),
                self.generate_calls.clone(),
            )
        }
    }

    #[async_trait]
    impl ExtractionService for MockService {
        fn name(&self) -> &str {
            "mock"
        }

        async fn upload(&self, path: &Path) -> JobResult<MediaHandle> {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            Ok(MediaHandle {
                name: "files/mock".to_string(),
                uri: format!("mock://{}", path.display()),
                mime_type: "video/mp4".to_string(),
            })
        }

        async fn poll_status(&self, _handle: &MediaHandle) -> JobResult<MediaState> {
            let idx = self.poll_calls.fetch_add(1, Ordering::SeqCst);
            (self.poll_fn)(idx)
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _media: &MediaRef,
        ) -> JobResult<GenerateOutcome> {
            let idx = self.generate_calls.fetch_add(1, Ordering::SeqCst);
            (self.generate_fn)(idx)
        }
    }

    fn fast_options() -> RunnerOptions {
        RunnerOptions {
            rate_limit_delay: Duration::from_millis(0),
            upload_poll_interval: Duration::from_millis(5),
            upload_timeout: Duration::from_millis(200),
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(20),
            },
            ..RunnerOptions::default()
        }
    }

    fn local_job(dir: &Path, name: &str) -> Job {
        Job {
            id: Some(name.to_string()),
            source: MediaSource::Local(PathBuf::from(format!("videos/{name}.mp4"))),
            destination: dir.join(format!("{name}.md")),
            title: name.to_string(),
            section: "Module 1".to_string(),
        }
    }

    fn remote_job(dir: &Path, name: &str) -> Job {
        Job {
            id: Some(name.to_string()),
            source: MediaSource::Remote(format!("https://youtu.be/{name}")),
            destination: dir.join(format!("{name}.md")),
            title: name.to_string(),
            section: "Module 1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_joins_segments_with_single_newline() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::text(&["A", "B"]);
        let runner = Runner::new(Arc::new(service), fast_options());
        let jobs = vec![remote_job(dir.path(), "clip")];

        let report = runner.run(&jobs, |_| {}).await;
        assert_eq!(report.succeeded(), 1);
        let content = std::fs::read_to_string(dir.path().join("clip.md")).unwrap();
        assert_eq!(content, "A\nB");
    }

    #[tokio::test]
    async fn test_remote_source_skips_upload_and_poll() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::text(&["ok"]);
        let (uploads, polls, generates) = service.counters();
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "clip")], |_| {}).await;
        assert_eq!(report.succeeded(), 1);
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert_eq!(generates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_local_source_uploads_and_polls_until_active() {
        let dir = tempfile::tempdir().unwrap();
        // Two pending polls before the upload turns active
        let service = MockService::text(&["ok"]).with_poll(Box::new(|idx| {
            Ok(if idx < 2 {
                MediaState::Pending
            } else {
                MediaState::Active
            })
        }));
        let (uploads, polls, _) = service.counters();
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[local_job(dir.path(), "clip")], |_| {}).await;
        assert_eq!(report.succeeded(), 1);
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_media_timeout_is_terminal_for_the_job_only() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            MockService::text(&["ok"]).with_poll(Box::new(|_| Ok(MediaState::Pending)));
        let mut options = fast_options();
        options.upload_timeout = Duration::from_millis(30);
        let runner = Runner::new(Arc::new(service), options);

        // First job stalls in upload processing; second is remote and succeeds
        let jobs = vec![local_job(dir.path(), "stuck"), remote_job(dir.path(), "ok")];
        let report = runner.run(&jobs, |_| {}).await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::MediaTimeout { .. })
        ));
        assert!(dir.path().join("ok.md").exists());
        assert!(!dir.path().join("stuck.md").exists());
    }

    #[tokio::test]
    async fn test_failed_remote_processing_is_upload_failure() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::text(&["ok"]).with_poll(Box::new(|_| Ok(MediaState::Failed)));
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[local_job(dir.path(), "bad")], |_| {}).await;
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::UploadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_failures_retried_then_terminal() {
        let dir = tempfile::tempdir().unwrap();
        // The first job's three attempts all fail transiently; the next
        // job's single attempt succeeds
        let service = MockService::new(Box::new(|idx| {
            if idx < 3 {
                Err(JobError::Transient {
                    message: "HTTP 503: overloaded".to_string(),
                    status_code: Some(503),
                })
            } else {
                Ok(GenerateOutcome::Text(vec!["ok".to_string()]))
            }
        }));
        let (_, _, generates) = service.counters();
        let runner = Runner::new(Arc::new(service), fast_options());

        let start = Instant::now();
        let jobs = vec![remote_job(dir.path(), "flaky"), remote_job(dir.path(), "fine")];
        let report = runner.run(&jobs, |_| {}).await;

        // max_attempts = 3: one initial call plus exactly two retries,
        // then one call for the second job
        assert_eq!(generates.load(Ordering::SeqCst), 4);
        // Backoff of 20ms then 40ms before the second and third attempts
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::Transient { .. })
        ));
        assert!(!dir.path().join("flaky.md").exists());
        // Retry exhaustion is terminal for the job, not the batch
        assert!(report.outcomes[1].succeeded());
        assert!(dir.path().join("fine.md").exists());
    }

    #[tokio::test]
    async fn test_transient_failure_then_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::new(Box::new(|idx| {
            if idx == 0 {
                Err(JobError::Transient {
                    message: "HTTP 429: rate limited".to_string(),
                    status_code: Some(429),
                })
            } else {
                Ok(GenerateOutcome::Text(vec!["recovered".to_string()]))
            }
        }));
        let (_, _, generates) = service.counters();
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "clip")], |_| {}).await;
        assert_eq!(report.succeeded(), 1);
        assert_eq!(generates.load(Ordering::SeqCst), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("clip.md")).unwrap(),
            "recovered"
        );
    }

    #[tokio::test]
    async fn test_safety_rejection_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::new(Box::new(|_| {
            Err(JobError::SafetyRejected {
                reason: "PROHIBITED_CONTENT".to_string(),
            })
        }));
        let (_, _, generates) = service.counters();
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "clip")], |_| {}).await;
        assert_eq!(generates.load(Ordering::SeqCst), 1);
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::SafetyRejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_outcome_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::new(Box::new(|_| Ok(GenerateOutcome::Empty)));
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "silent")], |_| {}).await;
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::EmptyResult)
        ));
        assert!(!dir.path().join("silent.md").exists());
    }

    #[tokio::test]
    async fn test_all_empty_segments_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        // A response can carry text parts that are all empty strings
        let service = MockService::text(&[""]);
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "blank")], |_| {}).await;
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::EmptyResult)
        ));
        assert!(!dir.path().join("blank.md").exists());
    }

    #[tokio::test]
    async fn test_whitespace_only_segments_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::text(&["  ", "\n"]);
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "blank")], |_| {}).await;
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::EmptyResult)
        ));
        assert!(!dir.path().join("blank.md").exists());
    }

    #[tokio::test]
    async fn test_inline_media_outcome_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::new(Box::new(|_| {
            Ok(GenerateOutcome::InlineMedia(vec![InlinePart {
                mime_type: "image/png".to_string(),
                data: vec![1, 2, 3],
            }]))
        }));
        let runner = Runner::new(Arc::new(service), fast_options());

        let report = runner.run(&[remote_job(dir.path(), "pic")], |_| {}).await;
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobError::EmptyResult)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rate_limit_pause_between_jobs_not_after_last() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::text(&["ok"]);
        let mut options = fast_options();
        options.rate_limit_delay = Duration::from_millis(250);
        let runner = Runner::new(Arc::new(service), options);

        let jobs = vec![
            remote_job(dir.path(), "a"),
            remote_job(dir.path(), "b"),
            remote_job(dir.path(), "c"),
        ];
        let start = Instant::now();
        let report = runner.run(&jobs, |_| {}).await;
        let elapsed = start.elapsed();

        assert_eq!(report.succeeded(), 3);
        // Two inter-job pauses, none after the final job
        assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(750), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_run_reports_every_outcome_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockService::new(Box::new(|idx| {
            if idx == 1 {
                Err(JobError::Service {
                    message: "HTTP 400: bad request".to_string(),
                    status_code: Some(400),
                })
            } else {
                Ok(GenerateOutcome::Text(vec!["ok".to_string()]))
            }
        }));
        let runner = Runner::new(Arc::new(service), fast_options());

        let jobs = vec![
            remote_job(dir.path(), "a"),
            remote_job(dir.path(), "b"),
            remote_job(dir.path(), "c"),
        ];
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let report = runner
            .run(&jobs, move |outcome| {
                seen_clone.lock().unwrap().push(outcome.job.label());
            })
            .await;

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.outcomes[1].error_kind(), Some("service"));
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
        // The failed job left no file behind
        assert!(dir.path().join("a.md").exists());
        assert!(!dir.path().join("b.md").exists());
        assert!(dir.path().join("c.md").exists());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let job = remote_job(dir.path(), "clip");
        std::fs::write(&job.destination, "stale output from an earlier run").unwrap();

        let service = MockService::text(&["fresh"]);
        let runner = Runner::new(Arc::new(service), fast_options());
        let report = runner.run(std::slice::from_ref(&job), |_| {}).await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(
            std::fs::read_to_string(&job.destination).unwrap(),
            "fresh"
        );
    }

    #[test]
    fn test_render_prompt_substitutes_job_fields() {
        let mut options = RunnerOptions::default();
        options.templates.prompt = "{title} / {section} / {missing}".to_string();
        let runner = Runner::new(Arc::new(MockService::text(&["x"])), options);
        let job = Job {
            id: None,
            source: MediaSource::Remote("https://youtu.be/abc".to_string()),
            destination: PathBuf::from("out.md"),
            title: "Intro".to_string(),
            section: "Module 1".to_string(),
        };
        assert_eq!(runner.render_prompt(&job), "Intro / Module 1 / {missing}");
    }
}
