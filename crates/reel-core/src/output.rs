//! Markdown persistence for extraction results.
//!
//! Files are written only after a fully successful extraction — a failed
//! job never leaves a partial file behind. An existing file at the
//! destination is overwritten without prompting.

use crate::error::JobResult;
use crate::job::{Job, MediaSource};

/// Write the extracted text to the job's destination.
///
/// Creates parent directories as needed. With `front_matter` the text is
/// preceded by a metadata header; without it the file holds the extracted
/// text byte-for-byte.
pub async fn write_markdown(job: &Job, text: &str, front_matter: bool) -> JobResult<()> {
    if let Some(parent) = job.destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    if front_matter {
        let content = format!("{}\n\n{}", front_matter_header(job), text);
        tokio::fs::write(&job.destination, content).await?;
    } else {
        tokio::fs::write(&job.destination, text).await?;
    }
    tracing::info!("Wrote {:?}", job.destination);
    Ok(())
}

/// Markdown metadata header: title, section, extraction date, and source.
fn front_matter_header(job: &Job) -> String {
    let (source_label, source) = match &job.source {
        MediaSource::Local(path) => ("Video File", path.display().to_string()),
        MediaSource::Remote(url) => ("Source URL", url.clone()),
    };
    let title = if job.title.is_empty() {
        "Untitled"
    } else {
        &job.title
    };
    format!(
        "# {title}\n\n**Section:** {section}\n**Extracted:** {date}\n**{source_label}:** {source}\n\n---",
        section = job.section,
        date = chrono::Local::now().format("%Y-%m-%d"),
    )
}
