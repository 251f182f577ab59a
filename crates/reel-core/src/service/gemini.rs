//! Gemini extraction service client.
//!
//! Talks to the Files API (resumable upload + status polls) and the
//! `generateContent` endpoint. The credential is threaded in at
//! construction — this module never reads the process environment.

use super::{
    mime_type_for, ExtractionService, GenerateOutcome, InlinePart, MediaHandle, MediaRef,
    MediaState,
};
use crate::error::JobError;
use crate::service::retry::is_overload_message;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gemini service client over the Files + generateContent APIs.
pub struct GeminiService {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiService {
    /// Create a client against the given base endpoint
    /// (e.g. "https://generativelanguage.googleapis.com").
    pub fn new(api_key: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    FileData(FileData),
    Text(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    file_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

#[derive(Serialize)]
struct UploadStart<'a> {
    file: UploadMeta<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMeta<'a> {
    display_name: &'a str,
}

// --- Response types ---

#[derive(Deserialize)]
struct FileEnvelope {
    file: FileInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    name: String,
    uri: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Map a non-success HTTP status to the per-job error taxonomy.
///
/// 429 and 5xx mean overload/unavailability and are transient; so is any
/// body that says "overloaded"/"unavailable". Everything else is terminal.
fn status_error(status: u16, body: &str) -> JobError {
    let message = format!("HTTP {status}: {body}");
    if status == 429 || (500..=599).contains(&status) || is_overload_message(body) {
        JobError::Transient {
            message,
            status_code: Some(status),
        }
    } else {
        JobError::Service {
            message,
            status_code: Some(status),
        }
    }
}

/// Parse a generateContent response body into the tagged outcome.
///
/// Content-policy refusals surface as `SafetyRejected`; a body the parser
/// cannot make sense of is a terminal `Service` error.
fn parse_generate_response(body: &str) -> Result<GenerateOutcome, JobError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| JobError::Service {
            message: format!("Failed to parse generateContent response: {e}"),
            status_code: None,
        })?;

    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(JobError::SafetyRejected {
                reason: reason.clone(),
            });
        }
    }

    let mut texts = Vec::new();
    let mut inline = Vec::new();
    for candidate in &response.candidates {
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(JobError::SafetyRejected {
                reason: "SAFETY".to_string(),
            });
        }
        let Some(content) = &candidate.content else {
            continue;
        };
        for part in &content.parts {
            if let Some(text) = &part.text {
                texts.push(text.clone());
            }
            if let Some(data) = &part.inline_data {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(&data.data)
                    .map_err(|e| JobError::Service {
                        message: format!("Invalid inline media payload: {e}"),
                        status_code: None,
                    })?;
                inline.push(InlinePart {
                    mime_type: data.mime_type.clone(),
                    data: bytes,
                });
            }
        }
    }

    if !texts.is_empty() {
        Ok(GenerateOutcome::Text(texts))
    } else if !inline.is_empty() {
        Ok(GenerateOutcome::InlineMedia(inline))
    } else {
        Ok(GenerateOutcome::Empty)
    }
}

#[async_trait]
impl ExtractionService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn upload(&self, path: &Path) -> Result<MediaHandle, JobError> {
        let upload_failed = |message: String| JobError::UploadFailed {
            path: path.to_path_buf(),
            message,
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| upload_failed(format!("failed to read file: {e}")))?;
        let mime_type = mime_type_for(path);
        let display_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::debug!("Uploading {:?} ({} bytes, {mime_type})", path, bytes.len());

        // Start a resumable upload session
        let start = self
            .client
            .post(format!(
                "{}/upload/v1beta/files?key={}",
                self.endpoint, self.api_key
            ))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStart {
                file: UploadMeta {
                    display_name: &display_name,
                },
            })
            .send()
            .await
            .map_err(|e| upload_failed(format!("upload start failed: {e}")))?;

        let status = start.status();
        if !status.is_success() {
            let body = start.text().await.unwrap_or_default();
            return Err(upload_failed(format!("HTTP {status}: {body}")));
        }
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| upload_failed("missing upload session URL".to_string()))?;

        // Send the bytes and finalize in one shot
        let finish = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(bytes)
            .send()
            .await
            .map_err(|e| upload_failed(format!("upload failed: {e}")))?;

        let status = finish.status();
        if !status.is_success() {
            let body = finish.text().await.unwrap_or_default();
            return Err(upload_failed(format!("HTTP {status}: {body}")));
        }
        let envelope: FileEnvelope = finish
            .json()
            .await
            .map_err(|e| upload_failed(format!("failed to parse upload response: {e}")))?;

        Ok(MediaHandle {
            name: envelope.file.name,
            uri: envelope.file.uri,
            mime_type: mime_type.to_string(),
        })
    }

    async fn poll_status(&self, handle: &MediaHandle) -> Result<MediaState, JobError> {
        let resp = self
            .client
            .get(format!(
                "{}/v1beta/{}?key={}",
                self.endpoint, handle.name, self.api_key
            ))
            .send()
            .await
            .map_err(|e| JobError::Service {
                message: format!("file status request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }
        let info: FileInfo = resp.json().await.map_err(|e| JobError::Service {
            message: format!("failed to parse file status: {e}"),
            status_code: None,
        })?;

        Ok(match info.state.as_deref() {
            Some("ACTIVE") => MediaState::Active,
            Some("FAILED") => MediaState::Failed,
            _ => MediaState::Pending,
        })
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        media: &MediaRef,
    ) -> Result<GenerateOutcome, JobError> {
        let file_data = match media {
            MediaRef::Uploaded { uri, mime_type } => FileData {
                file_uri: uri.clone(),
                mime_type: Some(mime_type.clone()),
            },
            MediaRef::External { url } => FileData {
                file_uri: url.clone(),
                mime_type: None,
            },
        };
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::FileData(file_data),
                    RequestPart::Text(prompt.to_string()),
                ],
            }],
        };

        let resp = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent?key={}",
                self.endpoint, model, self.api_key
            ))
            .json(&body)
            .send()
            .await
            // A service we cannot reach is unavailable — eligible for retry
            .map_err(|e| JobError::Transient {
                message: format!("generateContent request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| JobError::Service {
            message: format!("failed to read generateContent response: {e}"),
            status_code: Some(status.as_u16()),
        })?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        parse_generate_response(&text)
    }
}
