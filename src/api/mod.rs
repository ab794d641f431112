mod disposition;

use anyhow::Context;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use url::Url;
use uuid::Uuid;

use crate::models::*;
pub use disposition::{download_filename, DEFAULT_FILENAME};

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with `success: false`, with or without a message.
    #[error("{}", .0.as_deref().unwrap_or("Запрос отклонён сервером"))]
    Rejected(Option<String>),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl<T> Envelope<T> {
    /// `data` of a successful envelope, or the server's message.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected(
                self.message.filter(|m| !m.trim().is_empty()),
            ))
        }
    }
}

/// Decodes a response body as an envelope. Bodies that are not envelopes are
/// reported by HTTP status when the status is an error.
pub fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ApiError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(_) if !status.is_success() => Err(ApiError::Http {
            status: status.as_u16(),
            message: body.trim().to_string(),
        }),
        Err(e) => Err(ApiError::Decode(e)),
    }
}

fn require<T>(data: Option<T>) -> Result<T, ApiError> {
    data.ok_or(ApiError::Rejected(None))
}

/// A downloaded attachment.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CalendarClient {
    client: Client,
    base_url: Url,
}

impl CalendarClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid server URL: {base_url}"))?;
        // Relative joins replace the last segment unless the path ends in `/`.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("unical/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// `path` starts with `/` and is resolved under `<server_url>/api`.
    pub fn api_url(&self, path: &str) -> Result<Url, ApiError> {
        let full = format!("api{path}");
        self.base_url
            .join(&full)
            .with_context(|| format!("Bad API path: {path}"))
            .map_err(ApiError::Other)
    }

    /// JSON request returning the envelope's `data`.
    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ApiError> {
        let url = self.api_url(path)?;
        tracing::debug!(%method, %url, "api call");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        Self::read_envelope(resp).await
    }

    async fn read_envelope<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, ApiError> {
        let status = resp.status();
        let body = resp.text().await?;
        decode_envelope(status, &body)
    }

    // ── Events ──────────────────────────────────────────────────────────

    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let events = self
            .call::<(), Vec<Event>>(Method::GET, "/events", None)
            .await?;
        Ok(events.unwrap_or_default())
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<Event, ApiError> {
        require(self.call(Method::POST, "/events", Some(draft)).await?)
    }

    pub async fn update_event(&self, id: Uuid, draft: &EventDraft) -> Result<Event, ApiError> {
        require(
            self.call(Method::PUT, &format!("/events/{id}"), Some(draft))
                .await?,
        )
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<(), ApiError> {
        self.call::<(), serde_json::Value>(Method::DELETE, &format!("/events/{id}"), None)
            .await?;
        Ok(())
    }

    pub async fn event_details(&self, id: Uuid) -> Result<EventDetails, ApiError> {
        require(
            self.call::<(), _>(Method::GET, &format!("/events/{id}/details"), None)
                .await?,
        )
    }

    // ── Notes ───────────────────────────────────────────────────────────

    pub async fn list_notes(&self, event_id: Uuid) -> Result<Vec<EventNote>, ApiError> {
        let notes = self
            .call::<(), Vec<EventNote>>(Method::GET, &format!("/events/{event_id}/notes"), None)
            .await?;
        Ok(notes.unwrap_or_default())
    }

    pub async fn add_note(&self, event_id: Uuid, note: &NewNote) -> Result<(), ApiError> {
        self.call::<_, serde_json::Value>(
            Method::POST,
            &format!("/events/{event_id}/notes"),
            Some(note),
        )
        .await?;
        Ok(())
    }

    // ── Files ───────────────────────────────────────────────────────────

    /// Multipart upload with `file` and `uploaded_by` parts.
    pub async fn upload_file(
        &self,
        event_id: Uuid,
        file_path: &Path,
        uploaded_by: &str,
    ) -> Result<(), ApiError> {
        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let data = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("Cannot read '{}'", file_path.display()))?;
        let uploaded_by = match uploaded_by.trim() {
            "" => "Anonymous".to_string(),
            name => name.to_string(),
        };

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str(mime_from_ext(file_path))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("uploaded_by", uploaded_by);

        let url = self.api_url(&format!("/events/{event_id}/files"))?;
        tracing::debug!(%url, "uploading {}", file_path.display());
        let resp = self.client.post(url).multipart(form).send().await?;
        Self::read_envelope::<serde_json::Value>(resp).await?;
        Ok(())
    }

    pub async fn download_file(&self, file_id: Uuid) -> Result<Download, ApiError> {
        let url = self.api_url(&format!("/files/{file_id}/download"))?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        let filename = download_filename(resp.headers());
        let bytes = resp.bytes().await?.to_vec();
        Ok(Download { filename, bytes })
    }
}

fn mime_from_ext(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
        .unwrap_or("")
    {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
