//! Remote note service client
//!
//! The sync engine talks to the note service through the [`RemoteNoteService`]
//! trait; [`HttpNoteClient`] is the production implementation. Credentials are
//! an explicit object handed to the constructor, never ambient state.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Note, NoteId, NotePatch};
use crate::util::{is_http_url, normalize_text_option};

/// Bearer credentials for the remote note service
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    base_url: String,
    token: String,
}

impl ApiCredentials {
    /// Validate and normalize service credentials
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_text_option(Some(base_url.into())).ok_or_else(|| {
            ApiError::InvalidConfiguration("base URL must not be empty".to_string())
        })?;
        if !is_http_url(&base_url) {
            return Err(ApiError::InvalidConfiguration(
                "base URL must include http:// or https://".to_string(),
            ));
        }

        let token = normalize_text_option(Some(token.into())).ok_or_else(|| {
            ApiError::InvalidConfiguration("bearer token must not be empty".to_string())
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Service base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ApiCredentials")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Errors from the remote note service
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid client configuration
    #[error("Invalid client configuration: {0}")]
    InvalidConfiguration(String),
    /// Transport-level failure (connection, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The resource does not exist or is not owned by the caller
    #[error("resource not found")]
    NotFound,
    /// The service reported an application error
    #[error("{0}")]
    Api(String),
}

impl ApiError {
    /// Check for the not-found response the upload pass treats as terminal
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result alias for remote service calls
pub type ApiResult<T> = Result<T, ApiError>;

/// The server's view of a note
///
/// Same shape as [`Note`] minus the local-only `synced_at`; `version` is
/// authoritative here. JSON field names follow the service schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNote {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "isPinned", default)]
    pub pinned: bool,
    #[serde(rename = "isArchived", default)]
    pub archived: bool,
    pub version: i64,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<&Note> for RemoteNote {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            pinned: note.pinned,
            archived: note.archived,
            version: note.version,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Authenticated CRUD surface of the remote note service
///
/// Every call is a suspension point; implementations must be usable from
/// concurrent tasks.
#[async_trait]
pub trait RemoteNoteService: Send + Sync {
    /// `POST /notes` with a full note payload
    async fn create_note(&self, note: &RemoteNote) -> ApiResult<RemoteNote>;

    /// `PUT /notes/{id}` with a partial field diff
    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> ApiResult<RemoteNote>;

    /// `DELETE /notes/{id}`
    async fn delete_note(&self, id: &NoteId) -> ApiResult<()>;

    /// `GET /notes` returning the caller's full authoritative set
    async fn list_notes(&self) -> ApiResult<Vec<RemoteNote>>;
}

/// reqwest-backed implementation of [`RemoteNoteService`]
#[derive(Debug, Clone)]
pub struct HttpNoteClient {
    credentials: ApiCredentials,
    client: reqwest::Client,
}

impl HttpNoteClient {
    /// Create a client for the given service credentials
    pub fn new(credentials: ApiCredentials) -> ApiResult<Self> {
        Ok(Self {
            credentials,
            client: reqwest::Client::builder().build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.credentials.base_url)
    }

    async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api(parse_api_error(status, &body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteNoteService for HttpNoteClient {
    async fn create_note(&self, note: &RemoteNote) -> ApiResult<RemoteNote> {
        let response = self
            .client
            .post(self.url("/notes"))
            .bearer_auth(&self.credentials.token)
            .json(note)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> ApiResult<RemoteNote> {
        let response = self
            .client
            .put(self.url(&format!("/notes/{id}")))
            .bearer_auth(&self.credentials.token)
            .json(patch)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_note(&self, id: &NoteId) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/notes/{id}")))
            .bearer_auth(&self.credentials.token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn list_notes(&self) -> ApiResult<Vec<RemoteNote>> {
        let response = self
            .client
            .get(self.url("/notes"))
            .bearer_auth(&self.credentials.token)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Extract a readable message from an API error body, status appended
fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let message = payload
            .error
            .and_then(|detail| detail.message)
            .or(payload.message);
        if let Some(message) = message {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteDraft;

    #[test]
    fn credentials_reject_invalid_values() {
        assert!(ApiCredentials::new("", "token").is_err());
        assert!(ApiCredentials::new("api.example.com", "token").is_err());
        assert!(ApiCredentials::new("https://api.example.com", "  ").is_err());
    }

    #[test]
    fn credentials_strip_trailing_slash() {
        let credentials = ApiCredentials::new("https://api.example.com/", "token").unwrap();
        assert_eq!(credentials.base_url(), "https://api.example.com");
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let credentials = ApiCredentials::new("https://api.example.com", "secret").unwrap();
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn parse_api_error_prefers_nested_message() {
        let message = parse_api_error(
            StatusCode::FORBIDDEN,
            r#"{"error":{"message":"not your note"}}"#,
        );
        assert_eq!(message, "not your note (403)");
    }

    #[test]
    fn parse_api_error_falls_back_to_body_and_status() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream died"),
            "upstream died (502)"
        );
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "HTTP 500"
        );
    }

    #[test]
    fn remote_note_wire_field_names() {
        let note = Note::new(NoteDraft {
            title: "Wire".to_string(),
            content: "check".to_string(),
            tags: vec!["t".to_string()],
            pinned: true,
            archived: false,
        });
        let remote = RemoteNote::from(&note);

        let json = serde_json::to_string(&remote).unwrap();
        assert!(json.contains("\"isPinned\":true"));
        assert!(json.contains("\"isArchived\":false"));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("synced_at"));

        let parsed: RemoteNote = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, remote);
    }
}
