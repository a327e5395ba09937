use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Core wire model ──────────────────────────────────────────────

/// Chat provider the backend routes a turn to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
    #[default]
    Google,
    Openai,
    Anthropic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Client-side delivery marker for optimistically rendered messages.
///
/// Never serialized: the backend owns confirmed history, this only tracks the
/// gap between an optimistic append and the turn settling. A `Failed` message
/// stays visible but is rendered distinctly instead of silently looking sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    #[default]
    Confirmed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    pub prompt: Option<u64>,
    pub output: Option<u64>,
    pub total: Option<u64>,
}

/// One entry in a session transcript. Immutable once confirmed; insertion
/// order is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    #[serde(skip)]
    pub delivery: Delivery,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, file: Option<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            file,
            tokens: None,
            delivery: Delivery::Pending,
        }
    }

    pub fn assistant(content: impl Into<String>, tokens: Option<TokenUsage>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            file: None,
            tokens,
            delivery: Delivery::Confirmed,
        }
    }
}

/// Full session as returned by `GET /sessions/{id}`, `POST /sessions`,
/// rename/clear and inside a `/chat` response. Server-owned; the client only
/// ever holds a cached copy and replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Directory entry: everything the sidebar needs, without the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub message_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            provider: session.provider,
            model: session.model.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            message_count: session.messages.len(),
        }
    }
}

// ── Request / response envelopes ─────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest<'a> {
    pub title: &'a str,
    pub provider: Provider,
    pub model: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RenameRequest<'a> {
    pub title: &'a str,
}

/// `GET /sessions` envelope. `active_session_id` is the backend's hint, only
/// adopted when the client has no active session of its own yet.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub active_session_id: Option<String>,
}

/// `POST /sessions/import` success envelope: the full replacement directory
/// plus the ids that were just imported. Failures carry an `ErrorBody`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub imported: Vec<String>,
}

/// `POST /chat` envelope. A well-formed success carries either a full
/// `session` (authoritative replacement) or a plain `reply`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChatTurnResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
    #[serde(default)]
    pub file_preview: Option<String>,
}

/// Error body most endpoints return alongside a non-2xx status. `/chat` uses
/// `reply` for the same purpose.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
}
