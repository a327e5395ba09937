use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chatterm`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Backend API ─────────────────────────────────────────────────────
    #[error("api: {0}")]
    Api(#[from] ApiError),

    // ── Request orchestration ───────────────────────────────────────────
    #[error("a chat turn is already in flight")]
    TurnInFlight,

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Backend API errors ─────────────────────────────────────────────────────

/// Taxonomy for failures talking to the chat backend.
///
/// `Network` covers transport/connection failures, `MalformedResponse` any
/// body that is not the JSON shape we expect, `NotFound` a session id the
/// backend does not know, and `Server` everything else the backend rejects
/// with a message of its own.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("connection error: {0}")]
    Network(String),

    #[error("invalid server response: {0}")]
    MalformedResponse(String),

    #[error("session {id} not found")]
    NotFound { id: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    /// Map a reqwest failure onto the taxonomy. Decode errors are malformed
    /// responses; everything else on the wire is a network failure.
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_decode() {
            Self::MalformedResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }

    /// Text shown inside a synthetic assistant-role message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(detail) => format!("Connection error: {detail}"),
            Self::MalformedResponse(_) => "Invalid server response.".to_string(),
            Self::NotFound { id } => format!("Session {id} not found."),
            Self::Server { message, .. } => message.clone(),
        }
    }
}
