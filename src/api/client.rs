use super::types::{
    ChatTurnResponse, CreateSessionRequest, ErrorBody, ImportResponse, Provider, RenameRequest,
    Session, SessionsResponse,
};
use crate::config::Settings;
use crate::error::ApiError;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// File payload attached to a chat turn or an import upload.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Thin client over the backend REST surface. Holds no session state of its
/// own; reconciliation lives in the controller.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ── Session directory ────────────────────────────────────────

    pub async fn list_sessions(&self) -> Result<SessionsResponse, ApiError> {
        let response = self.send(self.http.get(self.url("/sessions"))).await?;
        Self::decode(Self::check(response, None).await?).await
    }

    pub async fn get_session(&self, id: &str) -> Result<Session, ApiError> {
        let response = self
            .send(self.http.get(self.url(&format!("/sessions/{id}"))))
            .await?;
        Self::decode(Self::check(response, Some(id)).await?).await
    }

    pub async fn create_session(
        &self,
        title: &str,
        provider: Provider,
        model: &str,
    ) -> Result<Session, ApiError> {
        let body = CreateSessionRequest {
            title,
            provider,
            model,
        };
        let response = self
            .send(self.http.post(self.url("/sessions")).json(&body))
            .await?;
        Self::decode(Self::check(response, None).await?).await
    }

    pub async fn rename_session(&self, id: &str, title: &str) -> Result<Session, ApiError> {
        let response = self
            .send(
                self.http
                    .post(self.url(&format!("/sessions/{id}/rename")))
                    .json(&RenameRequest { title }),
            )
            .await?;
        Self::decode(Self::check(response, Some(id)).await?).await
    }

    pub async fn clear_session(&self, id: &str) -> Result<Session, ApiError> {
        let response = self
            .send(self.http.post(self.url(&format!("/sessions/{id}/clear"))))
            .await?;
        Self::decode(Self::check(response, Some(id)).await?).await
    }

    /// Legacy session-less transcript clear (`POST /clear`), kept for
    /// backends that predate the session directory.
    pub async fn clear_transcript(&self) -> Result<(), ApiError> {
        let response = self.send(self.http.post(self.url("/clear"))).await?;
        Self::check(response, None).await?;
        Ok(())
    }

    // ── Export / import ──────────────────────────────────────────

    pub async fn export_session(&self, id: &str) -> Result<serde_json::Value, ApiError> {
        let response = self
            .send(self.http.get(self.url(&format!("/sessions/{id}/export"))))
            .await?;
        Self::decode(Self::check(response, Some(id)).await?).await
    }

    pub async fn export_all(&self) -> Result<serde_json::Value, ApiError> {
        let response = self
            .send(self.http.get(self.url("/sessions/export")))
            .await?;
        Self::decode(Self::check(response, None).await?).await
    }

    pub async fn import_sessions(&self, file: FilePayload) -> Result<ImportResponse, ApiError> {
        let part = Part::bytes(file.bytes).file_name(file.name);
        let form = Form::new().part("file", part);
        let response = self
            .send(self.http.post(self.url("/sessions/import")).multipart(form))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Self::decode(response).await;
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            message: body.error.unwrap_or_else(|| "Import failed.".to_string()),
        })
    }

    // ── Chat turn ────────────────────────────────────────────────

    /// One `/chat` turn: multipart form carrying the session id, message,
    /// optional attachment and the full generation parameter set.
    pub async fn send_chat(
        &self,
        session_id: &str,
        message: &str,
        file: Option<FilePayload>,
        settings: &Settings,
    ) -> Result<ChatTurnResponse, ApiError> {
        let mut form = Form::new()
            .text("session_id", session_id.to_string())
            .text("message", message.to_string())
            .text("provider", settings.provider.to_string())
            .text("model", settings.model.clone())
            .text(
                "openai_base_url",
                settings.openai_base_url.clone().unwrap_or_default(),
            )
            .text("temperature", settings.temperature.to_string())
            .text("top_p", settings.top_p.to_string())
            .text("top_k", settings.top_k.to_string())
            .text("max_tokens", settings.max_tokens.to_string());

        if let Some(payload) = file {
            form = form.part("file", Part::bytes(payload.bytes).file_name(payload.name));
        }

        debug!(session_id, "sending chat turn");
        let response = self
            .send(self.http.post(self.url("/chat")).multipart(form))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Self::decode(response).await;
        }

        // /chat reports errors through `reply` rather than `error`.
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            message: body
                .reply
                .or(body.error)
                .unwrap_or_else(|| "Request failed.".to_string()),
        })
    }

    // ── Internals ────────────────────────────────────────────────

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        builder
            .send()
            .await
            .map_err(|error| ApiError::from_transport(&error))
    }

    async fn check(response: Response, id: Option<&str>) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND
            && let Some(id) = id
        {
            return Err(ApiError::NotFound { id: id.to_string() });
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            message: body
                .error
                .or(body.reply)
                .unwrap_or_else(|| "Request failed.".to_string()),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|error| ApiError::MalformedResponse(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn strips_trailing_slash() {
        let client = ApiClient::new("http://example.com/");
        assert_eq!(client.base_url(), "http://example.com");
    }

    #[tokio::test]
    async fn list_sessions_decodes_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sessions": [{"id": "s1", "title": "First", "message_count": 3}],
                "active_session_id": "s1"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let directory = client.list_sessions().await.unwrap();
        assert_eq!(directory.sessions.len(), 1);
        assert_eq!(directory.sessions[0].message_count, 3);
        assert_eq!(directory.active_session_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn get_session_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "Session not found."})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let error = client.get_session("missing").await.unwrap_err();
        assert!(matches!(error, ApiError::NotFound { ref id } if id == "missing"));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let error = client.list_sessions().await.unwrap_err();
        assert!(matches!(error, ApiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        // Port 1 is never listening.
        let client = ApiClient::new("http://127.0.0.1:1");
        let error = client.list_sessions().await.unwrap_err();
        assert!(matches!(error, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn chat_error_uses_reply_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"reply": "Unknown provider selected."})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let settings = crate::config::Settings::default();
        let error = client
            .send_chat("s1", "hello", None, &settings)
            .await
            .unwrap_err();
        assert!(
            matches!(error, ApiError::Server { status: 400, ref message }
                if message == "Unknown provider selected.")
        );
    }
}
