use crate::api::{
    ApiClient, ChatMessage, Delivery, FilePayload, Session, SessionSummary,
};
use crate::config::Settings;
use crate::error::{ApiError, ChatError};
use crate::state::ClientState;
use tracing::{debug, warn};

/// Rendering collaborator. Only invoked after state settles; never mutates
/// state itself.
pub trait Renderer {
    /// Session directory changed.
    fn sessions(&mut self, sessions: &[SessionSummary], active: Option<&str>);
    /// Active transcript replaced wholesale.
    fn transcript(&mut self, messages: &[ChatMessage]);
    /// One message appended to the current transcript view.
    fn append(&mut self, message: &ChatMessage);
    /// Out-of-band status line.
    fn notice(&mut self, text: &str);
    /// Hand an export blob over for download.
    fn export(&mut self, filename: &str, payload: &serde_json::Value) -> anyhow::Result<()>;
}

/// Everything the UI layer can ask of the controller.
#[derive(Debug)]
pub enum UiAction {
    Refresh,
    Select { id: String },
    NewSession,
    Rename { title: String },
    Clear,
    ExportActive,
    ExportAll,
    Import { file: FilePayload },
    SendTurn { message: String, file: Option<FilePayload> },
}

/// Owns the client state and drives every mutation in response to a
/// `UiAction` or a settled network response. Backend failures are converted
/// into user-visible output here; only the turn-in-flight rejection escapes
/// as an error.
pub struct ChatController<R: Renderer> {
    api: ApiClient,
    settings: Settings,
    state: ClientState,
    renderer: R,
    turn_in_flight: bool,
}

impl<R: Renderer> ChatController<R> {
    pub fn new(api: ApiClient, settings: Settings, renderer: R) -> Self {
        Self {
            api,
            settings,
            state: ClientState::new(),
            renderer,
            turn_in_flight: false,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn turn_in_flight(&self) -> bool {
        self.turn_in_flight
    }

    pub async fn dispatch(&mut self, action: UiAction) -> Result<(), ChatError> {
        match action {
            UiAction::Refresh => self.refresh().await,
            UiAction::Select { id } => self.select(&id).await,
            UiAction::NewSession => self.new_session().await,
            UiAction::Rename { title } => self.rename(&title).await,
            UiAction::Clear => self.clear().await,
            UiAction::ExportActive => self.export_active().await,
            UiAction::ExportAll => self.export_all().await,
            UiAction::Import { file } => self.import(file).await,
            UiAction::SendTurn { message, file } => self.send_turn(&message, file).await,
        }
    }

    // ── Session directory ────────────────────────────────────────

    /// Fetch the directory and load whichever session ends up active. On
    /// transport failure the directory is left unchanged.
    pub async fn refresh(&mut self) -> Result<(), ChatError> {
        match self.api.list_sessions().await {
            Ok(directory) => {
                self.state
                    .replace_directory(directory.sessions, directory.active_session_id);
                self.render_sessions();
                if let Some(id) = self.state.active_session_id().map(str::to_string) {
                    self.select(&id).await?;
                }
            }
            Err(error) => {
                warn!(%error, "session list fetch failed");
                self.renderer.notice(&error.user_message());
            }
        }
        Ok(())
    }

    /// Load one session and make it the active cache. An unknown id is a
    /// no-op: the prior active session stays intact.
    pub async fn select(&mut self, id: &str) -> Result<(), ChatError> {
        match self.api.get_session(id).await {
            Ok(session) => {
                self.state.activate(session);
                self.render_sessions();
                self.renderer.transcript(self.state.transcript());
            }
            Err(ApiError::NotFound { id }) => {
                debug!(id, "select of unknown session ignored");
            }
            Err(error) => self.renderer.notice(&error.user_message()),
        }
        Ok(())
    }

    pub async fn new_session(&mut self) -> Result<(), ChatError> {
        match self.create_active().await {
            Ok(()) => {
                self.render_sessions();
                self.renderer.transcript(self.state.transcript());
            }
            Err(error) => self.renderer.notice(&error.user_message()),
        }
        Ok(())
    }

    /// Rename the active session. A result for an id the directory no longer
    /// holds is dropped without insertion.
    pub async fn rename(&mut self, title: &str) -> Result<(), ChatError> {
        let Some(id) = self.state.active_session_id().map(str::to_string) else {
            return Ok(());
        };
        match self.api.rename_session(&id, title.trim()).await {
            Ok(session) => {
                self.state.apply_rename(&session);
                self.render_sessions();
            }
            Err(error) => self.renderer.notice(&error.user_message()),
        }
        Ok(())
    }

    /// Clear the active session's transcript, or the legacy session-less
    /// transcript when nothing is active.
    pub async fn clear(&mut self) -> Result<(), ChatError> {
        match self.state.active_session_id().map(str::to_string) {
            Some(id) => match self.api.clear_session(&id).await {
                Ok(session) => {
                    self.state.activate(session);
                    self.renderer.transcript(self.state.transcript());
                }
                Err(error) => self.renderer.notice(&error.user_message()),
            },
            None => match self.api.clear_transcript().await {
                Ok(()) => self.renderer.transcript(&[]),
                Err(error) => self.renderer.notice(&error.user_message()),
            },
        }
        Ok(())
    }

    // ── Export / import ──────────────────────────────────────────

    pub async fn export_active(&mut self) -> Result<(), ChatError> {
        let Some(id) = self.state.active_session_id().map(str::to_string) else {
            self.renderer.notice("No active session to export.");
            return Ok(());
        };
        match self.api.export_session(&id).await {
            Ok(payload) => self.deliver_export(&format!("chat-session-{id}.json"), &payload),
            Err(error) => self.renderer.notice(&error.user_message()),
        }
        Ok(())
    }

    pub async fn export_all(&mut self) -> Result<(), ChatError> {
        match self.api.export_all().await {
            Ok(payload) => self.deliver_export("chat-sessions.json", &payload),
            Err(error) => self.renderer.notice(&error.user_message()),
        }
        Ok(())
    }

    fn deliver_export(&mut self, filename: &str, payload: &serde_json::Value) {
        if let Err(error) = self.renderer.export(filename, payload) {
            self.renderer.notice(&format!("Export failed: {error}"));
        }
    }

    /// Upload a session archive. A rejected import surfaces the server's
    /// error as an assistant-style message and touches no state; a successful
    /// one replaces the directory and activates the first imported session.
    pub async fn import(&mut self, file: FilePayload) -> Result<(), ChatError> {
        match self.api.import_sessions(file).await {
            Ok(outcome) => {
                let first_imported = outcome.imported.first().cloned();
                self.state.replace_directory(outcome.sessions, None);
                self.render_sessions();
                if let Some(id) = first_imported {
                    self.select(&id).await?;
                }
            }
            Err(error) => {
                self.renderer
                    .append(&ChatMessage::assistant(error.user_message(), None));
            }
        }
        Ok(())
    }

    // ── Chat turn orchestration ──────────────────────────────────

    /// One user-message-in, assistant-reply-out cycle.
    ///
    /// Empty submissions are silently ignored. A second call before the
    /// previous turn settles is rejected with `ChatError::TurnInFlight`
    /// rather than interleaving reconciliation. All backend failures settle
    /// into the transcript; the in-flight flag clears on every path.
    pub async fn send_turn(
        &mut self,
        message: &str,
        file: Option<FilePayload>,
    ) -> Result<(), ChatError> {
        let message = message.trim();
        if message.is_empty() && file.is_none() {
            return Ok(());
        }
        if self.turn_in_flight {
            return Err(ChatError::TurnInFlight);
        }

        self.turn_in_flight = true;
        let outcome = self.run_turn(message, file).await;
        self.turn_in_flight = false;
        outcome
    }

    async fn run_turn(&mut self, message: &str, file: Option<FilePayload>) -> Result<(), ChatError> {
        // Lazy session creation for the very first turn.
        if self.state.active_session_id().is_none() {
            if let Err(error) = self.create_active().await {
                self.renderer.notice(&error.user_message());
                return Ok(());
            }
            self.render_sessions();
        }
        let Some(session_id) = self.state.active_session_id().map(str::to_string) else {
            return Ok(());
        };

        // Optimistic append before the round-trip; settled below.
        let user_message = ChatMessage::user(message, file.as_ref().map(|f| f.name.clone()));
        self.state.append_message(user_message.clone());
        self.renderer.append(&user_message);

        match self
            .api
            .send_chat(&session_id, message, file, &self.settings)
            .await
        {
            Ok(response) => {
                if let Some(session) = response.session {
                    // Authoritative replacement; reconcile into the directory.
                    self.adopt_turn_session(session);
                } else {
                    self.state.settle_pending(Delivery::Confirmed);
                    let reply = response
                        .reply
                        .unwrap_or_else(|| "No response generated.".to_string());
                    let assistant = ChatMessage::assistant(reply, response.usage);
                    self.state.append_message(assistant.clone());
                    self.renderer.append(&assistant);
                }
            }
            Err(error) => {
                warn!(%error, session_id, "chat turn failed");
                self.state.settle_pending(Delivery::Failed);
                self.renderer.notice("Message not delivered.");
                let assistant = ChatMessage::assistant(error.user_message(), None);
                self.state.append_message(assistant.clone());
                self.renderer.append(&assistant);
            }
        }
        Ok(())
    }

    fn adopt_turn_session(&mut self, session: Session) {
        self.state.adopt_turn_session(session);
        self.render_sessions();
        self.renderer.transcript(self.state.transcript());
    }

    async fn create_active(&mut self) -> Result<(), ApiError> {
        let session = self
            .api
            .create_session("New Chat", self.settings.provider, &self.settings.model)
            .await?;
        debug!(id = %session.id, "created session");
        self.state.adopt_new(session);
        Ok(())
    }

    fn render_sessions(&mut self) {
        self.renderer
            .sessions(self.state.sessions(), self.state.active_session_id());
    }
}
