use crate::api::{ChatMessage, Delivery, Session, SessionSummary};
use tracing::debug;

/// Client-side mirror of the server-owned session space: the directory of
/// summaries plus at most one fully-hydrated active session.
///
/// Invariant: whenever both `active_session_id` and `active_session` are set,
/// their ids agree. The cache may run ahead of its directory entry only
/// inside a mutator; every public method leaves the two reconciled.
#[derive(Debug, Default)]
pub struct ClientState {
    sessions: Vec<SessionSummary>,
    active_session_id: Option<String>,
    active_session: Option<Session>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read access ──────────────────────────────────────────────

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.active_session
            .as_ref()
            .map_or(&[], |session| session.messages.as_slice())
    }

    // ── Session directory ────────────────────────────────────────

    /// Replace the whole directory from a `GET /sessions` response. The
    /// backend's `active_session_id` hint is only adopted when the client has
    /// no active session of its own yet.
    pub fn replace_directory(&mut self, sessions: Vec<SessionSummary>, hint: Option<String>) {
        self.sessions = sessions;
        if self.active_session_id.is_none() {
            self.active_session_id = hint;
        }
        self.assert_consistent();
    }

    /// Update the directory entry matching the renamed session in place. A
    /// rename result for an id the directory no longer holds is dropped
    /// silently, never inserted.
    pub fn apply_rename(&mut self, session: &Session) {
        match self.sessions.iter_mut().find(|entry| entry.id == session.id) {
            Some(entry) => *entry = SessionSummary::from(session),
            None => debug!(id = %session.id, "rename result for unknown session dropped"),
        }
        if let Some(active) = self.active_session.as_mut()
            && active.id == session.id
        {
            active.title = session.title.clone();
        }
        self.assert_consistent();
    }

    // ── Active session cache ─────────────────────────────────────

    /// Wholesale replacement of the active session cache (select / clear).
    /// Other directory entries stay untouched.
    pub fn activate(&mut self, session: Session) {
        self.active_session_id = Some(session.id.clone());
        if let Some(entry) = self.sessions.iter_mut().find(|entry| entry.id == session.id) {
            *entry = SessionSummary::from(&session);
        }
        self.active_session = Some(session);
        self.assert_consistent();
    }

    /// A freshly created session: prepend its summary (most-recent-first
    /// ordering) and make it active.
    pub fn adopt_new(&mut self, session: Session) {
        self.sessions.insert(0, SessionSummary::from(&session));
        self.active_session_id = Some(session.id.clone());
        self.active_session = Some(session);
        self.assert_consistent();
    }

    /// Server-confirmed session coming back from a chat turn: the new
    /// authoritative cache, reconciled into the directory in place when the
    /// id is already present, prepended otherwise.
    pub fn adopt_turn_session(&mut self, session: Session) {
        let summary = SessionSummary::from(&session);
        match self.sessions.iter_mut().find(|entry| entry.id == session.id) {
            Some(entry) => *entry = summary,
            None => self.sessions.insert(0, summary),
        }
        self.active_session_id = Some(session.id.clone());
        self.active_session = Some(session);
        self.assert_consistent();
    }

    // ── Transcript mutation (optimistic path) ────────────────────

    /// Append a locally-authored message to the cached transcript. No-op
    /// without an active session; the orchestrator creates one first.
    pub fn append_message(&mut self, message: ChatMessage) {
        if let Some(session) = self.active_session.as_mut() {
            session.messages.push(message);
        }
    }

    /// Settle the most recent pending message after the turn resolves.
    pub fn settle_pending(&mut self, delivery: Delivery) {
        if let Some(session) = self.active_session.as_mut()
            && let Some(message) = session
                .messages
                .iter_mut()
                .rev()
                .find(|message| message.delivery == Delivery::Pending)
        {
            message.delivery = delivery;
        }
    }

    fn assert_consistent(&self) {
        debug_assert!(
            match (&self.active_session_id, &self.active_session) {
                (Some(id), Some(session)) => *id == session.id,
                _ => true,
            },
            "active session cache diverged from active_session_id"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageRole;

    fn session(id: &str, title: &str) -> Session {
        Session {
            id: id.to_string(),
            title: title.to_string(),
            provider: None,
            model: None,
            created_at: None,
            updated_at: None,
            messages: Vec::new(),
        }
    }

    fn summary(id: &str, title: &str) -> SessionSummary {
        SessionSummary::from(&session(id, title))
    }

    #[test]
    fn replace_directory_adopts_hint_only_when_inactive() {
        let mut state = ClientState::new();
        state.replace_directory(vec![summary("s1", "First")], Some("s1".into()));
        assert_eq!(state.active_session_id(), Some("s1"));

        state.activate(session("s1", "First"));
        state.replace_directory(vec![summary("s2", "Second")], Some("s2".into()));
        assert_eq!(state.active_session_id(), Some("s1"));
    }

    #[test]
    fn apply_rename_updates_in_place() {
        let mut state = ClientState::new();
        state.replace_directory(vec![summary("s1", "Old"), summary("s2", "Other")], None);

        state.apply_rename(&session("s1", "New Title"));
        assert_eq!(state.sessions()[0].title, "New Title");
        assert_eq!(state.sessions()[1].title, "Other");
    }

    #[test]
    fn apply_rename_for_missing_id_leaves_directory_unchanged() {
        let mut state = ClientState::new();
        state.replace_directory(vec![summary("s1", "Only")], None);

        state.apply_rename(&session("ghost", "New Title"));
        assert_eq!(state.sessions().len(), 1);
        assert_eq!(state.sessions()[0].id, "s1");
        assert_eq!(state.sessions()[0].title, "Only");
    }

    #[test]
    fn apply_rename_keeps_active_cache_consistent() {
        let mut state = ClientState::new();
        state.adopt_new(session("s1", "Old"));

        state.apply_rename(&session("s1", "Renamed"));
        assert_eq!(state.active_session().unwrap().title, "Renamed");
        assert_eq!(state.sessions()[0].title, "Renamed");
    }

    #[test]
    fn adopt_new_prepends_and_activates() {
        let mut state = ClientState::new();
        state.replace_directory(vec![summary("old", "Old")], None);

        state.adopt_new(session("new", "New Chat"));
        assert_eq!(state.sessions()[0].id, "new");
        assert_eq!(state.sessions().len(), 2);
        assert_eq!(state.active_session_id(), Some("new"));
        assert_eq!(state.active_session().unwrap().id, "new");
    }

    #[test]
    fn adopt_turn_session_reconciles_in_place_or_prepends() {
        let mut state = ClientState::new();
        state.replace_directory(vec![summary("s1", "First")], None);

        let mut updated = session("s1", "First");
        updated.messages.push(ChatMessage::assistant("hi", None));
        state.adopt_turn_session(updated);
        assert_eq!(state.sessions().len(), 1);
        assert_eq!(state.sessions()[0].message_count, 1);

        state.adopt_turn_session(session("s9", "Fresh"));
        assert_eq!(state.sessions().len(), 2);
        assert_eq!(state.sessions()[0].id, "s9");
        assert_eq!(state.active_session_id(), Some("s9"));
    }

    #[test]
    fn settle_pending_marks_latest_pending_message() {
        let mut state = ClientState::new();
        state.adopt_new(session("s1", "Chat"));

        state.append_message(ChatMessage::user("hello", None));
        assert_eq!(state.transcript()[0].delivery, Delivery::Pending);

        state.settle_pending(Delivery::Failed);
        assert_eq!(state.transcript()[0].delivery, Delivery::Failed);
        assert_eq!(state.transcript()[0].role, MessageRole::User);
    }

    #[test]
    fn append_without_active_session_is_a_no_op() {
        let mut state = ClientState::new();
        state.append_message(ChatMessage::user("hello", None));
        assert!(state.transcript().is_empty());
    }
}
