//! Per-user, per-channel conversation state.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;
use twcbot_weather::LocationCandidate;

use crate::catalog::WeatherService;

/// Identifies one conversation: the same user in two channels has two sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user: String,
    pub channel: String,
}

impl SessionKey {
    #[must_use]
    pub fn new(user: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.channel)
    }
}

/// What a numbered reply would answer.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    ServiceSelection,
    /// The service is fixed when the prompt is issued, not when it is answered.
    LocationSelection {
        candidates: Vec<LocationCandidate>,
        service: WeatherService,
    },
}

impl PromptKind {
    /// Number of valid choices.
    #[must_use]
    pub fn choices(&self) -> usize {
        match self {
            Self::ServiceSelection => WeatherService::ALL.len(),
            Self::LocationSelection { candidates, .. } => candidates.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingPrompt {
    pub kind: PromptKind,
    pub issued_at: Instant,
    /// Query sequence number of the command that issued this prompt.
    pub query_seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    /// `None` until the user picks a service or first asks for weather.
    pub selected_service: Option<WeatherService>,
    pub pending: Option<PendingPrompt>,
    /// Bumped by every command; in-flight work from an older query is dropped.
    pub query_seq: u64,
}

/// An edit applied to one session while the store holds it exclusively.
pub type SessionUpdate<'a> = Box<dyn FnOnce(&mut ConversationSession) + Send + 'a>;

/// Storage for [`ConversationSession`]s.
///
/// `load` returns a fresh default session for unknown keys.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &SessionKey) -> ConversationSession;
    async fn save(&self, key: &SessionKey, session: ConversationSession);

    /// Applies `apply` atomically with respect to other calls on the same
    /// store and returns the session as `apply` left it.
    async fn update<'a>(
        &self,
        key: &SessionKey,
        apply: SessionUpdate<'a>,
    ) -> ConversationSession;
}

/// Process-local session store. Sessions live until the process exits.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, ConversationSession>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &SessionKey) -> ConversationSession {
        self.sessions
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    async fn save(&self, key: &SessionKey, session: ConversationSession) {
        self.sessions.lock().await.insert(key.clone(), session);
    }

    async fn update<'a>(
        &self,
        key: &SessionKey,
        apply: SessionUpdate<'a>,
    ) -> ConversationSession {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(key.clone()).or_default();
        apply(session);
        session.clone()
    }
}
