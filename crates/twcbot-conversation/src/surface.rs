//! The chat side of a conversation: where replies go.

use async_trait::async_trait;
use twcbot_weather::Card;

use crate::session::SessionKey;

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Plain text reply.
    Message(String),
    /// Text that expects a numbered answer from the same user.
    Prompt(String),
    /// Formatted weather results.
    Cards(Vec<Card>),
}

/// A chat adapter. Implementations deliver to one user in one channel.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    async fn emit(&self, session: &SessionKey, outbound: Outbound);

    /// Records that the user completed `activity_id`.
    async fn emit_activity(&self, session: &SessionKey, activity_id: &str);
}
