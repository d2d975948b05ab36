//! Multi-turn weather conversation for chat surfaces.
//!
//! [`ConversationFlow`] takes user messages for a [`SessionKey`], geocodes the
//! requested location, asks the user to pick when several places match, then
//! fetches and formats the session's selected [`WeatherService`].

pub mod catalog;
pub mod commands;
pub mod flow;
pub mod session;
pub mod surface;

pub use catalog::WeatherService;
pub use commands::Command;
pub use flow::{ConversationFlow, FlowState, QUERY_ACTIVITY, SERVICES_ACTIVITY};
pub use session::{
    ConversationSession, InMemorySessionStore, PendingPrompt, PromptKind, SessionKey, SessionStore,
    SessionUpdate,
};
pub use surface::{ChatSurface, Outbound};
