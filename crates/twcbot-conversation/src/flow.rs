//! The weather conversation state machine.
//!
//! A session is idle, awaiting a service choice, or awaiting a location
//! choice. Any recognised command moves it out of a waiting state, so the
//! most recent command always owns the session. Location and weather results
//! that come back after a newer command was issued are dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use twcbot_core::Translate;
use twcbot_weather::{
    location_candidates, CardFormatter, LocationCandidate, WeatherClient, WeatherError,
};

use crate::catalog::{catalog_prompt, numbered_prompt, WeatherService};
use crate::commands::{location_text, parse_selection, Command};
use crate::session::{ConversationSession, PendingPrompt, PromptKind, SessionKey, SessionStore};
use crate::surface::{ChatSurface, Outbound};

pub const QUERY_ACTIVITY: &str = "activity.weather.query";
pub const SERVICES_ACTIVITY: &str = "activity.weather.services";

const DEFAULT_BOT_NAME: &str = "weatherbot";

/// Observable state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingServiceSelection,
    AwaitingLocationSelection { choices: usize },
}

pub struct ConversationFlow {
    client: WeatherClient,
    formatter: CardFormatter,
    translator: Arc<dyn Translate>,
    sessions: Arc<dyn SessionStore>,
    surface: Arc<dyn ChatSurface>,
    prompt_timeout: Option<Duration>,
    bot_name: String,
}

impl ConversationFlow {
    /// Prompts never expire unless [`ConversationFlow::with_prompt_timeout`] is set.
    #[must_use]
    pub fn new(
        client: WeatherClient,
        formatter: CardFormatter,
        translator: Arc<dyn Translate>,
        sessions: Arc<dyn SessionStore>,
        surface: Arc<dyn ChatSurface>,
    ) -> Self {
        Self {
            client,
            formatter,
            translator,
            sessions,
            surface,
            prompt_timeout: None,
            bot_name: DEFAULT_BOT_NAME.to_owned(),
        }
    }

    /// A pending prompt older than `timeout` is discarded on the next message.
    #[must_use]
    pub fn with_prompt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Name shown in the help text.
    #[must_use]
    pub fn with_bot_name(mut self, bot_name: &str) -> Self {
        self.bot_name = bot_name.to_owned();
        self
    }

    /// Entry point for free-form chat text.
    ///
    /// Commands are handled first, replacing any pending prompt. Otherwise
    /// the text is tried as an answer to the pending prompt. Returns `false`
    /// when the message was neither.
    pub async fn handle_message(&self, key: &SessionKey, text: &str) -> bool {
        if let Some(command) = Command::parse(text) {
            tracing::debug!(session = %key, ?command, "command matched");
            self.dispatch(key, command).await;
            return true;
        }
        self.answer_prompt(key, text).await
    }

    pub async fn dispatch(&self, key: &SessionKey, command: Command) {
        match command {
            Command::Help => self.help(key).await,
            Command::ListServices => self.list_services(key).await,
            Command::ShowWeather { city, state } => {
                self.show_weather(key, &city, state.as_deref()).await;
            }
        }
    }

    pub async fn help(&self, key: &SessionKey) {
        let bot = &self.bot_name;
        let help = format!(
            "{bot} weather services - {}\n{bot} weather for [CITY] [STATE] - {}\n",
            self.translate("services.help", &[]),
            self.translate("weather.for.help", &[]),
        );
        self.say(key, help).await;
    }

    /// Shows the service catalog and waits for a numbered choice.
    pub async fn list_services(&self, key: &SessionKey) {
        tracing::info!(session = %key, "listing weather services");
        self.sessions
            .update(
                key,
                Box::new(|session: &mut ConversationSession| {
                    let seq = start_query(session);
                    session.pending = Some(PendingPrompt {
                        kind: PromptKind::ServiceSelection,
                        issued_at: Instant::now(),
                        query_seq: seq,
                    });
                }),
            )
            .await;

        self.say(key, self.translate("pick.a.service", &[])).await;
        self.surface
            .emit(key, Outbound::Prompt(catalog_prompt(self.translator.as_ref())))
            .await;
    }

    /// Entry point for an upstream language parser that extracted a location
    /// (or failed to).
    pub async fn show_weather_for_location(&self, key: &SessionKey, location: Option<&str>) {
        match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => self.show_weather(key, location, None).await,
            None => {
                tracing::error!(session = %key, "no location extracted from request");
                self.say(key, self.translate("cognitive.parse.problem.location", &[]))
                    .await;
            }
        }
    }

    /// Geocodes `city [state]` and shows weather from the session's service,
    /// prompting first when several places match.
    pub async fn show_weather(&self, key: &SessionKey, city: &str, state: Option<&str>) {
        let location = location_text(city, state);

        let session = self
            .sessions
            .update(
                key,
                Box::new(|session: &mut ConversationSession| {
                    if session.selected_service.is_none() {
                        session.selected_service = Some(WeatherService::default());
                    }
                    start_query(session);
                }),
            )
            .await;
        let service = session.selected_service.unwrap_or_default();
        let seq = session.query_seq;

        if location.is_empty() {
            self.say(key, self.translate("provide.location", &[])).await;
            return;
        }

        tracing::info!(
            session = %key,
            location = %location,
            service = service.id(),
            "getting weather"
        );
        self.say(key, self.translate("weather.for.city", &[location.as_str()]))
            .await;

        let result = self.client.geocode(&location, None).await;
        if self.is_superseded(key, seq).await {
            tracing::info!(
                session = %key,
                location = %location,
                "newer query arrived; dropping location results"
            );
            return;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(WeatherError::UnexpectedStatus { status: 404, .. }) => {
                self.say(key, self.translate("no.match", &[])).await;
                return;
            }
            Err(e) => {
                tracing::error!(
                    session = %key,
                    location = %location,
                    error = %e,
                    "location search failed"
                );
                self.say(key, self.translate("location.query.error", &[]))
                    .await;
                return;
            }
        };

        let candidates = match location_candidates(&payload) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::info!(
                    session = %key,
                    location = %location,
                    error = %e,
                    "no location match"
                );
                self.say(key, self.translate("no.match", &[])).await;
                return;
            }
        };

        tracing::info!(session = %key, matches = candidates.len(), "location results");
        if let [only] = candidates.as_slice() {
            self.fetch_weather(key, service, only, seq).await;
            return;
        }

        let prompt = numbered_prompt(candidates.iter().map(|c| c.address.as_str()));
        let session = self
            .sessions
            .update(
                key,
                Box::new(move |session: &mut ConversationSession| {
                    if session.query_seq == seq {
                        session.pending = Some(PendingPrompt {
                            kind: PromptKind::LocationSelection {
                                candidates,
                                service,
                            },
                            issued_at: Instant::now(),
                            query_seq: seq,
                        });
                    }
                }),
            )
            .await;
        if session.query_seq != seq {
            tracing::info!(session = %key, "newer query arrived; dropping location prompt");
            return;
        }

        self.say(key, self.translate("pick.an.option", &[])).await;
        self.surface.emit(key, Outbound::Prompt(prompt)).await;
    }

    /// Current state of `key`, treating an expired prompt as gone.
    pub async fn state(&self, key: &SessionKey) -> FlowState {
        let session = self.sessions.load(key).await;
        match session.pending {
            Some(pending) if !is_expired(&pending, self.prompt_timeout) => match pending.kind {
                PromptKind::ServiceSelection => FlowState::AwaitingServiceSelection,
                PromptKind::LocationSelection { candidates, .. } => {
                    FlowState::AwaitingLocationSelection {
                        choices: candidates.len(),
                    }
                }
            },
            _ => FlowState::Idle,
        }
    }

    async fn answer_prompt(&self, key: &SessionKey, reply: &str) -> bool {
        let timeout = self.prompt_timeout;
        let mut answer = Answer::NoPrompt;
        self.sessions
            .update(
                key,
                Box::new(|session: &mut ConversationSession| {
                    answer = resolve_reply(session, reply, timeout);
                }),
            )
            .await;

        match answer {
            Answer::NoPrompt => false,
            Answer::Expired => {
                tracing::info!(session = %key, "pending prompt expired");
                false
            }
            Answer::Unmatched => {
                tracing::debug!(session = %key, "reply does not answer the pending prompt");
                false
            }
            Answer::Service(service) => {
                tracing::info!(session = %key, service = service.id(), "selected weather service");
                let label = self.translate(service.label_key(), &[]);
                self.say(key, self.translate("service.selected", &[label.as_str()]))
                    .await;
                self.surface.emit_activity(key, SERVICES_ACTIVITY).await;
                true
            }
            Answer::Location {
                candidate,
                service,
                seq,
            } => {
                let confirmation =
                    self.translate("getting.weather", &[candidate.address.as_str()]);
                self.say(key, confirmation).await;
                self.fetch_weather(key, service, &candidate, seq).await;
                true
            }
        }
    }

    /// Fetches and emits weather for query `seq`, unless a newer query has
    /// started by the time the fetch returns.
    async fn fetch_weather(
        &self,
        key: &SessionKey,
        service: WeatherService,
        candidate: &LocationCandidate,
        seq: u64,
    ) {
        let (lat, lon) = (candidate.latitude, candidate.longitude);
        let result = service.fetch(&self.client, lat, lon).await;
        if self.is_superseded(key, seq).await {
            tracing::info!(session = %key, lat, lon, "newer query arrived; dropping weather");
            return;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    session = %key,
                    lat,
                    lon,
                    service = service.id(),
                    error = %e,
                    "weather fetch failed"
                );
                self.say(key, self.translate("error.weather", &[])).await;
                return;
            }
        };

        match service.format(&self.formatter, &payload) {
            Ok(cards) => {
                tracing::info!(
                    session = %key,
                    lat,
                    lon,
                    cards = cards.len(),
                    "weather data obtained"
                );
                self.surface.emit(key, Outbound::Cards(cards)).await;
                self.surface.emit_activity(key, QUERY_ACTIVITY).await;
            }
            Err(e) => {
                tracing::error!(
                    session = %key,
                    lat,
                    lon,
                    service = service.id(),
                    error = %e,
                    payload = %payload,
                    "failed to format weather response"
                );
                self.say(key, self.translate("error.weather", &[])).await;
            }
        }
    }

    async fn is_superseded(&self, key: &SessionKey, seq: u64) -> bool {
        self.sessions.load(key).await.query_seq != seq
    }

    fn translate(&self, key: &str, args: &[&str]) -> String {
        self.translator.translate(key, args)
    }

    async fn say(&self, key: &SessionKey, message: String) {
        self.surface.emit(key, Outbound::Message(message)).await;
    }
}

/// Outcome of matching a reply against the pending prompt.
enum Answer {
    NoPrompt,
    Expired,
    Unmatched,
    Service(WeatherService),
    Location {
        candidate: LocationCandidate,
        service: WeatherService,
        seq: u64,
    },
}

/// Consumes the pending prompt if `reply` answers it. An unmatched reply
/// leaves the prompt in place; an expired prompt is removed either way.
fn resolve_reply(
    session: &mut ConversationSession,
    reply: &str,
    timeout: Option<Duration>,
) -> Answer {
    let Some(pending) = session.pending.take() else {
        return Answer::NoPrompt;
    };
    if is_expired(&pending, timeout) {
        return Answer::Expired;
    }
    let Some(index) = parse_selection(reply, pending.kind.choices()) else {
        session.pending = Some(pending);
        return Answer::Unmatched;
    };

    let seq = pending.query_seq;
    match pending.kind {
        PromptKind::ServiceSelection => match WeatherService::ALL.get(index).copied() {
            Some(service) => {
                session.selected_service = Some(service);
                Answer::Service(service)
            }
            None => Answer::Unmatched,
        },
        PromptKind::LocationSelection {
            candidates,
            service,
        } => match candidates.into_iter().nth(index) {
            Some(candidate) => Answer::Location {
                candidate,
                service,
                seq,
            },
            None => Answer::Unmatched,
        },
    }
}

fn is_expired(pending: &PendingPrompt, timeout: Option<Duration>) -> bool {
    timeout.is_some_and(|timeout| pending.issued_at.elapsed() > timeout)
}

/// Starts a new query on `session`, cancelling whatever it was waiting for.
fn start_query(session: &mut ConversationSession) -> u64 {
    session.query_seq += 1;
    session.pending = None;
    session.query_seq
}
