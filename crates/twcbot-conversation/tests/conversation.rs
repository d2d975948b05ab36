//! End-to-end conversation tests against a wiremock weather API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use twcbot_core::{Credentials, IconTable, LocaleTable};
use twcbot_conversation::{
    ChatSurface, ConversationFlow, FlowState, InMemorySessionStore, Outbound, SessionKey,
    QUERY_ACTIVITY, SERVICES_ACTIVITY,
};
use twcbot_weather::{CardFormatter, WeatherClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOCATION_SEARCH: &str = "/api/weather/v3/location/search";
const CHARLOTTE_OBSERVATIONS: &str = "/api/weather/v1/geocode/35.23/-80.84/observations.json";

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Out(Outbound),
    Activity(String),
}

#[derive(Default)]
struct RecordingSurface {
    events: Mutex<Vec<(SessionKey, Event)>>,
}

impl RecordingSurface {
    fn events_for(&self, key: &SessionKey) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChatSurface for RecordingSurface {
    async fn emit(&self, session: &SessionKey, outbound: Outbound) {
        self.events
            .lock()
            .unwrap()
            .push((session.clone(), Event::Out(outbound)));
    }

    async fn emit_activity(&self, session: &SessionKey, activity_id: &str) {
        self.events
            .lock()
            .unwrap()
            .push((session.clone(), Event::Activity(activity_id.to_owned())));
    }
}

fn message(text: &str) -> Event {
    Event::Out(Outbound::Message(text.to_owned()))
}

fn flow_for(server: &MockServer, surface: &Arc<RecordingSurface>) -> ConversationFlow {
    let credentials = Credentials::new(&server.uri(), "twc-user", "twc-pass");
    let client = WeatherClient::new(Arc::new(credentials), 5, "twcbot-test")
        .expect("client construction should not fail");
    let formatter = CardFormatter::new(IconTable::new(None), "Current weather");
    ConversationFlow::new(
        client,
        formatter,
        Arc::new(LocaleTable::english()),
        Arc::new(InMemorySessionStore::new()),
        surface.clone(),
    )
}

fn search_body(places: &[(&str, f64, f64)]) -> Value {
    json!({
        "location": {
            "address": places.iter().map(|p| p.0).collect::<Vec<_>>(),
            "latitude": places.iter().map(|p| p.1).collect::<Vec<_>>(),
            "longitude": places.iter().map(|p| p.2).collect::<Vec<_>>(),
        }
    })
}

async fn mount_search(server: &MockServer, query: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(LOCATION_SEARCH))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_charlotte(server: &MockServer) {
    mount_search(
        server,
        "Charlotte NC",
        search_body(&[("Charlotte, North Carolina, United States", 35.23, -80.84)]),
    )
    .await;
}

fn fair_observation() -> Value {
    json!({ "observation": { "temp": 79, "wx_phrase": "Fair", "wx_icon": 34 } })
}

fn alice() -> SessionKey {
    SessionKey::new("alice", "general")
}

#[tokio::test]
async fn single_match_shows_current_conditions_by_default() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    Mock::given(method("GET"))
        .and(path(CHARLOTTE_OBSERVATIONS))
        .and(query_param("units", "e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fair_observation()))
        .expect(1)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    assert!(flow.handle_message(&alice(), "weather for Charlotte NC").await);

    let events = surface.events_for(&alice());
    assert_eq!(events.len(), 3, "events: {events:?}");
    assert_eq!(events[0], message("Got it! You want the weather for Charlotte NC"));
    let Event::Out(Outbound::Cards(cards)) = &events[1] else {
        panic!("expected cards, got {:?}", events[1]);
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].title, "Current weather");
    assert_eq!(cards[0].text, "79\u{b0}F\nFair");
    assert_eq!(events[2], Event::Activity(QUERY_ACTIVITY.to_owned()));
    assert_eq!(flow.state(&alice()).await, FlowState::Idle);
}

#[tokio::test]
async fn multiple_matches_prompt_and_fetch_the_chosen_place() {
    let server = MockServer::start().await;
    let names: Vec<String> = (1..=10).map(|i| format!("Springfield {i}")).collect();
    let places: Vec<(&str, f64, f64)> = names
        .iter()
        .zip(1..=10)
        .map(|(name, i)| (name.as_str(), f64::from(i), -f64::from(i)))
        .collect();
    mount_search(&server, "Springfield", search_body(&places)).await;
    Mock::given(method("GET"))
        .and(path("/api/weather/v1/geocode/10.00/-10.00/observations.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fair_observation()))
        .expect(1)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    flow.handle_message(&alice(), "weather for Springfield").await;

    let events = surface.events_for(&alice());
    assert_eq!(events.len(), 3, "events: {events:?}");
    assert_eq!(
        events[1],
        message("I found more than one location with that name. Which one did you mean?")
    );
    let Event::Out(Outbound::Prompt(prompt)) = &events[2] else {
        panic!("expected prompt, got {:?}", events[2]);
    };
    assert!(prompt.starts_with("\n1) Springfield 1\n2) Springfield 2"));
    assert!(prompt.ends_with("\n10) Springfield 10"));
    assert_eq!(
        flow.state(&alice()).await,
        FlowState::AwaitingLocationSelection { choices: 10 }
    );

    surface.clear();
    assert!(flow.handle_message(&alice(), "10").await);

    let events = surface.events_for(&alice());
    assert_eq!(events[0], message("Getting the weather for Springfield 10."));
    assert!(matches!(events[1], Event::Out(Outbound::Cards(_))));
    assert_eq!(events[2], Event::Activity(QUERY_ACTIVITY.to_owned()));
    assert_eq!(flow.state(&alice()).await, FlowState::Idle);
}

#[tokio::test]
async fn empty_search_result_is_no_match_without_fetch() {
    let server = MockServer::start().await;
    mount_search(&server, "Nowhere", search_body(&[])).await;
    Mock::given(method("GET"))
        .and(path("/api/weather/v1/geocode/0.00/0.00/observations.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fair_observation()))
        .expect(0)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    flow.handle_message(&alice(), "weather for Nowhere").await;

    assert_eq!(
        surface.events_for(&alice()),
        vec![
            message("Got it! You want the weather for Nowhere"),
            message("Sorry, I could not find a location matching your request."),
        ]
    );
}

#[tokio::test]
async fn search_not_found_is_no_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATION_SEARCH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    flow.handle_message(&alice(), "weather for Atlantis").await;

    let events = surface.events_for(&alice());
    assert_eq!(
        events.last(),
        Some(&message(
            "Sorry, I could not find a location matching your request."
        ))
    );
}

#[tokio::test]
async fn search_failure_is_location_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATION_SEARCH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    flow.handle_message(&alice(), "weather for Charlotte NC").await;

    assert_eq!(
        surface.events_for(&alice()),
        vec![
            message("Got it! You want the weather for Charlotte NC"),
            message("Sorry, the location service is not available right now. Please try again later."),
        ]
    );
}

#[tokio::test]
async fn weather_fetch_failure_reports_error() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    Mock::given(method("GET"))
        .and(path(CHARLOTTE_OBSERVATIONS))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    flow.handle_message(&alice(), "weather for Charlotte NC").await;

    let events = surface.events_for(&alice());
    assert_eq!(
        events.last(),
        Some(&message(
            "Sorry, I was unable to get the weather. Please try again later."
        ))
    );
    assert!(!events.contains(&Event::Activity(QUERY_ACTIVITY.to_owned())));
}

#[tokio::test]
async fn unformattable_payload_reports_error() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    Mock::given(method("GET"))
        .and(path(CHARLOTTE_OBSERVATIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "metadata": {} })))
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    flow.handle_message(&alice(), "weather for Charlotte NC").await;

    let events = surface.events_for(&alice());
    assert_eq!(events.len(), 2, "events: {events:?}");
    assert_eq!(
        events[1],
        message("Sorry, I was unable to get the weather. Please try again later.")
    );
}

#[tokio::test]
async fn selected_service_sticks_for_later_queries() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/weather/v1/geocode/35.23/-80.84/forecast/daily/10day.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forecasts": [
                {
                    "dow": "Wednesday",
                    "fcst_valid_local": "2016-06-22T07:00:00-0400",
                    "narrative": "Sunny. High 91F.",
                    "day": { "icon_code": 32 }
                },
                {
                    "dow": "Thursday",
                    "fcst_valid_local": "2016-06-23T07:00:00-0400",
                    "narrative": "Storms.",
                    "day": { "icon_code": 4 }
                }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    flow.handle_message(&alice(), "show services").await;
    assert_eq!(
        surface.events_for(&alice()),
        vec![
            message("OK, please let me know which service you would like to use?"),
            Event::Out(Outbound::Prompt(
                "\n1) 10 day weather forecast\n2) 48 hour weather forecast\n3) Current weather\n4) 24 hour weather observations"
                    .to_owned()
            )),
        ]
    );
    assert_eq!(flow.state(&alice()).await, FlowState::AwaitingServiceSelection);

    surface.clear();
    assert!(flow.handle_message(&alice(), "1").await);
    assert_eq!(
        surface.events_for(&alice()),
        vec![
            message("OK, I will use the 10 day weather forecast service from now on."),
            Event::Activity(SERVICES_ACTIVITY.to_owned()),
        ]
    );

    for _ in 0..2 {
        surface.clear();
        flow.handle_message(&alice(), "weather for Charlotte NC").await;
        let events = surface.events_for(&alice());
        let Event::Out(Outbound::Cards(cards)) = &events[1] else {
            panic!("expected cards, got {events:?}");
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Wednesday 7am");
    }
}

#[tokio::test]
async fn out_of_range_reply_keeps_prompt_open() {
    let server = MockServer::start().await;
    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    flow.handle_message(&alice(), "weather services").await;
    surface.clear();

    assert!(!flow.handle_message(&alice(), "9").await);
    assert!(!flow.handle_message(&alice(), "maybe later").await);
    assert!(surface.events_for(&alice()).is_empty());
    assert_eq!(flow.state(&alice()).await, FlowState::AwaitingServiceSelection);

    assert!(flow.handle_message(&alice(), "2").await);
    assert_eq!(
        surface.events_for(&alice())[0],
        message("OK, I will use the 48 hour weather forecast service from now on.")
    );
}

#[tokio::test]
async fn new_command_supersedes_pending_prompt() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    Mock::given(method("GET"))
        .and(path(CHARLOTTE_OBSERVATIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(fair_observation()))
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    flow.handle_message(&alice(), "list services").await;
    flow.handle_message(&alice(), "weather for Charlotte NC").await;
    assert_eq!(flow.state(&alice()).await, FlowState::Idle);

    surface.clear();
    assert!(!flow.handle_message(&alice(), "1").await);
    assert!(surface.events_for(&alice()).is_empty());
}

#[tokio::test]
async fn expired_prompt_is_discarded() {
    let server = MockServer::start().await;
    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface).with_prompt_timeout(Some(Duration::from_millis(50)));

    flow.handle_message(&alice(), "weather services").await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    surface.clear();

    assert_eq!(flow.state(&alice()).await, FlowState::Idle);
    assert!(!flow.handle_message(&alice(), "1").await);
    assert!(surface.events_for(&alice()).is_empty());
}

#[tokio::test]
async fn sessions_are_isolated_per_user_and_channel() {
    let server = MockServer::start().await;
    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    let bob = SessionKey::new("bob", "general");
    let alice_elsewhere = SessionKey::new("alice", "random");

    flow.handle_message(&alice(), "weather services").await;

    assert!(!flow.handle_message(&bob, "1").await);
    assert!(!flow.handle_message(&alice_elsewhere, "1").await);
    assert!(surface.events_for(&bob).is_empty());

    assert!(flow.handle_message(&alice(), "1").await);
    assert_eq!(flow.state(&alice()).await, FlowState::Idle);
}

#[tokio::test]
async fn latest_query_wins_over_slow_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATION_SEARCH))
        .and(query_param("query", "Springfield"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(&[
                    ("Springfield, Illinois", 39.8, -89.6),
                    ("Springfield, Missouri", 37.2, -93.3),
                ]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_search(
        &server,
        "Portland",
        search_body(&[
            ("Portland, Oregon", 45.5, -122.7),
            ("Portland, Maine", 43.7, -70.3),
            ("Portland, Texas", 27.9, -97.3),
        ]),
    )
    .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    let key = alice();

    tokio::join!(
        flow.handle_message(&key, "weather for Springfield"),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flow.handle_message(&key, "weather for Portland").await
        }
    );

    assert_eq!(
        flow.state(&key).await,
        FlowState::AwaitingLocationSelection { choices: 3 }
    );
    let prompts: Vec<_> = surface
        .events_for(&key)
        .into_iter()
        .filter(|e| matches!(e, Event::Out(Outbound::Prompt(_))))
        .collect();
    assert_eq!(prompts.len(), 1);
}

fn is_weather_output(event: &Event) -> bool {
    matches!(event, Event::Out(Outbound::Cards(_)))
        || *event == Event::Activity(QUERY_ACTIVITY.to_owned())
}

async fn mount_portland(server: &MockServer) {
    mount_search(
        server,
        "Portland",
        search_body(&[
            ("Portland, Oregon", 45.5, -122.7),
            ("Portland, Maine", 43.7, -70.3),
        ]),
    )
    .await;
}

#[tokio::test]
async fn slow_weather_fetch_is_dropped_after_newer_query() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    mount_portland(&server).await;
    Mock::given(method("GET"))
        .and(path(CHARLOTTE_OBSERVATIONS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fair_observation())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    let key = alice();

    tokio::join!(
        flow.handle_message(&key, "weather for Charlotte NC"),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flow.handle_message(&key, "weather for Portland").await
        }
    );

    let events = surface.events_for(&key);
    assert!(
        !events.iter().any(is_weather_output),
        "stale weather emitted: {events:?}"
    );
    assert!(matches!(
        events.last(),
        Some(Event::Out(Outbound::Prompt(_)))
    ));
    assert_eq!(
        flow.state(&key).await,
        FlowState::AwaitingLocationSelection { choices: 2 }
    );
}

#[tokio::test]
async fn slow_fetch_for_chosen_place_is_dropped_after_newer_query() {
    let server = MockServer::start().await;
    mount_portland(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/weather/v1/geocode/45.50/-122.70/observations.json"))
        .respond_with(
            ResponseTemplate::new(503).set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    let key = alice();

    flow.handle_message(&key, "weather for Portland").await;
    surface.clear();

    tokio::join!(flow.handle_message(&key, "1"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        flow.handle_message(&key, "weather services").await
    });

    let events = surface.events_for(&key);
    assert_eq!(events[0], message("Getting the weather for Portland, Oregon."));
    assert!(
        !events.contains(&message(
            "Sorry, I was unable to get the weather. Please try again later."
        )),
        "stale error emitted: {events:?}"
    );
    assert!(matches!(
        events.last(),
        Some(Event::Out(Outbound::Prompt(_)))
    ));
    assert_eq!(flow.state(&key).await, FlowState::AwaitingServiceSelection);
}

#[tokio::test]
async fn empty_location_asks_for_one_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);
    flow.show_weather(&alice(), "  ", None).await;

    assert_eq!(
        surface.events_for(&alice()),
        vec![message(
            "Please tell me which location you want the weather for."
        )]
    );
}

#[tokio::test]
async fn extracted_location_drives_the_same_flow() {
    let server = MockServer::start().await;
    mount_charlotte(&server).await;
    Mock::given(method("GET"))
        .and(path(CHARLOTTE_OBSERVATIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(fair_observation()))
        .expect(1)
        .mount(&server)
        .await;

    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    flow.show_weather_for_location(&alice(), None).await;
    assert_eq!(
        surface.events_for(&alice()),
        vec![message(
            "Sorry, I could not work out the location from your request. Try 'weather for [CITY] [STATE]'."
        )]
    );

    surface.clear();
    flow.show_weather_for_location(&alice(), Some("Charlotte NC"))
        .await;
    assert_eq!(
        surface.events_for(&alice()).last(),
        Some(&Event::Activity(QUERY_ACTIVITY.to_owned()))
    );
}

#[tokio::test]
async fn help_lists_commands_with_bot_name() {
    let server = MockServer::start().await;
    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface).with_bot_name("skybot");

    assert!(flow.handle_message(&alice(), "weather help").await);
    assert_eq!(
        surface.events_for(&alice()),
        vec![message(
            "skybot weather services - Choose which weather service to use.\nskybot weather for [CITY] [STATE] - Show the weather for a location.\n"
        )]
    );
}

#[tokio::test]
async fn unrelated_text_is_ignored() {
    let server = MockServer::start().await;
    let surface = Arc::new(RecordingSurface::default());
    let flow = flow_for(&server, &surface);

    assert!(!flow.handle_message(&alice(), "good morning").await);
    assert!(surface.events_for(&alice()).is_empty());
}
