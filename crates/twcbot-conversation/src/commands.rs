//! Chat commands and numbered-reply parsing.

use std::sync::LazyLock;

use regex::Regex;

static HELP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)weather\s+help").expect("valid regex"));

static LIST_SERVICES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)weather\s+services|(show|list)\s+((my)*\s+)*services").expect("valid regex")
});

static SHOW_WEATHER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)weather\s+for\s+(\S+)(.*)").expect("valid regex"));

static NUMBERED_REPLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ListServices,
    ShowWeather { city: String, state: Option<String> },
}

impl Command {
    /// Recognises a command anywhere in `text`. Help wins over the others,
    /// then the service list, then a weather request.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if HELP_RE.is_match(text) {
            return Some(Self::Help);
        }
        if LIST_SERVICES_RE.is_match(text) {
            return Some(Self::ListServices);
        }
        let caps = SHOW_WEATHER_RE.captures(text)?;
        let city = caps.get(1)?.as_str().to_owned();
        let state = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        Some(Self::ShowWeather { city, state })
    }
}

/// Parses a reply to a numbered prompt with `choices` options.
///
/// Returns the zero-based index, or `None` if the reply is not a bare
/// number in `1..=choices`.
#[must_use]
pub fn parse_selection(reply: &str, choices: usize) -> Option<usize> {
    let caps = NUMBERED_REPLY_RE.captures(reply)?;
    let ordinal: usize = caps.get(1)?.as_str().parse().ok()?;
    (1..=choices).contains(&ordinal).then(|| ordinal - 1)
}

/// Joins city and state with single spaces, collapsing inner whitespace.
pub(crate) fn location_text(city: &str, state: Option<&str>) -> String {
    city.split_whitespace()
        .chain(state.unwrap_or_default().split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
