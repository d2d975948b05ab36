//! Localized user-facing strings.
//!
//! Messages are looked up by key and `%s` placeholders are filled positionally,
//! so the conversation code never embeds literal text.

use std::collections::HashMap;

use crate::ConfigError;

/// Key → message lookup with positional `%s` substitution.
pub trait Translate: Send + Sync {
    /// Returns the message for `key` with each `%s` replaced by the next
    /// element of `args`. Unknown keys come back unchanged.
    fn translate(&self, key: &str, args: &[&str]) -> String;
}

const ENGLISH: &[(&str, &str)] = &[
    ("current.weather", "Current weather"),
    ("ten.day.forecast", "10 day weather forecast"),
    ("forty.eight.hour.forecast", "48 hour weather forecast"),
    ("twenty.four.hour.observations", "24 hour weather observations"),
    (
        "pick.a.service",
        "OK, please let me know which service you would like to use?",
    ),
    (
        "pick.an.option",
        "I found more than one location with that name. Which one did you mean?",
    ),
    ("service.selected", "OK, I will use the %s service from now on."),
    ("weather.for.city", "Got it! You want the weather for %s"),
    ("getting.weather", "Getting the weather for %s."),
    (
        "provide.location",
        "Please tell me which location you want the weather for.",
    ),
    (
        "no.match",
        "Sorry, I could not find a location matching your request.",
    ),
    (
        "error.weather",
        "Sorry, I was unable to get the weather. Please try again later.",
    ),
    (
        "location.query.error",
        "Sorry, the location service is not available right now. Please try again later.",
    ),
    (
        "cognitive.parse.problem.location",
        "Sorry, I could not work out the location from your request. Try 'weather for [CITY] [STATE]'.",
    ),
    ("services.help", "Choose which weather service to use."),
    ("weather.for.help", "Show the weather for a location."),
];

/// An in-memory message table for one locale.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    messages: HashMap<String, String>,
}

impl LocaleTable {
    /// The built-in English table.
    #[must_use]
    pub fn english() -> Self {
        Self {
            messages: ENGLISH
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    /// Parses a flat JSON object of `"key": "message"` pairs.
    ///
    /// Keys absent from `json` fall back to the English table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LocaleParse`] if `json` is not a string map.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let overrides: HashMap<String, String> = serde_json::from_str(json)?;
        let mut table = Self::english();
        table.messages.extend(overrides);
        Ok(table)
    }
}

impl Default for LocaleTable {
    fn default() -> Self {
        Self::english()
    }
}

impl Translate for LocaleTable {
    fn translate(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.messages.get(key) else {
            tracing::debug!(key, "no message for key");
            return key.to_string();
        };

        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template.as_str();
        while let Some(idx) = rest.find("%s") {
            out.push_str(&rest[..idx]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("%s"),
            }
            rest = &rest[idx + 2..];
        }
        out.push_str(rest);
        out
    }
}
