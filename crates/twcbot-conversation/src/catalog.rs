//! The four selectable weather services.
//!
//! Each variant pairs one client call with the formatter for its payload, so
//! a fetch result can only ever reach the formatter that understands it.

use serde_json::Value;
use twcbot_core::Translate;
use twcbot_weather::{Card, CardFormatter, WeatherClient, WeatherError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeatherService {
    DailyForecast,
    HourlyForecast,
    #[default]
    CurrentConditions,
    HourlyObservations,
}

impl WeatherService {
    /// Display and selection order.
    pub const ALL: [Self; 4] = [
        Self::DailyForecast,
        Self::HourlyForecast,
        Self::CurrentConditions,
        Self::HourlyObservations,
    ];

    /// Looks up a service by its 1-based position in [`WeatherService::ALL`].
    #[must_use]
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        ordinal
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::DailyForecast => "ten.day.forecast",
            Self::HourlyForecast => "forty.eight.hour.forecast",
            Self::CurrentConditions => "current.weather",
            Self::HourlyObservations => "twenty.four.hour.observations",
        }
    }

    /// Stable identifier for logs.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::DailyForecast => "daily_forecast",
            Self::HourlyForecast => "hourly_forecast",
            Self::CurrentConditions => "current_conditions",
            Self::HourlyObservations => "hourly_observations",
        }
    }

    /// Calls this service's endpoint.
    ///
    /// # Errors
    ///
    /// Propagates any [`WeatherError`] from the client.
    pub async fn fetch(
        self,
        client: &WeatherClient,
        latitude: f64,
        longitude: f64,
    ) -> Result<Value, WeatherError> {
        match self {
            Self::DailyForecast => client.fetch_ten_day_forecast(latitude, longitude).await,
            Self::HourlyForecast => {
                client
                    .fetch_forty_eight_hour_forecast(latitude, longitude)
                    .await
            }
            Self::CurrentConditions => client.fetch_current_observation(latitude, longitude).await,
            Self::HourlyObservations => {
                client
                    .fetch_twenty_four_hour_observation(latitude, longitude)
                    .await
            }
        }
    }

    /// Formats a payload returned by [`WeatherService::fetch`] for the same variant.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::NoWeatherData`] when the payload is empty or
    /// has the wrong shape.
    pub fn format(
        self,
        formatter: &CardFormatter,
        payload: &Value,
    ) -> Result<Vec<Card>, WeatherError> {
        match self {
            Self::DailyForecast => formatter.ten_day_forecast(payload),
            Self::HourlyForecast => formatter.forty_eight_hour_forecast(payload),
            Self::CurrentConditions => formatter.current_observation(payload),
            Self::HourlyObservations => formatter.twenty_four_hour_observations(payload),
        }
    }
}

/// `"\n1) label\n2) label…"` for every service, in catalog order.
pub(crate) fn catalog_prompt(translator: &dyn Translate) -> String {
    let labels: Vec<String> = WeatherService::ALL
        .iter()
        .map(|service| translator.translate(service.label_key(), &[]))
        .collect();
    numbered_prompt(labels.iter().map(String::as_str))
}

/// Renders a 1-based numbered list, each entry on its own line.
pub(crate) fn numbered_prompt<'a>(entries: impl IntoIterator<Item = &'a str>) -> String {
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| format!("\n{}) {entry}", idx + 1))
        .collect()
}
