//! Payload → [`Card`] formatters, one per weather service.
//!
//! Forecast titles use the hour of `fcst_valid_local` without minutes (the
//! API pre-rounds those to the hour). Observation titles come from a raw
//! epoch timestamp and include zero-padded minutes.

use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike};
use serde::de::DeserializeOwned;
use serde_json::Value;
use twcbot_core::IconTable;

use crate::error::WeatherError;
use crate::types::{
    Card, CurrentObservationPayload, DailyForecast, ForecastPayload, HourlyForecast, Observation,
    ObservationSeriesPayload,
};

pub struct CardFormatter {
    icons: IconTable,
    current_title: String,
    display_offset: FixedOffset,
}

impl CardFormatter {
    /// `current_title` is the (localized) title of the current-conditions card.
    /// Observation timestamps are shown in the host's current UTC offset
    /// unless [`CardFormatter::with_display_offset`] overrides it.
    #[must_use]
    pub fn new(icons: IconTable, current_title: &str) -> Self {
        Self {
            icons,
            current_title: current_title.to_owned(),
            display_offset: *Local::now().offset(),
        }
    }

    #[must_use]
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// One card per day: `"{dow} {hour}"`, narrative body, day icon falling
    /// back to the night icon.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::NoWeatherData`] if `forecasts` is missing,
    /// empty, or malformed.
    pub fn ten_day_forecast(&self, payload: &Value) -> Result<Vec<Card>, WeatherError> {
        let forecasts = non_empty(parse::<ForecastPayload<DailyForecast>>(payload)?.forecasts)?;
        forecasts
            .into_iter()
            .map(|forecast| {
                let valid = parse_local(&forecast.fcst_valid_local)?;
                let icon_code = forecast
                    .day
                    .and_then(|part| part.icon_code)
                    .or_else(|| forecast.night.and_then(|part| part.icon_code));
                Ok(Card {
                    title: format!("{} {}", forecast.dow, hour_label(valid.hour())),
                    text: forecast.narrative.unwrap_or_default(),
                    icon_url: self.icon(icon_code),
                })
            })
            .collect()
    }

    /// One card per hour: `"{dow} {hour}"`, temperature and short phrase.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::NoWeatherData`] if `forecasts` is missing,
    /// empty, or malformed.
    pub fn forty_eight_hour_forecast(&self, payload: &Value) -> Result<Vec<Card>, WeatherError> {
        let forecasts = non_empty(parse::<ForecastPayload<HourlyForecast>>(payload)?.forecasts)?;
        forecasts
            .into_iter()
            .map(|forecast| {
                let valid = parse_local(&forecast.fcst_valid_local)?;
                Ok(Card {
                    title: format!("{} {}", forecast.dow, hour_label(valid.hour())),
                    text: temperature_text(forecast.temp, forecast.phrase_32char.as_deref()),
                    icon_url: self.icon(forecast.icon_code),
                })
            })
            .collect()
    }

    /// Exactly one card for the latest observation.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::NoWeatherData`] if `observation` is missing.
    pub fn current_observation(&self, payload: &Value) -> Result<Vec<Card>, WeatherError> {
        let observation = parse::<CurrentObservationPayload>(payload)?
            .observation
            .ok_or(WeatherError::NoWeatherData)?;
        Ok(vec![Card {
            title: self.current_title.clone(),
            text: temperature_text(observation.temp, observation.wx_phrase.as_deref()),
            icon_url: self.icon(observation.wx_icon),
        }])
    }

    /// One card per observation: `"{m}/{d} {h}:{mm}{am|pm}"` in the display
    /// offset.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::NoWeatherData`] if `observations` is missing,
    /// empty, or an entry lacks a valid timestamp.
    pub fn twenty_four_hour_observations(
        &self,
        payload: &Value,
    ) -> Result<Vec<Card>, WeatherError> {
        let observations =
            non_empty(parse::<ObservationSeriesPayload>(payload)?.observations)?;
        observations
            .into_iter()
            .map(|observation| self.observation_card(observation))
            .collect()
    }

    fn observation_card(&self, observation: Observation) -> Result<Card, WeatherError> {
        let observed = observation
            .valid_time_gmt
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(WeatherError::NoWeatherData)?
            .with_timezone(&self.display_offset);
        Ok(Card {
            title: format!(
                "{}/{} {}",
                observed.month(),
                observed.day(),
                clock_label(observed.hour(), observed.minute())
            ),
            text: temperature_text(observation.temp, observation.wx_phrase.as_deref()),
            icon_url: self.icon(observation.wx_icon),
        })
    }

    fn icon(&self, code: Option<u32>) -> Option<String> {
        code.and_then(|c| self.icons.url_for(c)).map(str::to_owned)
    }
}

fn parse<T: DeserializeOwned>(payload: &Value) -> Result<T, WeatherError> {
    T::deserialize(payload).map_err(|e| {
        tracing::debug!(error = %e, "weather payload has unexpected shape");
        WeatherError::NoWeatherData
    })
}

fn non_empty<T>(entries: Option<Vec<T>>) -> Result<Vec<T>, WeatherError> {
    match entries {
        Some(entries) if !entries.is_empty() => Ok(entries),
        _ => Err(WeatherError::NoWeatherData),
    }
}

/// Parses `fcst_valid_local`, keeping the location's own offset.
fn parse_local(raw: &str) -> Result<DateTime<FixedOffset>, WeatherError> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map_err(|e| {
            tracing::debug!(value = raw, error = %e, "unparseable fcst_valid_local");
            WeatherError::NoWeatherData
        })
}

/// 12-hour label without minutes: 0 → `12am`, 12 → `12pm`, 13 → `1pm`.
pub(crate) fn hour_label(hour: u32) -> String {
    let (h, suffix) = twelve_hour(hour);
    format!("{h}{suffix}")
}

/// 12-hour label with zero-padded minutes: (0, 5) → `12:05am`.
pub(crate) fn clock_label(hour: u32, minute: u32) -> String {
    let (h, suffix) = twelve_hour(hour);
    format!("{h}:{minute:02}{suffix}")
}

fn twelve_hour(hour: u32) -> (u32, &'static str) {
    match hour {
        0 => (12, "am"),
        12 => (12, "pm"),
        h if h > 12 => (h - 12, "pm"),
        h => (h, "am"),
    }
}

fn temperature_text(temp: Option<f64>, phrase: Option<&str>) -> String {
    let temp = temp.map_or_else(|| "--".to_owned(), |t| t.to_string());
    format!("{temp}\u{b0}F\n{}", phrase.unwrap_or_default())
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
