//! Weather API payload shapes and the chat-facing output types.
//!
//! Payloads are owned by the API; only the fields the formatters read are
//! modelled, and everything optional in practice is `Option` here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WeatherError;

/// One displayable weather summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: String,
    pub text: String,
    pub icon_url: Option<String>,
}

/// A place that matched a location search.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCandidate {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// location search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LocationSearchResponse {
    #[serde(default)]
    location: Option<LocationSearchResult>,
}

/// Parallel arrays: index `i` of each describes the same place.
#[derive(Debug, Deserialize)]
struct LocationSearchResult {
    #[serde(default)]
    address: Option<Vec<String>>,
    #[serde(default)]
    latitude: Option<Vec<f64>>,
    #[serde(default)]
    longitude: Option<Vec<f64>>,
}

/// Zips a location-search payload into candidates, preserving array order.
///
/// # Errors
///
/// Returns [`WeatherError::NoLocationMatch`] when the payload has no
/// addresses, or when the coordinate arrays are missing or differ in length
/// from the address array.
pub fn location_candidates(payload: &Value) -> Result<Vec<LocationCandidate>, WeatherError> {
    let response = LocationSearchResponse::deserialize(payload).map_err(|e| {
        tracing::debug!(error = %e, "location search payload has unexpected shape");
        WeatherError::NoLocationMatch
    })?;

    let Some(LocationSearchResult {
        address: Some(address),
        latitude: Some(latitude),
        longitude: Some(longitude),
    }) = response.location
    else {
        return Err(WeatherError::NoLocationMatch);
    };

    if address.is_empty() || latitude.len() != address.len() || longitude.len() != address.len() {
        tracing::warn!(
            addresses = address.len(),
            latitudes = latitude.len(),
            longitudes = longitude.len(),
            "location search arrays are empty or misaligned"
        );
        return Err(WeatherError::NoLocationMatch);
    }

    Ok(address
        .into_iter()
        .zip(latitude.into_iter().zip(longitude))
        .map(|(address, (latitude, longitude))| LocationCandidate {
            address,
            latitude,
            longitude,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// forecasts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastPayload<T> {
    pub forecasts: Option<Vec<T>>,
}

/// One day of the 10-day forecast.
#[derive(Debug, Deserialize)]
pub(crate) struct DailyForecast {
    pub dow: String,
    /// Local valid time with offset, e.g. `"2016-06-22T07:00:00-0400"`.
    pub fcst_valid_local: String,
    #[serde(default)]
    pub narrative: Option<String>,
    /// Absent (or null) for late-day forecasts of the current date.
    #[serde(default)]
    pub day: Option<DayPart>,
    #[serde(default)]
    pub night: Option<DayPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DayPart {
    #[serde(default)]
    pub icon_code: Option<u32>,
}

/// One hour of the 48-hour forecast.
#[derive(Debug, Deserialize)]
pub(crate) struct HourlyForecast {
    pub dow: String,
    pub fcst_valid_local: String,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub phrase_32char: Option<String>,
    #[serde(default)]
    pub icon_code: Option<u32>,
}

// ---------------------------------------------------------------------------
// observations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentObservationPayload {
    #[serde(default)]
    pub observation: Option<Observation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObservationSeriesPayload {
    #[serde(default)]
    pub observations: Option<Vec<Observation>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Observation {
    /// Unix epoch seconds. Only the time series entries rely on it.
    #[serde(default)]
    pub valid_time_gmt: Option<i64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub wx_phrase: Option<String>,
    #[serde(default)]
    pub wx_icon: Option<u32>,
}
