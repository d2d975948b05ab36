//! HTTP client for The Weather Company data API.
//!
//! Every call resolves credentials from the injected [`CredentialSource`],
//! builds a percent-encoded URL with `language` as the first query parameter,
//! and performs a basic-auth GET. Responses are returned as raw JSON; shaping
//! them is the formatter's job.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde_json::Value;
use twcbot_core::{CredentialSource, API_URL_VAR, PASSWORD_VAR, USERNAME_VAR};

use crate::error::WeatherError;

pub const DEFAULT_LANGUAGE: &str = "en-US";

const LOCATION_SEARCH_PATH: &str = "/api/weather/v3/location/search";

/// Imperial ("English") units for every weather endpoint.
const UNITS: (&str, &str) = ("units", "e");

/// Characters left unescaped in query values, matching URI component encoding.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Client for the location-search and geocode weather endpoints.
///
/// Construct once and share; credentials are read on every request so a
/// changed credential source takes effect without rebuilding the client.
pub struct WeatherClient {
    client: Client,
    credentials: Arc<dyn CredentialSource>,
    language: String,
}

impl WeatherClient {
    /// Creates a client with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Network`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            credentials,
            language: DEFAULT_LANGUAGE.to_owned(),
        })
    }

    /// Sets the language tag sent when a call does not name one.
    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_owned();
        self
    }

    /// Searches for locations matching `query`.
    ///
    /// No filtering happens here; the raw search body is returned.
    ///
    /// # Errors
    ///
    /// - [`WeatherError::Configuration`] if a credential is unset.
    /// - [`WeatherError::Network`] on transport failure.
    /// - [`WeatherError::UnexpectedStatus`] on a non-2xx response.
    /// - [`WeatherError::Deserialize`] if the body is not JSON.
    pub async fn geocode(
        &self,
        query: &str,
        language: Option<&str>,
    ) -> Result<Value, WeatherError> {
        self.call(LOCATION_SEARCH_PATH, language, &[("query", query)]).await
    }

    /// Daily forecast for the next ten days.
    ///
    /// # Errors
    ///
    /// Same as [`WeatherClient::geocode`].
    pub async fn fetch_ten_day_forecast(&self, lat: f64, lon: f64) -> Result<Value, WeatherError> {
        let endpoint = geocode_path(lat, lon, "forecast/daily/10day.json");
        self.call(&endpoint, None, &[UNITS]).await
    }

    /// Hourly forecast for the next 48 hours.
    ///
    /// # Errors
    ///
    /// Same as [`WeatherClient::geocode`].
    pub async fn fetch_forty_eight_hour_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Value, WeatherError> {
        let endpoint = geocode_path(lat, lon, "forecast/hourly/48hour.json");
        self.call(&endpoint, None, &[UNITS]).await
    }

    /// Most recent observation.
    ///
    /// # Errors
    ///
    /// Same as [`WeatherClient::geocode`].
    pub async fn fetch_current_observation(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Value, WeatherError> {
        let endpoint = geocode_path(lat, lon, "observations.json");
        self.call(&endpoint, None, &[UNITS]).await
    }

    /// Observation time series covering the last 23 hours.
    ///
    /// # Errors
    ///
    /// Same as [`WeatherClient::geocode`].
    pub async fn fetch_twenty_four_hour_observation(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Value, WeatherError> {
        let endpoint = geocode_path(lat, lon, "observations/timeseries.json");
        self.call(&endpoint, None, &[UNITS, ("hours", "23")]).await
    }

    async fn call(
        &self,
        endpoint: &str,
        language: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<Value, WeatherError> {
        let creds = self.credentials.credentials();
        let base_url = creds.api_base_url.ok_or_else(|| missing(API_URL_VAR))?;
        let url = build_url(
            &base_url,
            endpoint,
            language.unwrap_or(&self.language),
            params,
        )?;
        let username = creds.username.ok_or_else(|| missing(USERNAME_VAR))?;
        let password = creds.password.ok_or_else(|| missing(PASSWORD_VAR))?;

        tracing::debug!(endpoint, "calling weather API");
        let response = self
            .client
            .get(url)
            .basic_auth(username, Some(password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: endpoint.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Deserialize {
            context: endpoint.to_owned(),
            source: e,
        })
    }
}

fn missing(var: &str) -> WeatherError {
    WeatherError::Configuration(format!("{var} is not set"))
}

/// Path for a geocode-keyed endpoint. Coordinates are rounded to two
/// decimals, the granularity the API buckets locations by.
pub(crate) fn geocode_path(lat: f64, lon: f64, suffix: &str) -> String {
    format!("/api/weather/v1/geocode/{lat:.2}/{lon:.2}/{suffix}")
}

/// Joins base URL, endpoint and query string. `language` always leads; the
/// remaining parameters keep the order given.
pub(crate) fn build_url(
    base_url: &str,
    endpoint: &str,
    language: &str,
    params: &[(&str, &str)],
) -> Result<Url, WeatherError> {
    let mut query = format!("language={}", utf8_percent_encode(language, QUERY_VALUE));
    for (key, value) in params {
        query.push('&');
        query.push_str(key);
        query.push('=');
        query.push_str(&utf8_percent_encode(value, QUERY_VALUE).to_string());
    }

    let raw = format!("{}{endpoint}?{query}", base_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| {
        WeatherError::Configuration(format!("{API_URL_VAR} is not a valid URL ('{base_url}'): {e}"))
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
