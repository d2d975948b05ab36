use thiserror::Error;

/// Errors returned by the weather client and card formatters.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// A credential or base URL is missing or unusable. Raised before any
    /// network I/O is attempted.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Transport failure from the underlying HTTP client.
    #[error("network error calling the weather API: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// The response body was not valid JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The payload is present but its expected field is missing or empty.
    #[error("no weather data in the response")]
    NoWeatherData,

    /// A location search produced no usable candidates.
    #[error("no location matched the query")]
    NoLocationMatch,
}
