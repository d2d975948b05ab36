//! Client and card formatters for The Weather Company data API.
//!
//! [`WeatherClient`] calls the location-search endpoint and the four
//! geocode-keyed weather endpoints, returning raw JSON. [`CardFormatter`]
//! turns those payloads into chat-ready [`Card`]s.

pub mod client;
pub mod error;
pub mod format;
pub mod types;

pub use client::{WeatherClient, DEFAULT_LANGUAGE};
pub use error::WeatherError;
pub use format::CardFormatter;
pub use types::{location_candidates, Card, LocationCandidate};
