//! One-shot commands that call the weather API directly.

use anyhow::anyhow;
use twcbot_conversation::{Outbound, WeatherService};
use twcbot_core::Translate;
use twcbot_weather::{location_candidates, CardFormatter, WeatherClient, WeatherError};

use crate::chat::render;

pub(crate) async fn geocode(
    client: &WeatherClient,
    translator: &dyn Translate,
    query: &str,
) -> anyhow::Result<()> {
    let payload = match client.geocode(query, None).await {
        Ok(payload) => payload,
        Err(WeatherError::UnexpectedStatus { status: 404, .. }) => {
            println!("{}", translator.translate("no.match", &[]));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match location_candidates(&payload) {
        Ok(candidates) => {
            for (idx, candidate) in candidates.iter().enumerate() {
                println!(
                    "{}) {} ({:.2}, {:.2})",
                    idx + 1,
                    candidate.address,
                    candidate.latitude,
                    candidate.longitude
                );
            }
        }
        Err(WeatherError::NoLocationMatch) => {
            println!("{}", translator.translate("no.match", &[]));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub(crate) async fn weather(
    client: &WeatherClient,
    formatter: &CardFormatter,
    lat: f64,
    lon: f64,
    ordinal: usize,
) -> anyhow::Result<()> {
    let service = service_for(ordinal)?;
    tracing::info!(lat, lon, service = service.id(), "fetching weather");
    let payload = service.fetch(client, lat, lon).await?;
    let cards = service.format(formatter, &payload)?;
    println!("{}", render("", &Outbound::Cards(cards)));
    Ok(())
}

pub(crate) fn service_for(ordinal: usize) -> anyhow::Result<WeatherService> {
    WeatherService::from_ordinal(ordinal).ok_or_else(|| {
        anyhow!(
            "--service must be between 1 and {}",
            WeatherService::ALL.len()
        )
    })
}
