mod chat;
mod lookup;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use twcbot_conversation::{ConversationFlow, InMemorySessionStore, SessionKey};
use twcbot_core::{AppConfig, Credentials, EnvCredentials, IconTable, LocaleTable, Translate};
use twcbot_weather::{CardFormatter, WeatherClient};

#[derive(Debug, Parser)]
#[command(name = "twcbot")]
#[command(about = "Weather chat bot for The Weather Company data API")]
struct Cli {
    /// JSON message table overriding the built-in English strings.
    #[arg(long, global = true)]
    locale: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Chat with the bot on stdin/stdout (default).
    Chat {
        #[arg(long, default_value = "console")]
        user: String,
        #[arg(long, default_value = "console")]
        channel: String,
    },
    /// List the places matching a location query.
    Geocode { query: String },
    /// Show weather for a coordinate without a conversation.
    Weather {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Service number as listed by `weather services` (1-4).
        #[arg(long, default_value_t = 3)]
        service: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = twcbot_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    warn_missing_credentials(&config.credentials);

    let translator: Arc<dyn Translate> = Arc::new(load_locale(cli.locale.as_deref()).await?);
    let client = build_client(&config)?;
    let formatter = build_formatter(&config, translator.as_ref());

    match cli.command.unwrap_or(Commands::Chat {
        user: "console".to_owned(),
        channel: "console".to_owned(),
    }) {
        Commands::Chat { user, channel } => {
            let surface = Arc::new(chat::ConsoleSurface::new(&config.bot_name));
            let flow = ConversationFlow::new(
                client,
                formatter,
                translator,
                Arc::new(InMemorySessionStore::new()),
                surface,
            )
            .with_prompt_timeout(prompt_timeout(config.prompt_timeout_secs))
            .with_bot_name(&config.bot_name);
            chat::run(&flow, &SessionKey::new(user, channel)).await?;
        }
        Commands::Geocode { query } => {
            lookup::geocode(&client, translator.as_ref(), &query).await?;
        }
        Commands::Weather { lat, lon, service } => {
            lookup::weather(&client, &formatter, lat, lon, service).await?;
        }
    }

    Ok(())
}

async fn load_locale(path: Option<&std::path::Path>) -> anyhow::Result<LocaleTable> {
    let Some(path) = path else {
        return Ok(LocaleTable::english());
    };
    let raw = tokio::fs::read_to_string(path).await?;
    let table = LocaleTable::from_json(&raw)?;
    tracing::info!(path = %path.display(), "loaded locale overrides");
    Ok(table)
}

fn build_client(config: &AppConfig) -> anyhow::Result<WeatherClient> {
    let client = WeatherClient::new(
        Arc::new(EnvCredentials),
        config.request_timeout_secs,
        &config.user_agent,
    )?
    .with_language(&config.language);
    Ok(client)
}

fn build_formatter(config: &AppConfig, translator: &dyn Translate) -> CardFormatter {
    CardFormatter::new(
        IconTable::new(config.icon_base_url.as_deref()),
        &translator.translate("current.weather", &[]),
    )
}

/// Logged once, after the subscriber is installed; config loading stays silent.
fn warn_missing_credentials(credentials: &Credentials) {
    let missing = credentials.missing_vars();
    if !missing.is_empty() {
        tracing::warn!(?missing, "weather API credentials incomplete");
    }
}

fn prompt_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
