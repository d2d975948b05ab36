use crate::app_config::AppConfig;
use crate::credentials::Credentials;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric setting cannot be parsed. Missing
/// weather credentials are not an error; see [`Credentials::missing_vars`].
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric setting cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let credentials = Credentials::resolve(&lookup);

    let language = or_default("TWC_LANGUAGE", "en-US");
    let log_level = or_default("TWC_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("TWC_REQUEST_TIMEOUT_SECS", "30")?;
    let prompt_timeout_secs = parse_u64("TWC_PROMPT_TIMEOUT_SECS", "300")?;
    let bot_name = or_default("TWC_BOT_NAME", "weatherbot");
    let icon_base_url = lookup("TWC_ICON_BASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let user_agent = or_default("TWC_USER_AGENT", "twcbot/0.1 (weather-chat)");

    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TWC_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        credentials,
        language,
        log_level,
        request_timeout_secs,
        prompt_timeout_secs,
        bot_name,
        icon_base_url,
        user_agent,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
