//! Shared configuration, credentials, localization and icon lookup for twcbot.

mod app_config;
mod config;
mod credentials;
mod i18n;
mod icons;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{
    CredentialSource, Credentials, EnvCredentials, API_URL_VAR, PASSWORD_VAR, USERNAME_VAR,
};
pub use i18n::{LocaleTable, Translate};
pub use icons::IconTable;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to parse locale table: {0}")]
    LocaleParse(#[from] serde_json::Error),
}
