//! Weather API credentials and where they come from.
//!
//! Every field is optional at load time. A missing field only becomes an
//! error when an API call is attempted, so the bot can start with partial
//! configuration and report the problem on first use.

use std::env::VarError;

/// Cloud Foundry bound-service variables, checked before the plain ones.
pub(crate) const VCAP_HOST_VAR: &str = "VCAP_SERVICES_WEATHERINSIGHTS_0_CREDENTIALS_HOST";
pub(crate) const VCAP_USERNAME_VAR: &str = "VCAP_SERVICES_WEATHERINSIGHTS_0_CREDENTIALS_USERNAME";
pub(crate) const VCAP_PASSWORD_VAR: &str = "VCAP_SERVICES_WEATHERINSIGHTS_0_CREDENTIALS_PASSWORD";

pub const API_URL_VAR: &str = "HUBOT_TWC_API";
pub const USERNAME_VAR: &str = "HUBOT_TWC_USER";
pub const PASSWORD_VAR: &str = "HUBOT_TWC_PASSWORD";

/// Base URL and basic-auth pair for The Weather Company API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(api_base_url: &str, username: &str, password: &str) -> Self {
        Self {
            api_base_url: Some(api_base_url.to_owned()),
            username: Some(username.to_owned()),
            password: Some(password.to_owned()),
        }
    }

    /// Names of the variables whose values could not be resolved.
    #[must_use]
    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_base_url.is_none() {
            missing.push(API_URL_VAR);
        }
        if self.username.is_none() {
            missing.push(USERNAME_VAR);
        }
        if self.password.is_none() {
            missing.push(PASSWORD_VAR);
        }
        missing
    }

    /// Resolve credentials through `lookup`, preferring bound-service
    /// variables over the `HUBOT_TWC_*` ones. Empty values count as unset.
    pub(crate) fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let get = |key: &str| lookup(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            api_base_url: get(VCAP_HOST_VAR)
                .map(|host| format!("https://{host}"))
                .or_else(|| get(API_URL_VAR)),
            username: get(VCAP_USERNAME_VAR).or_else(|| get(USERNAME_VAR)),
            password: get(VCAP_PASSWORD_VAR).or_else(|| get(PASSWORD_VAR)),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_base_url", &self.api_base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Supplies credentials to the weather client.
///
/// The client asks on every request and never caches the answer.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Credentials;
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Credentials {
        self.clone()
    }
}

/// Reads the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> Credentials {
        Credentials::resolve(|key| std::env::var(key))
    }
}
