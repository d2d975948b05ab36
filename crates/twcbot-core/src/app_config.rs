use crate::credentials::Credentials;

#[derive(Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub language: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub prompt_timeout_secs: u64,
    pub bot_name: String,
    pub icon_base_url: Option<String>,
    pub user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("credentials", &self.credentials)
            .field("language", &self.language)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("prompt_timeout_secs", &self.prompt_timeout_secs)
            .field("bot_name", &self.bot_name)
            .field("icon_base_url", &self.icon_base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
