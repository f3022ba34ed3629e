use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub struct Config {
    pub api_base_url: String,
    pub log_level: String,
    /// Bounded timeout for auxiliary fetches (unread count); mutating calls
    /// rely on the transport default.
    pub aux_timeout_secs: u64,
    pub token_path: String,
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("log_level", &self.log_level)
            .field("aux_timeout_secs", &self.aux_timeout_secs)
            .field("token_path", &"<redacted>")
            .finish()
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            api_base_url: env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:4000/api".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            aux_timeout_secs: env::var("AUX_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            token_path: env::var("TOKEN_PATH").unwrap_or_else(|_| ".libris-session.json".to_string()),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
