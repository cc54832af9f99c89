use crate::phases::models::PhaseFormat;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

/// Application-level defaults for new studies.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub deployment: String,
    /// Phase naming scheme stamped on newly created studies.
    pub default_phase_format: PhaseFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available
        let default_phase_format = match env::var("SPIRIT_PHASE_FORMAT").as_deref() {
            Ok("number") => PhaseFormat::Number,
            _ => PhaseFormat::DayMinutes,
        };
        Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "spirit-core".to_string()),
            deployment: env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            default_phase_format,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "spirit-core-test".to_string(),
            deployment: "test".to_string(),
            default_phase_format: PhaseFormat::DayMinutes,
        }
    }
}
