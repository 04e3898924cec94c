use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment-driven configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    pub log_level: String,
    pub rest_port: u16,
    pub database_path: PathBuf,

    pub command_topic_marriage: String,
    pub event_topic_marriage_status: String,
    pub event_topic_character_status: String,

    pub proposal_expiry_sweep_interval_secs: u64,
    pub ceremony_timeout_sweep_interval_secs: u64,

    pub character_service_base_url: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_level: "info,marriage=debug".to_string(),
            rest_port: 8080,
            database_path: PathBuf::from("/var/lib/marriage/marriage.db"),
            command_topic_marriage: "marriage.commands".to_string(),
            event_topic_marriage_status: "marriage.status".to_string(),
            event_topic_character_status: "character.status".to_string(),
            proposal_expiry_sweep_interval_secs: 60,
            ceremony_timeout_sweep_interval_secs: 30,
            character_service_base_url: "http://localhost:9000".to_string(),
        }
    }
}

impl EnvConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("REST_PORT") {
            if let Ok(port) = v.parse() {
                config.rest_port = port;
            }
        }
        if let Ok(v) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("COMMAND_TOPIC_MARRIAGE") {
            config.command_topic_marriage = v;
        }
        if let Ok(v) = std::env::var("EVENT_TOPIC_MARRIAGE_STATUS") {
            config.event_topic_marriage_status = v;
        }
        if let Ok(v) = std::env::var("EVENT_TOPIC_CHARACTER_STATUS") {
            config.event_topic_character_status = v;
        }
        if let Ok(v) = std::env::var("PROPOSAL_EXPIRY_SWEEP_INTERVAL_SECS") {
            if let Ok(secs) = v.parse() {
                config.proposal_expiry_sweep_interval_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("CEREMONY_TIMEOUT_SWEEP_INTERVAL_SECS") {
            if let Ok(secs) = v.parse() {
                config.ceremony_timeout_sweep_interval_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("CHARACTER_SERVICE_BASE_URL") {
            config.character_service_base_url = v;
        }

        config
    }

    /// Loads a `.env` file (if present) then environment variables.
    pub fn load(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            load_dotenv(path);
        } else {
            let candidates = [PathBuf::from("/etc/marriage/.env"), PathBuf::from(".env")];
            for candidate in &candidates {
                if candidate.exists() {
                    load_dotenv(candidate);
                    break;
                }
            }
        }

        Self::from_env()
    }
}

/// Loads a basic `.env` file (KEY=VALUE per line).
fn load_dotenv(path: &Path) {
    if let Ok(content) = std::fs::read_to_string(path) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    // SAFETY: called before spawning any threads (single-threaded init)
                    unsafe { std::env::set_var(key, value) };
                }
            }
        }
    }
}
