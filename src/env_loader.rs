use crate::gate::GateSettings;
use crate::notices::{DEFAULT_RULES, DEFAULT_WELCOME};
use dotenvy::dotenv;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use teloxide::types::ChatId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the bot reads from its environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub log_chat: Option<ChatId>,
    pub log_file: String,
    pub log_level: LevelFilter,
    pub gate: GateSettings,
}

/// Load environment variables from a .env file.
pub fn load_env() {
    // Load .env file, ignore errors if file not found.
    dotenv().ok();
}

impl BotConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any name -> value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let log_chat = match get("LOG_CHAT_ID") {
            Some(raw) => Some(ChatId(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "LOG_CHAT_ID",
                value: raw.clone(),
            })?)),
            None => None,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "LOG_LEVEL",
                value: raw.clone(),
            })?,
            None => LevelFilter::Info,
        };

        let rules_text = match (get("RULES_TEXT"), get("RULES_TEXT_PATH")) {
            (Some(text), _) => text,
            (None, Some(path)) => {
                let path = PathBuf::from(path);
                std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?
                    .trim_end()
                    .to_string()
            }
            (None, None) => DEFAULT_RULES.to_string(),
        };

        let defaults = GateSettings::default();
        let gate = GateSettings {
            verify_window: secs(&get, "VERIFY_WINDOW_SECS", defaults.verify_window)?,
            notice_ttl_verified: secs(
                &get,
                "NOTICE_TTL_VERIFIED_SECS",
                defaults.notice_ttl_verified,
            )?,
            notice_ttl_removed: secs(&get, "NOTICE_TTL_REMOVED_SECS", defaults.notice_ttl_removed)?,
            welcome_text: get("WELCOME_TEXT").unwrap_or_else(|| DEFAULT_WELCOME.to_string()),
            rules_text,
        };

        Ok(BotConfig {
            token,
            log_chat,
            log_file: get("LOG_FILE_PATH").unwrap_or_else(|| "logs/bot.log".to_string()),
            log_level,
            gate,
        })
    }
}

/// Parse a positive number of seconds, falling back to `default` when unset.
fn secs<G>(get: &G, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}
