//! Configuration management
//!
//! Configuration comes from the process environment, seeded from a
//! dotenv file when one is present. The bot token resolution order is
//! fixed: the `TELEGRAM_BOT_TOKEN` env var wins outright; otherwise
//! `.env` and then `../.env` are searched, and within a file the last
//! matching line wins.

use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;

pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const DB_PATH_VAR: &str = "SCRAPETECH_DB";

const DEFAULT_DB_PATH: &str = "scrapetech.db";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the bot loop.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    pub db_path: PathBuf,
    pub poll_timeout_secs: u64,
}

impl Settings {
    /// Build settings from the environment, falling back to dotenv
    /// files for the token.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = resolve_bot_token()?;
        let db_path = std::env::var(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));
        Ok(Self {
            bot_token,
            db_path,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        })
    }
}

/// Strip one layer of matching surrounding quotes.
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Pull a key out of dotenv-formatted content: last matching
/// `KEY=value` line wins, one quote layer stripped.
pub fn dotenv_lookup(content: &str, key: &str) -> Option<String> {
    let prefix = format!("{}=", key);
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .last()
        .map(|raw| strip_quotes(raw.trim()).to_string())
        .filter(|v| !v.is_empty())
}

/// All `KEY=value` entries of a dotenv file, in order. Comment and
/// blank lines are skipped; quotes are stripped.
pub fn dotenv_entries(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), strip_quotes(value.trim()).to_string()))
        })
        .collect()
}

/// Resolve the bot token against explicit inputs. Split out from
/// `resolve_bot_token` so the precedence rules are testable without
/// touching the process environment.
pub fn resolve_bot_token_from(
    env_value: Option<&str>,
    dotenv_candidates: &[PathBuf],
) -> Result<String, ConfigError> {
    if let Some(token) = env_value.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    for candidate in dotenv_candidates {
        let Ok(content) = std::fs::read_to_string(candidate) else {
            continue;
        };
        if let Some(token) = dotenv_lookup(&content, BOT_TOKEN_VAR) {
            tracing::debug!(path = %candidate.display(), "bot token resolved from dotenv file");
            return Ok(token);
        }
    }

    Err(ConfigError::MissingCredential)
}

/// Registrar/bot token resolution: env var, then `.env`, then `../.env`.
pub fn resolve_bot_token() -> Result<String, ConfigError> {
    let env_value = std::env::var(BOT_TOKEN_VAR).ok();
    resolve_bot_token_from(
        env_value.as_deref(),
        &[PathBuf::from(".env"), PathBuf::from("../.env")],
    )
}

/// Seed the process environment from a dotenv file. Variables already
/// set in the environment are left alone.
pub fn load_dotenv(path: &Path) -> std::io::Result<()> {
    let content = std::fs::read_to_string(path)?;
    for (key, value) in dotenv_entries(&content) {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, &value);
        }
    }
    Ok(())
}
