//! Application layer errors

use std::path::PathBuf;

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors. `InvalidArgs` carries the usage line and is
/// replied to the chat rather than treated as fatal.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN not set and not found in any .env file")]
    MissingCredential,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Launcher errors. Fatal, surfaced once, never retried.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("environment file not found (expected {})", .0.display())]
    MissingEnvironment(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
