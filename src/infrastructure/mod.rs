//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Environment and dotenv handling
//! - Launcher: Root resolution and environment handoff
//! - Database: SQLite persistence
//! - Detector: Mint extraction from chat text
//! - Adapters: Platform integrations (Telegram)

pub mod adapters;
pub mod config;
pub mod database;
pub mod detector;
pub mod launcher;
