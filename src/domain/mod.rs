//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (User, Message, Command, Position)
//! - Traits: Abstractions for infrastructure (Bot)

pub mod entities;
pub mod traits;
