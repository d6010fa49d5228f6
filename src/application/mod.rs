//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Business logic orchestration
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing

pub mod errors;
pub mod messaging;
pub mod services;
