//! Application services - Business logic orchestration

pub mod command_service;
pub mod trade_service;

pub use command_service::CommandService;
pub use trade_service::TradeService;
