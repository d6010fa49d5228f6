//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod message;
pub mod position;
pub mod user;

pub use command::{command_menu, Command, CommandDescriptor, CommandRegistry};
pub use message::{Content, Message};
pub use position::{Position, TradeSettings, TradeSide};
pub use user::User;
