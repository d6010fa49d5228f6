//! Message handling - parsing chat text into commands

pub mod parser;

pub use parser::MessageParser;
