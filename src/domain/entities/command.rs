use std::collections::HashMap;

use serde::Serialize;

/// A command name/description pair as registered with the Telegram
/// bot-command menu via setMyCommands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub command: String,
    pub description: String,
}

impl CommandDescriptor {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// The fixed command menu. Order matters: this is the exact list the
/// registrar publishes and /start and /help render.
pub fn command_menu() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("start", "Start the bot"),
        CommandDescriptor::new("wallet", "Show your wallet address"),
        CommandDescriptor::new("positions", "Show your positions"),
        CommandDescriptor::new("buy", "Buy a token: /buy <mint> [sol]"),
        CommandDescriptor::new("sell", "Sell a position: /sell <mint> <pct>"),
        CommandDescriptor::new("help", "Show help message"),
    ]
}

/// Command handler function type
pub type CommandHandler = Box<
    dyn Fn(crate::domain::entities::Message) -> Result<String, crate::application::errors::CommandError>
        + Send
        + Sync,
>;

/// A runnable bot command: a descriptor plus its handler.
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub handler: Option<CommandHandler>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            handler: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(crate::domain::entities::Message) -> Result<String, crate::application::errors::CommandError>
            + Send
            + Sync
            + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        self.name.eq_ignore_ascii_case(input)
    }
}

/// Command registry for managing available commands
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name.clone(), command);
    }

    pub fn find(&self, input: &str) -> Option<&Command> {
        self.commands.values().find(|c| c.matches(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_has_the_six_registered_commands() {
        let menu = command_menu();
        let names: Vec<&str> = menu.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, vec!["start", "wallet", "positions", "buy", "sell", "help"]);
    }

    #[test]
    fn menu_serializes_as_command_description_objects() {
        let json = serde_json::to_value(command_menu()).unwrap();
        let first = &json[0];
        assert_eq!(first["command"], "start");
        assert_eq!(first["description"], "Start the bot");
    }

    #[test]
    fn registry_finds_commands_case_insensitively() {
        let mut reg = CommandRegistry::new();
        reg.register(Command::new("wallet").with_description("Show your wallet address"));
        assert!(reg.find("WALLET").is_some());
        assert!(reg.find("wallets").is_none());
    }
}
