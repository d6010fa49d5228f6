use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::application::messaging::parser::{parse_buy_args, parse_sell_args};
use crate::application::services::TradeService;
use crate::domain::entities::{command_menu, Command, CommandRegistry, Content, Message};

/// Service for managing and executing the chat commands.
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            prefix: prefix.into(),
        }
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    /// Wire up the six menu commands against the trade service.
    pub fn register_menu(&mut self, trades: Arc<TradeService>) {
        let banner = start_banner();
        self.register(
            Command::new("start")
                .with_description("Start the bot")
                .with_handler(move |_| Ok(banner.clone())),
        );

        let help_text = help_text();
        self.register(
            Command::new("help")
                .with_description("Show help message")
                .with_handler(move |_| Ok(help_text.clone())),
        );

        let svc = trades.clone();
        self.register(
            Command::new("wallet")
                .with_description("Show your wallet address")
                .with_handler(move |msg| svc.wallet_summary(msg.user_id())),
        );

        let svc = trades.clone();
        self.register(
            Command::new("positions")
                .with_description("Show your positions")
                .with_handler(move |msg| svc.positions_summary(msg.user_id())),
        );

        let svc = trades.clone();
        self.register(
            Command::new("buy")
                .with_description("Buy a token")
                .with_handler(move |msg| {
                    let Content::Command { args, .. } = &msg.content else {
                        return Err(CommandError::InvalidArgs("Usage: /buy <mint> [sol]".to_string()));
                    };
                    let (mint, sol) = parse_buy_args(args)?;
                    svc.submit_buy(msg.user_id(), &mint, sol)
                }),
        );

        let svc = trades;
        self.register(
            Command::new("sell")
                .with_description("Sell a position")
                .with_handler(move |msg| {
                    let Content::Command { args, .. } = &msg.content else {
                        return Err(CommandError::InvalidArgs("Usage: /sell <mint> <pct>".to_string()));
                    };
                    let (mint, pct) = parse_sell_args(args)?;
                    svc.submit_sell(msg.user_id(), &mint, pct)
                }),
        );
    }

    /// Execute the command a message carries. `Ok(None)` for
    /// non-command messages; argument errors come back as the reply.
    pub fn handle(&self, message: &Message) -> Result<Option<String>, CommandError> {
        let Content::Command { name, .. } = &message.content else {
            return Ok(None);
        };

        let cmd = self
            .registry
            .find(name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        match &cmd.handler {
            Some(handler) => match handler(message.clone()) {
                Ok(reply) => Ok(Some(reply)),
                // Usage errors go back to the chat, as the original bot did
                Err(CommandError::InvalidArgs(text)) => Ok(Some(text)),
                Err(e) => Err(e),
            },
            None => Ok(Some(format!("Command {} not implemented", cmd.name))),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

fn start_banner() -> String {
    let mut banner = "Scrapetech bot online.\nCommands:\n".to_string();
    for desc in command_menu() {
        banner.push_str(&format!("/{}\n", desc.command));
    }
    banner.trim_end().to_string()
}

fn help_text() -> String {
    let mut help = "Available commands:\n".to_string();
    for desc in command_menu() {
        help.push_str(&format!("/{} - {}\n", desc.command, desc.description));
    }
    help.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::infrastructure::database::Database;

    fn service() -> CommandService {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let trades = Arc::new(TradeService::new(db));
        let mut commands = CommandService::new("/");
        commands.register_menu(trades);
        commands
    }

    fn command(name: &str, args: &[&str]) -> Message {
        Message::from_command("7", name, args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn all_six_menu_commands_are_registered() {
        let svc = service();
        for desc in command_menu() {
            let reply = svc.handle(&command(&desc.command, &[])).unwrap();
            assert!(reply.is_some(), "/{} produced no reply", desc.command);
        }
    }

    #[test]
    fn unknown_command_is_an_error() {
        let svc = service();
        assert!(matches!(
            svc.handle(&command("status", &[])),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn start_lists_the_menu() {
        let svc = service();
        let reply = svc.handle(&command("start", &[])).unwrap().unwrap();
        assert!(reply.starts_with("Scrapetech bot online."));
        for desc in command_menu() {
            assert!(reply.contains(&format!("/{}", desc.command)));
        }
    }

    #[test]
    fn buy_without_args_replies_with_usage() {
        let svc = service();
        let reply = svc.handle(&command("buy", &[])).unwrap().unwrap();
        assert_eq!(reply, "Usage: /buy <mint> [sol]");
    }

    #[test]
    fn sell_with_bad_pct_replies_with_the_reason() {
        let svc = service();
        let reply = svc
            .handle(&command("sell", &["6t3pCmYLzLbhUDg4uSWnBsVbHaRCHKhvjjENzBQJpump", "150"]))
            .unwrap()
            .unwrap();
        assert_eq!(reply, "pct must be in (0,100]");
    }

    #[test]
    fn non_command_messages_are_ignored() {
        let svc = service();
        let msg = Message::from_text("7", "gm");
        assert!(svc.handle(&msg).unwrap().is_none());
    }
}
