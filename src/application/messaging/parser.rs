//! Message parser - Parses raw messages into structured messages

use crate::application::errors::CommandError;
use crate::domain::entities::{Content, Message, User};

/// Parses incoming chat text into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, text, sender);
        }

        Message::new(chat_id, Content::Text(text)).with_sender_opt(sender)
    }

    fn parse_command(&self, chat_id: String, text: String, sender: Option<User>) -> Message {
        let cmd_text = text.trim_start_matches(&self.command_prefix);

        let parts: Vec<&str> = cmd_text.split_whitespace().collect();
        let name = parts.first().unwrap_or(&"").to_string();
        // Telegram appends @botname to commands in groups
        let name = name.split('@').next().unwrap_or("").to_string();
        let args = parts.get(1..).unwrap_or(&[]).iter().map(|s| s.to_string()).collect();

        Message::new(chat_id, Content::Command { name, args }).with_sender_opt(sender)
    }
}

/// `/buy <mint> [sol]` — mint required, SOL amount optional (defaults to
/// the user's configured buy amount).
pub fn parse_buy_args(args: &[String]) -> Result<(String, Option<f64>), CommandError> {
    let usage = || CommandError::InvalidArgs("Usage: /buy <mint> [sol]".to_string());
    let mint = args.first().ok_or_else(usage)?.trim().to_string();
    if mint.is_empty() {
        return Err(usage());
    }
    let sol = match args.get(1) {
        Some(raw) => Some(raw.parse::<f64>().map_err(|_| usage())?),
        None => None,
    };
    if matches!(sol, Some(s) if s <= 0.0) {
        return Err(CommandError::InvalidArgs("sol must be positive".to_string()));
    }
    Ok((mint, sol))
}

/// `/sell <mint> <pct>` — pct must be in (0, 100].
pub fn parse_sell_args(args: &[String]) -> Result<(String, f64), CommandError> {
    let usage = || CommandError::InvalidArgs("Usage: /sell <mint> <pct>".to_string());
    let mint = args.first().ok_or_else(usage)?.trim().to_string();
    let pct = args
        .get(1)
        .ok_or_else(usage)?
        .parse::<f64>()
        .map_err(|_| usage())?;
    if pct <= 0.0 || pct > 100.0 {
        return Err(CommandError::InvalidArgs("pct must be in (0,100]".to_string()));
    }
    Ok((mint, pct))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_args() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "/buy mintAddr 0.25", None);
        match msg.content {
            Content::Command { name, args } => {
                assert_eq!(name, "buy");
                assert_eq!(args, vec!["mintAddr", "0.25"]);
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn strips_bot_mention_from_command_name() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "/positions@scrapetech_bot", None);
        match msg.content {
            Content::Command { name, args } => {
                assert_eq!(name, "positions");
                assert!(args.is_empty());
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn plain_text_is_not_a_command() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "gm", None);
        assert!(!msg.content.is_command());
    }

    #[test]
    fn buy_args_require_a_mint() {
        assert!(parse_buy_args(&[]).is_err());
        let (mint, sol) = parse_buy_args(&["abc".to_string()]).unwrap();
        assert_eq!(mint, "abc");
        assert!(sol.is_none());
    }

    #[test]
    fn buy_args_accept_optional_sol_amount() {
        let args = vec!["abc".to_string(), "0.75".to_string()];
        let (_, sol) = parse_buy_args(&args).unwrap();
        assert_eq!(sol, Some(0.75));
        assert!(parse_buy_args(&["abc".to_string(), "nope".to_string()]).is_err());
        assert!(parse_buy_args(&["abc".to_string(), "-1".to_string()]).is_err());
    }

    #[test]
    fn sell_pct_must_be_in_range() {
        let ok = vec!["abc".to_string(), "50".to_string()];
        assert_eq!(parse_sell_args(&ok).unwrap().1, 50.0);
        for bad in ["0", "-5", "101"] {
            let args = vec!["abc".to_string(), bad.to_string()];
            assert!(parse_sell_args(&args).is_err(), "pct {} should fail", bad);
        }
    }
}
