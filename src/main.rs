use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

mod application;
mod domain;
mod infrastructure;

use application::errors::BotError;
use application::messaging::MessageParser;
use application::services::{CommandService, TradeService};
use domain::entities::TradeSide;
use domain::traits::Bot;
use infrastructure::adapters::telegram::{self, TelegramAdapter};
use infrastructure::config::{self, Settings};
use infrastructure::database::Database;
use infrastructure::launcher;

#[derive(Parser)]
#[command(name = "scrapetech")]
#[command(about = "Telegram trading assistant bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate the environment and start the bot
    Run,
    /// Publish the command menu to Telegram (one-shot)
    RegisterCommands,
    /// Wallet utilities
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },
    /// Position ledger utilities
    Pos {
        #[command(subcommand)]
        command: PosCommands,
    },
    /// Show the latest queued trade intents
    Intents {
        #[arg(short, default_value_t = 20)]
        n: usize,
    },
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Store a watch-only public key for a user
    Import {
        #[arg(long)]
        user: String,
        #[arg(long)]
        pubkey: String,
    },
    /// Show the stored public key
    Show {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
enum PosCommands {
    /// List positions for a user
    Show {
        #[arg(long)]
        user: String,
    },
    /// Apply a fill to the ledger
    Apply {
        #[arg(long)]
        user: String,
        #[arg(long)]
        mint: String,
        #[arg(long)]
        side: TradeSide,
        #[arg(long)]
        tokens: f64,
        #[arg(long)]
        sol: f64,
        #[arg(long)]
        tx: Option<String>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(),
        Commands::RegisterCommands => register_commands(),
        Commands::Wallet { command } => wallet_command(command),
        Commands::Pos { command } => pos_command(command),
        Commands::Intents { n } => intents_tail(n),
        Commands::Version => {
            println!("scrapetech v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Register the fixed command menu and print the raw API response.
fn register_commands() -> Result<(), BotError> {
    let token = config::resolve_bot_token()?;
    let body = telegram::register_commands_blocking(&token)?;
    println!("{}", body);
    Ok(())
}

fn open_db() -> Result<Arc<Mutex<Database>>, BotError> {
    let db_path = std::env::var(config::DB_PATH_VAR).unwrap_or_else(|_| "scrapetech.db".to_string());
    Ok(Arc::new(Mutex::new(Database::new(db_path)?)))
}

fn wallet_command(command: WalletCommands) -> Result<(), BotError> {
    let db = open_db()?;
    let db = db.lock().unwrap_or_else(|e| e.into_inner());
    match command {
        WalletCommands::Import { user, pubkey } => {
            if !infrastructure::detector::is_plausible_mint(&pubkey) {
                return Err(BotError::Parse(format!("not a base58 public key: {}", pubkey)));
            }
            db.wallet_set_pubkey(&user, &pubkey)?;
            println!("wallet={}", pubkey);
        }
        WalletCommands::Show { user } => match db.wallet_get_pubkey(&user)? {
            Some(pubkey) => println!("wallet={}", pubkey),
            None => println!("No wallet found."),
        },
    }
    Ok(())
}

fn pos_command(command: PosCommands) -> Result<(), BotError> {
    let db = open_db()?;
    let trades = TradeService::new(db);
    match command {
        PosCommands::Show { user } => {
            println!("{}", trades.positions_summary(&user)?);
        }
        PosCommands::Apply { user, mint, side, tokens, sol, tx } => {
            let position = trades.apply_fill(&user, &mint, side, tokens, sol, tx.as_deref())?;
            println!("{}", position.summary());
        }
    }
    Ok(())
}

fn intents_tail(n: usize) -> Result<(), BotError> {
    let db = open_db()?;
    let db = db.lock().unwrap_or_else(|e| e.into_inner());
    let intents = db.tail_trade_intents(n)?;
    if intents.is_empty() {
        println!("No trade intents.");
        return Ok(());
    }
    for intent in intents {
        println!(
            "{} | user={} | {} {} | sol={:?} tokens={:?} | {} | {}",
            intent.id,
            intent.telegram_user_id,
            intent.side,
            intent.mint,
            intent.requested_sol_amount,
            intent.requested_token_amount,
            intent.status,
            intent.created_at,
        );
    }
    Ok(())
}

/// Launcher handoff: activate the environment, then block on the bot
/// loop until the process is stopped.
fn run_bot() -> Result<(), BotError> {
    launcher::activate()?;

    let settings = Settings::from_env()?;
    tracing::info!("Starting scrapetech");

    let db = Arc::new(Mutex::new(Database::new(&settings.db_path)?));
    tracing::info!(path = %settings.db_path.display(), "Database initialized");

    let trades = Arc::new(TradeService::new(db));
    let mut commands = CommandService::new("/");
    commands.register_menu(trades);

    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(async {
        let mut bot = TelegramAdapter::new(settings.bot_token.clone());
        run_telegram_bot(&mut bot, &commands, settings.poll_timeout_secs as i64).await;
    });
    Ok(())
}

async fn run_telegram_bot(bot: &mut TelegramAdapter, commands: &CommandService, timeout_seconds: i64) {
    use domain::entities::User;

    if let Err(e) = bot.fetch_bot_info().await {
        tracing::error!("Failed to fetch bot info: {}", e);
        return;
    }

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let parser = MessageParser::new(commands.prefix());
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    offset = TelegramAdapter::get_next_offset(&updates);
                }
                for update in &updates {
                    let Some(msg) = &update.message else { continue };
                    let Some(text) = msg.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
                        continue;
                    };

                    let chat_id = msg.chat.id.to_string();
                    let sender = msg.from.as_ref().map(|u| {
                        let mut user = User::new(u.id.to_string());
                        if let Some(ref username) = u.username {
                            user = user.with_username(username.clone());
                        }
                        user
                    });

                    let message = parser.parse(chat_id.clone(), text, sender);
                    let reply = match commands.handle(&message) {
                        Ok(Some(reply)) => reply,
                        Ok(None) => continue,
                        Err(application::errors::CommandError::NotFound(name)) => {
                            tracing::debug!(command = name, "ignoring unknown command");
                            continue;
                        }
                        Err(e) => format!("Error: {}", e),
                    };

                    if let Err(e) = bot.send_message(&chat_id, &reply).await {
                        tracing::error!("Failed to send reply to {}: {}", chat_id, e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("getUpdates failed: {}", e);
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            }
        }
    }
}
