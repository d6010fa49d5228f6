//! Trade orchestration: chat commands in, ledger and intent rows out.
//!
//! Chat-driven buys and sells are queued as trade intents; fills are
//! applied to the position ledger through `apply_fill` (the CLI `pos
//! apply` path). On-chain execution is out of scope here.

use std::sync::{Arc, Mutex};

use crate::application::errors::CommandError;
use crate::domain::entities::{Position, TradeSide};
use crate::infrastructure::database::Database;
use crate::infrastructure::detector;

pub struct TradeService {
    db: Arc<Mutex<Database>>,
}

impl TradeService {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    fn db(&self) -> std::sync::MutexGuard<'_, Database> {
        // A poisoned lock means another handler already panicked; there
        // is nothing sensible to salvage from the connection.
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a buy intent. `sol` falls back to the user's configured
    /// buy amount.
    pub fn submit_buy(&self, user_id: &str, mint: &str, sol: Option<f64>) -> Result<String, CommandError> {
        if !detector::is_plausible_mint(mint) {
            return Err(CommandError::InvalidArgs(format!("Not a valid mint address: {}", mint)));
        }

        let db = self.db();
        let settings = db
            .get_settings(user_id)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        let sol_in = sol.unwrap_or(settings.buy_amount_sol);

        let intent_id = db
            .insert_trade_intent(user_id, mint, TradeSide::Buy, Some(sol_in), None)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        tracing::info!(user = user_id, mint, sol_in, intent = %intent_id, "buy intent queued");
        Ok(format!("Buy submitted: {}", intent_id))
    }

    /// Queue a sell intent for `pct` percent of the held balance.
    pub fn submit_sell(&self, user_id: &str, mint: &str, pct: f64) -> Result<String, CommandError> {
        if !detector::is_plausible_mint(mint) {
            return Err(CommandError::InvalidArgs(format!("Not a valid mint address: {}", mint)));
        }

        let db = self.db();
        let position = db
            .get_position(user_id, mint)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let Some(position) = position.filter(|p| p.token_balance > 0.0) else {
            return Err(CommandError::InvalidArgs("No position balance found.".to_string()));
        };

        let tokens = position.token_balance * (pct / 100.0);
        let intent_id = db
            .insert_trade_intent(user_id, mint, TradeSide::Sell, None, Some(tokens))
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        tracing::info!(user = user_id, mint, tokens, intent = %intent_id, "sell intent queued");
        Ok(format!("Sell submitted: {}", intent_id))
    }

    /// Apply a fill to the ledger and record the trade.
    pub fn apply_fill(
        &self,
        user_id: &str,
        mint: &str,
        side: TradeSide,
        token_amount: f64,
        sol_amount: f64,
        tx_sig: Option<&str>,
    ) -> Result<Position, CommandError> {
        if token_amount <= 0.0 || sol_amount < 0.0 {
            return Err(CommandError::InvalidArgs(
                "token amount must be positive and sol amount non-negative".to_string(),
            ));
        }
        let db = self.db();
        let position = db
            .apply_trade(user_id, mint, side, token_amount, sol_amount, tx_sig)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        let filled = db
            .mark_oldest_intent_filled(user_id, mint, side)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        if let Some(intent_id) = filled {
            tracing::info!(user = user_id, mint, intent = %intent_id, "intent filled");
        }
        Ok(position)
    }

    /// Rendered /positions reply.
    pub fn positions_summary(&self, user_id: &str) -> Result<String, CommandError> {
        let rows = self
            .db()
            .list_positions(user_id)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        if rows.is_empty() {
            return Ok("No positions.".to_string());
        }
        let lines: Vec<String> = rows.iter().map(Position::summary).collect();
        Ok(lines.join("\n"))
    }

    /// Rendered /wallet reply.
    pub fn wallet_summary(&self, user_id: &str) -> Result<String, CommandError> {
        let pubkey = self
            .db()
            .wallet_get_pubkey(user_id)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        match pubkey {
            Some(pubkey) => Ok(format!("wallet={}", pubkey)),
            None => Ok("No wallet found. Use the CLI to create/import.".to_string()),
        }
    }
}
