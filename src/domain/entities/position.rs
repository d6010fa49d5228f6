use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Token balances below this are treated as a closed position.
const DUST_BALANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(TradeSide::Buy),
            "SELL" => Ok(TradeSide::Sell),
            other => Err(format!("unknown trade side: {}", other)),
        }
    }
}

/// A per-user, per-mint position ledger entry.
///
/// `avg_entry_sol` is the weighted average cost in SOL per token of the
/// currently held balance; `realized_pnl_sol` accumulates on sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub mint: String,
    pub token_balance: f64,
    pub avg_entry_sol: f64,
    pub realized_pnl_sol: f64,
    pub open: bool,
}

impl Position {
    pub fn new(mint: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            token_balance: 0.0,
            avg_entry_sol: 0.0,
            realized_pnl_sol: 0.0,
            open: false,
        }
    }

    /// Apply a fill to the position. Buys fold the SOL spent into the
    /// weighted average entry; sells realize PnL against that average.
    /// Sells are clamped to the held balance.
    pub fn apply(&mut self, side: TradeSide, token_amount: f64, sol_amount: f64) {
        match side {
            TradeSide::Buy => {
                let new_balance = self.token_balance + token_amount;
                if new_balance > DUST_BALANCE {
                    self.avg_entry_sol =
                        (self.avg_entry_sol * self.token_balance + sol_amount) / new_balance;
                }
                self.token_balance = new_balance;
                self.open = self.token_balance > DUST_BALANCE;
            }
            TradeSide::Sell => {
                let sold = token_amount.min(self.token_balance);
                self.realized_pnl_sol += sol_amount - sold * self.avg_entry_sol;
                self.token_balance -= sold;
                if self.token_balance <= DUST_BALANCE {
                    self.token_balance = 0.0;
                    self.open = false;
                }
            }
        }
    }

    /// One-line rendering used by /positions, matching the ledger fields.
    pub fn summary(&self) -> String {
        format!(
            "{} | tokens={} | avg_entry={} | pnl={} | open={}",
            self.mint,
            self.token_balance,
            self.avg_entry_sol,
            self.realized_pnl_sol,
            if self.open { 1 } else { 0 },
        )
    }
}

/// Per-user trade settings with the stock defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSettings {
    pub buy_amount_sol: f64,
    pub buy_slippage_pct: f64,
    pub sell_slippage_pct: f64,
    pub tp_sl_enabled: bool,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            buy_amount_sol: 0.5,
            buy_slippage_pct: 20.0,
            sell_slippage_pct: 20.0,
            tp_sl_enabled: true,
            take_profit_pct: 30.0,
            stop_loss_pct: 20.0,
        }
    }
}
