//! SQLite store: users, wallets, trade settings, the position ledger,
//! trades and queued trade intents.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::application::errors::StorageError;
use crate::domain::entities::{Position, TradeSettings, TradeSide};

/// A recorded fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub id: String,
    pub mint: String,
    pub side: String,
    pub token_amount: f64,
    pub sol_amount: f64,
    pub tx_sig: Option<String>,
    pub created_at: String,
}

/// A queued buy or sell awaiting a fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIntentRow {
    pub id: String,
    pub telegram_user_id: String,
    pub mint: String,
    pub side: String,
    pub requested_sol_amount: Option<f64>,
    pub requested_token_amount: Option<f64>,
    pub status: String,
    pub created_at: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self { conn };
        db.init_tables()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_tables()?;
        Ok(db)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telegram_user_id TEXT UNIQUE NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS wallets (
                user_id INTEGER PRIMARY KEY,
                pubkey TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS user_settings (
                user_id INTEGER PRIMARY KEY,
                buy_amount_sol REAL NOT NULL DEFAULT 0.5,
                buy_slippage_pct REAL NOT NULL DEFAULT 20.0,
                sell_slippage_pct REAL NOT NULL DEFAULT 20.0,
                tp_sl_enabled INTEGER NOT NULL DEFAULT 1,
                take_profit_pct REAL NOT NULL DEFAULT 30.0,
                stop_loss_pct REAL NOT NULL DEFAULT 20.0,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                mint TEXT NOT NULL,
                token_balance REAL NOT NULL DEFAULT 0,
                avg_entry_sol REAL NOT NULL DEFAULT 0,
                realized_pnl_sol REAL NOT NULL DEFAULT 0,
                open INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, mint),
                FOREIGN KEY(user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                mint TEXT NOT NULL,
                side TEXT NOT NULL,
                token_amount REAL NOT NULL,
                sol_amount REAL NOT NULL,
                tx_sig TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS trade_intents (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                mint TEXT NOT NULL,
                side TEXT NOT NULL,
                requested_sol_amount REAL,
                requested_token_amount REAL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_positions_user ON positions(user_id)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trades_user_mint ON trades(user_id, mint)",
            [],
        )?;

        Ok(())
    }

    pub fn get_or_create_user(&self, telegram_user_id: &str) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (telegram_user_id) VALUES (?1)",
            [telegram_user_id],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM users WHERE telegram_user_id = ?1",
            [telegram_user_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // Wallets (watch-only: public key custody lives outside the bot)

    pub fn wallet_set_pubkey(&self, telegram_user_id: &str, pubkey: &str) -> Result<(), StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        self.conn.execute(
            "INSERT INTO wallets (user_id, pubkey) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET
                pubkey = excluded.pubkey,
                updated_at = CURRENT_TIMESTAMP",
            params![user_id, pubkey],
        )?;
        Ok(())
    }

    pub fn wallet_get_pubkey(&self, telegram_user_id: &str) -> Result<Option<String>, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        let pubkey = self
            .conn
            .query_row("SELECT pubkey FROM wallets WHERE user_id = ?1", [user_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(pubkey)
    }

    // Trade settings

    fn ensure_settings(&self, user_id: i64) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_settings (user_id) VALUES (?1)",
            [user_id],
        )?;
        Ok(())
    }

    pub fn get_settings(&self, telegram_user_id: &str) -> Result<TradeSettings, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        self.ensure_settings(user_id)?;
        let settings = self.conn.query_row(
            "SELECT buy_amount_sol, buy_slippage_pct, sell_slippage_pct,
                    tp_sl_enabled, take_profit_pct, stop_loss_pct
             FROM user_settings WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(TradeSettings {
                    buy_amount_sol: row.get(0)?,
                    buy_slippage_pct: row.get(1)?,
                    sell_slippage_pct: row.get(2)?,
                    tp_sl_enabled: row.get::<_, i64>(3)? != 0,
                    take_profit_pct: row.get(4)?,
                    stop_loss_pct: row.get(5)?,
                })
            },
        )?;
        Ok(settings)
    }

    pub fn set_settings(&self, telegram_user_id: &str, settings: &TradeSettings) -> Result<(), StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        self.ensure_settings(user_id)?;
        self.conn.execute(
            "UPDATE user_settings SET
                buy_amount_sol = ?1,
                buy_slippage_pct = ?2,
                sell_slippage_pct = ?3,
                tp_sl_enabled = ?4,
                take_profit_pct = ?5,
                stop_loss_pct = ?6,
                updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ?7",
            params![
                settings.buy_amount_sol,
                settings.buy_slippage_pct,
                settings.sell_slippage_pct,
                settings.tp_sl_enabled as i64,
                settings.take_profit_pct,
                settings.stop_loss_pct,
                user_id
            ],
        )?;
        Ok(())
    }

    // Position ledger

    pub fn get_position(&self, telegram_user_id: &str, mint: &str) -> Result<Option<Position>, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        let position = self
            .conn
            .query_row(
                "SELECT mint, token_balance, avg_entry_sol, realized_pnl_sol, open
                 FROM positions WHERE user_id = ?1 AND mint = ?2",
                params![user_id, mint],
                Self::row_to_position,
            )
            .optional()?;
        Ok(position)
    }

    pub fn list_positions(&self, telegram_user_id: &str) -> Result<Vec<Position>, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT mint, token_balance, avg_entry_sol, realized_pnl_sol, open
             FROM positions WHERE user_id = ?1 ORDER BY mint",
        )?;
        let rows = stmt.query_map([user_id], Self::row_to_position)?;

        let mut positions = Vec::new();
        for position in rows {
            positions.push(position?);
        }
        Ok(positions)
    }

    fn row_to_position(row: &rusqlite::Row<'_>) -> rusqlite::Result<Position> {
        Ok(Position {
            mint: row.get(0)?,
            token_balance: row.get(1)?,
            avg_entry_sol: row.get(2)?,
            realized_pnl_sol: row.get(3)?,
            open: row.get::<_, i64>(4)? != 0,
        })
    }

    /// Apply a fill: update the ledger entry and record the trade.
    pub fn apply_trade(
        &self,
        telegram_user_id: &str,
        mint: &str,
        side: TradeSide,
        token_amount: f64,
        sol_amount: f64,
        tx_sig: Option<&str>,
    ) -> Result<Position, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;

        let mut position = self
            .get_position(telegram_user_id, mint)?
            .unwrap_or_else(|| Position::new(mint));
        position.apply(side, token_amount, sol_amount);

        self.conn.execute(
            "INSERT INTO positions (user_id, mint, token_balance, avg_entry_sol, realized_pnl_sol, open)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, mint) DO UPDATE SET
                token_balance = excluded.token_balance,
                avg_entry_sol = excluded.avg_entry_sol,
                realized_pnl_sol = excluded.realized_pnl_sol,
                open = excluded.open,
                updated_at = CURRENT_TIMESTAMP",
            params![
                user_id,
                mint,
                position.token_balance,
                position.avg_entry_sol,
                position.realized_pnl_sol,
                position.open as i64
            ],
        )?;

        self.conn.execute(
            "INSERT INTO trades (id, user_id, mint, side, token_amount, sol_amount, tx_sig)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid::Uuid::new_v4().to_string(),
                user_id,
                mint,
                side.as_str(),
                token_amount,
                sol_amount,
                tx_sig
            ],
        )?;

        Ok(position)
    }

    pub fn list_trades(&self, telegram_user_id: &str, mint: &str) -> Result<Vec<TradeRow>, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, mint, side, token_amount, sol_amount, tx_sig, created_at
             FROM trades WHERE user_id = ?1 AND mint = ?2 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![user_id, mint], |row| {
            Ok(TradeRow {
                id: row.get(0)?,
                mint: row.get(1)?,
                side: row.get(2)?,
                token_amount: row.get(3)?,
                sol_amount: row.get(4)?,
                tx_sig: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        let mut trades = Vec::new();
        for trade in rows {
            trades.push(trade?);
        }
        Ok(trades)
    }

    // Trade intents

    pub fn insert_trade_intent(
        &self,
        telegram_user_id: &str,
        mint: &str,
        side: TradeSide,
        requested_sol: Option<f64>,
        requested_tokens: Option<f64>,
    ) -> Result<String, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO trade_intents (id, user_id, mint, side, requested_sol_amount, requested_token_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, user_id, mint, side.as_str(), requested_sol, requested_tokens],
        )?;
        Ok(id)
    }

    /// Mark the oldest PENDING intent matching a fill as FILLED.
    /// Returns the intent id when one was transitioned.
    pub fn mark_oldest_intent_filled(
        &self,
        telegram_user_id: &str,
        mint: &str,
        side: TradeSide,
    ) -> Result<Option<String>, StorageError> {
        let user_id = self.get_or_create_user(telegram_user_id)?;
        let intent_id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM trade_intents
                 WHERE user_id = ?1 AND mint = ?2 AND side = ?3 AND status = 'PENDING'
                 ORDER BY created_at, rowid LIMIT 1",
                params![user_id, mint, side.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(ref id) = intent_id {
            self.update_intent_status(id, "FILLED")?;
        }
        Ok(intent_id)
    }

    pub fn update_intent_status(&self, intent_id: &str, status: &str) -> Result<bool, StorageError> {
        let rows = self.conn.execute(
            "UPDATE trade_intents SET status = ?1 WHERE id = ?2",
            params![status, intent_id],
        )?;
        Ok(rows > 0)
    }

    pub fn tail_trade_intents(&self, n: usize) -> Result<Vec<TradeIntentRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT ti.id, u.telegram_user_id, ti.mint, ti.side,
                    ti.requested_sol_amount, ti.requested_token_amount, ti.status, ti.created_at
             FROM trade_intents ti
             JOIN users u ON u.id = ti.user_id
             ORDER BY ti.created_at DESC, ti.rowid DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([n as i64], |row| {
            Ok(TradeIntentRow {
                id: row.get(0)?,
                telegram_user_id: row.get(1)?,
                mint: row.get(2)?,
                side: row.get(3)?,
                requested_sol_amount: row.get(4)?,
                requested_token_amount: row.get(5)?,
                status: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;

        let mut intents = Vec::new();
        for intent in rows {
            intents.push(intent?);
        }
        Ok(intents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT: &str = "6t3pCmYLzLbhUDg4uSWnBsVbHaRCHKhvjjENzBQJpump";

    #[test]
    fn users_are_created_once() {
        let db = Database::open_in_memory().unwrap();
        let a = db.get_or_create_user("7").unwrap();
        let b = db.get_or_create_user("7").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, db.get_or_create_user("8").unwrap());
    }

    #[test]
    fn wallet_pubkey_round_trips_and_overwrites() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.wallet_get_pubkey("7").unwrap().is_none());
        db.wallet_set_pubkey("7", "first").unwrap();
        db.wallet_set_pubkey("7", "second").unwrap();
        assert_eq!(db.wallet_get_pubkey("7").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn settings_start_at_the_defaults() {
        let db = Database::open_in_memory().unwrap();
        let settings = db.get_settings("7").unwrap();
        assert_eq!(settings, TradeSettings::default());
    }

    #[test]
    fn settings_updates_persist() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = db.get_settings("7").unwrap();
        settings.buy_amount_sol = 1.25;
        settings.tp_sl_enabled = false;
        db.set_settings("7", &settings).unwrap();
        assert_eq!(db.get_settings("7").unwrap(), settings);
    }

    #[test]
    fn apply_trade_builds_and_closes_a_position() {
        let db = Database::open_in_memory().unwrap();
        let pos = db.apply_trade("7", MINT, TradeSide::Buy, 1000.0, 0.5, Some("sig1")).unwrap();
        assert!(pos.open);
        assert_eq!(pos.token_balance, 1000.0);

        let pos = db.apply_trade("7", MINT, TradeSide::Sell, 1000.0, 0.9, Some("sig2")).unwrap();
        assert!(!pos.open);
        assert_eq!(pos.token_balance, 0.0);
        assert!((pos.realized_pnl_sol - 0.4).abs() < 1e-9);

        let trades = db.list_trades("7", MINT).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, "BUY");
        assert_eq!(trades[1].side, "SELL");
    }

    #[test]
    fn positions_are_scoped_per_user() {
        let db = Database::open_in_memory().unwrap();
        db.apply_trade("7", MINT, TradeSide::Buy, 10.0, 0.1, None).unwrap();
        assert_eq!(db.list_positions("7").unwrap().len(), 1);
        assert!(db.list_positions("8").unwrap().is_empty());
    }

    #[test]
    fn intents_tail_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_trade_intent("7", MINT, TradeSide::Buy, Some(0.5), None).unwrap();
        let second = db.insert_trade_intent("7", MINT, TradeSide::Sell, None, Some(500.0)).unwrap();

        let tail = db.tail_trade_intents(10).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].id, second);
        assert_eq!(tail[1].id, first);
        assert_eq!(tail[0].status, "PENDING");
    }

    #[test]
    fn fills_consume_pending_intents_oldest_first() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_trade_intent("7", MINT, TradeSide::Buy, Some(0.5), None).unwrap();
        let second = db.insert_trade_intent("7", MINT, TradeSide::Buy, Some(0.5), None).unwrap();

        assert_eq!(db.mark_oldest_intent_filled("7", MINT, TradeSide::Buy).unwrap(), Some(first));
        assert_eq!(db.mark_oldest_intent_filled("7", MINT, TradeSide::Buy).unwrap(), Some(second));
        assert_eq!(db.mark_oldest_intent_filled("7", MINT, TradeSide::Buy).unwrap(), None);

        // Sells and other users are untouched
        db.insert_trade_intent("8", MINT, TradeSide::Sell, None, Some(10.0)).unwrap();
        assert_eq!(db.mark_oldest_intent_filled("7", MINT, TradeSide::Sell).unwrap(), None);
    }

    #[test]
    fn intent_status_updates_by_id() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_trade_intent("7", MINT, TradeSide::Buy, Some(0.5), None).unwrap();
        assert!(db.update_intent_status(&id, "FILLED").unwrap());
        assert!(!db.update_intent_status("nope", "FILLED").unwrap());
        assert_eq!(db.tail_trade_intents(1).unwrap()[0].status, "FILLED");
    }
}
