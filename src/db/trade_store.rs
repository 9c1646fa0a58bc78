use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{Database, StoreError};
use crate::import::parse::{parse_datetime_opt, parse_decimal_opt};
use crate::models::{NewTrade, Platform, Trade, TradeFilters, TradeStatus, TradeType};

/// Result of attempting to persist a trade draft. A storage-level unique
/// constraint violation on (user_id, platform, uuid) surfaces as `Duplicate`
/// so a concurrent import that lost the race is handled like a pre-check skip.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(i64),
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_profit: Decimal,
    pub completed_trades: usize,
    pub unique_counterparties: usize,
    pub platforms: Vec<String>,
    pub average_margin: Decimal,
}

/// Fields the inline-edit path is allowed to touch. Everything else requires
/// the full edit form, which re-validates.
const EDITABLE_FIELDS: [&str; 11] = [
    "platform",
    "trade_type",
    "status",
    "counterparty",
    "cryptocurrency",
    "crypto_amount",
    "local_currency",
    "local_currency_amount",
    "market_value",
    "trading_fee",
    "time_created",
];

const TRADE_COLUMNS: &str = "id, user_id, platform, uuid, trade_type, counterparty, status, \
     crypto_amount, cryptocurrency, local_currency_amount, local_currency, \
     market_value, trading_fee, time_created, time_completed, offer_uuid, \
     created_at, updated_at";

pub struct TradeStore<'a> {
    db: &'a Database,
}

impl<'a> TradeStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        TradeStore { db }
    }

    /// Existence pre-check on the idempotency key. An optimization only: the
    /// unique index is the authoritative guard.
    pub fn exists(&self, user_id: i64, platform: Platform, uuid: &str) -> Result<bool, StoreError> {
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM trades WHERE user_id = ? AND platform = ? AND uuid = ?)",
            rusqlite::params![user_id, platform.as_str(), uuid],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn insert(&self, trade: &NewTrade) -> Result<InsertOutcome, StoreError> {
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let now = Utc::now().to_rfc3339();

        let result = conn.execute(
            "INSERT INTO trades (
                user_id, platform, uuid, trade_type, counterparty, status,
                crypto_amount, cryptocurrency, local_currency_amount, local_currency,
                market_value, trading_fee, time_created, time_completed, offer_uuid,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                trade.user_id,
                trade.platform.as_str(),
                trade.uuid,
                trade.trade_type.as_str(),
                trade.counterparty,
                trade.status.as_str(),
                trade.crypto_amount.map(|d| d.to_string()),
                trade.cryptocurrency,
                trade.local_currency_amount.map(|d| d.to_string()),
                trade.local_currency,
                trade.market_value.map(|d| d.to_string()),
                trade.trading_fee.to_string(),
                trade.time_created.map(|t| t.to_rfc3339()),
                trade.time_completed.map(|t| t.to_rfc3339()),
                trade.offer_uuid,
                now,
                now,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Blank row for the quick-create path in the listing UI. Bypasses
    /// validation deliberately; the user fills the cells in afterwards.
    pub fn insert_blank(&self, user_id: i64) -> Result<i64, StoreError> {
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO trades (
                user_id, platform, uuid, trade_type, counterparty, status,
                crypto_amount, cryptocurrency, local_currency_amount, local_currency,
                market_value, trading_fee, time_created, time_completed, offer_uuid,
                created_at, updated_at
            ) VALUES (?, 'private', ?, 'sell', NULL, 'COMPLETED',
                      '0', 'USDT', '0', 'USD', '0', '0', ?, ?, NULL, ?, ?)",
            rusqlite::params![user_id, uuid::Uuid::new_v4().to_string(), now, now, now, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(&self, user_id: i64, trade_id: i64) -> Result<Trade, StoreError> {
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let query = format!(
            "SELECT {} FROM trades WHERE id = ? AND user_id = ?",
            TRADE_COLUMNS
        );
        conn.query_row(&query, rusqlite::params![trade_id, user_id], map_row_to_trade)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Database(other),
            })
    }

    pub fn list(&self, user_id: i64, filters: &TradeFilters) -> Result<Vec<Trade>, StoreError> {
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;

        let mut query = format!("SELECT {} FROM trades WHERE user_id = ?", TRADE_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(platform) = filters.platform {
            query.push_str(" AND platform = ?");
            params.push(Box::new(platform.as_str()));
        }
        if let Some(trade_type) = filters.trade_type {
            query.push_str(" AND trade_type = ?");
            params.push(Box::new(trade_type.as_str()));
        }
        if let Some(status) = filters.status {
            query.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        query.push_str(" ORDER BY time_completed DESC");

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query)?;
        let trades = stmt
            .query_map(param_refs.as_slice(), map_row_to_trade)?
            .collect::<Result<Vec<Trade>, _>>()?;
        Ok(trades)
    }

    /// Scoped single-field edit used by the inline-edit UI. Bypasses full
    /// validation; when the status flips to COMPLETED and no completion time
    /// is set, time_created is copied over.
    pub fn update_field(
        &self,
        user_id: i64,
        trade_id: i64,
        field: &str,
        value: &str,
    ) -> Result<Trade, StoreError> {
        if !EDITABLE_FIELDS.contains(&field) {
            return Err(StoreError::InvalidField(field.to_string()));
        }

        let stored: Option<String> = match field {
            "crypto_amount" | "local_currency_amount" | "market_value" | "trading_fee" => {
                parse_decimal_opt(value).map(|d| d.to_string())
            }
            "time_created" => parse_datetime_opt(value).map(|t| t.to_rfc3339()),
            _ => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        };

        {
            let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;
            let query = format!(
                "UPDATE trades SET {} = ?, updated_at = ? WHERE id = ? AND user_id = ?",
                field
            );
            let changed = conn.execute(
                &query,
                rusqlite::params![stored, Utc::now().to_rfc3339(), trade_id, user_id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }

            if field == "status" && stored.as_deref() == Some("COMPLETED") {
                conn.execute(
                    "UPDATE trades SET time_completed = time_created
                     WHERE id = ? AND user_id = ? AND time_completed IS NULL",
                    rusqlite::params![trade_id, user_id],
                )?;
            }
        }

        self.get(user_id, trade_id)
    }

    pub fn delete(&self, user_id: i64, trade_id: i64) -> Result<(), StoreError> {
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let deleted = conn.execute(
            "DELETE FROM trades WHERE id = ? AND user_id = ?",
            rusqlite::params![trade_id, user_id],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Dashboard aggregates. Profit and margin are derived, not stored, so the
    /// completed set is loaded and folded here.
    pub fn stats(&self, user_id: i64) -> Result<TradeStats, StoreError> {
        let completed = self.list(
            user_id,
            &TradeFilters {
                status: Some(TradeStatus::Completed),
                ..Default::default()
            },
        )?;

        let total_profit: Decimal = completed.iter().map(|t| t.profit()).sum();
        let mut counterparties: Vec<&str> = completed
            .iter()
            .filter_map(|t| t.counterparty.as_deref())
            .filter(|c| !c.is_empty())
            .collect();
        counterparties.sort_unstable();
        counterparties.dedup();

        let average_margin = if completed.is_empty() {
            Decimal::ZERO
        } else {
            (completed.iter().map(|t| t.margin()).sum::<Decimal>()
                / Decimal::from(completed.len() as i64))
            .round_dp(2)
        };

        let all = self.list(user_id, &TradeFilters::default())?;
        let mut platforms: Vec<String> = all.iter().map(|t| t.platform.to_string()).collect();
        platforms.sort_unstable();
        platforms.dedup();

        Ok(TradeStats {
            total_profit,
            completed_trades: completed.len(),
            unique_counterparties: counterparties.len(),
            platforms,
            average_margin,
        })
    }
}

fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: Platform::from_str_opt(&row.get::<_, String>(2)?)
            .unwrap_or(Platform::Private),
        uuid: row.get(3)?,
        trade_type: TradeType::from_str_opt(&row.get::<_, String>(4)?)
            .unwrap_or(TradeType::Buy),
        counterparty: row.get(5)?,
        status: TradeStatus::from_str_opt(&row.get::<_, String>(6)?)
            .unwrap_or(TradeStatus::Cancelled),
        crypto_amount: get_decimal(row, 7)?,
        cryptocurrency: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        local_currency_amount: get_decimal(row, 9)?,
        local_currency: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        market_value: get_decimal(row, 11)?,
        trading_fee: get_decimal(row, 12)?,
        time_created: get_datetime(row, 13)?,
        time_completed: get_datetime(row, 14)?,
        offer_uuid: row.get(15)?,
        created_at: get_datetime(row, 16)?.unwrap_or_else(Utc::now),
        updated_at: get_datetime(row, 17)?.unwrap_or_else(Utc::now),
    })
}

fn get_decimal(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw
        .and_then(|s| s.parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO))
}

fn get_datetime(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}
