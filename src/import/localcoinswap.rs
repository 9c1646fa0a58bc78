use std::collections::HashMap;

use crate::import::mapper::RowMapper;
use crate::import::parse::{parse_datetime_opt, parse_decimal_opt, parse_decimal_or_zero};
use crate::import::row::RawRow;
use crate::import::ImportError;
use crate::models::{NewTrade, Platform, TradeStatus, TradeType};

/// LocalCoinSwap trade-history CSV.
///
/// The export names both parties of every trade but never says which one is
/// the account owner, so `prepare` scans the whole sheet first: the value
/// appearing most often across the Buyer and Seller columns combined is taken
/// to be the importing user's username. Ties break to the first-encountered
/// value, which keeps re-imports deterministic. Per-row, the side the
/// username sits on decides buy vs sell.
pub struct LocalCoinSwapMapper {
    username: Option<String>,
}

impl LocalCoinSwapMapper {
    pub fn new() -> Self {
        LocalCoinSwapMapper { username: None }
    }

    fn infer_username(rows: &[RawRow]) -> Option<String> {
        // value -> (occurrences, first-seen order)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut order = 0usize;

        for row in rows {
            for column in ["Buyer", "Seller"] {
                if let Some(name) = row.get_nonblank(column) {
                    let entry = counts.entry(name.to_string()).or_insert_with(|| {
                        let slot = (0, order);
                        order += 1;
                        slot
                    });
                    entry.0 += 1;
                }
            }
        }

        counts
            .into_iter()
            .min_by_key(|(_, (count, first_seen))| (std::cmp::Reverse(*count), *first_seen))
            .map(|(name, _)| name)
    }
}

impl Default for LocalCoinSwapMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RowMapper for LocalCoinSwapMapper {
    fn platform(&self) -> Platform {
        Platform::Localcoinswap
    }

    fn prepare(&mut self, rows: &[RawRow]) -> Result<(), ImportError> {
        match Self::infer_username(rows) {
            Some(username) => {
                log::info!("LocalCoinSwap import: inferred username '{}'", username);
                self.username = Some(username);
                Ok(())
            }
            None => Err(ImportError::UsernameInference),
        }
    }

    fn map_row(&self, row: &RawRow, user_id: i64) -> Result<Option<NewTrade>, String> {
        let username = self
            .username
            .as_deref()
            .ok_or("Username inference has not run")?;

        let uuid = row.get_nonblank("UUID").unwrap_or_default().to_string();
        let buyer = row.get_nonblank("Buyer");
        let seller = row.get_nonblank("Seller");

        let (trade_type, counterparty) = if buyer == Some(username) {
            (TradeType::Buy, seller)
        } else if seller == Some(username) {
            (TradeType::Sell, buyer)
        } else {
            return Err("Username not found in Buyer or Seller columns".to_string());
        };

        let status = match row
            .get_nonblank("Status")
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("completed") => TradeStatus::Completed,
            _ => TradeStatus::Cancelled,
        };

        let time_created = row.get("Time created").and_then(parse_datetime_opt);
        let time_completed = row.get("Time completed").and_then(parse_datetime_opt);

        Ok(Some(NewTrade {
            user_id,
            platform: Platform::Localcoinswap,
            uuid,
            trade_type,
            counterparty: counterparty.map(str::to_string),
            status,
            crypto_amount: row.get("Crypto Amount").and_then(parse_decimal_opt),
            cryptocurrency: row.get_nonblank("Cryptocurrency").map(str::to_string),
            local_currency_amount: row
                .get("Local Currency Amount")
                .and_then(parse_decimal_opt),
            local_currency: row.get_nonblank("Local Currency").map(str::to_string),
            market_value: row.get("Market Value").and_then(parse_decimal_opt),
            trading_fee: parse_decimal_or_zero(row.get("Trading Fee").unwrap_or_default()),
            time_created,
            time_completed,
            offer_uuid: row.get_nonblank("Offer UUID").map(str::to_string),
        }))
    }

    fn row_label(&self, row: &RawRow, index: usize) -> String {
        row.get_nonblank("UUID")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}", index + 1))
    }
}
