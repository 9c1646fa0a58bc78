use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange platforms whose trade-history exports the importer understands,
/// plus `Private` for manually entered trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Localcoinswap,
    Binance,
    Bybit,
    Kucoin,
    Okx,
    Private,
}

impl Platform {
    /// Platforms an import file can be detected as.
    pub const SUPPORTED: [Platform; 5] = [
        Platform::Localcoinswap,
        Platform::Binance,
        Platform::Bybit,
        Platform::Kucoin,
        Platform::Okx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Localcoinswap => "localcoinswap",
            Platform::Binance => "binance",
            Platform::Bybit => "bybit",
            Platform::Kucoin => "kucoin",
            Platform::Okx => "okx",
            Platform::Private => "private",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Platform> {
        match s {
            "localcoinswap" => Some(Platform::Localcoinswap),
            "binance" => Some(Platform::Binance),
            "bybit" => Some(Platform::Bybit),
            "kucoin" => Some(Platform::Kucoin),
            "okx" => Some(Platform::Okx),
            "private" => Some(Platform::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the trade from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<TradeType> {
        match s {
            "buy" => Some(TradeType::Buy),
            "sell" => Some(TradeType::Sell),
            _ => None,
        }
    }
}

/// Normalized trade status. Platform vocabularies ("DONE", "Fulfilled",
/// "System Cancelled", ...) collapse into these two; anything unrecognized
/// becomes Cancelled so a completed state is never invented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Completed => "COMPLETED",
            TradeStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<TradeStatus> {
        match s {
            "COMPLETED" => Some(TradeStatus::Completed),
            "CANCELLED" => Some(TradeStatus::Cancelled),
            _ => None,
        }
    }
}

/// A persisted P2P trade in the canonical schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub user_id: i64,
    pub platform: Platform,
    /// Platform-native order identifier; unique per (user, platform).
    pub uuid: String,
    pub trade_type: TradeType,
    pub counterparty: Option<String>,
    pub status: TradeStatus,
    pub crypto_amount: Decimal,
    pub cryptocurrency: String,
    pub local_currency_amount: Decimal,
    pub local_currency: String,
    pub market_value: Decimal,
    pub trading_fee: Decimal,
    pub time_created: Option<DateTime<Utc>>,
    pub time_completed: Option<DateTime<Utc>>,
    pub offer_uuid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Profit against the market-value baseline. Zero unless the trade
    /// completed: a cancelled trade moved no money.
    pub fn profit(&self) -> Decimal {
        if self.status != TradeStatus::Completed {
            return Decimal::ZERO;
        }
        match self.trade_type {
            // Bought crypto below its market value
            TradeType::Buy => self.market_value - self.local_currency_amount - self.trading_fee,
            // Sold crypto above its market value
            TradeType::Sell => self.local_currency_amount - self.market_value - self.trading_fee,
        }
    }

    /// Profit as a percentage of the fiat amount exchanged, rounded to 2 dp.
    pub fn margin(&self) -> Decimal {
        if self.local_currency_amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.profit() / self.local_currency_amount * Decimal::from(100)).round_dp(2)
    }
}

/// A trade draft produced by a row mapper or the manual-entry path, not yet
/// validated or persisted. Required amounts are optional here: a mapper that
/// could not parse a cell leaves the field absent and validation reports it.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub user_id: i64,
    pub platform: Platform,
    pub uuid: String,
    pub trade_type: TradeType,
    pub counterparty: Option<String>,
    pub status: TradeStatus,
    pub crypto_amount: Option<Decimal>,
    pub cryptocurrency: Option<String>,
    pub local_currency_amount: Option<Decimal>,
    pub local_currency: Option<String>,
    pub market_value: Option<Decimal>,
    pub trading_fee: Decimal,
    pub time_created: Option<DateTime<Utc>>,
    pub time_completed: Option<DateTime<Utc>>,
    pub offer_uuid: Option<String>,
}

impl NewTrade {
    /// Field-level validation mirroring the storage invariants. Returns every
    /// failure so the import report can show them all on one line.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.uuid.trim().is_empty() {
            errors.push("Uuid can't be blank".to_string());
        }

        match self.crypto_amount {
            None => errors.push("Crypto amount can't be blank".to_string()),
            Some(v) if v <= Decimal::ZERO => {
                errors.push("Crypto amount must be greater than 0".to_string())
            }
            _ => {}
        }
        if self.cryptocurrency.as_deref().map_or(true, |s| s.trim().is_empty()) {
            errors.push("Cryptocurrency can't be blank".to_string());
        }
        match self.local_currency_amount {
            None => errors.push("Local currency amount can't be blank".to_string()),
            Some(v) if v <= Decimal::ZERO => {
                errors.push("Local currency amount must be greater than 0".to_string())
            }
            _ => {}
        }
        if self.local_currency.as_deref().map_or(true, |s| s.trim().is_empty()) {
            errors.push("Local currency can't be blank".to_string());
        }
        match self.market_value {
            None => errors.push("Market value can't be blank".to_string()),
            Some(v) if v <= Decimal::ZERO => {
                errors.push("Market value must be greater than 0".to_string())
            }
            _ => {}
        }
        if self.trading_fee < Decimal::ZERO {
            errors.push("Trading fee must be greater than or equal to 0".to_string());
        }
        if self.time_created.is_none() {
            errors.push("Time created can't be blank".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Listing filters used by the CLI and any outer UI layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeFilters {
    pub platform: Option<Platform>,
    pub trade_type: Option<TradeType>,
    pub status: Option<TradeStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn completed_trade(trade_type: TradeType) -> Trade {
        Trade {
            id: 1,
            user_id: 1,
            platform: Platform::Binance,
            uuid: "20123456789".to_string(),
            trade_type,
            counterparty: Some("cryptodealer99".to_string()),
            status: TradeStatus::Completed,
            crypto_amount: dec("100"),
            cryptocurrency: "USDT".to_string(),
            local_currency_amount: dec("100"),
            local_currency: "USD".to_string(),
            market_value: dec("100"),
            trading_fee: Decimal::ZERO,
            time_created: Some(Utc::now()),
            time_completed: Some(Utc::now()),
            offer_uuid: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sell_profit_is_fiat_minus_market_minus_fee() {
        let mut trade = completed_trade(TradeType::Sell);
        trade.local_currency_amount = dec("120");
        trade.market_value = dec("100");
        trade.trading_fee = dec("2");
        assert_eq!(trade.profit(), dec("18"));
    }

    #[test]
    fn buy_profit_is_market_minus_fiat_minus_fee() {
        let mut trade = completed_trade(TradeType::Buy);
        trade.market_value = dec("100");
        trade.local_currency_amount = dec("95");
        trade.trading_fee = dec("1");
        assert_eq!(trade.profit(), dec("4"));
    }

    #[test]
    fn cancelled_trade_has_zero_profit() {
        let mut trade = completed_trade(TradeType::Sell);
        trade.status = TradeStatus::Cancelled;
        trade.local_currency_amount = dec("120");
        trade.market_value = dec("100");
        assert_eq!(trade.profit(), Decimal::ZERO);
    }

    #[test]
    fn margin_is_profit_over_fiat_amount() {
        let mut trade = completed_trade(TradeType::Sell);
        trade.local_currency_amount = dec("120");
        trade.market_value = dec("100");
        trade.trading_fee = dec("2");
        // 18 / 120 * 100
        assert_eq!(trade.margin(), dec("15.00"));
    }

    #[test]
    fn margin_with_zero_fiat_amount_is_zero() {
        let mut trade = completed_trade(TradeType::Sell);
        trade.local_currency_amount = Decimal::ZERO;
        assert_eq!(trade.margin(), Decimal::ZERO);
    }

    fn valid_draft() -> NewTrade {
        NewTrade {
            user_id: 1,
            platform: Platform::Kucoin,
            uuid: "ORD-1".to_string(),
            trade_type: TradeType::Buy,
            counterparty: None,
            status: TradeStatus::Completed,
            crypto_amount: Some(dec("10")),
            cryptocurrency: Some("USDT".to_string()),
            local_currency_amount: Some(dec("10")),
            local_currency: Some("USD".to_string()),
            market_value: Some(dec("10")),
            trading_fee: Decimal::ZERO,
            time_created: Some(Utc::now()),
            time_completed: None,
            offer_uuid: None,
        }
    }

    #[test]
    fn valid_draft_passes_validation() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn missing_amount_and_negative_fee_are_both_reported() {
        let mut draft = valid_draft();
        draft.crypto_amount = None;
        draft.trading_fee = dec("-1");
        let errors = draft.validate().unwrap_err();
        assert!(errors.contains(&"Crypto amount can't be blank".to_string()));
        assert!(errors.contains(&"Trading fee must be greater than or equal to 0".to_string()));
    }

    #[test]
    fn zero_market_value_fails_validation() {
        let mut draft = valid_draft();
        draft.market_value = Some(Decimal::ZERO);
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors, vec!["Market value must be greater than 0".to_string()]);
    }
}
