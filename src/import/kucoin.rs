use rust_decimal::Decimal;

use crate::import::mapper::RowMapper;
use crate::import::parse::{parse_datetime_opt, parse_decimal_opt};
use crate::import::row::RawRow;
use crate::models::{NewTrade, Platform, TradeStatus, TradeType};

/// KuCoin P2P trade-history CSV.
///
/// The currency pair comes compounded in one "LEGAL/CURRENCY" cell
/// ("USD/USDT") and is split on the slash, falling back to USD/USDT when
/// malformed. The export carries no fee column, so the trading fee is zero.
pub struct KucoinMapper;

fn normalize_status(status: Option<&str>) -> TradeStatus {
    match status.map(|s| s.to_uppercase()).as_deref() {
        Some("DONE") => TradeStatus::Completed,
        Some("CANCELED") | Some("CANCELLED") => TradeStatus::Cancelled,
        _ => TradeStatus::Cancelled,
    }
}

fn split_currency_pair(pair: &str) -> (String, String) {
    let parts: Vec<&str> = pair.split('/').collect();
    if parts.len() == 2 {
        (parts[0].trim().to_string(), parts[1].trim().to_string())
    } else {
        ("USD".to_string(), "USDT".to_string())
    }
}

impl RowMapper for KucoinMapper {
    fn platform(&self) -> Platform {
        Platform::Kucoin
    }

    fn map_row(&self, row: &RawRow, user_id: i64) -> Result<Option<NewTrade>, String> {
        // KuCoin sheets pad trailing rows with empty order ids
        let uuid = match row.get_nonblank("ORDER_ID") {
            Some(id) => id.to_string(),
            None => return Ok(None),
        };

        let trade_type = match row.get_nonblank("SIDE").map(|s| s.to_lowercase()) {
            Some(ref s) if s == "sell" => TradeType::Sell,
            _ => TradeType::Buy,
        };

        let (local_currency, cryptocurrency) =
            split_currency_pair(row.get_nonblank("LEGAL/CURRENCY").unwrap_or("USD/USDT"));

        let crypto_amount = row.get("CURRENCY_AMOUNT").and_then(parse_decimal_opt);
        let time = row.get("TIME").and_then(parse_datetime_opt);

        Ok(Some(NewTrade {
            user_id,
            platform: Platform::Kucoin,
            uuid,
            trade_type,
            counterparty: row.get_nonblank("OP_TRADER_NAME").map(str::to_string),
            status: normalize_status(row.get_nonblank("STATUS")),
            crypto_amount,
            cryptocurrency: Some(cryptocurrency),
            local_currency_amount: row.get("LEGAL_AMOUNT").and_then(parse_decimal_opt),
            local_currency: Some(local_currency),
            market_value: crypto_amount,
            // No fee column in the KuCoin export
            trading_fee: Decimal::ZERO,
            time_created: time,
            time_completed: time,
            offer_uuid: None,
        }))
    }

    fn row_label(&self, row: &RawRow, index: usize) -> String {
        row.get_nonblank("ORDER_ID")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}", index + 1))
    }
}
