use crate::import::mapper::RowMapper;
use crate::import::parse::{parse_datetime_opt, parse_decimal_opt, parse_decimal_or_zero};
use crate::import::row::RawRow;
use crate::models::{NewTrade, Platform, TradeStatus, TradeType};

/// Binance P2P order-history export (CSV, sometimes re-exported as Excel).
///
/// Fees come split into Maker Fee and Taker Fee and are summed into one
/// trading fee. Binance reports no independent market value, so the crypto
/// quantity stands in for it — exact only for assets pegged 1:1 to the fiat
/// side (USDT and friends), a known approximation carried over deliberately.
/// The counterparty column really is spelled "Couterparty" in the export.
pub struct BinanceMapper;

fn normalize_status(status: Option<&str>) -> TradeStatus {
    match status.map(|s| s.to_lowercase()).as_deref() {
        Some("completed") => TradeStatus::Completed,
        Some("cancelled") | Some("canceled") | Some("system cancelled") => TradeStatus::Cancelled,
        _ => TradeStatus::Cancelled,
    }
}

impl RowMapper for BinanceMapper {
    fn platform(&self) -> Platform {
        Platform::Binance
    }

    fn map_row(&self, row: &RawRow, user_id: i64) -> Result<Option<NewTrade>, String> {
        let uuid = row
            .get_nonblank("Order Number")
            .unwrap_or_default()
            .to_string();

        let trade_type = match row.get_nonblank("Order Type").map(|s| s.to_lowercase()) {
            Some(ref t) if t == "sell" => TradeType::Sell,
            _ => TradeType::Buy,
        };

        let maker_fee = parse_decimal_or_zero(row.get("Maker Fee").unwrap_or_default());
        let taker_fee = parse_decimal_or_zero(row.get("Taker Fee").unwrap_or_default());

        let quantity = row.get("Quantity").and_then(parse_decimal_opt);
        let time_created = row.get("Created Time").and_then(parse_datetime_opt);

        Ok(Some(NewTrade {
            user_id,
            platform: Platform::Binance,
            uuid,
            trade_type,
            counterparty: row.get_nonblank("Couterparty").map(str::to_string),
            status: normalize_status(row.get_nonblank("Status")),
            crypto_amount: quantity,
            cryptocurrency: row.get_nonblank("Asset Type").map(str::to_string),
            local_currency_amount: row.get("Total Price").and_then(parse_decimal_opt),
            local_currency: row.get_nonblank("Fiat Type").map(str::to_string),
            market_value: quantity,
            trading_fee: maker_fee + taker_fee,
            time_created,
            time_completed: time_created,
            offer_uuid: None,
        }))
    }

    fn row_label(&self, row: &RawRow, index: usize) -> String {
        row.get_nonblank("Order Number")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}", index + 1))
    }
}
