use crate::import::mapper::RowMapper;
use crate::import::parse::{parse_datetime_opt, parse_decimal_opt, parse_decimal_or_zero};
use crate::import::row::RawRow;
use crate::models::{NewTrade, Platform, TradeStatus, TradeType};

/// Bybit P2P order-history export (Excel only).
///
/// Cells arrive through the spreadsheet reader, so numbers and timestamps
/// may have been typed cells rather than text; both land here as strings.
/// The side lives in "Type" (the neighboring "p2p-convert" column is not it),
/// the fee column is plural ("Transaction Fees"), and a single "Time" column
/// serves as both creation and completion instant.
pub struct BybitMapper;

fn normalize_status(status: Option<&str>) -> TradeStatus {
    match status.map(|s| s.to_lowercase()).as_deref() {
        Some("completed") => TradeStatus::Completed,
        Some("cancelled") | Some("canceled") => TradeStatus::Cancelled,
        _ => TradeStatus::Cancelled,
    }
}

impl RowMapper for BybitMapper {
    fn platform(&self) -> Platform {
        Platform::Bybit
    }

    fn map_row(&self, row: &RawRow, user_id: i64) -> Result<Option<NewTrade>, String> {
        if row.is_empty() {
            return Ok(None);
        }

        let uuid = row
            .get_nonblank("Order No.")
            .unwrap_or_default()
            .to_string();

        let trade_type = match row.get_nonblank("Type").map(|s| s.to_lowercase()) {
            Some(ref t) if t == "sell" => TradeType::Sell,
            _ => TradeType::Buy,
        };

        let crypto_amount = row.get("Coin Amount").and_then(parse_decimal_opt);
        let time = row.get("Time").and_then(parse_datetime_opt);

        Ok(Some(NewTrade {
            user_id,
            platform: Platform::Bybit,
            uuid,
            trade_type,
            counterparty: row.get_nonblank("Counterparty").map(str::to_string),
            status: normalize_status(row.get_nonblank("Status")),
            crypto_amount,
            cryptocurrency: Some(
                row.get_nonblank("Cryptocurrency").unwrap_or("USDT").to_string(),
            ),
            local_currency_amount: row.get("Fiat Amount").and_then(parse_decimal_opt),
            local_currency: Some(row.get_nonblank("Currency").unwrap_or("USD").to_string()),
            market_value: crypto_amount,
            trading_fee: parse_decimal_or_zero(row.get("Transaction Fees").unwrap_or_default()),
            time_created: time,
            time_completed: time,
            offer_uuid: None,
        }))
    }

    fn row_label(&self, row: &RawRow, index: usize) -> String {
        row.get_nonblank("Order No.")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}", index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::row::row_from;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn bybit_row() -> RawRow {
        row_from(&[
            ("Order No.", "17051234567890"),
            ("p2p-convert", "p2p"),
            ("Type", "SELL"),
            ("Fiat Amount", "1,010.00"),
            ("Currency", "USD"),
            ("Coin Amount", "1000"),
            ("Cryptocurrency", "USDT"),
            ("Transaction Fees", "1.5"),
            ("Status", "Completed"),
            ("Time", "2025-03-10 18:45:12"),
            ("Counterparty", "otcking"),
        ])
    }

    #[test]
    fn maps_sell_row_with_separator_amounts() {
        let draft = BybitMapper.map_row(&bybit_row(), 1).unwrap().unwrap();
        assert_eq!(draft.trade_type, TradeType::Sell);
        assert_eq!(draft.local_currency_amount, Some(dec("1010.00")));
        assert_eq!(draft.crypto_amount, Some(dec("1000")));
        assert_eq!(draft.market_value, Some(dec("1000")));
        assert_eq!(draft.trading_fee, dec("1.5"));
        assert_eq!(draft.status, TradeStatus::Completed);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn blank_currencies_fall_back_to_usd_usdt() {
        let row = row_from(&[
            ("Order No.", "17051234567891"),
            ("Type", "BUY"),
            ("Fiat Amount", "50"),
            ("Currency", ""),
            ("Coin Amount", "50"),
            ("Cryptocurrency", "  "),
            ("Transaction Fees", ""),
            ("Status", "Completed"),
            ("Time", "2025-03-11 09:00:00"),
            ("Counterparty", ""),
        ]);
        let draft = BybitMapper.map_row(&row, 1).unwrap().unwrap();
        assert_eq!(draft.local_currency.as_deref(), Some("USD"));
        assert_eq!(draft.cryptocurrency.as_deref(), Some("USDT"));
        assert_eq!(draft.trading_fee, Decimal::ZERO);
    }

    #[test]
    fn fully_empty_row_is_skipped_silently() {
        let row = row_from(&[("Order No.", ""), ("Type", ""), ("Status", "")]);
        assert!(BybitMapper.map_row(&row, 1).unwrap().is_none());
    }
}
