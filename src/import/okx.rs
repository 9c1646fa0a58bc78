use rust_decimal::Decimal;

use crate::import::mapper::RowMapper;
use crate::import::parse::{parse_datetime_opt, parse_decimal_opt};
use crate::import::row::RawRow;
use crate::models::{NewTrade, Platform, TradeStatus, TradeType};

/// OKX P2P order-history CSV.
///
/// Completed orders report "Fulfilled"; the completion instant comes from
/// "Updated date" and falls back to the creation date. Like KuCoin, the
/// export has no fee column.
pub struct OkxMapper;

fn normalize_status(status: Option<&str>) -> TradeStatus {
    match status.map(|s| s.to_lowercase()).as_deref() {
        Some("fulfilled") => TradeStatus::Completed,
        Some("canceled") | Some("cancelled") => TradeStatus::Cancelled,
        _ => TradeStatus::Cancelled,
    }
}

impl RowMapper for OkxMapper {
    fn platform(&self) -> Platform {
        Platform::Okx
    }

    fn map_row(&self, row: &RawRow, user_id: i64) -> Result<Option<NewTrade>, String> {
        let uuid = match row.get_nonblank("Order No") {
            Some(id) => id.to_string(),
            None => return Ok(None),
        };

        let trade_type = match row.get_nonblank("Order type").map(|s| s.to_lowercase()) {
            Some(ref t) if t == "sell" => TradeType::Sell,
            _ => TradeType::Buy,
        };

        let crypto_amount = row.get("Volume").and_then(parse_decimal_opt);
        let time_created = row.get("Created date").and_then(parse_datetime_opt);
        let time_completed = row
            .get("Updated date")
            .and_then(parse_datetime_opt)
            .or(time_created);

        Ok(Some(NewTrade {
            user_id,
            platform: Platform::Okx,
            uuid,
            trade_type,
            counterparty: row.get_nonblank("Counterparty").map(str::to_string),
            status: normalize_status(row.get_nonblank("Status")),
            crypto_amount,
            cryptocurrency: Some(
                row.get_nonblank("Crypto")
                    .map(|s| s.to_uppercase())
                    .unwrap_or_else(|| "USDT".to_string()),
            ),
            local_currency_amount: row.get("Amount").and_then(parse_decimal_opt),
            local_currency: Some(
                row.get_nonblank("Currency")
                    .map(|s| s.to_uppercase())
                    .unwrap_or_else(|| "USD".to_string()),
            ),
            market_value: crypto_amount,
            // No fee column in the OKX export
            trading_fee: Decimal::ZERO,
            time_created,
            time_completed,
            offer_uuid: None,
        }))
    }

    fn row_label(&self, row: &RawRow, index: usize) -> String {
        row.get_nonblank("Order No")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}", index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::row::row_from;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn okx_row(status: &str, updated: &str) -> RawRow {
        row_from(&[
            ("Order No", "OKX-777"),
            ("Order type", "Buy"),
            ("Status", status),
            ("Volume", "300"),
            ("Amount", "298.50"),
            ("Crypto", "usdt"),
            ("Currency", "usd"),
            ("Created date", "2025-05-01 12:00:00"),
            ("Updated date", updated),
            ("Counterparty", "quickswap"),
        ])
    }

    #[test]
    fn fulfilled_maps_to_completed_with_uppercased_currencies() {
        let draft = OkxMapper
            .map_row(&okx_row("Fulfilled", "2025-05-01 12:30:00"), 1)
            .unwrap()
            .unwrap();
        assert_eq!(draft.status, TradeStatus::Completed);
        assert_eq!(draft.cryptocurrency.as_deref(), Some("USDT"));
        assert_eq!(draft.local_currency.as_deref(), Some("USD"));
        assert_eq!(draft.crypto_amount, Some(dec("300")));
        assert_eq!(draft.market_value, Some(dec("300")));
        assert_ne!(draft.time_completed, draft.time_created);
    }

    #[test]
    fn missing_updated_date_falls_back_to_created() {
        let draft = OkxMapper
            .map_row(&okx_row("Fulfilled", ""), 1)
            .unwrap()
            .unwrap();
        assert!(draft.time_completed.is_some());
        assert_eq!(draft.time_completed, draft.time_created);
    }

    #[test]
    fn canceled_status_normalizes() {
        let draft = OkxMapper
            .map_row(&okx_row("Canceled", ""), 1)
            .unwrap()
            .unwrap();
        assert_eq!(draft.status, TradeStatus::Cancelled);
    }

    #[test]
    fn blank_order_number_skips_row() {
        let row = row_from(&[("Order No", ""), ("Order type", "Buy")]);
        assert!(OkxMapper.map_row(&row, 1).unwrap().is_none());
    }
}
