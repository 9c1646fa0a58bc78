//! Platform detection from file names and header rows.
//!
//! Each platform's export carries a header combination no other supported
//! platform uses, so detection is a required-substring test over the first
//! line (CSV) or an exact-cell test over the header row (Excel). No match is
//! `None`, never a guess: the caller turns that into a user-facing
//! "unsupported format" message.

use crate::models::Platform;

const EXCEL_EXTENSIONS: [&str; 2] = ["xls", "xlsx"];

pub fn is_excel_file(filename: &str) -> bool {
    matches_extension(filename, &EXCEL_EXTENSIONS)
}

pub fn is_csv_file(filename: &str) -> bool {
    matches_extension(filename, &["csv"])
}

fn matches_extension(filename: &str, extensions: &[&str]) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Classify delimited-text content by its first line. Only the header is
/// inspected; the content itself is re-read by the selected mapper.
pub fn detect_from_csv(content: &str) -> Option<Platform> {
    let first_line = content.lines().next()?.trim().to_lowercase();
    if first_line.is_empty() {
        return None;
    }

    // LocalCoinSwap: UUID, Buyer, Seller columns
    if first_line.contains("uuid") && first_line.contains("buyer") && first_line.contains("seller")
    {
        return Some(Platform::Localcoinswap);
    }

    // Binance P2P: Order Number, Order Type, Asset Type columns
    if first_line.contains("order number")
        && first_line.contains("order type")
        && first_line.contains("asset type")
    {
        return Some(Platform::Binance);
    }

    // KuCoin P2P: TIME, SIDE, LEGAL/CURRENCY, ORDER_ID columns
    if first_line.contains("time")
        && first_line.contains("side")
        && first_line.contains("legal/currency")
        && first_line.contains("order_id")
    {
        return Some(Platform::Kucoin);
    }

    // OKX P2P: Order No, Order type, Crypto, Volume columns
    if first_line.contains("order no")
        && first_line.contains("order type")
        && first_line.contains("crypto")
        && first_line.contains("volume")
    {
        return Some(Platform::Okx);
    }

    None
}

/// Classify a spreadsheet by its header row cells (already read out by the
/// orchestrator, which keeps the workbook open for the row pass).
pub fn detect_from_headers(headers: &[String]) -> Option<Platform> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    if normalized.iter().all(|h| h.is_empty()) {
        return None;
    }

    let has = |name: &str| normalized.iter().any(|h| h == name);

    // Bybit P2P order-history sheet
    if has("order no.") && has("type") && has("fiat amount") && has("coin amount") {
        return Some(Platform::Bybit);
    }

    // Binance also exports order history as a spreadsheet
    if has("order number") && has("order type") && has("asset type") {
        return Some(Platform::Binance);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_routing() {
        assert!(is_excel_file("trades.xlsx"));
        assert!(is_excel_file("TRADES.XLS"));
        assert!(is_csv_file("export.csv"));
        assert!(!is_excel_file("export.csv"));
        assert!(!is_csv_file("notes.txt"));
        assert!(!is_csv_file("no_extension"));
    }

    #[test]
    fn detects_localcoinswap_header() {
        let content = "UUID,Buyer,Seller,Status,Crypto Amount,Cryptocurrency\nabc,alice,bob,...";
        assert_eq!(detect_from_csv(content), Some(Platform::Localcoinswap));
    }

    #[test]
    fn detects_binance_header() {
        let content = "Order Number,Order Type,Asset Type,Fiat Type,Status\n1,BUY,USDT,USD,Completed";
        assert_eq!(detect_from_csv(content), Some(Platform::Binance));
    }

    #[test]
    fn detects_kucoin_header() {
        let content = "ORDER_ID,SIDE,STATUS,LEGAL/CURRENCY,LEGAL_AMOUNT,CURRENCY_AMOUNT,TIME\n";
        assert_eq!(detect_from_csv(content), Some(Platform::Kucoin));
    }

    #[test]
    fn detects_okx_header() {
        let content = "Order No,Order type,Status,Volume,Amount,Crypto,Currency,Created date\n";
        assert_eq!(detect_from_csv(content), Some(Platform::Okx));
    }

    #[test]
    fn unknown_header_is_none() {
        assert_eq!(detect_from_csv("Date,Description,Amount\n"), None);
        assert_eq!(detect_from_csv(""), None);
        assert_eq!(detect_from_csv("   \n"), None);
    }

    #[test]
    fn binance_header_is_not_localcoinswap() {
        // "uuid" can appear in a data cell or an unrelated column; the Binance
        // header lacks Buyer/Seller, so the LocalCoinSwap rule must not fire.
        let content = "Order Number,Order Type,Asset Type,uuid\n";
        assert_eq!(detect_from_csv(content), Some(Platform::Binance));
    }

    #[test]
    fn detects_bybit_excel_headers() {
        let headers: Vec<String> = [
            "Order No.", "p2p-convert", "Type", "Fiat Amount", "Currency",
            "Coin Amount", "Cryptocurrency", "Transaction Fees", "Status", "Time",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(detect_from_headers(&headers), Some(Platform::Bybit));
    }

    #[test]
    fn detects_binance_excel_headers() {
        let headers: Vec<String> = ["Order Number", "Order Type", "Asset Type", "Status"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(detect_from_headers(&headers), Some(Platform::Binance));
    }

    #[test]
    fn empty_or_unknown_excel_headers_are_none() {
        assert_eq!(detect_from_headers(&[]), None);
        assert_eq!(
            detect_from_headers(&["".to_string(), "  ".to_string()]),
            None
        );
        let headers: Vec<String> = ["Date", "Amount"].iter().map(|s| s.to_string()).collect();
        assert_eq!(detect_from_headers(&headers), None);
    }
}
