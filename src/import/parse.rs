//! Defensive parsing of locale-variant numeric and timestamp strings.
//!
//! Export files decorate numbers with thousands separators, currency symbols
//! and unit suffixes ("1,234.50 USD"), and mix timestamp formats, sometimes
//! with non-standard timezone suffixes ("2025-12-12 14:10:27 PST-0800").
//! Nothing in here panics or returns an error: required amounts fall back to
//! absent (failing entity validation later), fees fall back to zero, and
//! unparseable dates fall back to None.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use rust_decimal::Decimal;

/// Parse a decimal cell, stripping separators and symbols. Absent or
/// unparseable values become None.
pub fn parse_decimal_opt(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Keep digits, sign and decimal point only ("$1,234.50 USD" -> "1234.50")
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Zero-defaulting variant for fee fields.
pub fn parse_decimal_or_zero(value: &str) -> Decimal {
    parse_decimal_opt(value).unwrap_or(Decimal::ZERO)
}

/// Parse a timestamp cell into UTC. Tries, in order: an offset-suffixed form
/// with a timezone abbreviation ("2025-10-28 14:51:29 PDT-0700"), RFC 3339,
/// common naive datetime layouts (interpreted as UTC), and a bare date.
pub fn parse_datetime_opt(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // "2025-12-12 14:10:27 PST-0800" — the abbreviation is noise, the
    // numeric offset is what matters.
    if let Ok(re) = Regex::new(r"^(\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2})\s+[A-Za-z]{2,5}([+-]\d{4})$")
    {
        if let Some(caps) = re.captures(trimmed) {
            let rebuilt = format!("{} {}", &caps[1], &caps[2]);
            if let Ok(dt) = DateTime::parse_from_str(&rebuilt, "%Y-%m-%d %H:%M:%S %z") {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn plain_decimal() {
        assert_eq!(parse_decimal_opt("123.45"), Some(dec("123.45")));
    }

    #[test]
    fn decimal_with_separators_and_symbols() {
        assert_eq!(parse_decimal_opt("$1,234.50"), Some(dec("1234.50")));
        assert_eq!(parse_decimal_opt("1,000,000"), Some(dec("1000000")));
        assert_eq!(parse_decimal_opt("99.5 USDT"), Some(dec("99.5")));
        assert_eq!(parse_decimal_opt("-90.354USDT"), Some(dec("-90.354")));
    }

    #[test]
    fn garbage_decimal_is_absent() {
        assert_eq!(parse_decimal_opt(""), None);
        assert_eq!(parse_decimal_opt("   "), None);
        assert_eq!(parse_decimal_opt("n/a"), None);
        assert_eq!(parse_decimal_opt("--"), None);
    }

    #[test]
    fn fee_fields_default_to_zero() {
        assert_eq!(parse_decimal_or_zero("not a number"), Decimal::ZERO);
        assert_eq!(parse_decimal_or_zero(""), Decimal::ZERO);
        assert_eq!(parse_decimal_or_zero("0.25"), dec("0.25"));
    }

    #[test]
    fn datetime_with_timezone_abbreviation_suffix() {
        let dt = parse_datetime_opt("2025-12-12 14:10:27 PST-0800").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-12-12T22:10:27+00:00");

        let dt = parse_datetime_opt("2025-10-28 14:51:29 PDT-0700").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-10-28T21:51:29+00:00");
    }

    #[test]
    fn naive_datetime_is_read_as_utc() {
        let dt = parse_datetime_opt("2025-01-10 09:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-10T09:30:00+00:00");
    }

    #[test]
    fn bare_date_becomes_midnight_utc() {
        let dt = parse_datetime_opt("2025-03-04").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-04T00:00:00+00:00");
    }

    #[test]
    fn malformed_dates_are_none() {
        assert_eq!(parse_datetime_opt(""), None);
        assert_eq!(parse_datetime_opt("yesterday"), None);
        assert_eq!(parse_datetime_opt("13/45/9999"), None);
    }
}
