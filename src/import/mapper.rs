use crate::import::row::RawRow;
use crate::import::ImportError;
use crate::models::{NewTrade, Platform};

/// Per-platform transformation from a raw export row to a trade draft.
///
/// Mappers only translate: duplicate checking, validation and persistence
/// stay in the orchestrator so the five implementations differ in nothing
/// but column names, status vocabulary, fee layout and currency encoding.
pub trait RowMapper {
    fn platform(&self) -> Platform;

    /// Whole-sheet pass before per-row mapping. Only LocalCoinSwap needs it
    /// (username inference); a failure here fails the entire import.
    fn prepare(&mut self, _rows: &[RawRow]) -> Result<(), ImportError> {
        Ok(())
    }

    /// Map one row. `Ok(None)` silently skips rows with no order identifier
    /// (some exports pad the sheet with empty rows); `Err` is a row-level
    /// mapping failure that the orchestrator records and moves past.
    fn map_row(&self, row: &RawRow, user_id: i64) -> Result<Option<NewTrade>, String>;

    /// Label for per-row error messages: the platform order id when the row
    /// has one, the 1-based row number otherwise.
    fn row_label(&self, row: &RawRow, index: usize) -> String;
}

pub fn mapper_for(platform: Platform) -> Option<Box<dyn RowMapper>> {
    match platform {
        Platform::Localcoinswap => {
            Some(Box::new(super::localcoinswap::LocalCoinSwapMapper::new()))
        }
        Platform::Binance => Some(Box::new(super::binance::BinanceMapper)),
        Platform::Bybit => Some(Box::new(super::bybit::BybitMapper)),
        Platform::Kucoin => Some(Box::new(super::kucoin::KucoinMapper)),
        Platform::Okx => Some(Box::new(super::okx::OkxMapper)),
        Platform::Private => None,
    }
}
