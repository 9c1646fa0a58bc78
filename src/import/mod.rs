//! Multi-platform trade-history import.
//!
//! One synchronous pass over one uploaded file: classify by extension,
//! detect the source platform from the header, run the matching row mapper
//! over every data row, and persist what validates. Row-level problems are
//! absorbed into the result summary; only whole-import conditions (unreadable
//! file, undetectable platform, failed username inference) short-circuit.

pub mod detector;
pub mod mapper;
pub mod parse;
pub mod row;

pub mod binance;
pub mod bybit;
pub mod kucoin;
pub mod localcoinswap;
pub mod okx;

use std::io::Write;
use std::sync::Arc;

use calamine::{open_workbook_auto, Reader};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, InsertOutcome, StoreError, TradeStore};
use crate::models::Platform;
use mapper::{mapper_for, RowMapper};
use row::{cell_to_string, RawRow};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("File is not readable: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Excel(String),

    #[error("Unable to determine user's username from CSV. Make sure Buyer and Seller columns contain valid usernames.")]
    UsernameInference,

    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Per-import counters, accumulated across rows.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// What the upload handler (or CLI) gets back. Exactly one of the two shapes
/// is populated: a summary on success, a single actionable message on
/// whole-import failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutcome {
    fn completed(platform: Platform, report: ImportReport) -> Self {
        ImportOutcome {
            success: true,
            platform: Some(platform.to_string()),
            imported: Some(report.imported),
            skipped: Some(report.skipped),
            errors: Some(report.errors),
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        ImportOutcome {
            success: false,
            platform: None,
            imported: None,
            skipped: None,
            errors: None,
            error: Some(message.into()),
        }
    }
}

pub struct ImportService<'a> {
    store: TradeStore<'a>,
}

impl<'a> ImportService<'a> {
    pub fn new(db: &'a Database) -> Self {
        ImportService {
            store: TradeStore::new(db),
        }
    }

    /// Import one uploaded file for one user. Never panics and never returns
    /// an error to the caller: every failure mode lands in the outcome.
    pub fn import(&self, user_id: i64, filename: &str, bytes: &[u8]) -> ImportOutcome {
        log::info!("Importing '{}' ({} bytes) for user {}", filename, bytes.len(), user_id);

        let outcome = if detector::is_excel_file(filename) {
            self.import_excel(user_id, filename, bytes)
        } else {
            self.import_csv(user_id, bytes)
        };

        match outcome {
            Ok(outcome) => {
                if let (Some(imported), Some(skipped)) = (outcome.imported, outcome.skipped) {
                    log::info!("Import finished: {} imported, {} skipped", imported, skipped);
                }
                outcome
            }
            Err(e) => {
                log::error!("Import failed: {}", e);
                ImportOutcome::failure(format!("Import failed: {}", e))
            }
        }
    }

    fn import_excel(
        &self,
        user_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ImportOutcome, ImportError> {
        // The spreadsheet reader wants a file path, and sniffs the format
        // from the extension, so the upload is materialized into a named
        // temp file that keeps it. Drop removes the file on every exit
        // path, including the error returns below.
        let extension = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("xlsx");
        let mut temp_file = tempfile::Builder::new()
            .prefix("trade_import")
            .suffix(&format!(".{}", extension.to_lowercase()))
            .tempfile()?;
        temp_file.write_all(bytes)?;
        temp_file.flush()?;

        let mut workbook = match open_workbook_auto(temp_file.path()) {
            Ok(wb) => wb,
            Err(e) => return Ok(ImportOutcome::failure(format!("Detection error: {}", e))),
        };

        let sheet_name = match workbook.sheet_names().first().cloned() {
            Some(name) => name,
            None => {
                return Ok(ImportOutcome::failure(
                    "Unable to detect platform from Excel file. Supported platforms: Bybit P2P",
                ))
            }
        };
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::Excel(e.to_string()))?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(header_row) => header_row.iter().map(cell_to_string).collect(),
            None => Vec::new(),
        };

        let platform = match detector::detect_from_headers(&headers) {
            Some(platform) => platform,
            None => {
                return Ok(ImportOutcome::failure(
                    "Unable to detect platform from Excel file. Supported platforms: Bybit P2P",
                ))
            }
        };
        log::info!("Detected platform: {}", platform);

        let headers = Arc::new(headers);
        let rows: Vec<RawRow> = rows_iter
            .map(|cells| RawRow::new(Arc::clone(&headers), cells.iter().map(cell_to_string).collect()))
            .collect();

        self.run_mapper(user_id, platform, rows, Vec::new())
    }

    fn import_csv(&self, user_id: i64, bytes: &[u8]) -> Result<ImportOutcome, ImportError> {
        let content = String::from_utf8_lossy(bytes);
        let content = content.trim_start_matches('\u{feff}');

        let platform = match detector::detect_from_csv(content) {
            Some(platform) => platform,
            None => {
                return Ok(ImportOutcome::failure(
                    "Unable to detect platform from CSV. Supported platforms: \
                     LocalCoinSwap, Binance P2P, KuCoin, OKX",
                ))
            }
        };
        log::info!("Detected platform: {}", platform);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = Arc::new(
            reader
                .headers()?
                .iter()
                .map(|h| h.trim().to_string())
                .collect::<Vec<String>>(),
        );

        // Collect the whole row set before mapping: the LocalCoinSwap mapper
        // needs a full pass for username inference. Unreadable records are
        // carried as row-level errors so one bad line cannot abort the batch.
        let mut rows = Vec::new();
        let mut read_errors = Vec::new();
        for (index, record) in reader.records().enumerate() {
            match record {
                Ok(record) => rows.push(RawRow::new(
                    Arc::clone(&headers),
                    record.iter().map(str::to_string).collect(),
                )),
                Err(e) => read_errors.push(format!("Row {}: {}", index + 1, e)),
            }
        }

        self.run_mapper(user_id, platform, rows, read_errors)
    }

    fn run_mapper(
        &self,
        user_id: i64,
        platform: Platform,
        rows: Vec<RawRow>,
        read_errors: Vec<String>,
    ) -> Result<ImportOutcome, ImportError> {
        let mut mapper: Box<dyn RowMapper> = match mapper_for(platform) {
            Some(mapper) => mapper,
            None => {
                return Ok(ImportOutcome::failure(format!(
                    "Platform '{}' is not supported",
                    platform
                )))
            }
        };

        // Whole-sheet preparation failures (username inference) abort before
        // any row is processed.
        mapper.prepare(&rows)?;

        let mut report = ImportReport {
            skipped: read_errors.len(),
            errors: read_errors,
            ..Default::default()
        };

        for (index, raw_row) in rows.iter().enumerate() {
            let label = mapper.row_label(raw_row, index);
            match mapper.map_row(raw_row, user_id) {
                Ok(Some(draft)) => {
                    match self.store.exists(user_id, platform, &draft.uuid) {
                        Ok(true) => {
                            // Re-import of an overlapping range; expected
                            report.skipped += 1;
                            continue;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            report.skipped += 1;
                            report.errors.push(format!("Row {}: {}", label, e));
                            continue;
                        }
                    }

                    if let Err(messages) = draft.validate() {
                        report.skipped += 1;
                        report
                            .errors
                            .push(format!("Row {}: {}", label, messages.join(", ")));
                        continue;
                    }

                    match self.store.insert(&draft) {
                        Ok(InsertOutcome::Inserted(_)) => report.imported += 1,
                        // Lost a race with a concurrent import; same as the
                        // pre-check skip
                        Ok(InsertOutcome::Duplicate) => report.skipped += 1,
                        Err(e) => {
                            report.skipped += 1;
                            report.errors.push(format!("Row {}: {}", label, e));
                        }
                    }
                }
                Ok(None) => {} // blank padding row
                Err(message) => {
                    report.skipped += 1;
                    report.errors.push(format!("Row {}: {}", label, message));
                }
            }
        }

        Ok(ImportOutcome::completed(platform, report))
    }
}
