pub mod connection;
pub mod trade_store;
pub mod user_store;

pub use connection::Database;
pub use trade_store::{InsertOutcome, TradeStats, TradeStore};
pub use user_store::UserStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database connection is poisoned")]
    Poisoned,

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Record not found")]
    NotFound,
}
