use rusqlite::{Connection, Result};
use std::sync::Mutex;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::init_schema(&conn)?;

        log::info!("Database ready at {}", db_path);

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Self::init_schema(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT NOT NULL UNIQUE,
                name        TEXT,
                country     TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trades (
                id                     INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id                INTEGER NOT NULL REFERENCES users(id),
                platform               TEXT NOT NULL,
                uuid                   TEXT NOT NULL,
                trade_type             TEXT NOT NULL,
                counterparty           TEXT,
                status                 TEXT NOT NULL,
                crypto_amount          TEXT,
                cryptocurrency         TEXT,
                local_currency_amount  TEXT,
                local_currency         TEXT,
                market_value           TEXT,
                trading_fee            TEXT,
                time_created           TEXT,
                time_completed         TEXT,
                offer_uuid             TEXT,
                created_at             TEXT NOT NULL,
                updated_at             TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS index_trades_on_user_platform_uuid
                ON trades (user_id, platform, uuid);
            CREATE INDEX IF NOT EXISTS index_trades_on_user_id_and_platform
                ON trades (user_id, platform);
            CREATE INDEX IF NOT EXISTS index_trades_on_user_id_and_status
                ON trades (user_id, status);
            CREATE INDEX IF NOT EXISTS index_trades_on_user_id_and_time_completed
                ON trades (user_id, time_completed);",
        )
    }
}
