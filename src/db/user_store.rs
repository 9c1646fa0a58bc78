use chrono::{DateTime, Utc};

use crate::db::{Database, StoreError};
use crate::models::User;

pub struct UserStore<'a> {
    db: &'a Database,
}

impl<'a> UserStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        UserStore { db }
    }

    /// Look a user up by email, creating one on first use. Email addresses
    /// are normalized the way the account layer does it: trimmed, lowercased.
    pub fn find_or_create(&self, email: &str) -> Result<User, StoreError> {
        let email = email.trim().to_lowercase();
        let conn = self.db.conn.lock().map_err(|_| StoreError::Poisoned)?;

        let existing = conn
            .query_row(
                "SELECT id, email, name, country, created_at FROM users WHERE email = ?",
                [&email],
                map_row_to_user,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO users (email, name, country, created_at) VALUES (?, NULL, NULL, ?)",
            rusqlite::params![email, now.to_rfc3339()],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            email,
            name: None,
            country: None,
            created_at: now,
        })
    }
}

fn map_row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let created_raw: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        country: row.get(3)?,
        created_at: DateTime::parse_from_rfc3339(&created_raw)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
