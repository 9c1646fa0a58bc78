use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner of a set of trades. Authentication and email verification live in
/// the web layer; the tracker core only needs an identity to scope trades to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}
