//! Peer-to-peer crypto trade tracker.
//!
//! Tracks one user's P2P trades across exchange platforms, computes profit
//! and margin on completed trades, and imports trade history from the
//! heterogeneous CSV/Excel exports those platforms produce.

pub mod db;
pub mod import;
pub mod models;
