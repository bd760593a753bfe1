//! Tally Evidence Store - JSON result persistence
//!
//! This crate keeps the latest result of each named reconciliation strategy
//! in a single JSON file that is replaced atomically on every write.

pub mod schema;
pub mod store;

pub use schema::ResultEntry;
pub use store::{ResultMap, ResultStore};
