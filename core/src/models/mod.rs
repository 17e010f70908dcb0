//! Data models for Tabular Store
//!
//! This module provides the values, rows and tables the store is built from.

mod interval;
mod row;
mod table;

pub use interval::DateInterval;
pub use row::{Row, StorageKind, Value};
pub use table::Table;
