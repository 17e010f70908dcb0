//! # Tabular Store Core
//!
//! An in-memory, schema-validated table. Callers declare a
//! `column -> type tag` mapping, turn it into a [`TableSchema`] with
//! [`generate_schema`], and build a [`Table`] from it. Every insert and
//! update is validated against the schema before the rows change.
//!
//! ```
//! use serde_json::json;
//! use tabular_store_core::{generate_schema, Table};
//!
//! let schema = generate_schema("Person", [("name", "string"), ("age", "int")]).unwrap();
//! let mut table = Table::new("people", schema);
//! table.insert(&json!({"name": "Ann", "age": 30})).unwrap();
//! table.insert(&json!({"name": "Bo", "age": 40})).unwrap();
//!
//! let adults = table.run_query("age > 35").unwrap();
//! assert_eq!(adults.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod utils;

/// Re-export common types for ease of use
pub use config::TableConfig;
pub use error::{FieldError, Result, ValidationError, ValidationErrorKind};
pub use models::{DateInterval, Row, StorageKind, Table, Value};
pub use query::Predicate;
pub use schema::{generate_schema, generate_schema_from_json, ColumnType, TableSchema};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_end_to_end() {
        let schema = generate_schema_from_json(
            "Booking",
            &json!({"guest": "string", "room": "char", "nights": "int", "stay": "dateinvl"}),
        )
        .unwrap();
        let mut table = Table::with_config("bookings", schema, TableConfig::testing());

        table
            .insert(&json!({"guest": "Ann", "room": "A", "nights": 2, "stay": ["2024-06-01", "2024-06-03"]}))
            .unwrap();
        table
            .insert(&json!({"guest": "Bo", "room": "B", "nights": 5, "stay": ["2024-06-02", "2024-06-07"]}))
            .unwrap();
        table
            .insert(&json!({"guest": "Ann", "room": "A", "nights": 2, "stay": ["2024-06-01", "2024-06-03"]}))
            .unwrap();

        assert_eq!(table.drop_duplicates(None).unwrap(), 1);
        let long_stays = table.run_query("nights >= 3 and room = 'B'").unwrap();
        assert_eq!(long_stays.len(), 1);
        assert_eq!(long_stays[0].get("guest"), Some(&Value::Text("Bo".to_string())));
    }
}
