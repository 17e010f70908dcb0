//! Schema generation
//!
//! Turns a declarative `column name -> type tag` mapping into a [`TableSchema`].

use std::collections::HashSet;

use log::debug;
use serde_json::Value as JsonValue;

use super::{ColumnDefinition, ColumnType, TableSchema};
use crate::error::{Result, ValidationError};

/// Build a schema named `table_name` from `(column, tag)` pairs
///
/// Column order follows the input order. Every column is mandatory. Fails
/// with `UnknownColumnType` naming the first column whose tag is outside
/// `{string, int, float, char, datetime, dateinvl}`, or with
/// `DuplicateColumn` when a name repeats. An empty input yields a valid
/// schema with no columns.
pub fn generate_schema<I, K, V>(table_name: &str, columns: I) -> Result<TableSchema>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut definitions = Vec::new();

    for (name, tag) in columns {
        let name: String = name.into();
        let tag = tag.as_ref();

        let column_type = ColumnType::from_tag(tag).ok_or_else(|| ValidationError::UnknownColumnType {
            column: name.clone(),
            tag: tag.to_string(),
        })?;

        if !seen.insert(name.clone()) {
            return Err(ValidationError::DuplicateColumn(name));
        }

        definitions.push(ColumnDefinition { name, column_type });
    }

    debug!("Generated schema '{}' with {} columns", table_name, definitions.len());
    Ok(TableSchema::new(table_name.to_string(), definitions))
}

/// Build a schema from a JSON object such as `{"name": "string", "age": "int"}`
///
/// Key order of the object is preserved. A value that is not a string is
/// reported as an unknown column type.
pub fn generate_schema_from_json(table_name: &str, columns: &JsonValue) -> Result<TableSchema> {
    let object = columns.as_object().ok_or_else(|| ValidationError::UnknownColumnType {
        column: "<schema>".to_string(),
        tag: columns.to_string(),
    })?;

    let mut pairs = Vec::with_capacity(object.len());
    for (name, tag) in object {
        match tag.as_str() {
            Some(tag) => pairs.push((name.clone(), tag.to_string())),
            None => {
                return Err(ValidationError::UnknownColumnType {
                    column: name.clone(),
                    tag: tag.to_string(),
                })
            }
        }
    }

    generate_schema(table_name, pairs)
}
