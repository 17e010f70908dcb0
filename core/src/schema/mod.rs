//! Table schemas
//!
//! This module provides the column-type vocabulary, the schema descriptor a
//! table is built from, the schema generator and the row validator.

mod generator;
mod validator;

pub use generator::{generate_schema, generate_schema_from_json};
pub use validator::{parse_timestamp, RowValidator};

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::StorageKind;

/// Type of column in a table schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Text (unlimited length), tag `string`
    #[serde(rename = "string")]
    Text,

    /// Integer (64-bit), tag `int`
    #[serde(rename = "int")]
    Integer,

    /// Floating point (64-bit), tag `float`
    #[serde(rename = "float")]
    Real,

    /// Text of exactly one character, tag `char`
    #[serde(rename = "char")]
    Char,

    /// Timestamp, tag `datetime`
    #[serde(rename = "datetime")]
    Timestamp,

    /// Date interval, tag `dateinvl`
    #[serde(rename = "dateinvl")]
    DateInterval,
}

impl ColumnType {
    /// Every supported column type
    pub const ALL: [ColumnType; 6] = [
        ColumnType::Text,
        ColumnType::Integer,
        ColumnType::Real,
        ColumnType::Char,
        ColumnType::Timestamp,
        ColumnType::DateInterval,
    ];

    /// Resolve a type tag, `None` when it is outside the vocabulary
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(ColumnType::Text),
            "int" => Some(ColumnType::Integer),
            "float" => Some(ColumnType::Real),
            "char" => Some(ColumnType::Char),
            "datetime" => Some(ColumnType::Timestamp),
            "dateinvl" => Some(ColumnType::DateInterval),
            _ => None,
        }
    }

    /// Get the tag of this column type
    pub fn tag(&self) -> &'static str {
        match self {
            ColumnType::Text => "string",
            ColumnType::Integer => "int",
            ColumnType::Real => "float",
            ColumnType::Char => "char",
            ColumnType::Timestamp => "datetime",
            ColumnType::DateInterval => "dateinvl",
        }
    }

    /// Storage representation of values of this type
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            ColumnType::Text | ColumnType::Char => StorageKind::Text,
            ColumnType::Integer => StorageKind::Int64,
            ColumnType::Real => StorageKind::Float64,
            ColumnType::Timestamp => StorageKind::Timestamp,
            ColumnType::DateInterval => StorageKind::Interval,
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.tag())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::from_tag(s).ok_or_else(|| format!("unknown column type '{}'", s))
    }
}

/// Definition of a column in a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Name of the column
    pub name: String,

    /// Type of the column
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Schema of a table: an ordered list of mandatory columns
///
/// Built once by [`generate_schema`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    pub(crate) fn new(name: String, columns: Vec<ColumnDefinition>) -> Self {
        TableSchema { name, columns }
    }

    /// Name of the record type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Check if the schema has a column
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|col| col.name.as_str())
    }
}
