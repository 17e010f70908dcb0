//! Table representation
//!
//! A [`Table`] owns a schema and an ordered sequence of validated rows
//! addressed by zero-based position. Every mutating operation performs all
//! of its checks before touching the rows, so a failed call leaves the
//! table exactly as it was.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ops::Range;

use log::{debug, info};
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::row::Row;
use crate::config::TableConfig;
use crate::error::{Result, ValidationError};
use crate::query::Predicate;
use crate::schema::{RowValidator, TableSchema};
use crate::utils::Timer;

/// An in-memory, schema-validated table
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: TableSchema,
    config: TableConfig,
    rows: Vec<Row>,
}

impl Debug for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("schema", &self.schema.name())
            .field("columns", &self.schema.column_names().collect::<Vec<_>>())
            .field("row_count", &self.rows.len())
            .finish()
    }
}

impl Table {
    /// Create an empty table with the default configuration
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        Self::with_config(name, schema, TableConfig::default())
    }

    /// Create an empty table with the given configuration
    pub fn with_config(name: impl Into<String>, schema: TableSchema, config: TableConfig) -> Self {
        let name = name.into();
        debug!("Created table '{}' with {} columns", name, schema.len());
        Table {
            name,
            schema,
            config,
            rows: Vec::new(),
        }
    }

    /// Name of the table
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema of the table
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Configuration of the table
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in positional order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterate over rows in positional order
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    fn validator(&self) -> RowValidator<'_> {
        RowValidator::new(&self.schema, &self.config.validation)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.rows.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Validate `row` and append it, returning its index
    pub fn insert<R: Serialize + ?Sized>(&mut self, row: &R) -> Result<usize> {
        let row = self.validator().validate(row).map_err(|e| {
            debug!("Rejected insert into '{}': {}", self.name, e);
            e
        })?;

        self.rows.push(row);
        let index = self.rows.len() - 1;
        debug!("Inserted row {} into '{}'", index, self.name);
        Ok(index)
    }

    /// Validate every row first, then append them all
    ///
    /// Either all rows are appended or none is. Returns the index range of
    /// the appended rows.
    pub fn insert_many<I>(&mut self, rows: I) -> Result<Range<usize>>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        let validator = self.validator();
        let validated = rows
            .into_iter()
            .map(|row| validator.validate(&row))
            .collect::<Result<Vec<_>>>()?;

        let start = self.rows.len();
        self.rows.extend(validated);
        debug!("Inserted rows {}..{} into '{}'", start, self.rows.len(), self.name);
        Ok(start..self.rows.len())
    }

    /// Get the row at `index`
    pub fn read_by_index(&self, index: usize) -> Result<&Row> {
        self.check_index(index)?;
        Ok(&self.rows[index])
    }

    /// Replace the row at `index` with a validated `new_data`
    ///
    /// The index is checked before the data, so an out-of-range index is
    /// reported as `IndexOutOfRange` even when `new_data` is also invalid.
    pub fn update<R: Serialize + ?Sized>(&mut self, index: usize, new_data: &R) -> Result<()> {
        self.check_index(index)?;
        let row = self.validator().validate(new_data)?;

        self.rows[index] = row;
        debug!("Updated row {} in '{}'", index, self.name);
        Ok(())
    }

    /// Remove and return the row at `index`; later rows shift down by one
    pub fn delete(&mut self, index: usize) -> Result<Row> {
        self.check_index(index)?;

        let row = self.rows.remove(index);
        debug!("Deleted row {} from '{}', {} rows left", index, self.name, self.rows.len());
        Ok(row)
    }

    /// Remove rows equal to an earlier row, returning how many were removed
    ///
    /// Equality covers every column when `subset` is `None` or empty, and
    /// only the named columns otherwise. The first occurrence is kept and
    /// the survivors keep their relative order.
    pub fn drop_duplicates(&mut self, subset: Option<&[&str]>) -> Result<usize> {
        let positions: Vec<usize> = match subset {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| {
                    self.schema
                        .column_index(name)
                        .ok_or_else(|| ValidationError::UnknownColumn(name.to_string()))
                })
                .collect::<Result<_>>()?,
            _ => (0..self.schema.len()).collect(),
        };

        let timer = Timer::new(format!("drop_duplicates on '{}'", self.name))
            .with_threshold(self.config.query.slow_query_threshold);

        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.key(&positions)));
        let removed = before - self.rows.len();

        timer.log("completed");
        if removed > 0 {
            info!("Removed {} duplicate rows from '{}'", removed, self.name);
        }
        Ok(removed)
    }

    fn matching_indices(&self, query: &str) -> Result<Vec<usize>> {
        let predicate = Predicate::parse(query, &self.schema, &self.config.query)?;
        let timer = Timer::new(format!("query `{}` on '{}'", query, self.name))
            .with_threshold(self.config.query.slow_query_threshold);

        let mut indices = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            if predicate.matches(row)? {
                indices.push(index);
            }
        }

        timer.log(format!("matched {} of {} rows", indices.len(), self.rows.len()));
        Ok(indices)
    }

    /// Rows satisfying the predicate `query`, in table order
    pub fn run_query(&self, query: &str) -> Result<Vec<Row>> {
        let indices = self.matching_indices(query)?;
        Ok(indices.into_iter().map(|i| self.rows[i].clone()).collect())
    }

    /// Positions of the rows satisfying the predicate `query`
    pub fn query_indices(&self, query: &str) -> Result<Vec<usize>> {
        self.matching_indices(query)
    }

    /// Current rows as a JSON array of objects
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.rows.iter().map(Row::to_json).collect())
    }
}
