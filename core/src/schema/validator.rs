//! Row validation
//!
//! Checks a candidate row against a [`TableSchema`] and converts each field
//! into its typed storage value. All failing fields are collected into one
//! `RowValidation` error instead of stopping at the first.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use super::{ColumnType, TableSchema};
use crate::config::ValidationConfig;
use crate::error::{FieldError, Result, ValidationError};
use crate::models::{DateInterval, Row, Value};

/// Pseudo-column used for failures that concern the row as a whole
const ROW_FIELD: &str = "<row>";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp from text
///
/// Accepts RFC 3339 (offsets are converted to UTC and dropped), naive
/// ISO-8601 date-times with a `T` or space separator, bare dates (midnight)
/// and finally each of `extra_formats` in order.
pub fn parse_timestamp(text: &str, extra_formats: &[String]) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    extra_formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Validates candidate rows against a schema
#[derive(Debug, Clone, Copy)]
pub struct RowValidator<'a> {
    schema: &'a TableSchema,
    config: &'a ValidationConfig,
}

impl<'a> RowValidator<'a> {
    /// Create a validator for `schema`
    pub fn new(schema: &'a TableSchema, config: &'a ValidationConfig) -> Self {
        RowValidator { schema, config }
    }

    /// Validate anything that serializes to a JSON object
    pub fn validate<R: Serialize + ?Sized>(&self, input: &R) -> Result<Row> {
        match serde_json::to_value(input) {
            Ok(json) => self.validate_json(&json),
            Err(err) => Err(self.failure(vec![FieldError::new(ROW_FIELD, err.to_string())])),
        }
    }

    /// Validate a JSON object
    pub fn validate_json(&self, input: &JsonValue) -> Result<Row> {
        let object = match input.as_object() {
            Some(object) => object,
            None => {
                return Err(self.failure(vec![FieldError::new(
                    ROW_FIELD,
                    format!("expected an object, got {}", json_kind(input)),
                )]))
            }
        };

        let mut errors = Vec::new();
        let mut fields = Vec::with_capacity(self.schema.len());

        for column in self.schema.columns() {
            match object.get(&column.name) {
                None => errors.push(FieldError::new(&column.name, "field required")),
                Some(raw) => match self.coerce(column.column_type, raw) {
                    Ok(value) => fields.push((column.name.clone(), value)),
                    Err(message) => errors.push(FieldError::new(&column.name, message)),
                },
            }
        }

        if self.config.reject_unknown_fields {
            errors.extend(self.unknown_fields(object));
        }

        if errors.is_empty() {
            Ok(Row::new(fields))
        } else {
            Err(self.failure(errors))
        }
    }

    fn unknown_fields(&self, object: &Map<String, JsonValue>) -> Vec<FieldError> {
        object
            .keys()
            .filter(|key| !self.schema.has_column(key))
            .map(|key| FieldError::new(key, "extra fields not permitted"))
            .collect()
    }

    fn failure(&self, errors: Vec<FieldError>) -> ValidationError {
        ValidationError::RowValidation {
            table: self.schema.name().to_string(),
            errors,
        }
    }

    fn coerce(&self, column_type: ColumnType, raw: &JsonValue) -> std::result::Result<Value, String> {
        if raw.is_null() {
            return Err("field required, null is not permitted".to_string());
        }

        match column_type {
            ColumnType::Text => match raw {
                JsonValue::String(s) => Ok(Value::Text(s.clone())),
                other => Err(format!("expected a string, got {}", json_kind(other))),
            },
            ColumnType::Char => match raw {
                JsonValue::String(s) => match s.chars().count() {
                    1 => Ok(Value::Text(s.clone())),
                    n => Err(format!("expected exactly one character, got {}", n)),
                },
                other => Err(format!("expected a single character, got {}", json_kind(other))),
            },
            ColumnType::Integer => self.coerce_integer(raw),
            ColumnType::Real => self.coerce_real(raw),
            ColumnType::Timestamp => self.coerce_timestamp(raw).map(Value::Timestamp),
            ColumnType::DateInterval => self.coerce_interval(raw).map(Value::Interval),
        }
    }

    fn coerce_integer(&self, raw: &JsonValue) -> std::result::Result<Value, String> {
        match raw {
            JsonValue::Number(n) => {
                if let Some(v) = n.as_i64() {
                    return Ok(Value::Integer(v));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                        Ok(Value::Integer(f as i64))
                    }
                    _ => Err(format!("expected an integer, got {}", n)),
                }
            }
            JsonValue::String(s) if self.config.coerce_numeric_strings => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("unable to parse '{}' as an integer", s)),
            other => Err(format!("expected an integer, got {}", json_kind(other))),
        }
    }

    fn coerce_real(&self, raw: &JsonValue) -> std::result::Result<Value, String> {
        match raw {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Real)
                .ok_or_else(|| format!("expected a number, got {}", n)),
            JsonValue::String(s) if self.config.coerce_numeric_strings => s
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| format!("unable to parse '{}' as a number", s)),
            other => Err(format!("expected a number, got {}", json_kind(other))),
        }
    }

    fn coerce_timestamp(&self, raw: &JsonValue) -> std::result::Result<NaiveDateTime, String> {
        match raw {
            JsonValue::String(s) => parse_timestamp(s, &self.config.datetime_formats)
                .ok_or_else(|| format!("unable to parse '{}' as a datetime", s)),
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|ts| ts.naive_utc())
                .ok_or_else(|| format!("{} is not a valid unix timestamp", n)),
            other => Err(format!("expected a datetime, got {}", json_kind(other))),
        }
    }

    fn coerce_interval(&self, raw: &JsonValue) -> std::result::Result<DateInterval, String> {
        let (start, end) = match raw {
            JsonValue::Array(items) if items.len() == 2 => (&items[0], &items[1]),
            JsonValue::Array(items) => {
                return Err(format!("expected a pair of datetimes, got {} items", items.len()))
            }
            JsonValue::Object(map) => match (map.get("start"), map.get("end")) {
                (Some(start), Some(end)) => (start, end),
                _ => return Err("expected an object with 'start' and 'end'".to_string()),
            },
            other => return Err(format!("expected a pair of datetimes, got {}", json_kind(other))),
        };

        let start = self.coerce_timestamp(start).map_err(|e| format!("start: {}", e))?;
        let end = self.coerce_timestamp(end).map_err(|e| format!("end: {}", e))?;
        DateInterval::new(start, end).map_err(|e| e.to_string())
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use crate::schema::generate_schema;
    use rstest::rstest;
    use serde_json::json;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    fn schema() -> TableSchema {
        generate_schema(
            "records",
            [
                ("name", "string"),
                ("age", "int"),
                ("score", "float"),
                ("grade", "char"),
                ("seen", "datetime"),
                ("span", "dateinvl"),
            ],
        )
        .unwrap()
    }

    fn valid_input() -> JsonValue {
        json!({
            "name": "Ann",
            "age": 30,
            "score": 9.5,
            "grade": "A",
            "seen": "2024-01-01T10:00:00",
            "span": ["2024-01-01", "2024-01-31"]
        })
    }

    #[rstest]
    #[case("2024-01-01T10:00:00", ts(2024, 1, 1, 10, 0, 0))]
    #[case("2024-01-01 10:00:00.5", ts(2024, 1, 1, 10, 0, 0) + chrono::Duration::milliseconds(500))]
    #[case("2024-01-01T10:00", ts(2024, 1, 1, 10, 0, 0))]
    #[case("2024-01-01", ts(2024, 1, 1, 0, 0, 0))]
    #[case("2024-01-01T12:00:00+02:00", ts(2024, 1, 1, 10, 0, 0))]
    #[case("2024-01-01T10:00:00Z", ts(2024, 1, 1, 10, 0, 0))]
    fn test_parse_timestamp(#[case] text: &str, #[case] expected: NaiveDateTime) {
        assert_eq!(parse_timestamp(text, &[]), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_extra_formats() {
        assert_eq!(parse_timestamp("01/02/2024 03:04", &[]), None);
        let formats = vec!["%d/%m/%Y %H:%M".to_string()];
        assert_eq!(parse_timestamp("01/02/2024 03:04", &formats), Some(ts(2024, 2, 1, 3, 4, 0)));
    }

    #[test]
    fn test_valid_row() {
        let schema = schema();
        let config = ValidationConfig::default();
        let row = RowValidator::new(&schema, &config).validate(&valid_input()).unwrap();

        assert_eq!(row.len(), 6);
        assert_eq!(row.get("age"), Some(&Value::Integer(30)));
        assert_eq!(row.get("grade"), Some(&Value::Text("A".to_string())));
        assert_eq!(row.get("seen"), Some(&Value::Timestamp(ts(2024, 1, 1, 10, 0, 0))));
        let span = DateInterval::new(ts(2024, 1, 1, 0, 0, 0), ts(2024, 1, 31, 0, 0, 0)).unwrap();
        assert_eq!(row.get("span"), Some(&Value::Interval(span)));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "age", "score", "grade", "seen", "span"]);
    }

    #[rstest]
    #[case("age", json!(30.0), Value::Integer(30))]
    #[case("age", json!(" 42 "), Value::Integer(42))]
    #[case("score", json!(3), Value::Real(3.0))]
    #[case("score", json!("2.25"), Value::Real(2.25))]
    #[case("seen", json!(0), Value::Timestamp(ts(1970, 1, 1, 0, 0, 0)))]
    #[case("grade", json!("é"), Value::Text("é".to_string()))]
    fn test_lax_coercions(#[case] column: &str, #[case] raw: JsonValue, #[case] expected: Value) {
        let schema = schema();
        let config = ValidationConfig::default();
        let mut input = valid_input();
        input[column] = raw;

        let row = RowValidator::new(&schema, &config).validate_json(&input).unwrap();
        assert_eq!(row.get(column), Some(&expected));
    }

    #[rstest]
    #[case("name", json!(5))]
    #[case("age", json!(30.5))]
    #[case("age", json!("thirty"))]
    #[case("age", json!(true))]
    #[case("score", json!([1]))]
    #[case("grade", json!("AB"))]
    #[case("grade", json!(""))]
    #[case("seen", json!("yesterday"))]
    #[case("span", json!(["2024-02-01", "2024-01-01"]))]
    #[case("span", json!(["2024-02-01"]))]
    #[case("span", json!({"start": "2024-01-01"}))]
    #[case("name", JsonValue::Null)]
    fn test_rejected_values(#[case] column: &str, #[case] raw: JsonValue) {
        let schema = schema();
        let config = ValidationConfig::default();
        let mut input = valid_input();
        input[column] = raw;

        let err = RowValidator::new(&schema, &config).validate_json(&input).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::RowValidation);
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].column, column);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let schema = schema();
        let config = ValidationConfig::default();
        let err = RowValidator::new(&schema, &config)
            .validate_json(&json!({"name": "Ann", "age": "x", "grade": "AB"}))
            .unwrap_err();

        let columns: Vec<&str> = err.field_errors().iter().map(|e| e.column.as_str()).collect();
        assert_eq!(columns, vec!["age", "score", "grade", "seen", "span"]);
    }

    #[test]
    fn test_strict_config() {
        let schema = schema();
        let config = ValidationConfig {
            coerce_numeric_strings: false,
            reject_unknown_fields: true,
            ..ValidationConfig::default()
        };
        let validator = RowValidator::new(&schema, &config);

        let mut input = valid_input();
        input["nickname"] = json!("Annie");
        let err = validator.validate_json(&input).unwrap_err();
        assert_eq!(err.field_errors()[0].column, "nickname");

        let mut input = valid_input();
        input["age"] = json!("30");
        assert!(validator.validate_json(&input).is_err());

        // Extra fields are ignored by default
        let mut input = valid_input();
        input["nickname"] = json!("Annie");
        let lax = ValidationConfig::default();
        assert!(RowValidator::new(&schema, &lax).validate_json(&input).is_ok());
    }

    #[test]
    fn test_non_object_input() {
        let schema = schema();
        let config = ValidationConfig::default();
        let err = RowValidator::new(&schema, &config).validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.field_errors()[0].column, ROW_FIELD);
    }

    #[test]
    fn test_interval_object_form() {
        let schema = generate_schema("spans", [("span", "dateinvl")]).unwrap();
        let config = ValidationConfig::default();
        let row = RowValidator::new(&schema, &config)
            .validate(&json!({"span": {"start": "2024-01-01", "end": "2024-01-02"}}))
            .unwrap();
        assert!(matches!(row.get("span"), Some(Value::Interval(_))));
    }
}
