//! Row predicates
//!
//! Predicates are boolean expressions over column names, written in SQL
//! expression syntax (`age > 7 AND name != 'Bo'`). The text is parsed with
//! `sqlparser` and compiled against a schema before any row is touched, so
//! references to unknown columns fail even on an empty table.

mod eval;

use log::debug;
use sqlparser::ast::{BinaryOperator, Expr, Ident, UnaryOperator, Value as SqlValue};
use sqlparser::dialect::{Dialect, GenericDialect};
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;

use self::eval::{ArithOp, CompareOp, Node, Scalar};
use crate::config::QueryConfig;
use crate::error::{to_query_error, Result};
use crate::models::Row;
use crate::schema::TableSchema;

// Binding strengths the parser assigns to OR and AND
const OR_PRECEDENCE: u8 = 5;
const AND_PRECEDENCE: u8 = 10;

/// Generic SQL dialect where `&` and `|` bind like `AND` and `OR`,
/// so `age > 7 & name == 'Ann'` groups around the comparisons
#[derive(Debug)]
struct PredicateDialect(GenericDialect);

impl Dialect for PredicateDialect {
    fn is_identifier_start(&self, ch: char) -> bool {
        self.0.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        self.0.is_identifier_part(ch)
    }

    fn get_next_precedence(&self, parser: &Parser) -> Option<std::result::Result<u8, ParserError>> {
        match parser.peek_token().token {
            Token::Ampersand => Some(Ok(AND_PRECEDENCE)),
            Token::Pipe => Some(Ok(OR_PRECEDENCE)),
            _ => None,
        }
    }
}

/// A compiled boolean predicate
#[derive(Debug, Clone)]
pub struct Predicate {
    source: String,
    root: Node,
}

impl Predicate {
    /// Parse `source` and resolve its column references against `schema`
    pub fn parse(source: &str, schema: &TableSchema, config: &QueryConfig) -> Result<Self> {
        let dialect = PredicateDialect(GenericDialect {});
        let mut parser = Parser::new(&dialect)
            .try_with_sql(source)
            .map_err(|e| to_query_error(source, e))?;
        let expr = parser.parse_expr().map_err(|e| to_query_error(source, e))?;

        let trailing = parser.peek_token();
        if trailing.token != Token::EOF {
            return Err(to_query_error(
                source,
                format!("unexpected trailing input starting at '{}'", trailing.token),
            ));
        }

        let root = Compiler { schema, config }
            .compile(&expr)
            .map_err(|e| to_query_error(source, e))?;
        debug!("Compiled predicate `{}` against '{}'", source, schema.name());

        Ok(Predicate {
            source: source.to_string(),
            root,
        })
    }

    /// Source text of the predicate
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the predicate against `row`
    pub fn matches(&self, row: &Row) -> Result<bool> {
        match self.root.eval(row).map_err(|e| to_query_error(&self.source, e))? {
            Scalar::Bool(b) => Ok(b),
            other => Err(to_query_error(
                &self.source,
                format!("expression must evaluate to a boolean, got {}", other.type_name()),
            )),
        }
    }
}

struct Compiler<'a> {
    schema: &'a TableSchema,
    config: &'a QueryConfig,
}

type CompileResult = std::result::Result<Node, String>;

impl<'a> Compiler<'a> {
    fn compile(&self, expr: &Expr) -> CompileResult {
        match expr {
            Expr::Identifier(ident) => self.identifier(ident),
            Expr::Value(value) => literal(value).map(Node::Literal),
            Expr::Nested(inner) => self.compile(inner),
            Expr::UnaryOp { op, expr } => {
                let inner = Box::new(self.compile(expr)?);
                match op {
                    UnaryOperator::Not => Ok(Node::Not(inner)),
                    UnaryOperator::Minus => Ok(Node::Negate(inner)),
                    UnaryOperator::Plus => Ok(*inner),
                    other => Err(format!("unsupported operator '{}'", other)),
                }
            }
            Expr::BinaryOp { left, op, right } => {
                let left = Box::new(self.compile(left)?);
                let right = Box::new(self.compile(right)?);
                match op {
                    BinaryOperator::And | BinaryOperator::BitwiseAnd => Ok(Node::And(left, right)),
                    BinaryOperator::Or | BinaryOperator::BitwiseOr => Ok(Node::Or(left, right)),
                    BinaryOperator::Eq => Ok(Node::Compare(CompareOp::Eq, left, right)),
                    BinaryOperator::NotEq => Ok(Node::Compare(CompareOp::NotEq, left, right)),
                    BinaryOperator::Lt => Ok(Node::Compare(CompareOp::Lt, left, right)),
                    BinaryOperator::LtEq => Ok(Node::Compare(CompareOp::LtEq, left, right)),
                    BinaryOperator::Gt => Ok(Node::Compare(CompareOp::Gt, left, right)),
                    BinaryOperator::GtEq => Ok(Node::Compare(CompareOp::GtEq, left, right)),
                    BinaryOperator::Plus => Ok(Node::Arith(ArithOp::Add, left, right)),
                    BinaryOperator::Minus => Ok(Node::Arith(ArithOp::Sub, left, right)),
                    BinaryOperator::Multiply => Ok(Node::Arith(ArithOp::Mul, left, right)),
                    BinaryOperator::Divide => Ok(Node::Arith(ArithOp::Div, left, right)),
                    BinaryOperator::Modulo => Ok(Node::Arith(ArithOp::Mod, left, right)),
                    other => Err(format!("unsupported operator '{}'", other)),
                }
            }
            Expr::InList { expr, list, negated } => Ok(Node::InList {
                expr: Box::new(self.compile(expr)?),
                list: list
                    .iter()
                    .map(|item| self.compile(item))
                    .collect::<std::result::Result<Vec<_>, String>>()?,
                negated: *negated,
            }),
            Expr::Between { expr, negated, low, high } => Ok(Node::Between {
                expr: Box::new(self.compile(expr)?),
                low: Box::new(self.compile(low)?),
                high: Box::new(self.compile(high)?),
                negated: *negated,
            }),
            other => Err(format!("unsupported expression '{}'", other)),
        }
    }

    fn identifier(&self, ident: &Ident) -> CompileResult {
        if let Some(position) = self.schema.column_index(&ident.value) {
            return Ok(Node::Column {
                position,
                name: ident.value.clone(),
            });
        }
        if ident.quote_style == Some('"') && self.config.quoted_identifiers_as_text {
            return Ok(Node::Literal(Scalar::Text(ident.value.clone())));
        }
        Err(format!("name '{}' is not defined", ident.value))
    }
}

fn literal(value: &SqlValue) -> std::result::Result<Scalar, String> {
    match value {
        SqlValue::Number(text, _) => {
            if let Ok(v) = text.parse::<i64>() {
                Ok(Scalar::Int(v))
            } else {
                text.parse::<f64>()
                    .map(Scalar::Real)
                    .map_err(|_| format!("invalid number '{}'", text))
            }
        }
        SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => Ok(Scalar::Text(s.clone())),
        SqlValue::Boolean(b) => Ok(Scalar::Bool(*b)),
        SqlValue::Null => Err("NULL is not supported: every column is mandatory".to_string()),
        other => Err(format!("unsupported literal {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::error::ValidationErrorKind;
    use crate::schema::{generate_schema, RowValidator};
    use rstest::rstest;
    use serde_json::json;

    fn schema() -> TableSchema {
        generate_schema(
            "people",
            [("name", "string"), ("age", "int"), ("score", "float"), ("seen", "datetime"), ("span", "dateinvl")],
        )
        .unwrap()
    }

    fn row(schema: &TableSchema) -> Row {
        let config = ValidationConfig::default();
        RowValidator::new(schema, &config)
            .validate(&json!({
                "name": "Ann",
                "age": 30,
                "score": 7.5,
                "seen": "2024-03-01T12:00:00",
                "span": ["2024-01-01", "2024-02-01"]
            }))
            .unwrap()
    }

    fn eval(source: &str) -> Result<bool> {
        let schema = schema();
        let row = row(&schema);
        Predicate::parse(source, &schema, &QueryConfig::default())?.matches(&row)
    }

    #[rstest]
    #[case("age > 7", true)]
    #[case("age = 30", true)]
    #[case("age == 30", true)]
    #[case("age != 30", false)]
    #[case("age <> 31", true)]
    #[case("age >= 30 AND score < 8", true)]
    #[case("age < 10 or name = 'Ann'", true)]
    #[case("NOT (age > 7)", false)]
    #[case("name == \"Ann\"", true)]
    #[case("age + 5 = 35", true)]
    #[case("age / 4 = 7.5", true)]
    #[case("age % 7 = 2", true)]
    #[case("-age < 0", true)]
    #[case("age IN (1, 30, 50)", true)]
    #[case("name NOT IN ('Bo', 'Cy')", true)]
    #[case("age BETWEEN 30 AND 40", true)]
    #[case("score NOT BETWEEN 7 AND 8", false)]
    #[case("seen > '2024-02-15'", true)]
    #[case("seen = '2024-03-01 12:00:00'", true)]
    #[case("true", true)]
    #[case("age > 7 & name == 'Ann'", true)]
    #[case("age > 7 & name == 'Bo'", false)]
    #[case("age > 70 | name == 'Bo'", false)]
    #[case("age > 70 | name == 'Ann' & score < 8", true)]
    #[case("name in (1, 'Ann')", true)]
    #[case("age not in ('x', 31)", true)]
    fn test_predicates(#[case] source: &str, #[case] expected: bool) {
        assert_eq!(eval(source).unwrap(), expected, "predicate `{}`", source);
    }

    #[rstest]
    #[case("height > 3")]
    #[case("name > 3")]
    #[case("age >")]
    #[case("age > 3 extra")]
    #[case("")]
    #[case("age + 1")]
    #[case("age = NULL")]
    #[case("age / 0 > 1")]
    #[case("span > span")]
    #[case("seen > 'not a date'")]
    #[case("upper(name) = 'ANN'")]
    fn test_query_errors(#[case] source: &str) {
        let err = eval(source).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::QueryError, "predicate `{}`", source);
    }

    #[test]
    fn test_unknown_column_fails_at_parse() {
        let err = Predicate::parse("height > 3", &schema(), &QueryConfig::default()).unwrap_err();
        assert!(err.to_string().contains("name 'height' is not defined"));
    }

    #[test]
    fn test_quoted_identifiers() {
        let schema = generate_schema("t", [("first name", "string")]).unwrap();
        let config = ValidationConfig::default();
        let row = RowValidator::new(&schema, &config)
            .validate(&json!({"first name": "Ann"}))
            .unwrap();

        let predicate = Predicate::parse("\"first name\" = 'Ann'", &schema, &QueryConfig::default()).unwrap();
        assert!(predicate.matches(&row).unwrap());
        assert_eq!(predicate.source(), "\"first name\" = 'Ann'");

        // Strict mode does not turn unknown quoted names into text
        let strict = QueryConfig {
            quoted_identifiers_as_text: false,
            ..QueryConfig::default()
        };
        assert!(Predicate::parse("\"first name\" = \"Ann\"", &schema, &strict).is_err());
    }
}
