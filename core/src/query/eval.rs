//! Predicate evaluation
//!
//! A compiled predicate is a tree of [`Node`]s whose column references are
//! already resolved to row positions. Evaluation is strict: both sides of
//! every operator are evaluated, so type errors surface on every row.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::models::{DateInterval, Row, Value};
use crate::schema::parse_timestamp;

/// Intermediate value produced while evaluating a predicate
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Interval(DateInterval),
}

impl Scalar {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Text(v) => Scalar::Text(v.clone()),
            Value::Integer(v) => Scalar::Int(*v),
            Value::Real(v) => Scalar::Real(*v),
            Value::Timestamp(v) => Scalar::Timestamp(*v),
            Value::Interval(v) => Scalar::Interval(*v),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Real(_) => "float",
            Scalar::Text(_) => "string",
            Scalar::Timestamp(_) => "datetime",
            Scalar::Interval(_) => "dateinvl",
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Real(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }

    /// Apply to an ordering; `None` (NaN involved) only satisfies `!=`
    fn holds(&self, ordering: Option<Ordering>) -> bool {
        match ordering {
            None => *self == CompareOp::NotEq,
            Some(ordering) => match self {
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::NotEq => ordering != Ordering::Equal,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::LtEq => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::GtEq => ordering != Ordering::Less,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }
}

/// Compiled predicate expression
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Column { position: usize, name: String },
    Literal(Scalar),
    Not(Box<Node>),
    Negate(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Compare(CompareOp, Box<Node>, Box<Node>),
    Arith(ArithOp, Box<Node>, Box<Node>),
    InList { expr: Box<Node>, list: Vec<Node>, negated: bool },
    Between { expr: Box<Node>, low: Box<Node>, high: Box<Node>, negated: bool },
}

type EvalResult<T> = std::result::Result<T, String>;

impl Node {
    pub(crate) fn eval(&self, row: &Row) -> EvalResult<Scalar> {
        match self {
            Node::Column { position, name } => row
                .value_at(*position)
                .map(Scalar::from_value)
                .ok_or_else(|| format!("column '{}' missing from row", name)),
            Node::Literal(value) => Ok(value.clone()),
            Node::Not(inner) => Ok(Scalar::Bool(!expect_bool(inner.eval(row)?, "NOT")?)),
            Node::Negate(inner) => match inner.eval(row)? {
                Scalar::Int(v) => v
                    .checked_neg()
                    .map(Scalar::Int)
                    .ok_or_else(|| "integer overflow".to_string()),
                Scalar::Real(v) => Ok(Scalar::Real(-v)),
                other => Err(format!("cannot negate {}", other.type_name())),
            },
            Node::And(left, right) => {
                let left = expect_bool(left.eval(row)?, "AND")?;
                let right = expect_bool(right.eval(row)?, "AND")?;
                Ok(Scalar::Bool(left && right))
            }
            Node::Or(left, right) => {
                let left = expect_bool(left.eval(row)?, "OR")?;
                let right = expect_bool(right.eval(row)?, "OR")?;
                Ok(Scalar::Bool(left || right))
            }
            Node::Compare(op, left, right) => {
                let left = left.eval(row)?;
                let right = right.eval(row)?;
                compare(*op, &left, &right).map(Scalar::Bool)
            }
            Node::Arith(op, left, right) => {
                let left = left.eval(row)?;
                let right = right.eval(row)?;
                arithmetic(*op, &left, &right)
            }
            Node::InList { expr, list, negated } => {
                let needle = expr.eval(row)?;
                let mut found = false;
                for item in list {
                    if list_member_eq(&needle, &item.eval(row)?)? {
                        found = true;
                    }
                }
                Ok(Scalar::Bool(found != *negated))
            }
            Node::Between { expr, low, high, negated } => {
                let value = expr.eval(row)?;
                let above = compare(CompareOp::GtEq, &value, &low.eval(row)?)?;
                let below = compare(CompareOp::LtEq, &value, &high.eval(row)?)?;
                Ok(Scalar::Bool((above && below) != *negated))
            }
        }
    }
}

fn expect_bool(value: Scalar, context: &str) -> EvalResult<bool> {
    match value {
        Scalar::Bool(b) => Ok(b),
        other => Err(format!("{} expects booleans, got {}", context, other.type_name())),
    }
}

/// Equality for `IN` lists: values of unrelated types are simply unequal
fn list_member_eq(needle: &Scalar, item: &Scalar) -> EvalResult<bool> {
    match (needle, item) {
        (Scalar::Int(_) | Scalar::Real(_), Scalar::Int(_) | Scalar::Real(_))
        | (Scalar::Text(_), Scalar::Text(_))
        | (Scalar::Bool(_), Scalar::Bool(_))
        | (Scalar::Timestamp(_), Scalar::Timestamp(_) | Scalar::Text(_))
        | (Scalar::Text(_), Scalar::Timestamp(_))
        | (Scalar::Interval(_), Scalar::Interval(_)) => compare(CompareOp::Eq, needle, item),
        _ => Ok(false),
    }
}

fn text_as_timestamp(text: &str) -> EvalResult<NaiveDateTime> {
    parse_timestamp(text, &[]).ok_or_else(|| format!("unable to parse '{}' as a datetime", text))
}

fn compare(op: CompareOp, left: &Scalar, right: &Scalar) -> EvalResult<bool> {
    let ordering = match (left, right) {
        (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
        (Scalar::Int(_) | Scalar::Real(_), Scalar::Int(_) | Scalar::Real(_)) => {
            match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
        (Scalar::Timestamp(a), Scalar::Text(b)) => Some(a.cmp(&text_as_timestamp(b)?)),
        (Scalar::Text(a), Scalar::Timestamp(b)) => Some(text_as_timestamp(a)?.cmp(b)),
        (Scalar::Interval(a), Scalar::Interval(b)) => match op {
            CompareOp::Eq | CompareOp::NotEq => Some(a.cmp(b)),
            _ => return Err(format!("dateinvl values only support = and !=, not {}", op.symbol())),
        },
        _ => {
            return Err(format!(
                "cannot compare {} {} {}",
                left.type_name(),
                op.symbol(),
                right.type_name()
            ))
        }
    };
    Ok(op.holds(ordering))
}

fn arithmetic(op: ArithOp, left: &Scalar, right: &Scalar) -> EvalResult<Scalar> {
    if let (Scalar::Int(a), Scalar::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let result = match op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => {
                if b == 0 {
                    return Err("division by zero".to_string());
                }
                return Ok(Scalar::Real(a as f64 / b as f64));
            }
            ArithOp::Mod => {
                if b == 0 {
                    return Err("division by zero".to_string());
                }
                if b == -1 {
                    // checked_rem reports i64::MIN % -1 as overflow
                    Some(0)
                } else {
                    // Result takes the sign of the divisor
                    a.checked_rem(b).map(|r| if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
                }
            }
        };
        return result.map(Scalar::Int).ok_or_else(|| "integer overflow".to_string());
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => {
            if matches!(op, ArithOp::Div | ArithOp::Mod) && b == 0.0 {
                return Err("division by zero".to_string());
            }
            let value = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
                ArithOp::Mod => a - b * (a / b).floor(),
            };
            Ok(Scalar::Real(value))
        }
        _ => Err(format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )),
    }
}
