//! Dynamic SQL values - the parameter/result representation
//!
//! Statements are bound positionally with [`Value`]s and rows come back as
//! [`Value`]s, so the session never needs to know the concrete Rust type
//! behind a column. [`ScalarKind`] is the fixed DDL type mapping used by
//! create-table synthesis.

/// A dynamically typed SQL value.
///
/// Integers are widened to 64 bits on the wire; the INT/BIGINT distinction
/// only exists in generated DDL (see [`ScalarKind`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Text(String),
}

impl Value {
    /// Read as a 64-bit integer, if this value holds one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Read as a double, if this value holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Read as text, if this value holds some.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Value::from)
    }
}

/// Conversion from a [`Value`] back into a Rust scalar.
///
/// Used by generated column setters when a fetched row is written back into
/// an entity instance. A type mismatch yields `None` rather than panicking.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Scalar kind of a plain column - drives the fixed create-table type
/// mapping. Unknown scalars fall back to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    BigInt,
    Double,
    Text,
}

impl ScalarKind {
    /// The SQL column type emitted for this scalar kind.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ScalarKind::Int => "INT",
            ScalarKind::BigInt => "BIGINT",
            ScalarKind::Double => "DOUBLE",
            ScalarKind::Text => "VARCHAR(255)",
        }
    }
}

/// Maps a Rust column type to its [`ScalarKind`].
///
/// Implemented for the scalars the mapper supports; the `entity!` macro uses
/// it to fill in `FieldRole::Column::scalar`.
pub trait ColumnType {
    const SCALAR: ScalarKind;
}

impl ColumnType for i32 {
    const SCALAR: ScalarKind = ScalarKind::Int;
}

impl ColumnType for i64 {
    const SCALAR: ScalarKind = ScalarKind::BigInt;
}

impl ColumnType for f64 {
    const SCALAR: ScalarKind = ScalarKind::Double;
}

impl ColumnType for String {
    const SCALAR: ScalarKind = ScalarKind::Text;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from(5i64), Value::Int(5));
        assert_eq!(Value::from(1.5f64), Value::Double(1.5));
        assert_eq!(Value::from("hi"), Value::Text("hi".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn test_from_value_round_trip() {
        assert_eq!(i64::from_value(Value::Int(42)), Some(42));
        assert_eq!(i32::from_value(Value::Int(42)), Some(42));
        assert_eq!(f64::from_value(Value::Double(2.5)), Some(2.5));
        assert_eq!(
            String::from_value(Value::Text("x".into())),
            Some("x".to_string())
        );
        assert_eq!(Option::<i64>::from_value(Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(Value::Int(1)), Some(Some(1)));
    }

    #[test]
    fn test_from_value_mismatch_is_none() {
        assert_eq!(i64::from_value(Value::Text("42".into())), None);
        assert_eq!(String::from_value(Value::Int(42)), None);
        assert_eq!(f64::from_value(Value::Null), None);
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(ScalarKind::Int.sql_type(), "INT");
        assert_eq!(ScalarKind::BigInt.sql_type(), "BIGINT");
        assert_eq!(ScalarKind::Double.sql_type(), "DOUBLE");
        assert_eq!(ScalarKind::Text.sql_type(), "VARCHAR(255)");
        assert_eq!(<String as ColumnType>::SCALAR, ScalarKind::Text);
    }
}
