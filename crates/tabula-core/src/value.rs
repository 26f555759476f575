#![forbid(unsafe_code)]

//! Cell values and declared column types.

use std::fmt;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    /// Free text.
    #[default]
    Text,
    /// 64-bit signed integer.
    Long,
    /// 64-bit float.
    Double,
    /// Boolean.
    Bool,
}

impl ColumnType {
    /// Whether `value` may be stored in a column of this type.
    ///
    /// `Null` fits every column; a `Long` is accepted by `Double` columns.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Text, Value::Text(_))
                | (Self::Long, Value::Long(_))
                | (Self::Double, Value::Double(_) | Value::Long(_))
                | (Self::Bool, Value::Bool(_))
        )
    }
}

/// Contents of one cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Empty cell.
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
}

impl Value {
    /// Check whether the cell is empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether writing `other` over `self` would leave the cell unchanged.
    ///
    /// Doubles compare bitwise, so `-0.0` differs from `0.0` and a NaN
    /// matches only the same NaN.
    #[must_use]
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Double(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Double(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fits_every_column_type() {
        for ty in [
            ColumnType::Text,
            ColumnType::Long,
            ColumnType::Double,
            ColumnType::Bool,
        ] {
            assert!(ty.accepts(&Value::Null));
        }
    }

    #[test]
    fn column_type_rejects_mismatched_values() {
        assert!(!ColumnType::Long.accepts(&Value::from("x")));
        assert!(!ColumnType::Bool.accepts(&Value::Long(1)));
        assert!(ColumnType::Double.accepts(&Value::Long(1)));
        assert!(ColumnType::Text.accepts(&Value::from("x")));
    }

    #[test]
    fn identity_distinguishes_signed_zero() {
        assert_eq!(Value::Double(-0.0), Value::Double(0.0));
        assert!(!Value::Double(-0.0).is_identical(&Value::Double(0.0)));
        assert!(Value::Double(f64::NAN).is_identical(&Value::Double(f64::NAN)));
        assert!(Value::from("x").is_identical(&Value::from("x")));
        assert!(!Value::Long(1).is_identical(&Value::Double(1.0)));
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(5_i64)), Value::Long(5));
    }

    #[test]
    fn display_renders_null_as_empty() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::Long(-3).to_string(), "-3");
    }
}
