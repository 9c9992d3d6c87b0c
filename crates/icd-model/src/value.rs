//! Typed values produced by field validation.

use std::fmt;

use chrono::NaiveDateTime;

/// Result of validating one item against its field format.
///
/// An empty item whose field allows empty values yields `Absent` without
/// invoking type specific parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Integer(i64),
    Decimal(f64),
    /// Date or date-time; midnight when the pattern has no time part.
    DateTime(NaiveDateTime),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Numeric view of the value, for totalling checks.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Decimal(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::DateTime(value) => write!(f, "{value}"),
        }
    }
}
