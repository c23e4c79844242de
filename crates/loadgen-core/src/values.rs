//! Value representations for generated rows.
//!
//! Every column of an emitted row is one [`FieldValue`]. Sinks only ever see
//! these four shapes, which keeps each output format's conversion total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string
    Text,
    /// 64-bit signed integer
    Int,
    /// UTC timestamp
    Timestamp,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Int => write!(f, "int"),
            FieldType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// A single column value of an emitted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// String value
    Text(String),

    /// Integer value
    Int(i64),

    /// Date/time in UTC
    Timestamp(DateTime<Utc>),

    /// Null value
    Null,
}

impl FieldValue {
    /// Build an integer value from an optional number, mapping `None` to null.
    pub fn int_or_null(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Int)
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value can be stored in a column of the given type.
    ///
    /// Null is accepted by every column type.
    pub fn conforms_to(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (Self::Null, _)
                | (Self::Text(_), FieldType::Text)
                | (Self::Int(_), FieldType::Int)
                | (Self::Timestamp(_), FieldType::Timestamp)
        )
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a timestamp.
    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}
