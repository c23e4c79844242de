//! Field value → load-file string conversion.

use loadgen_core::FieldValue;

/// Timestamp layout understood by bulk loaders.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Wrapper for CSV string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvValue(pub String);

impl CsvValue {
    /// Convert a field, writing nulls as `null_token`.
    pub fn from_field(value: &FieldValue, null_token: &str) -> Self {
        match value {
            FieldValue::Null => CsvValue(null_token.to_string()),
            FieldValue::Int(i) => CsvValue(i.to_string()),
            FieldValue::Text(s) => CsvValue(s.clone()),
            FieldValue::Timestamp(ts) => CsvValue(ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// Get the inner CSV string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Get a reference to the inner CSV string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Convert a row's fields to a record.
pub fn fields_to_record(fields: &[FieldValue], null_token: &str) -> Vec<String> {
    fields
        .iter()
        .map(|f| CsvValue::from_field(f, null_token).into_inner())
        .collect()
}
