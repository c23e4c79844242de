//! Row → JSON object conversion.

use loadgen_core::{FieldValue, Record};
use serde_json::{json, Map, Value};

/// Convert a field to a JSON value. Timestamps are RFC 3339.
pub fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Int(i) => json!(*i),
        FieldValue::Text(s) => json!(s),
        FieldValue::Timestamp(ts) => json!(ts.to_rfc3339()),
    }
}

/// Convert a complete row to a JSON object keyed by column name.
pub fn record_to_json<R: Record>(row: &R) -> Value {
    let mut obj = Map::new();
    for (column, value) in R::COLUMNS.iter().zip(row.fields()) {
        obj.insert(column.name.to_string(), field_to_json(&value));
    }
    Value::Object(obj)
}
