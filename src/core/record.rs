//! Purpose: Define the schema-flexible record representation.
//! Exports: `Record`, `coerce_scalar`, numeric field accessors.
//! Role: Field sets come from the CSV header at load time, so records are
//! ordered name→scalar maps rather than fixed structs.
//! Invariants: Scalars are either integers or text; rating updates may
//! introduce floats.

use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

/// One stored item: an ordered map from field name to scalar value.
///
/// `serde_json`'s `preserve_order` feature keeps fields in header order.
pub type Record = Map<String, Value>;

/// Coerce a raw text field to an integer when lexically possible,
/// otherwise keep it as text.
pub fn coerce_scalar(raw: &str) -> Value {
    match raw.trim().parse::<i64>() {
        Ok(number) => Value::from(number),
        Err(_) => Value::from(raw),
    }
}

/// Read a numeric field as `f64`.
///
/// A record that reaches the rating flow without its numeric fields is a
/// data problem, not a caller problem, so the failure kind is `Internal`.
pub fn field_f64(record: &Record, field: &str) -> Result<f64, Error> {
    record
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message(format!("record has no numeric `{field}` field"))
        })
}

/// Read a non-negative integer field.
pub fn field_u64(record: &Record, field: &str) -> Result<u64, Error> {
    record
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message(format!("record has no counter `{field}` field"))
        })
}
