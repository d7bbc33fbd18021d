//! Response normalization
//!
//! Turns a decoded response body into records: unwrap the envelope, then
//! prune each raw object down to the declared fields in declared order.

use serde_json::Value;

use crate::connectors::metadata::{FieldKind, FieldSpec, ResourceDefinition};
use crate::error::StreamError;
use crate::models::{FieldValue, Record};

/// Extract the raw records from a response body.
///
/// With a records key the value under that key is used, otherwise the whole
/// body. A lone value is treated as a one-element sequence.
pub fn unwrap_envelope(
    stream: &str,
    body: Value,
    records_key: Option<&str>,
) -> Result<Vec<Value>, StreamError> {
    let payload = match records_key {
        Some(key) => {
            let nested = match body {
                Value::Object(mut map) => map.remove(key),
                _ => None,
            };
            nested.ok_or_else(|| StreamError::MissingEnvelope {
                stream: stream.to_string(),
                key: key.to_string(),
            })?
        }
        None => body,
    };

    Ok(match payload {
        Value::Array(items) => items,
        single => vec![single],
    })
}

/// Build a record holding exactly `fields`, in order, from one raw object.
pub fn prune_record(
    stream: &str,
    index: usize,
    raw: Value,
    fields: &[FieldSpec],
) -> Result<Record, StreamError> {
    let Value::Object(mut raw) = raw else {
        return Err(StreamError::NotAnObject {
            stream: stream.to_string(),
            index,
        });
    };

    let mut record = Record::with_capacity(fields.len());
    for field in fields {
        let value = raw.remove(field.name).ok_or_else(|| StreamError::MissingField {
            stream: stream.to_string(),
            field: field.name.to_string(),
            index,
        })?;

        let value = FieldValue::from_json(value).map_err(|err| StreamError::InvalidDecimal {
            stream: stream.to_string(),
            field: field.name.to_string(),
            literal: err.literal,
        })?;

        let value = match field.kind {
            FieldKind::Decimal => value.into_decimal(),
            _ => value,
        };

        record.push(field.name, value);
    }

    Ok(record)
}

/// Normalize a whole response. Fails on the first bad record, so callers never
/// see a partial result.
pub fn normalize_response(
    definition: &ResourceDefinition,
    body: Value,
) -> Result<Vec<Record>, StreamError> {
    unwrap_envelope(definition.name, body, definition.records_key)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| prune_record(definition.name, index, raw, definition.fields))
        .collect()
}
