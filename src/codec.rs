//! Text snapshots of a [`Params`] set.
//!
//! The snapshot is a flat JSON object keyed by [`Field::key`]. Encoding goes
//! through serde and refuses non-finite floats; decoding checks every key by
//! hand so errors name the field.

use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::config::{Field, Kind, Params, ParseError, Value};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot must be a JSON object")]
    NotAnObject,
    #[error("snapshot is missing `{0}`")]
    MissingField(Field),
    #[error("snapshot field `{field}` must be a {}", .expected.name())]
    WrongKind { field: Field, expected: Kind },
}

#[derive(Debug, Error)]
pub enum EncodeError {
    /// JSON has no spelling for NaN or infinity.
    #[error("cannot encode snapshot: {0}")]
    NonFinite(#[from] ParseError),
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn encode(p: &Params) -> Result<String, EncodeError> {
    p.validate()?;
    Ok(serde_json::to_string(p)?)
}

pub fn decode(text: &str) -> Result<Params, DecodeError> {
    let doc: Json = serde_json::from_str(text)?;
    decode_value(&doc)
}

/// Decode an already parsed document. Unknown keys are ignored.
pub fn decode_value(doc: &Json) -> Result<Params, DecodeError> {
    let obj = doc.as_object().ok_or(DecodeError::NotAnObject)?;
    let mut params = Params::default();
    for field in Field::ALL {
        let value = read_field(obj, field)?;
        params
            .set(field, value)
            .map_err(|_| DecodeError::WrongKind {
                field,
                expected: field.kind(),
            })?;
    }
    Ok(params)
}

fn read_field(obj: &Map<String, Json>, field: Field) -> Result<Value, DecodeError> {
    let raw = obj
        .get(field.key())
        .ok_or(DecodeError::MissingField(field))?;
    let wrong = || DecodeError::WrongKind {
        field,
        expected: field.kind(),
    };
    match field.kind() {
        Kind::Float => {
            let v = raw.as_f64().ok_or_else(wrong)? as f32;
            // Out-of-range doubles land on infinity here.
            if v.is_finite() { Ok(Value::Float(v)) } else { Err(wrong()) }
        }
        Kind::Int => raw
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int)
            .ok_or_else(wrong),
        Kind::Bool => raw.as_bool().map(Value::Bool).ok_or_else(wrong),
    }
}
