//! Normalisation of raw sentiment-model output.
//!
//! Inference backends disagree on the shape of their result. A local
//! pipeline returns a flat ranked list of predictions, while hosted
//! inference APIs wrap that list once more (one inner list per input):
//!
//! - Flat: `[{"label": "POSITIVE", "score": 0.98}, ...]`
//! - Nested: `[[{"label": "POSITIVE", "score": 0.98}, ...]]`
//!
//! Both collapse to a single [`SentimentRecord`] built from the first
//! (highest-ranked) prediction. The rest of the list is ignored.

use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::record::SentimentRecord;

/// The recognised layouts of a raw output, resolved to the prediction list.
enum OutputShape<'a> {
    Flat(&'a [Value]),
    Nested(&'a [Value]),
}

impl<'a> OutputShape<'a> {
    /// Probe the flat layout first, then the singly-nested one.
    fn parse(raw: &'a Value) -> Result<Self, NormalizeError> {
        let outer = match raw {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => {
                return Err(NormalizeError::InvalidOutputShape(
                    "expected a non-empty list of predictions, got an empty list".into(),
                ));
            }
            other => {
                return Err(NormalizeError::InvalidOutputShape(format!(
                    "expected a list of predictions, got {}",
                    kind(other)
                )));
            }
        };

        match &outer[0] {
            Value::Object(_) => Ok(Self::Flat(outer)),
            Value::Array(inner) if !inner.is_empty() && inner[0].is_object() => {
                Ok(Self::Nested(inner))
            }
            Value::Array(inner) if inner.is_empty() => Err(NormalizeError::InvalidOutputShape(
                "nested prediction list is empty".into(),
            )),
            Value::Array(inner) => Err(NormalizeError::InvalidOutputShape(format!(
                "nested prediction list holds {}, expected objects",
                kind(&inner[0])
            ))),
            other => Err(NormalizeError::InvalidOutputShape(format!(
                "prediction list holds {}, expected objects",
                kind(other)
            ))),
        }
    }

    fn predictions(&self) -> &'a [Value] {
        match self {
            Self::Flat(items) | Self::Nested(items) => *items,
        }
    }
}

/// Convert raw model output into a canonical [`SentimentRecord`].
///
/// # Errors
///
/// - [`NormalizeError::InvalidOutputShape`] when `raw` is not a non-empty
///   list of objects (flat or singly nested).
/// - [`NormalizeError::InvalidOutputFields`] when the top prediction lacks a
///   string `label` or a numeric `score`.
pub fn normalize_output(raw: &Value) -> Result<SentimentRecord, NormalizeError> {
    let shape = OutputShape::parse(raw)?;
    let top = shape
        .predictions()
        .first()
        .and_then(Value::as_object)
        .ok_or_else(|| NormalizeError::InvalidOutputShape("missing top prediction".into()))?;

    record_from_prediction(top)
}

fn record_from_prediction(prediction: &Map<String, Value>) -> Result<SentimentRecord, NormalizeError> {
    let label = prediction
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            NormalizeError::InvalidOutputFields("top prediction has no string `label`".into())
        })?;
    let score = prediction
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            NormalizeError::InvalidOutputFields("top prediction has no numeric `score`".into())
        })?;

    Ok(SentimentRecord::new(label, score))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
