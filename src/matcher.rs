//! Structural subset matching between desired and observed objects
//!
//! The gateway returns more than it was sent (ids, timestamps, defaults), so
//! an observed object matches when it contains everything the desired object
//! specifies. Keys present only on the observed side are ignored.

use serde_json::Value;

use crate::gateway::Statistics;

/// Value kind used for the type check
#[derive(Debug, PartialEq, Eq)]
enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

fn kind(value: &Value) -> Kind {
    match value {
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Bool,
        Value::Number(_) => Kind::Number,
        Value::String(_) => Kind::String,
        Value::Array(_) => Kind::Array,
        Value::Object(_) => Kind::Object,
    }
}

/// True when every property of `desired` is present in `observed` with the
/// same kind and an equal value, at any depth.
///
/// Arrays are compared by index like objects: element `i` of `desired` must
/// match element `i` of `observed`, and `observed` may be longer.
pub fn matches(desired: &Value, observed: &Value) -> bool {
    if kind(desired) != kind(observed) {
        return false;
    }
    match (desired, observed) {
        (Value::Object(want), Value::Object(have)) => want.iter().all(|(key, value)| {
            have.get(key)
                .map(|other| matches(value, other))
                .unwrap_or(false)
        }),
        (Value::Array(want), Value::Array(have)) => want.len() <= have.len()
            && want.iter().zip(have.iter()).all(|(a, b)| matches(a, b)),
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (a, b) => a == b,
    }
}

/// [`matches`], recording the pair in `statistics` when it fails and
/// recording is enabled
pub fn matches_recorded(desired: &Value, observed: &Value, statistics: &Statistics) -> bool {
    let result = matches(desired, observed);
    if !result {
        statistics.record_mismatch(desired, observed);
    }
    result
}

fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
