use serde_json::Value;

use crate::{DecisionReason, EnforcementDecision};

/// Field of the attribute JSON that carries the flag.
pub const ENABLED_FIELD: &str = "enabled";

/// Interpret a raw attribute value. Evaluated in order:
/// - empty => disabled
/// - not JSON => disabled
/// - JSON but not an object => disabled
/// - object without `enabled` => disabled
/// - `enabled` truthy => enabled, otherwise disabled
pub fn decide(raw: &str) -> EnforcementDecision {
    if raw.trim().is_empty() {
        return EnforcementDecision::disabled(DecisionReason::EmptyValue);
    }

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return EnforcementDecision::disabled(DecisionReason::Unparseable),
    };

    let obj = match parsed.as_object() {
        Some(o) => o,
        None => return EnforcementDecision::disabled(DecisionReason::NotAnObject),
    };

    match obj.get(ENABLED_FIELD) {
        None => EnforcementDecision::disabled(DecisionReason::MissingField),
        Some(v) if is_truthy(v) => EnforcementDecision::enabled(),
        Some(_) => EnforcementDecision::disabled(DecisionReason::Disabled),
    }
}

/// `decide(raw).enabled`.
pub fn reconcile(raw: &str) -> bool {
    decide(raw).enabled
}

/// Truthiness of a JSON value: `null`, `false`, zero, and empty
/// strings/arrays/objects are falsy; everything else is truthy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
