use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use super::Violation;

/// A JSON body schema: serde decoding plus `validator` rules.
///
/// `FIELDS` pairs every struct field with the key it has in the payload, so
/// violations name the field the way the client sent it.
pub trait BodySchema: DeserializeOwned + Validate {
    /// `(struct field, payload key)` for every field of the schema.
    const FIELDS: &'static [(&'static str, &'static str)];

    /// Payload key of a struct field. Unlisted names map to themselves.
    fn payload_key(field: &str) -> &str {
        Self::FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, key)| *key)
            .unwrap_or(field)
    }
}

/// Decode `payload` into `T` and run its validation rules.
///
/// Every violation is collected: fields holding a value of the wrong type
/// are reported one by one, then the remaining fields are decoded and
/// checked against the rules. Violations are sorted by payload key.
pub fn validate_body<T: BodySchema>(payload: &Value) -> Result<T, Vec<Violation>> {
    let Value::Object(fields) = payload else {
        return Err(vec![Violation::new(
            "Malformed request body: expected a JSON object",
        )]);
    };

    let mut violations = type_violations::<T>(fields);

    // Wrongly typed fields are dropped so the rest can still be decoded
    let mut remaining = fields.clone();
    let mistyped: Vec<String> = violations
        .iter()
        .filter_map(context_key)
        .map(str::to_string)
        .collect();
    for key in &mistyped {
        remaining.remove(key);
    }

    match serde_json::from_value::<T>(Value::Object(remaining)) {
        Ok(parsed) => match parsed.validate() {
            Ok(()) if violations.is_empty() => return Ok(parsed),
            Ok(()) => {}
            Err(errors) => violations.extend(
                rule_violations::<T>(&errors)
                    .into_iter()
                    .filter(|v| !context_key(v).is_some_and(|key| mistyped.iter().any(|m| m == key))),
            ),
        },
        Err(e) if violations.is_empty() => {
            violations.push(Violation::new(format!("Malformed request body: {}", e)));
        }
        Err(_) => {}
    }

    violations.sort_by(|a, b| context_key(a).cmp(&context_key(b)));
    Err(violations)
}

/// One violation per listed field whose value alone fails to decode.
///
/// Errors that an empty object produces as well (a missing non-optional
/// field) are not attributed to the field being checked.
fn type_violations<T: BodySchema>(fields: &Map<String, Value>) -> Vec<Violation> {
    let baseline = serde_json::from_value::<T>(Value::Object(Map::new()))
        .err()
        .map(|e| e.to_string());

    T::FIELDS
        .iter()
        .filter_map(|(_, key)| {
            let value = fields.get(*key)?;

            let mut single = Map::new();
            single.insert(key.to_string(), value.clone());
            let message = serde_json::from_value::<T>(Value::Object(single))
                .err()?
                .to_string();

            if baseline.as_deref() == Some(message.as_str()) {
                return None;
            }

            Some(Violation::for_field(
                type_message(key, &message),
                *key,
                Some(value.clone()),
            ))
        })
        .collect()
}

/// `"age" must be u32` from serde's `invalid type: .., expected u32`.
fn type_message(key: &str, serde_message: &str) -> String {
    match serde_message.rsplit_once(", expected ") {
        Some((_, expected)) => format!("\"{}\" must be {}", key, expected),
        None => format!("\"{}\" {}", key, serde_message),
    }
}

fn rule_violations<T: BodySchema>(errors: &ValidationErrors) -> Vec<Violation> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let key = T::payload_key(&field).to_string();
            field_errors.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("\"{}\" failed {} check", key, err.code));
                Violation::for_field(message, key.clone(), err.params.get("value").cloned())
            })
        })
        .collect()
}

fn context_key(violation: &Violation) -> Option<&str> {
    violation.context.as_ref().map(|c| c.key.as_str())
}
