//! Strict validation of the public result schema.

use serde_json::{Map, Value};

use super::DialecticResult;
use crate::error::SchemaError;

const REQUIRED_FIELDS: &[&str] = &["query", "thesis", "antithesis", "synthesis"];

const ALLOWED_FIELDS: &[&str] = &[
    "query",
    "mode",
    "thesis",
    "antithesis",
    "synthesis",
    "timestamp",
    "validation_score",
    "contradictions",
    "research_proposals",
    "metadata",
    "trace",
];

const MODES: &[&str] = &["synthesis", "antithesis", "thesis_only"];

const REQUIRED_TIMINGS: &[&str] = &["thesis_time_ms", "antithesis_time_ms", "total_time_ms"];

/// Validate a result against the public schema.
///
/// The result is checked in its serialized form so the rules match what
/// callers and the cache actually see on the wire.
pub fn validate_result(result: &DialecticResult) -> Result<(), SchemaError> {
    let value = serde_json::to_value(result).map_err(|e| SchemaError {
        violations: vec![format!("result is not serializable: {}", e)],
    })?;
    validate_value(&value)
}

/// Validate an already-serialized result document.
pub fn validate_value(value: &Value) -> Result<(), SchemaError> {
    let mut violations = Vec::new();

    let Some(object) = value.as_object() else {
        return Err(SchemaError {
            violations: vec!["result must be a JSON object".to_string()],
        });
    };

    for field in REQUIRED_FIELDS {
        match object.get(*field) {
            Some(Value::String(_)) => {}
            Some(_) => violations.push(format!("'{}' must be a string", field)),
            None => violations.push(format!("missing required field '{}'", field)),
        }
    }

    for key in object.keys() {
        if !ALLOWED_FIELDS.contains(&key.as_str()) {
            violations.push(format!("unexpected top-level field '{}'", key));
        }
    }

    if let Some(mode) = object.get("mode") {
        match mode.as_str() {
            Some(m) if MODES.contains(&m) => {}
            _ => violations.push(format!("'mode' must be one of {:?}", MODES)),
        }
    }

    if let Some(timestamp) = object.get("timestamp") {
        if !timestamp.is_string() {
            violations.push("'timestamp' must be a string".to_string());
        }
    }

    if let Some(score) = object.get("validation_score") {
        match score.as_f64() {
            Some(s) if (0.0..=1.0).contains(&s) => {}
            _ => violations.push("'validation_score' must be a number in [0, 1]".to_string()),
        }
    }

    if let Some(entries) = object.get("contradictions") {
        check_entries(
            entries,
            "contradictions",
            &["description", "evidence"],
            &mut violations,
        );
    }

    if let Some(entries) = object.get("research_proposals") {
        check_entries(
            entries,
            "research_proposals",
            &["description", "testable_prediction"],
            &mut violations,
        );
    }

    if let Some(metadata) = object.get("metadata") {
        match metadata.as_object() {
            Some(metadata) => check_metadata(metadata, &mut violations),
            None => violations.push("'metadata' must be an object".to_string()),
        }
    }

    if let Some(trace) = object.get("trace") {
        if !trace.is_array() && !trace.is_object() {
            violations.push("'trace' must be an array or object".to_string());
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { violations })
    }
}

/// Entries are objects with a required string `description` plus one optional string field.
fn check_entries(value: &Value, field: &str, allowed: &[&str], violations: &mut Vec<String>) {
    let Some(entries) = value.as_array() else {
        violations.push(format!("'{}' must be an array", field));
        return;
    };

    for (i, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            violations.push(format!("{}[{}] must be an object", field, i));
            continue;
        };

        if !matches!(entry.get("description"), Some(Value::String(_))) {
            violations.push(format!("{}[{}].description must be a string", field, i));
        }

        for (key, v) in entry {
            if !allowed.contains(&key.as_str()) {
                violations.push(format!("{}[{}] has unexpected field '{}'", field, i, key));
            } else if key != "description" && !v.is_string() && !v.is_null() {
                violations.push(format!("{}[{}].{} must be a string", field, i, key));
            }
        }
    }
}

fn check_metadata(metadata: &Map<String, Value>, violations: &mut Vec<String>) {
    for field in REQUIRED_TIMINGS {
        match metadata.get(*field) {
            Some(v) if v.as_f64().is_some_and(|n| n >= 0.0) => {}
            Some(_) => violations.push(format!("metadata.{} must be a non-negative number", field)),
            None => violations.push(format!("metadata.{} is required", field)),
        }
    }

    if let Some(v) = metadata.get("synthesis_time_ms") {
        if !v.as_f64().is_some_and(|n| n >= 0.0) {
            violations.push("metadata.synthesis_time_ms must be a non-negative number".to_string());
        }
    }

    for field in ["backend_provider", "backend_model"] {
        if let Some(v) = metadata.get(field) {
            if !v.is_string() {
                violations.push(format!("metadata.{} must be a string", field));
            }
        }
    }

    if let Some(errors) = metadata.get("errors") {
        let Some(errors) = errors.as_array() else {
            violations.push("metadata.errors must be an array".to_string());
            return;
        };
        for (i, record) in errors.iter().enumerate() {
            for key in ["phase", "error_kind", "message"] {
                if !matches!(record.get(key), Some(Value::String(_))) {
                    violations.push(format!("metadata.errors[{}].{} must be a string", i, key));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "query": "q",
            "thesis": "t",
            "antithesis": "a",
            "synthesis": "s"
        })
    }

    #[test]
    fn test_minimal_document_is_valid() {
        assert!(validate_value(&minimal()).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove("thesis");
        let err = validate_value(&doc).unwrap_err();
        assert!(err.violations.iter().any(|v| v.contains("'thesis'")));
    }

    #[test]
    fn test_unexpected_top_level_field() {
        let mut doc = minimal();
        doc["extra"] = json!(1);
        let err = validate_value(&doc).unwrap_err();
        assert_eq!(err.violations, vec!["unexpected top-level field 'extra'"]);
    }

    #[test]
    fn test_unexpected_field_in_contradiction() {
        let mut doc = minimal();
        doc["contradictions"] = json!([{"description": "d", "severity": "high"}]);
        let err = validate_value(&doc).unwrap_err();
        assert!(err.violations[0].contains("severity"));
    }

    #[test]
    fn test_proposal_requires_description() {
        let mut doc = minimal();
        doc["research_proposals"] = json!([{"testable_prediction": "p"}]);
        assert!(validate_value(&doc).is_err());
    }

    #[test]
    fn test_invalid_mode() {
        let mut doc = minimal();
        doc["mode"] = json!("partial");
        assert!(validate_value(&doc).is_err());
    }

    #[test]
    fn test_metadata_requires_timings() {
        let mut doc = minimal();
        doc["metadata"] = json!({"thesis_time_ms": 1, "antithesis_time_ms": 2});
        let err = validate_value(&doc).unwrap_err();
        assert!(err.violations[0].contains("total_time_ms"));
    }

    #[test]
    fn test_validation_score_range() {
        let mut doc = minimal();
        doc["validation_score"] = json!(0.5);
        assert!(validate_value(&doc).is_ok());
        doc["validation_score"] = json!(1.5);
        assert!(validate_value(&doc).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(validate_value(&json!([1, 2])).is_err());
    }
}
