//! JSON document parsing and leaf conformance.
//!
//! Supported inputs:
//! - A single JSON object: `{"a":1}`
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`

use std::fs;
use std::path::Path;

use crate::error::{FlattenError, FlattenResult};
use crate::types::{DataType, Document, Value};

/// Read and parse the document at `path`; its identifier is the path's display form.
///
/// Content that is not valid UTF-8 is a [`FlattenError::Parse`] failure of this document, not an
/// I/O error.
pub fn read_document(path: impl AsRef<Path>) -> FlattenResult<Document> {
    let path = path.as_ref();
    let id = path.display().to_string();
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|e| FlattenError::Parse {
        source_id: id.clone(),
        message: format!("content is not valid utf-8: {e}"),
    })?;
    parse_document(id, &text)
}

/// Parse an in-memory string into a [`Document`].
pub fn parse_document(id: impl Into<String>, input: &str) -> FlattenResult<Document> {
    let id = id.into();
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FlattenError::Parse {
            source_id: id,
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (object or array).
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(v) => Document::from_value(id, v),
        Err(whole_err) => {
            // Fall back to NDJSON, but only when there is more than one line to try.
            if !trimmed.contains('\n') {
                return Err(FlattenError::Parse {
                    source_id: id,
                    message: whole_err.to_string(),
                });
            }
            let mut records = Vec::new();
            for (i, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| FlattenError::Parse {
                    source_id: id.clone(),
                    message: format!("invalid ndjson at line {}: {}", i + 1, e),
                })?;
                match v {
                    serde_json::Value::Object(map) => records.push(map),
                    _ => {
                        return Err(FlattenError::Parse {
                            source_id: id,
                            message: format!("ndjson line {} is not a json object", i + 1),
                        });
                    }
                }
            }
            Ok(Document::new(id, records))
        }
    }
}

/// Conform a raw JSON leaf to the unified column type.
///
/// Values that cannot be represented in `data_type` become [`Value::Null`]; conformance never
/// fails. Text columns accept any value and keep non-strings as their JSON text.
pub fn conform_value(data_type: &DataType, v: &serde_json::Value) -> Value {
    if v.is_null() {
        return Value::Null;
    }

    match data_type {
        DataType::Utf8 => match v {
            serde_json::Value::String(s) => Value::Utf8(s.clone()),
            other => Value::Utf8(other.to_string()),
        },
        DataType::Bool => v.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        DataType::Int64 => {
            if let Some(n) = v.as_i64() {
                Value::Int64(n)
            } else {
                // u64 beyond i64::MAX and fractional numbers do not fit.
                Value::Null
            }
        }
        DataType::Float64 => v.as_f64().map(Value::Float64).unwrap_or(Value::Null),
        DataType::List(inner) => match v {
            serde_json::Value::Array(items) => Value::List(items.iter().map(|item| conform_value(inner, item)).collect()),
            _ => Value::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{conform_value, parse_document, read_document};
    use crate::error::FlattenError;
    use crate::types::{DataType, Value};
    use serde_json::json;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn parses_object_array_and_ndjson() {
        assert_eq!(parse_document("a", r#"{"x":1}"#).unwrap().records.len(), 1);
        assert_eq!(parse_document("b", r#"[{"x":1},{"x":2}]"#).unwrap().records.len(), 2);
        let doc = parse_document("c", "{\"x\":1}\n\n{\"x\":2}\n{\"x\":3}\n").unwrap();
        assert_eq!(doc.id, "c");
        assert_eq!(doc.records.len(), 3);
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let err = parse_document("bad.json", r#"{"x": 1"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("failed to parse document 'bad.json'"));

        let err = parse_document("bad.ndjson", "{\"x\":1}\n{oops}\n").unwrap_err();
        assert!(err.to_string().contains("invalid ndjson at line 2"));

        assert!(parse_document("empty", "   ").is_err());
    }

    #[test]
    fn conform_coerces_or_nulls() {
        assert_eq!(conform_value(&DataType::Int64, &json!(3)), Value::Int64(3));
        assert_eq!(conform_value(&DataType::Int64, &json!(3.5)), Value::Null);
        assert_eq!(conform_value(&DataType::Int64, &json!("3")), Value::Null);
        assert_eq!(conform_value(&DataType::Float64, &json!(3)), Value::Float64(3.0));
        assert_eq!(conform_value(&DataType::Bool, &json!(1)), Value::Null);
        assert_eq!(conform_value(&DataType::Utf8, &json!(12)), Value::Utf8("12".to_string()));
        assert_eq!(
            conform_value(&DataType::Utf8, &json!({"k": 1})),
            Value::Utf8(r#"{"k":1}"#.to_string())
        );
        assert_eq!(
            conform_value(&DataType::List(Box::new(DataType::Int64)), &json!([1, "x", null])),
            Value::List(vec![Value::Int64(1), Value::Null, Value::Null])
        );
        assert_eq!(conform_value(&DataType::List(Box::new(DataType::Int64)), &json!(1)), Value::Null);
        assert_eq!(conform_value(&DataType::Utf8, &json!(null)), Value::Null);
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("rust-json-flatten-utf8-{nanos}.json"));
        fs::write(&path, b"{\"a\": \"\xff\xfe\"}").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, FlattenError::Parse { .. }), "{err:?}");
        assert!(err.to_string().contains("not valid utf-8"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn large_unsigned_integers_fit_float_columns() {
        let big = json!(18446744073709551615u64);
        assert_eq!(conform_value(&DataType::Int64, &big), Value::Null);
        assert_eq!(conform_value(&DataType::Float64, &big), Value::Float64(18446744073709551615u64 as f64));
    }
}
