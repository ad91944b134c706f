//! Schema inference for parsed documents.
//!
//! Mirrors what a JSON reader infers for a whole file: scalar types are read off the values,
//! arrays and multiple records are merged element by element, and incompatible shapes widen to
//! strings. Integers beyond the `i64` range are read as floats. Values that were only ever null,
//! and elements of arrays that were always empty, stay [`SchemaNode::Unknown`]. Object fields come
//! out in key order.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::types::{DataType, Document};

use super::SchemaNode;

#[derive(Debug, Clone, PartialEq)]
enum Inferred {
    Null,
    Scalar(DataType),
    Object(BTreeMap<String, Inferred>),
    Array(Box<Inferred>),
}

/// Infer the schema of a document: the merge of all of its records' object schemas.
pub fn infer_document_schema(doc: &Document) -> SchemaNode {
    let merged = doc
        .records
        .iter()
        .map(infer_object)
        .fold(Inferred::Object(BTreeMap::new()), merge);
    finish(merged)
}

/// Infer the schema of a single JSON value.
pub fn infer_value_schema(value: &Value) -> SchemaNode {
    finish(infer(value))
}

fn infer(value: &Value) -> Inferred {
    match value {
        Value::Null => Inferred::Null,
        Value::Bool(_) => Inferred::Scalar(DataType::Bool),
        Value::Number(n) => {
            if n.is_i64() {
                Inferred::Scalar(DataType::Int64)
            } else {
                Inferred::Scalar(DataType::Float64)
            }
        }
        Value::String(_) => Inferred::Scalar(DataType::Utf8),
        Value::Array(items) => {
            let element = items.iter().map(infer).fold(Inferred::Null, merge);
            Inferred::Array(Box::new(element))
        }
        Value::Object(map) => infer_object(map),
    }
}

fn infer_object(map: &Map<String, Value>) -> Inferred {
    Inferred::Object(map.iter().map(|(k, v)| (k.clone(), infer(v))).collect())
}

fn merge(a: Inferred, b: Inferred) -> Inferred {
    match (a, b) {
        (Inferred::Null, other) | (other, Inferred::Null) => other,
        (Inferred::Scalar(x), Inferred::Scalar(y)) => Inferred::Scalar(widen(x, y)),
        (Inferred::Object(mut left), Inferred::Object(right)) => {
            for (name, node) in right {
                let merged = match left.remove(&name) {
                    Some(existing) => merge(existing, node),
                    None => node,
                };
                left.insert(name, merged);
            }
            Inferred::Object(left)
        }
        (Inferred::Array(x), Inferred::Array(y)) => Inferred::Array(Box::new(merge(*x, *y))),
        _ => Inferred::Scalar(DataType::Utf8),
    }
}

fn widen(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (x, y) if x == y => x,
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => DataType::Float64,
        _ => DataType::Utf8,
    }
}

fn finish(node: Inferred) -> SchemaNode {
    match node {
        // Only nulls (or no array elements) were seen; another document may still supply a type.
        Inferred::Null => SchemaNode::Unknown,
        Inferred::Scalar(data_type) => SchemaNode::leaf(data_type),
        Inferred::Object(fields) => {
            SchemaNode::Object(fields.into_iter().map(|(k, v)| (k, finish(v))).collect())
        }
        Inferred::Array(element) => SchemaNode::array_of(finish(*element)),
    }
}

#[cfg(test)]
mod tests {
    use super::{infer_document_schema, infer_value_schema};
    use crate::schema::SchemaNode;
    use crate::types::{DataType, Document};
    use serde_json::json;

    #[test]
    fn scalars_objects_and_arrays() {
        let schema = infer_value_schema(&json!({
            "b": {"c": 2.5, "d": "x"},
            "a": 1,
            "items": [{"x": 1}, {"y": true}],
            "tags": ["t"]
        }));
        assert_eq!(
            schema,
            SchemaNode::object([
                ("a", SchemaNode::leaf(DataType::Int64)),
                (
                    "b",
                    SchemaNode::object([
                        ("c", SchemaNode::leaf(DataType::Float64)),
                        ("d", SchemaNode::leaf(DataType::Utf8)),
                    ])
                ),
                (
                    "items",
                    SchemaNode::array_of(SchemaNode::object([
                        ("x", SchemaNode::leaf(DataType::Int64)),
                        ("y", SchemaNode::leaf(DataType::Bool)),
                    ]))
                ),
                ("tags", SchemaNode::array_of(SchemaNode::leaf(DataType::Utf8))),
            ])
        );
    }

    #[test]
    fn numbers_widen_and_conflicts_become_text() {
        let schema = infer_value_schema(&json!({"n": [1, 2.5], "m": [1, "x"], "o": [{"k": 1}, 3]}));
        assert_eq!(
            schema,
            SchemaNode::object([
                ("m", SchemaNode::array_of(SchemaNode::leaf(DataType::Utf8))),
                ("n", SchemaNode::array_of(SchemaNode::leaf(DataType::Float64))),
                ("o", SchemaNode::array_of(SchemaNode::leaf(DataType::Utf8))),
            ])
        );
    }

    #[test]
    fn nulls_and_empty_arrays_stay_unknown() {
        let schema = infer_value_schema(&json!({"gone": null, "none": [], "holes": [null]}));
        assert_eq!(
            schema,
            SchemaNode::object([
                ("gone", SchemaNode::Unknown),
                ("holes", SchemaNode::array_of(SchemaNode::Unknown)),
                ("none", SchemaNode::array_of(SchemaNode::Unknown)),
            ])
        );
    }

    #[test]
    fn integers_beyond_i64_are_floats() {
        let schema = infer_value_schema(&json!({"big": 18446744073709551615u64, "small": 7}));
        assert_eq!(
            schema,
            SchemaNode::object([
                ("big", SchemaNode::leaf(DataType::Float64)),
                ("small", SchemaNode::leaf(DataType::Int64)),
            ])
        );
    }

    #[test]
    fn null_does_not_hide_a_later_type() {
        let doc = Document::from_value("d", json!([{"a": null}, {"a": 7, "b": {"c": 1}}])).unwrap();
        assert_eq!(
            infer_document_schema(&doc),
            SchemaNode::object([
                ("a", SchemaNode::leaf(DataType::Int64)),
                ("b", SchemaNode::object([("c", SchemaNode::leaf(DataType::Int64))])),
            ])
        );
    }

    #[test]
    fn empty_document_has_an_empty_object_schema() {
        let doc = Document::new("d", vec![]);
        assert_eq!(infer_document_schema(&doc), SchemaNode::Object(vec![]));
    }
}
