//! The flattening core over in-memory values.
//!
//! - [`flatten_document()`]: conform one [`crate::types::Document`] to a
//!   [`crate::schema::UnifiedSchema`] and flatten it into rows, exploding arrays of objects
//! - [`combine()`]: union many flattened tables into one dataset by column name
//!
//! ## Example: two documents, one dataset
//!
//! ```rust
//! use rust_json_flatten::processing::{combine, flatten_document};
//! use rust_json_flatten::schema::{infer_document_schema, UnifiedSchema};
//! use rust_json_flatten::types::{Document, Value};
//! use serde_json::json;
//!
//! let d1 = Document::from_value("d1", json!({"a": 1, "b": {"c": 2}})).unwrap();
//! let d2 = Document::from_value("d2", json!({"a": 3, "b": {"c": 4, "d": 5}})).unwrap();
//!
//! let unified = UnifiedSchema::from_document_schemas(&[
//!     infer_document_schema(&d1),
//!     infer_document_schema(&d2),
//! ]);
//! let tables = [&d1, &d2].map(|d| flatten_document(d, &unified).unwrap());
//! let ds = combine(tables).unwrap();
//!
//! assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["a", "b_1_c", "b_1_d"]);
//! assert_eq!(ds.rows[0], vec![Value::Int64(1), Value::Int64(2), Value::Null]);
//! assert_eq!(ds.rows[1], vec![Value::Int64(3), Value::Int64(4), Value::Int64(5)]);
//! ```

pub mod combine;
pub mod conform;

pub use combine::combine;
pub use conform::flatten_document;
