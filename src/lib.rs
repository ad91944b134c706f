//! `rust-json-flatten` turns a collection of heterogeneous JSON documents into one flat, tabular
//! [`types::DataSet`].
//!
//! Each document's structure is inferred, the inferred schemas are unified (the first definition
//! of a column wins), every document is conformed to the unified schema and flattened (nested
//! objects become prefixed columns, arrays of objects become additional rows), and the per-document
//! tables are combined into one dataset by column name.
//!
//! The primary entrypoint is [`pipeline::run`], which reads every matching file under a directory.
//! Documents already in memory go through [`pipeline::run_documents`].
//!
//! ## Column naming
//!
//! Top-level fields keep their names. A field nested inside an object `b` at nesting level `n` is
//! named `b_n_field`, so `{"a": 1, "b": {"c": 2}}` flattens to the columns `a` and `b_1_c`.
//! Arrays are transparent to naming: `{"items": [{"x": 1}]}` yields `items_1_x`, one row per
//! element. Arrays of scalars stay in a single list-valued column.
//!
//! ## Failure isolation
//!
//! A document that cannot be parsed or conformed is excluded from the result and reported once to
//! the configured [`ingestion::FlattenObserver`]; the rest of the run continues. Only a failure to
//! enumerate the input location fails the run itself. A run in which every document failed
//! produces [`pipeline::RunReport::dataset`] `== None` rather than an error.
//!
//! ## Quick example: flatten a directory
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rust_json_flatten::ingestion::StdErrObserver;
//! use rust_json_flatten::pipeline::{run, RunOptions};
//!
//! # fn main() -> Result<(), rust_json_flatten::FlattenError> {
//! let options = RunOptions {
//!     observer: Some(Arc::new(StdErrObserver)),
//!     ..RunOptions::new("data/")
//! };
//! let report = run(&options)?;
//! match &report.dataset {
//!     Some(ds) => println!("rows={} columns={}", ds.row_count(), ds.schema.len()),
//!     None => println!("nothing flattened ({} failed)", report.failures.len()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick example: in-memory documents
//!
//! ```rust
//! use rust_json_flatten::pipeline::{run_documents, RunOptions};
//! use rust_json_flatten::types::{Document, Value};
//! use serde_json::json;
//!
//! let docs = vec![
//!     Document::from_value("orders", json!({"id": 1, "items": [{"x": 1}, {"x": 2}]})).unwrap(),
//! ];
//! let report = run_documents(docs, &RunOptions::new("."));
//! let ds = report.dataset.unwrap();
//!
//! assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["id", "items_1_x"]);
//! assert_eq!(ds.column("items_1_x").unwrap(), vec![&Value::Int64(1), &Value::Int64(2)]);
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: schema trees, flattening a schema into columns, inference and unification
//! - [`processing`]: conforming/flattening documents and combining the results
//! - [`ingestion`]: finding and parsing sources, observers for per-document diagnostics
//! - [`execution`]: parallel, throttled execution with metrics
//! - [`pipeline`]: end-to-end runs
//! - [`sink`]: CSV output and text previews
//! - [`types`]: documents, columns and in-memory dataset types
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod schema;
pub mod sink;
pub mod types;

pub use error::{FlattenError, FlattenResult};
pub use pipeline::{run, run_documents, RunOptions, RunReport};
