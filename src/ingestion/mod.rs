//! Collaborators around the flattening core: finding sources, parsing them into
//! [`crate::types::Document`]s, and reporting per-document outcomes.
//!
//! - [`source`]: enumerate input files ([`list_sources`])
//! - [`json`]: parse JSON / NDJSON text ([`parse_document`], [`read_document`]) and conform leaves
//! - [`observability`]: observer hooks for failures, alerts and schema notes

pub mod json;
pub mod observability;
pub mod source;

pub use json::{conform_value, parse_document, read_document};
pub use observability::{
    CompositeObserver, DocumentContext, DocumentStats, FileObserver, FlattenObserver, Severity, StdErrObserver,
};
pub use source::{list_sources, SourceOptions};
