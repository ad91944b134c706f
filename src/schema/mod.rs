//! Nested schema trees and their flat projections.
//!
//! - [`infer`]: infer a [`SchemaNode`] tree from a parsed [`crate::types::Document`]
//! - [`flatten`]: turn a tree into an ordered list of flat [`crate::types::Field`]s
//! - [`unify`]: merge many documents' schemas into one first-wins [`UnifiedSchema`]
//!
//! ## Column naming
//!
//! Every top-level field is a column root and keeps its bare name. The children of a nested
//! column named `prefix` at nesting level `level` are named `{prefix}_{level}_{child}`; the
//! children of those get `level + 1`, and so on:
//!
//! ```rust
//! use rust_json_flatten::schema::{flatten_schema, SchemaNode};
//! use rust_json_flatten::types::DataType;
//!
//! let root = SchemaNode::object([
//!     ("a", SchemaNode::leaf(DataType::Int64)),
//!     ("b", SchemaNode::object([
//!         ("c", SchemaNode::leaf(DataType::Int64)),
//!         ("e", SchemaNode::object([("f", SchemaNode::leaf(DataType::Utf8))])),
//!     ])),
//! ]);
//!
//! let names: Vec<String> = flatten_schema(&root).into_iter().map(|f| f.name).collect();
//! assert_eq!(names, vec!["a", "b_1_c", "b_1_e_2_f"]);
//! ```

use std::fmt;

use crate::types::DataType;

pub mod flatten;
pub mod infer;
pub mod unify;

pub use flatten::{flatten_object_fields, flatten_schema};
pub use infer::{infer_document_schema, infer_value_schema};
pub use unify::{merge_schema_trees, unify_flattened, SchemaCollision, UnifiedSchema};

/// Tagged description of a value's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// A scalar.
    Leaf { data_type: DataType, nullable: bool },
    /// An object with fields in declared order.
    Object(Vec<(String, SchemaNode)>),
    /// An array whose elements all share one schema.
    ArrayOf(Box<SchemaNode>),
    /// No type information: only nulls were seen (or, as an array element, no elements).
    ///
    /// Unification lets any concrete shape from another document replace it. A column that stays
    /// unknown is read as text.
    Unknown,
}

impl SchemaNode {
    /// A nullable leaf.
    pub fn leaf(data_type: DataType) -> Self {
        SchemaNode::Leaf {
            data_type,
            nullable: true,
        }
    }

    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, SchemaNode)>,
        S: Into<String>,
    {
        SchemaNode::Object(fields.into_iter().map(|(n, s)| (n.into(), s)).collect())
    }

    pub fn array_of(element: SchemaNode) -> Self {
        SchemaNode::ArrayOf(Box::new(element))
    }

    /// Fields of an object, or of the element of an array of objects.
    ///
    /// The array wrapper is transparent to naming, so both shapes expose the same children.
    pub fn object_fields(&self) -> Option<&[(String, SchemaNode)]> {
        match self {
            SchemaNode::Object(fields) => Some(fields),
            SchemaNode::ArrayOf(element) => match element.as_ref() {
                SchemaNode::Object(fields) => Some(fields),
                _ => None,
            },
            SchemaNode::Leaf { .. } | SchemaNode::Unknown => None,
        }
    }

    /// Whether this node must be flattened further (an object or an array of objects).
    pub fn is_nested(&self) -> bool {
        self.object_fields().is_some()
    }

    /// Remaining nesting depth: `0` for terminal columns, one per object or array-of-object layer.
    pub fn depth(&self) -> usize {
        match self {
            SchemaNode::Leaf { .. } | SchemaNode::Unknown => 0,
            SchemaNode::Object(fields) => {
                1 + fields.iter().map(|(_, child)| child.depth()).max().unwrap_or(0)
            }
            SchemaNode::ArrayOf(element) => match element.as_ref() {
                SchemaNode::Object(_) => 1 + element.depth(),
                _ => 0,
            },
        }
    }

    /// Column type of a terminal node.
    ///
    /// Arrays of scalars become opaque [`DataType::List`] columns. Objects nested inside arrays of
    /// arrays cannot be flattened and are carried as their JSON text.
    pub fn terminal_type(&self) -> DataType {
        match self {
            SchemaNode::Leaf { data_type, .. } => data_type.clone(),
            SchemaNode::ArrayOf(element) => DataType::List(Box::new(element.terminal_type())),
            SchemaNode::Object(_) | SchemaNode::Unknown => DataType::Utf8,
        }
    }

    /// Whether this node carries no type information: unknown, or an array of unknown elements.
    pub fn is_placeholder(&self) -> bool {
        match self {
            SchemaNode::Unknown => true,
            SchemaNode::ArrayOf(element) => element.is_placeholder(),
            _ => false,
        }
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaNode::Leaf { data_type, .. } => write!(f, "{data_type}"),
            SchemaNode::Object(_) => f.write_str("object"),
            SchemaNode::ArrayOf(element) => write!(f, "array<{element}>"),
            SchemaNode::Unknown => f.write_str("null"),
        }
    }
}

/// Name of child `field` under `prefix` at nesting `level`.
///
/// With an empty prefix the level is appended instead (`{field}_{level}`).
pub fn column_name(prefix: &str, level: usize, field: &str) -> String {
    if prefix.is_empty() {
        format!("{field}_{level}")
    } else {
        format!("{prefix}_{level}_{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::{column_name, SchemaNode};
    use crate::types::DataType;

    #[test]
    fn column_name_keeps_the_prefix_asymmetry() {
        assert_eq!(column_name("", 1, "a"), "a_1");
        assert_eq!(column_name("b", 1, "c"), "b_1_c");
        assert_eq!(column_name("b_1_c", 2, "d"), "b_1_c_2_d");
    }

    #[test]
    fn depth_counts_object_and_array_of_object_layers() {
        let leaf = SchemaNode::leaf(DataType::Int64);
        assert_eq!(leaf.depth(), 0);
        assert_eq!(SchemaNode::array_of(leaf.clone()).depth(), 0);

        let obj = SchemaNode::object([("x", leaf.clone())]);
        assert_eq!(obj.depth(), 1);
        assert_eq!(SchemaNode::array_of(obj.clone()).depth(), 2);
        assert_eq!(SchemaNode::object([("o", SchemaNode::array_of(obj))]).depth(), 3);
        assert_eq!(SchemaNode::Object(vec![]).depth(), 1);
    }

    #[test]
    fn terminal_types_of_scalar_arrays_are_lists() {
        let nested = SchemaNode::array_of(SchemaNode::array_of(SchemaNode::leaf(DataType::Bool)));
        assert_eq!(
            nested.terminal_type(),
            DataType::List(Box::new(DataType::List(Box::new(DataType::Bool))))
        );
        assert!(!nested.is_nested());
        assert_eq!(nested.to_string(), "array<array<bool>>");
    }

    #[test]
    fn unknown_nodes_are_text_placeholders() {
        let empty = SchemaNode::array_of(SchemaNode::Unknown);
        assert!(empty.is_placeholder());
        assert!(SchemaNode::Unknown.is_placeholder());
        assert!(!SchemaNode::array_of(SchemaNode::leaf(DataType::Utf8)).is_placeholder());
        assert_eq!(empty.terminal_type(), DataType::List(Box::new(DataType::Utf8)));
        assert_eq!(empty.depth(), 0);
        assert_eq!(empty.to_string(), "array<null>");
    }
}
