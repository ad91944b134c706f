//! Schema tree → flat field list.

use std::collections::HashSet;

use crate::types::Field;

use super::{column_name, SchemaNode};

/// Flatten a document schema into its ordered flat columns.
///
/// Fields are visited depth-first, left-to-right. Top-level fields are column roots: scalars and
/// arrays of scalars keep their bare names, objects and arrays of objects are expanded with
/// [`flatten_object_fields`] starting at `(name, 1)`. A root that is not an object has no columns.
pub fn flatten_schema(root: &SchemaNode) -> Vec<Field> {
    let mut out = Vec::new();
    walk_root(root, &mut |name, node| out.push(terminal_field(name, node)));
    out
}

/// Flatten the fields of one object whose path is `prefix` at nesting `level`.
///
/// Objects and arrays of objects recurse with the child's name as the new prefix and `level + 1`;
/// no column is emitted for the object itself. Everything else becomes one nullable column.
pub fn flatten_object_fields(fields: &[(String, SchemaNode)], prefix: &str, level: usize) -> Vec<Field> {
    let mut out = Vec::new();
    walk_fields(fields, prefix, level, &mut |name, node| out.push(terminal_field(name, node)));
    out
}

/// Names of the columns of `root` whose type is only a placeholder (see
/// [`SchemaNode::is_placeholder`]).
pub fn placeholder_columns(root: &SchemaNode) -> HashSet<String> {
    let mut out = HashSet::new();
    walk_root(root, &mut |name, node| {
        if node.is_placeholder() {
            out.insert(name);
        }
    });
    out
}

fn walk_root<F>(root: &SchemaNode, visit: &mut F)
where
    F: FnMut(String, &SchemaNode),
{
    let SchemaNode::Object(fields) = root else {
        return;
    };
    for (name, child) in fields {
        match child.object_fields() {
            Some(children) => walk_fields(children, name, 1, visit),
            None => visit(name.clone(), child),
        }
    }
}

fn walk_fields<F>(fields: &[(String, SchemaNode)], prefix: &str, level: usize, visit: &mut F)
where
    F: FnMut(String, &SchemaNode),
{
    for (name, child) in fields {
        let candidate = column_name(prefix, level, name);
        match child.object_fields() {
            Some(children) => walk_fields(children, &candidate, level + 1, visit),
            None => visit(candidate, child),
        }
    }
}

fn terminal_field(name: String, node: &SchemaNode) -> Field {
    // Explosion and merging can always introduce gaps, so source nullability is widened.
    Field::new(name, node.terminal_type())
}
