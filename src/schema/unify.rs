//! First-wins schema unification.
//!
//! Names are inserted in first-seen order across documents and never overwritten. When a later
//! document defines an existing name with a different type (or an incompatible shape), the
//! first definition is kept and a [`SchemaCollision`] note is recorded. No type unification is
//! attempted.
//!
//! Placeholders ([`SchemaNode::Unknown`], from values that were only null or arrays that were
//! always empty) never win: the first concrete definition from any document replaces them
//! without a note. A placeholder column whose name no longer appears once the trees are merged
//! (an empty array that turned out to hold objects) is dropped from the flat schema.

use std::collections::{HashMap, HashSet};

use crate::types::{Field, Schema};

use super::flatten::placeholder_columns;
use super::{column_name, flatten_schema, SchemaNode};

/// A name defined differently by a later document. Not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCollision {
    /// Flat column name (or the column name of the nested node whose shapes differ).
    pub name: String,
    /// Index (in document order) of the document whose definition was ignored.
    pub document_index: usize,
    /// Type that was kept.
    pub kept: String,
    /// Type that was ignored.
    pub ignored: String,
}

/// The first-wins union of all documents' schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedSchema {
    /// Flat columns, unique names, first-seen order.
    pub schema: Schema,
    /// Merged nested shape used to conform documents.
    pub root: SchemaNode,
    /// Definitions that lost to an earlier document.
    pub collisions: Vec<SchemaCollision>,
}

impl UnifiedSchema {
    /// Unify per-document schema trees given in document order.
    pub fn from_document_schemas(schemas: &[SchemaNode]) -> Self {
        let flattened: Vec<Vec<Field>> = schemas.iter().map(flatten_schema).collect();
        Self::from_parts(&flattened, schemas)
    }

    /// Unify already-flattened schemas together with their trees (both in document order).
    pub fn from_parts(flattened: &[Vec<Field>], schemas: &[SchemaNode]) -> Self {
        let placeholders: Vec<HashSet<String>> = schemas.iter().map(placeholder_columns).collect();
        let (fields, mut collisions) = unify_fields(flattened, |doc, field| {
            placeholders.get(doc).is_some_and(|names| names.contains(&field.name))
        });
        let (root, shape_collisions) = merge_schema_trees(schemas);
        collisions.extend(shape_collisions);

        let resolved: HashSet<String> = flatten_schema(&root).into_iter().map(|f| f.name).collect();
        let fields = fields
            .into_iter()
            .filter(|u| !u.placeholder || resolved.contains(&u.field.name))
            .map(|u| u.field)
            .collect();

        Self {
            schema: Schema::new(fields),
            root,
            collisions,
        }
    }

    /// Unified flat column names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.field_names()
    }
}

/// Ordered-insert-only union of flat field lists.
pub fn unify_flattened(inputs: &[Vec<Field>]) -> (Schema, Vec<SchemaCollision>) {
    let (fields, collisions) = unify_fields(inputs, |_, _| false);
    (Schema::new(fields.into_iter().map(|u| u.field).collect()), collisions)
}

struct UnifiedField {
    field: Field,
    /// Every definition seen so far was a placeholder.
    placeholder: bool,
}

fn unify_fields<P>(inputs: &[Vec<Field>], is_placeholder: P) -> (Vec<UnifiedField>, Vec<SchemaCollision>)
where
    P: Fn(usize, &Field) -> bool,
{
    let mut fields: Vec<UnifiedField> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut collisions = Vec::new();

    for (document_index, input) in inputs.iter().enumerate() {
        for field in input {
            let placeholder = is_placeholder(document_index, field);
            match index.get(&field.name) {
                Some(&pos) => {
                    let kept = &mut fields[pos];
                    if placeholder {
                        continue;
                    }
                    if kept.placeholder {
                        kept.field = field.clone();
                        kept.placeholder = false;
                    } else if kept.field.data_type != field.data_type {
                        collisions.push(SchemaCollision {
                            name: field.name.clone(),
                            document_index,
                            kept: kept.field.data_type.to_string(),
                            ignored: field.data_type.to_string(),
                        });
                    }
                }
                None => {
                    index.insert(field.name.clone(), fields.len());
                    fields.push(UnifiedField {
                        field: field.clone(),
                        placeholder,
                    });
                }
            }
        }
    }

    (fields, collisions)
}

/// Merge document schema trees, first definition wins.
///
/// Objects merge field-by-field in first-seen order and arrays merge their elements. An
/// [`SchemaNode::Unknown`] is replaced by the first concrete node merged into it. Any other
/// disagreement keeps the earlier node; it is reported here only when one side is nested, since
/// scalar-vs-scalar disagreements already surface from [`unify_flattened`].
pub fn merge_schema_trees(schemas: &[SchemaNode]) -> (SchemaNode, Vec<SchemaCollision>) {
    let mut root: Vec<(String, SchemaNode)> = Vec::new();
    let mut collisions = Vec::new();

    for (document_index, schema) in schemas.iter().enumerate() {
        if let SchemaNode::Object(fields) = schema {
            let mut ctx = MergeContext {
                document_index,
                collisions: &mut collisions,
            };
            for (name, node) in fields {
                ctx.merge_field(&mut root, name, node, name.clone(), 1);
            }
        }
    }

    (SchemaNode::Object(root), collisions)
}

struct MergeContext<'a> {
    document_index: usize,
    collisions: &'a mut Vec<SchemaCollision>,
}

impl MergeContext<'_> {
    /// `path` is the column name this node flattens under; its children are named at `level`.
    fn merge_field(
        &mut self,
        into: &mut Vec<(String, SchemaNode)>,
        name: &str,
        node: &SchemaNode,
        path: String,
        level: usize,
    ) {
        match into.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => self.merge_node(existing, node, path, level),
            None => into.push((name.to_string(), node.clone())),
        }
    }

    fn merge_node(&mut self, existing: &mut SchemaNode, incoming: &SchemaNode, path: String, level: usize) {
        // Placeholders never win and never collide.
        if matches!(incoming, SchemaNode::Unknown) {
            return;
        }
        if matches!(existing, SchemaNode::Unknown) {
            *existing = incoming.clone();
            return;
        }
        match (existing, incoming) {
            (SchemaNode::Object(left), SchemaNode::Object(right)) => self.merge_children(left, right, &path, level),
            (SchemaNode::ArrayOf(left), SchemaNode::ArrayOf(right)) => match (left.as_mut(), right.as_ref()) {
                (SchemaNode::Object(l), SchemaNode::Object(r)) => self.merge_children(l, r, &path, level),
                (l, r) => self.merge_node(l, r, path, level),
            },
            (existing, incoming) => {
                if (existing.is_nested() || incoming.is_nested()) && *existing != *incoming {
                    self.collisions.push(SchemaCollision {
                        name: path,
                        document_index: self.document_index,
                        kept: existing.to_string(),
                        ignored: incoming.to_string(),
                    });
                }
            }
        }
    }

    fn merge_children(
        &mut self,
        left: &mut Vec<(String, SchemaNode)>,
        right: &[(String, SchemaNode)],
        path: &str,
        level: usize,
    ) {
        for (name, node) in right {
            let child_path = column_name(path, level, name);
            self.merge_field(left, name, node, child_path, level + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_schema_trees, unify_flattened, SchemaCollision, UnifiedSchema};
    use crate::schema::SchemaNode;
    use crate::types::{DataType, Field};

    #[test]
    fn union_keeps_first_seen_order() {
        let (schema, collisions) = unify_flattened(&[
            vec![Field::new("a", DataType::Int64), Field::new("b_1_c", DataType::Int64)],
            vec![
                Field::new("a", DataType::Int64),
                Field::new("b_1_c", DataType::Int64),
                Field::new("b_1_d", DataType::Int64),
            ],
        ]);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["a", "b_1_c", "b_1_d"]);
        assert!(collisions.is_empty());
    }

    #[test]
    fn first_definition_wins_and_is_noted() {
        let (schema, collisions) = unify_flattened(&[
            vec![Field::new("x", DataType::Int64)],
            vec![Field::new("x", DataType::Utf8), Field::new("y", DataType::Bool)],
        ]);
        assert_eq!(schema.field("x").unwrap().data_type, DataType::Int64);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].name, "x");
        assert_eq!(collisions[0].document_index, 1);
        assert_eq!(collisions[0].kept, "int64");
        assert_eq!(collisions[0].ignored, "utf8");
    }

    #[test]
    fn trees_merge_nested_fields() {
        let d1 = SchemaNode::object([
            ("a", SchemaNode::leaf(DataType::Int64)),
            ("b", SchemaNode::object([("c", SchemaNode::leaf(DataType::Int64))])),
        ]);
        let d2 = SchemaNode::object([
            ("b", SchemaNode::object([("d", SchemaNode::leaf(DataType::Int64))])),
            (
                "items",
                SchemaNode::array_of(SchemaNode::object([("x", SchemaNode::leaf(DataType::Int64))])),
            ),
        ]);
        let d3 = SchemaNode::object([(
            "items",
            SchemaNode::array_of(SchemaNode::object([("y", SchemaNode::leaf(DataType::Utf8))])),
        )]);

        let (root, collisions) = merge_schema_trees(&[d1, d2, d3]);
        assert!(collisions.is_empty());
        assert_eq!(
            root,
            SchemaNode::object([
                ("a", SchemaNode::leaf(DataType::Int64)),
                (
                    "b",
                    SchemaNode::object([
                        ("c", SchemaNode::leaf(DataType::Int64)),
                        ("d", SchemaNode::leaf(DataType::Int64)),
                    ])
                ),
                (
                    "items",
                    SchemaNode::array_of(SchemaNode::object([
                        ("x", SchemaNode::leaf(DataType::Int64)),
                        ("y", SchemaNode::leaf(DataType::Utf8)),
                    ]))
                ),
            ])
        );
    }

    #[test]
    fn shape_conflicts_keep_the_first_shape() {
        let d1 = SchemaNode::object([("b", SchemaNode::object([("c", SchemaNode::leaf(DataType::Int64))]))]);
        let d2 = SchemaNode::object([(
            "b",
            SchemaNode::object([("c", SchemaNode::object([("z", SchemaNode::leaf(DataType::Int64))]))]),
        )]);
        let (root, collisions) = merge_schema_trees(&[d1.clone(), d2]);
        assert_eq!(root, d1);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].name, "b_1_c");
        assert_eq!(collisions[0].kept, "int64");
        assert_eq!(collisions[0].ignored, "object");
    }

    #[test]
    fn unified_schema_collects_both_kinds_of_notes() {
        let d1 = SchemaNode::object([
            ("x", SchemaNode::leaf(DataType::Int64)),
            ("o", SchemaNode::leaf(DataType::Utf8)),
        ]);
        let d2 = SchemaNode::object([
            ("x", SchemaNode::leaf(DataType::Utf8)),
            ("o", SchemaNode::object([("p", SchemaNode::leaf(DataType::Int64))])),
        ]);
        let unified = UnifiedSchema::from_document_schemas(&[d1, d2]);
        assert_eq!(unified.field_names().collect::<Vec<_>>(), vec!["x", "o", "o_1_p"]);
        let names: Vec<&str> = unified.collisions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "o"]);
    }

    #[test]
    fn placeholders_yield_to_later_shapes_without_notes() {
        let d1 = SchemaNode::object([
            ("b", SchemaNode::Unknown),
            ("id", SchemaNode::leaf(DataType::Int64)),
            ("items", SchemaNode::array_of(SchemaNode::Unknown)),
            ("n", SchemaNode::Unknown),
        ]);
        let d2 = SchemaNode::object([
            ("b", SchemaNode::object([("c", SchemaNode::leaf(DataType::Int64))])),
            ("id", SchemaNode::leaf(DataType::Int64)),
            (
                "items",
                SchemaNode::array_of(SchemaNode::object([("x", SchemaNode::leaf(DataType::Int64))])),
            ),
            ("n", SchemaNode::leaf(DataType::Float64)),
        ]);
        let d3 = SchemaNode::object([("n", SchemaNode::Unknown), ("z", SchemaNode::Unknown)]);

        let unified = UnifiedSchema::from_document_schemas(&[d1, d2.clone(), d3]);
        assert_eq!(unified.collisions, Vec::<SchemaCollision>::new());
        assert_eq!(
            unified.field_names().collect::<Vec<_>>(),
            vec!["id", "n", "b_1_c", "items_1_x", "z"]
        );
        assert_eq!(unified.schema.field("n").unwrap().data_type, DataType::Float64);
        assert_eq!(unified.schema.field("z").unwrap().data_type, DataType::Utf8);

        let SchemaNode::Object(fields) = &unified.root else {
            panic!("root is an object");
        };
        let SchemaNode::Object(expected) = &d2 else {
            unreachable!()
        };
        assert_eq!(&fields[..4], &expected[..]);
        assert_eq!(fields[4], ("z".to_string(), SchemaNode::Unknown));
    }

    #[test]
    fn placeholder_arrays_take_a_later_scalar_element_type() {
        let d1 = SchemaNode::object([("tags", SchemaNode::array_of(SchemaNode::Unknown))]);
        let d2 = SchemaNode::object([("tags", SchemaNode::array_of(SchemaNode::leaf(DataType::Int64)))]);
        let unified = UnifiedSchema::from_document_schemas(&[d1, d2]);
        assert!(unified.collisions.is_empty());
        assert_eq!(
            unified.schema.field("tags").unwrap().data_type,
            DataType::List(Box::new(DataType::Int64))
        );
    }
}
