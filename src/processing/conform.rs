//! Conform one document to the unified schema and flatten it into rows.
//!
//! The document's records are projected onto the unified top-level columns, then rewritten pass
//! by pass until every column is terminal:
//!
//! - an object column is replaced by one column per child field
//! - an array-of-object column is exploded into one row per element (outer semantics: an empty or
//!   null array keeps the row, with nulls) and becomes an object column for the next pass
//! - scalar and array-of-scalar columns are left as they are
//!
//! Each pass must lower the maximum remaining nesting depth; if it does not, flattening stops
//! with [`FlattenError::NonTermination`] instead of looping.

use std::collections::HashMap;

use serde_json::Value as Json;

use crate::error::{FlattenError, FlattenResult};
use crate::ingestion::json::conform_value;
use crate::schema::{column_name, SchemaNode, UnifiedSchema};
use crate::types::{DataSet, Document, Value};

#[derive(Debug, Clone)]
struct Column {
    name: String,
    /// Level given to this column's children when it is expanded.
    level: usize,
    node: SchemaNode,
}

#[derive(Debug)]
struct WorkTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Json>>,
}

/// Flatten `doc` under `unified`.
///
/// The result declares exactly the unified columns, in unified order; columns the document does
/// not populate are null. Values that do not fit their column (a scalar where an object was
/// expected, a string in an integer column, ...) become null. A terminal column that the unified
/// schema does not declare is a [`FlattenError::StructuralMismatch`].
pub fn flatten_document(doc: &Document, unified: &UnifiedSchema) -> FlattenResult<DataSet> {
    let table = converge(project(doc, &unified.root), WorkTable::rewrite)?;
    finish(table, unified)
}

/// Apply `pass` until no nested column remains. Every pass must lower the maximum depth.
fn converge<F>(mut table: WorkTable, mut pass: F) -> FlattenResult<WorkTable>
where
    F: FnMut(WorkTable) -> WorkTable,
{
    let mut depth = table.max_depth();
    let mut iteration = 0;
    while depth > 0 {
        iteration += 1;
        table = pass(table);
        let next = table.max_depth();
        if next >= depth {
            return Err(FlattenError::NonTermination { depth: next, iteration });
        }
        depth = next;
    }
    Ok(table)
}

fn project(doc: &Document, root: &SchemaNode) -> WorkTable {
    let fields: &[(String, SchemaNode)] = match root {
        SchemaNode::Object(fields) => fields,
        _ => &[],
    };

    let columns = fields
        .iter()
        .map(|(name, node)| Column {
            name: name.clone(),
            level: 1,
            node: node.clone(),
        })
        .collect();

    let rows = doc
        .records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|(name, _)| record.get(name).cloned().unwrap_or(Json::Null))
                .collect()
        })
        .collect();

    WorkTable { columns, rows }
}

impl WorkTable {
    fn max_depth(&self) -> usize {
        self.columns.iter().map(|c| c.node.depth()).max().unwrap_or(0)
    }

    /// One rewrite pass over every column present at the start of the pass.
    fn rewrite(mut self) -> Self {
        let mut pos = 0;
        while pos < self.columns.len() {
            let column = self.columns[pos].clone();
            match &column.node {
                SchemaNode::Object(children) => {
                    self.expand(pos, &column, children);
                    pos += children.len();
                }
                SchemaNode::ArrayOf(element) if matches!(element.as_ref(), SchemaNode::Object(_)) => {
                    self.explode(pos);
                    self.columns[pos].node = element.as_ref().clone();
                    pos += 1;
                }
                _ => pos += 1,
            }
        }
        self
    }

    fn expand(&mut self, pos: usize, column: &Column, children: &[(String, SchemaNode)]) {
        let replacement: Vec<Column> = children
            .iter()
            .map(|(child, node)| Column {
                name: column_name(&column.name, column.level, child),
                level: column.level + 1,
                node: node.clone(),
            })
            .collect();
        self.columns.splice(pos..=pos, replacement);

        for row in &mut self.rows {
            let values: Vec<Json> = match std::mem::take(&mut row[pos]) {
                Json::Object(mut map) => children
                    .iter()
                    .map(|(child, _)| map.remove(child).unwrap_or(Json::Null))
                    .collect(),
                // Null parents and mismatched shapes null the whole subtree.
                _ => vec![Json::Null; children.len()],
            };
            row.splice(pos..=pos, values);
        }
    }

    fn explode(&mut self, pos: usize) {
        let rows = std::mem::take(&mut self.rows);
        let mut out = Vec::with_capacity(rows.len());
        for mut row in rows {
            match std::mem::take(&mut row[pos]) {
                Json::Array(items) if !items.is_empty() => {
                    for item in items {
                        let mut exploded = row.clone();
                        exploded[pos] = item;
                        out.push(exploded);
                    }
                }
                // Empty, null or mismatched arrays keep the parent row.
                _ => out.push(row),
            }
        }
        self.rows = out;
    }
}

fn finish(table: WorkTable, unified: &UnifiedSchema) -> FlattenResult<DataSet> {
    let positions: HashMap<&str, usize> = unified
        .schema
        .field_names()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let mut targets = Vec::with_capacity(table.columns.len());
    let mut claimed = vec![false; unified.schema.len()];
    for column in &table.columns {
        let Some(&target) = positions.get(column.name.as_str()) else {
            return Err(FlattenError::StructuralMismatch {
                column: column.name.clone(),
                message: format!("{} column is not declared by the unified schema", column.node),
            });
        };
        // Two paths can spell the same flat name; the first one keeps it.
        if claimed[target] {
            targets.push(None);
        } else {
            claimed[target] = true;
            targets.push(Some(target));
        }
    }

    let width = unified.schema.len();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            let mut out = vec![Value::Null; width];
            for (cell, target) in row.iter().zip(&targets) {
                if let Some(t) = *target {
                    out[t] = conform_value(&unified.schema.fields[t].data_type, cell);
                }
            }
            out
        })
        .collect();

    Ok(DataSet::new(unified.schema.clone(), rows))
}
