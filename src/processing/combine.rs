//! Column-aligned union of flattened tables.

use std::collections::HashMap;

use crate::types::{DataSet, Field, Schema, Value};

/// Combine tables into one dataset by column name.
///
/// The output columns are the union of the input columns in first-seen order; a column's type is
/// taken from the first table that declares it. Rows keep table order, then row order, and are
/// null-filled for columns their table lacks. Returns `None` when there are no tables.
pub fn combine<I>(tables: I) -> Option<DataSet>
where
    I: IntoIterator<Item = DataSet>,
{
    let tables: Vec<DataSet> = tables.into_iter().collect();
    if tables.is_empty() {
        return None;
    }

    let mut fields: Vec<Field> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for table in &tables {
        for field in &table.schema.fields {
            if !index.contains_key(&field.name) {
                index.insert(field.name.clone(), fields.len());
                fields.push(field.clone());
            }
        }
    }

    let width = fields.len();
    let total: usize = tables.iter().map(DataSet::row_count).sum();
    let mut rows = Vec::with_capacity(total);
    for table in tables {
        let mapping: Vec<usize> = table.schema.fields.iter().map(|f| index[&f.name]).collect();
        let aligned = mapping.iter().enumerate().all(|(i, &t)| i == t) && mapping.len() == width;
        for row in table.rows {
            if aligned {
                rows.push(row);
                continue;
            }
            let mut out = vec![Value::Null; width];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                out[target] = cell;
            }
            rows.push(out);
        }
    }

    Some(DataSet::new(Schema::new(fields), rows))
}

#[cfg(test)]
mod tests {
    use super::combine;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn table(names: &[&str], rows: Vec<Vec<Value>>) -> DataSet {
        let schema = Schema::new(names.iter().map(|n| Field::new(*n, DataType::Int64)).collect());
        DataSet::new(schema, rows)
    }

    #[test]
    fn union_of_columns_with_null_fill() {
        let t1 = table(&["a", "b_1_c"], vec![vec![Value::Int64(1), Value::Int64(2)]]);
        let t2 = table(
            &["a", "b_1_c", "b_1_d"],
            vec![
                vec![Value::Int64(3), Value::Int64(4), Value::Int64(5)],
                vec![Value::Int64(6), Value::Null, Value::Int64(7)],
            ],
        );

        let out = combine(vec![t1, t2]).unwrap();
        assert_eq!(out.schema.field_names().collect::<Vec<_>>(), vec!["a", "b_1_c", "b_1_d"]);
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.rows[0], vec![Value::Int64(1), Value::Int64(2), Value::Null]);
        assert_eq!(out.rows[2], vec![Value::Int64(6), Value::Null, Value::Int64(7)]);
    }

    #[test]
    fn reordered_columns_align_by_name() {
        let t1 = table(&["a", "b"], vec![vec![Value::Int64(1), Value::Int64(2)]]);
        let t2 = table(&["c", "b"], vec![vec![Value::Int64(9), Value::Int64(8)]]);
        let out = combine(vec![t1, t2]).unwrap();
        assert_eq!(out.schema.field_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(out.rows[1], vec![Value::Null, Value::Int64(8), Value::Int64(9)]);
    }

    #[test]
    fn first_table_decides_column_type() {
        let t1 = DataSet::new(Schema::new(vec![Field::new("x", DataType::Int64)]), vec![]);
        let t2 = DataSet::new(
            Schema::new(vec![Field::new("x", DataType::Utf8)]),
            vec![vec![Value::Utf8("s".to_string())]],
        );
        let out = combine(vec![t1, t2]).unwrap();
        assert_eq!(out.schema.fields[0].data_type, DataType::Int64);
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn no_tables_is_an_absent_dataset() {
        assert!(combine(Vec::<DataSet>::new()).is_none());
    }
}
