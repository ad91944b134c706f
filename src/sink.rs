//! Materializing a combined dataset.
//!
//! - [`write_csv`] / [`write_csv_to_path`]: CSV with a header row; nulls are empty cells and list
//!   cells are written as JSON text
//! - [`render_table`]: a bounded, aligned text preview
//! - [`render_report`]: the preview, or an explicit empty-result line with attempted/failed counts

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::FlattenResult;
use crate::pipeline::RunReport;
use crate::types::{DataSet, Value};

/// Write `dataset` as CSV to `writer`.
pub fn write_csv<W: Write>(dataset: &DataSet, writer: W) -> FlattenResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(csv_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `dataset` as CSV to a new file at `path`.
pub fn write_csv_to_path(dataset: &DataSet, path: impl AsRef<Path>) -> FlattenResult<()> {
    let file = File::create(path)?;
    write_csv(dataset, file)
}

fn csv_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render up to `limit` rows as an aligned text table.
pub fn render_table(dataset: &DataSet, limit: usize) -> String {
    let header: Vec<String> = dataset.schema.field_names().map(str::to_string).collect();
    let body: Vec<Vec<String>> = dataset
        .rows
        .iter()
        .take(limit)
        .map(|row| row.iter().map(Value::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let border = format!(
        "+{}+",
        widths.iter().map(|w| "-".repeat(w + 2)).collect::<Vec<_>>().join("+")
    );
    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!(" {c:<w$} "))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&line(&header));
    out.push('\n');
    out.push_str(&border);
    out.push('\n');
    for row in &body {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&border);
    out.push('\n');
    if dataset.row_count() > limit {
        out.push_str(&format!("only showing top {limit} of {} rows\n", dataset.row_count()));
    }
    out
}

/// Preview of a run's dataset, or the empty-result signal when nothing was flattened.
pub fn render_report(report: &RunReport, limit: usize) -> String {
    match &report.dataset {
        Some(ds) => render_table(ds, limit),
        None => format!(
            "no documents were flattened (attempted={}, failed={})\n",
            report.attempted,
            report.failures.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{render_table, write_csv};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn sample() -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("a", DataType::Int64),
                Field::new("name", DataType::Utf8),
                Field::new("tags", DataType::List(Box::new(DataType::Utf8))),
            ]),
            vec![
                vec![
                    Value::Int64(1),
                    Value::Utf8("x, y".to_string()),
                    Value::List(vec![Value::Utf8("t".to_string())]),
                ],
                vec![Value::Int64(22), Value::Null, Value::Null],
            ],
        )
    }

    #[test]
    fn csv_writes_header_nulls_and_lists() {
        let mut buf = Vec::new();
        write_csv(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "a,name,tags\n1,\"x, y\",\"[\"\"t\"\"]\"\n22,,\n");
    }

    #[test]
    fn table_preview_is_aligned_and_bounded() {
        let text = render_table(&sample(), 1);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+---+------+-------+");
        assert_eq!(lines[1], "| a | name | tags  |");
        assert_eq!(lines[3], "| 1 | x, y | [\"t\"] |");
        assert_eq!(lines.last().copied(), Some("only showing top 1 of 2 rows"));
    }
}
