//! End-to-end flattening runs.
//!
//! A run lists the sources under an input location, then:
//!
//! 1. parses every source and infers + flattens its schema (in parallel)
//! 2. unifies the schemas in document order (first definition wins)
//! 3. flattens every document under the unified schema (in parallel, each document isolated)
//! 4. combines the per-document tables in document order
//!
//! A document that fails at any step is excluded, reported once to the observer, and recorded in
//! [`RunReport::failures`]; the rest of the run continues. A run in which every document failed
//! still succeeds, with [`RunReport::dataset`] set to `None`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FlattenError, FlattenResult};
use crate::execution::{ExecutionEngine, ExecutionOptions};
use crate::ingestion::observability::{DocumentContext, DocumentStats, FlattenObserver, Severity};
use crate::ingestion::source::{list_sources, SourceOptions};
use crate::processing::combine;
use crate::schema::{SchemaCollision, SchemaNode, UnifiedSchema};
use crate::types::{DataSet, Document, Field};

/// Options controlling a flattening run.
///
/// Use [`RunOptions::new`] with the input location for common cases.
#[derive(Clone)]
pub struct RunOptions {
    /// Input location (a directory, or a single file).
    pub input: PathBuf,
    /// Which files under `input` are documents.
    pub sources: SourceOptions,
    /// Parallelism and throttling.
    pub execution: ExecutionOptions,
    /// Optional observer for per-document diagnostics.
    pub observer: Option<Arc<dyn FlattenObserver>>,
    /// Severity at or above which failures go to `on_alert` instead of `on_document_failure`.
    pub alert_at_or_above: Severity,
}

impl RunOptions {
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            sources: SourceOptions::default(),
            execution: ExecutionOptions::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("input", &self.input)
            .field("sources", &self.sources)
            .field("execution", &self.execution)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

/// A document excluded from the run.
#[derive(Debug)]
pub struct DocumentFailure {
    /// Source identifier.
    pub id: String,
    /// Position in document order.
    pub index: usize,
    pub error: FlattenError,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    /// Combined dataset, or `None` if no document was flattened.
    pub dataset: Option<DataSet>,
    /// Unified schema of the successfully parsed documents.
    pub unified: UnifiedSchema,
    /// Number of documents attempted.
    pub attempted: usize,
    /// Excluded documents in document order.
    pub failures: Vec<DocumentFailure>,
}

impl RunReport {
    /// Number of documents that contributed rows (possibly zero rows) to the dataset.
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// First-wins collisions noted while unifying.
    pub fn collisions(&self) -> &[SchemaCollision] {
        &self.unified.collisions
    }
}

/// Flatten every document under `options.input`.
///
/// Only a failure to enumerate the input location is returned as an error.
pub fn run(options: &RunOptions) -> FlattenResult<RunReport> {
    let paths = list_sources(&options.input, &options.sources)?;
    let engine = ExecutionEngine::new(options.execution.clone());

    let mut isolation = Isolation::new(options);
    let parsed = engine.parse_sources(&paths);
    let docs: Vec<(usize, Document)> = parsed
        .into_iter()
        .zip(&paths)
        .enumerate()
        .filter_map(|(index, (result, path))| isolation.keep(index, &path.display().to_string(), result))
        .collect();

    Ok(flatten_indexed(&engine, docs, paths.len(), isolation))
}

/// Flatten already-parsed documents, given in document order.
pub fn run_documents(docs: Vec<Document>, options: &RunOptions) -> RunReport {
    let engine = ExecutionEngine::new(options.execution.clone());
    let attempted = docs.len();
    let indexed = docs.into_iter().enumerate().collect();
    flatten_indexed(&engine, indexed, attempted, Isolation::new(options))
}

fn flatten_indexed(
    engine: &ExecutionEngine,
    indexed: Vec<(usize, Document)>,
    attempted: usize,
    mut isolation: Isolation<'_>,
) -> RunReport {
    let (indices, docs): (Vec<usize>, Vec<Document>) = indexed.into_iter().unzip();

    let schemas = engine.document_schemas(&docs);
    let (fields, trees): (Vec<Vec<Field>>, Vec<SchemaNode>) =
        schemas.into_iter().map(|s| (s.fields, s.tree)).unzip();
    let mut unified = UnifiedSchema::from_parts(&fields, &trees);
    // Notes refer to positions among all attempted documents, not just the parsed ones.
    for collision in &mut unified.collisions {
        collision.document_index = indices[collision.document_index];
    }
    isolation.report_collisions(&unified.collisions);

    let results = engine.flatten_documents(&docs, &unified);
    let tables: Vec<DataSet> = results
        .into_iter()
        .zip(indices.iter().zip(&docs))
        .filter_map(|(result, (&index, doc))| {
            let (_, table) = isolation.keep(index, &doc.id, result)?;
            isolation.report_success(index, &doc.id, table.row_count());
            Some(table)
        })
        .collect();

    let mut failures = isolation.into_failures();
    failures.sort_by_key(|f| f.index);

    RunReport {
        dataset: combine(tables),
        unified,
        attempted,
        failures,
    }
}

/// Records per-document failures and forwards diagnostics to the observer.
struct Isolation<'a> {
    observer: Option<&'a Arc<dyn FlattenObserver>>,
    alert_at_or_above: Severity,
    failures: Vec<DocumentFailure>,
}

impl<'a> Isolation<'a> {
    fn new(options: &'a RunOptions) -> Self {
        Self {
            observer: options.observer.as_ref(),
            alert_at_or_above: options.alert_at_or_above,
            failures: Vec::new(),
        }
    }

    /// Pass a successful result through; record and report a failed one.
    fn keep<T>(&mut self, index: usize, id: &str, result: FlattenResult<T>) -> Option<(usize, T)> {
        match result {
            Ok(value) => Some((index, value)),
            Err(error) => {
                if let Some(obs) = self.observer {
                    let ctx = DocumentContext {
                        id: id.to_string(),
                        index,
                    };
                    // Exactly one callback per failed document.
                    let sev = Severity::for_error(&error);
                    if sev >= self.alert_at_or_above {
                        obs.on_alert(&ctx, sev, &error);
                    } else {
                        obs.on_document_failure(&ctx, sev, &error);
                    }
                }
                self.failures.push(DocumentFailure {
                    id: id.to_string(),
                    index,
                    error,
                });
                None
            }
        }
    }

    fn report_success(&self, index: usize, id: &str, rows: usize) {
        if let Some(obs) = self.observer {
            let ctx = DocumentContext {
                id: id.to_string(),
                index,
            };
            obs.on_document_success(&ctx, DocumentStats { rows });
        }
    }

    fn report_collisions(&self, collisions: &[SchemaCollision]) {
        if let Some(obs) = self.observer {
            for c in collisions {
                obs.on_schema_collision(c);
            }
        }
    }

    fn into_failures(self) -> Vec<DocumentFailure> {
        self.failures
    }
}
