//! Execution engine for the per-document phases of a flattening run.
//!
//! Parsing, schema inference and per-document flattening are independent for every document, so
//! the engine runs them on a rayon thread pool. Results always come back in document order,
//! which keeps first-wins unification and the combined row order reproducible.
//!
//! This module provides:
//!
//! - Parallel, order-preserving execution of the per-document phases
//! - Isolation: a failing (or panicking) document yields an `Err` for that document only
//! - Resource limits / throttling (documents in flight)
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::{FlattenError, FlattenResult};
use crate::ingestion::json::read_document;
use crate::processing::flatten_document;
use crate::schema::{flatten_schema, infer_document_schema, SchemaNode, UnifiedSchema};
use crate::types::{DataSet, Document, Field};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on documents being flattened at the same time.
    ///
    /// This is an additional throttle on top of `num_threads`, useful when single documents are
    /// large or explode into many rows.
    pub max_in_flight_documents: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight_documents: n.max(1),
        }
    }
}

/// A document's schema tree together with its flattened columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSchema {
    pub tree: SchemaNode,
    pub fields: Vec<Field>,
}

/// A configurable execution engine for flattening runs.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `max_in_flight_documents == 0` or `num_threads == Some(0)`.
    pub fn new(opts: ExecutionOptions) -> Self {
        assert!(
            opts.max_in_flight_documents > 0,
            "max_in_flight_documents must be > 0"
        );
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Read and parse every source, in parallel, keeping source order.
    pub fn parse_sources(&self, paths: &[PathBuf]) -> Vec<FlattenResult<Document>> {
        self.pool
            .install(|| paths.par_iter().map(|p| isolate(|| read_document(p))).collect())
    }

    /// Infer and flatten each document's schema, in parallel, keeping document order.
    pub fn document_schemas(&self, docs: &[Document]) -> Vec<DocumentSchema> {
        self.pool.install(|| {
            docs.par_iter()
                .map(|doc| {
                    let tree = infer_document_schema(doc);
                    let fields = flatten_schema(&tree);
                    DocumentSchema { tree, fields }
                })
                .collect()
        })
    }

    /// Flatten every document under `unified`, in parallel, keeping document order.
    ///
    /// Each document is isolated: an error or panic affects only that document's entry.
    pub fn flatten_documents(&self, docs: &[Document], unified: &UnifiedSchema) -> Vec<FlattenResult<DataSet>> {
        self.pool.install(|| self.flatten_documents_impl(docs, unified))
    }

    fn flatten_documents_impl(&self, docs: &[Document], unified: &UnifiedSchema) -> Vec<FlattenResult<DataSet>> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { documents: docs.len() });

        let sem = Semaphore::new(self.opts.max_in_flight_documents);

        let out: Vec<FlattenResult<DataSet>> = docs
            .par_iter()
            .enumerate()
            .map(|(index, doc)| {
                let permit = sem.acquire();
                if permit.waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(permit.waited);
                    self.emit(ExecutionEvent::ThrottleWaited { duration: permit.waited });
                }

                self.metrics.on_document_start();
                self.emit(ExecutionEvent::DocumentStarted {
                    index,
                    id: doc.id.clone(),
                });

                let result = isolate(|| flatten_document(doc, unified));
                match &result {
                    Ok(table) => {
                        self.metrics.on_document_success(table.row_count());
                        self.emit(ExecutionEvent::DocumentFinished {
                            index,
                            rows: table.row_count(),
                        });
                    }
                    Err(e) => {
                        self.metrics.on_document_failure();
                        self.emit(ExecutionEvent::DocumentFailed {
                            index,
                            reason: e.to_string(),
                        });
                    }
                }
                drop(permit);
                result
            })
            .collect();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Run one document's work, turning a panic into [`FlattenError::Panicked`].
pub fn isolate<T, F>(f: F) -> FlattenResult<T>
where
    F: FnOnce() -> FlattenResult<T>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(FlattenError::Panicked {
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
