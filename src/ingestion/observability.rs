use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::FlattenError;
use crate::schema::SchemaCollision;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational note (e.g. a first-wins schema collision).
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (one document was excluded).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl Severity {
    /// Severity of a per-document failure.
    pub fn for_error(e: &FlattenError) -> Self {
        match e {
            FlattenError::Io(_) | FlattenError::Walk(_) => Severity::Critical,
            FlattenError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Severity::Critical,
                _ => Severity::Error,
            },
            FlattenError::Pattern(_)
            | FlattenError::Parse { .. }
            | FlattenError::StructuralMismatch { .. }
            | FlattenError::NonTermination { .. }
            | FlattenError::Panicked { .. } => Severity::Error,
        }
    }
}

/// Identifies the document an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    /// Source identifier.
    pub id: String,
    /// Position in document order.
    pub index: usize,
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    /// Number of flattened rows.
    pub rows: usize,
}

/// Observer interface for per-document outcomes and schema notes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait FlattenObserver: Send + Sync {
    /// Called when a document is flattened.
    fn on_document_success(&self, _ctx: &DocumentContext, _stats: DocumentStats) {}

    /// Called when a document is excluded from the run and the failure is below the alert
    /// threshold.
    fn on_document_failure(&self, _ctx: &DocumentContext, _severity: Severity, _error: &FlattenError) {}

    /// Called instead of [`Self::on_document_failure`] when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_document_failure`].
    fn on_alert(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        self.on_document_failure(ctx, severity, error)
    }

    /// Called once per first-wins collision found while unifying schemas.
    fn on_schema_collision(&self, _collision: &SchemaCollision) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn FlattenObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn FlattenObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl FlattenObserver for CompositeObserver {
    fn on_document_success(&self, ctx: &DocumentContext, stats: DocumentStats) {
        for o in &self.observers {
            o.on_document_success(ctx, stats);
        }
    }

    fn on_document_failure(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        for o in &self.observers {
            o.on_document_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_schema_collision(&self, collision: &SchemaCollision) {
        for o in &self.observers {
            o.on_schema_collision(collision);
        }
    }
}

/// Logs failures and schema notes to stderr. Successful documents are not logged.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl FlattenObserver for StdErrObserver {
    fn on_document_failure(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        eprintln!("[flatten][{:?}] document={} err={}", severity, ctx.id, error);
    }

    fn on_alert(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        eprintln!("[ALERT][flatten][{:?}] document={} err={}", severity, ctx.id, error);
    }

    fn on_schema_collision(&self, collision: &SchemaCollision) {
        eprintln!("[schema][Info] {}", collision_line(collision));
    }
}

/// Appends failures and schema notes to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl FlattenObserver for FileObserver {
    fn on_document_failure(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        self.append_line(&format!(
            "{} fail severity={:?} document={} err={}",
            unix_ts(),
            severity,
            ctx.id,
            error
        ));
    }

    fn on_alert(&self, ctx: &DocumentContext, severity: Severity, error: &FlattenError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} document={} err={}",
            unix_ts(),
            severity,
            ctx.id,
            error
        ));
    }

    fn on_schema_collision(&self, collision: &SchemaCollision) {
        self.append_line(&format!("{} note {}", unix_ts(), collision_line(collision)));
    }
}

fn collision_line(c: &SchemaCollision) -> String {
    format!(
        "column '{}' redefined by document #{} as {}; keeping {}",
        c.name, c.document_index, c.ignored, c.kept
    )
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::{CompositeObserver, DocumentContext, FileObserver, FlattenObserver, Severity};
    use crate::error::FlattenError;
    use crate::schema::SchemaCollision;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn severity_ordering_and_mapping() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Error > Severity::Info);
        let io = FlattenError::Io(std::io::Error::other("boom"));
        assert_eq!(Severity::for_error(&io), Severity::Critical);
        let parse = FlattenError::Parse {
            source_id: "x".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(Severity::for_error(&parse), Severity::Error);
    }

    #[test]
    fn file_observer_appends_failures_and_notes() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("rust-json-flatten-observer-{nanos}.log"));
        let file = Arc::new(FileObserver::new(&path));
        let composite = CompositeObserver::new(vec![file]);

        let ctx = DocumentContext {
            id: "doc-2.json".to_string(),
            index: 1,
        };
        let err = FlattenError::NonTermination { depth: 2, iteration: 3 };
        composite.on_document_failure(&ctx, Severity::Error, &err);
        composite.on_schema_collision(&SchemaCollision {
            name: "x".to_string(),
            document_index: 1,
            kept: "int64".to_string(),
            ignored: "utf8".to_string(),
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("fail severity=Error document=doc-2.json"));
        assert!(lines[1].contains("column 'x' redefined by document #1 as utf8; keeping int64"));
        let _ = std::fs::remove_file(&path);
    }
}
