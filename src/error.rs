use thiserror::Error;

/// Convenience result type for flattening operations.
pub type FlattenResult<T> = Result<T, FlattenError>;

/// Error type returned by listing, parsing, flattening and writing.
///
/// Every per-document variant is caught by the isolation wrapper in
/// [`crate::execution::ExecutionEngine`] and degrades to "this document is excluded". Only
/// failures to enumerate the input location surface from [`crate::pipeline::run`].
#[derive(Debug, Error)]
pub enum FlattenError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid source file-name pattern.
    #[error("invalid source pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// CSV sink error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Raw content is not a valid JSON document.
    #[error("failed to parse document '{source_id}': {message}")]
    Parse { source_id: String, message: String },

    /// The document's shape conflicts irreconcilably with the unified schema.
    #[error("structural mismatch at '{column}': {message}")]
    StructuralMismatch { column: String, message: String },

    /// The flatten fixpoint failed to reduce the remaining nesting depth.
    #[error("flatten did not converge: nesting depth stayed at {depth} on iteration {iteration}")]
    NonTermination { depth: usize, iteration: usize },

    /// A panic raised while flattening a single document.
    #[error("document processing panicked: {message}")]
    Panicked { message: String },
}
