use stream::StreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The live root cannot anchor a reconciliation. Detected synchronously,
    /// before any streaming begins.
    #[error("live root is not a tree-bearing handle: {0}")]
    InvalidArgument(&'static str),
    /// The byte source failed mid-stream. The live tree keeps whatever was
    /// already applied; no rollback is performed.
    #[error(transparent)]
    StreamFailure(#[from] StreamError),
}
