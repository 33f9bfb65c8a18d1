use thiserror::Error;

/// Errors that can occur when working with an [`IntervalTree`](crate::IntervalTree)
/// or [`IntervalForest`](crate::IntervalForest).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverlapError {
    /// A read-only query was issued against a tree with pending insertions.
    /// Call `build()` first, or use the lazily-rebuilding `query`/`stab`.
    #[error("Interval tree is out of sync with its intervals; call build() before a read-only query")]
    OutOfSync,
    /// An interval whose start lies after its end.
    #[error("Invalid interval: start={start}, end={end}")]
    InvalidInterval { start: String, end: String },
}
