//! In-memory genomic overlap queries for the locidx project.
//!
//! This crate provides a centered interval tree and a per-chromosome forest of
//! them, answering "which annotated features overlap this range?" and "which
//! features cover this position?".
//!
//! ## Features
//!
//! - **Median-partitioned trees**: [`IntervalTree`] splits on the median of all
//!   interval boundaries, giving `O(n log n)` builds and `O(log n + k)` queries
//! - **Lazy rebuilds**: insertions are cheap appends, the index is rebuilt on the
//!   next query
//! - **Strict read-only access**: [`IntervalTree::find_iter`] never rebuilds and
//!   reports [`OverlapError::OutOfSync`] instead, so a built tree can be shared
//! - **Genome-wide routing**: [`IntervalForest`] keeps one tree per normalized
//!   chromosome name
//!
//! All positions are zero-based and half-open, see [`locidx_core::coords`].
//!
//! ## Quick Start
//!
//! ```rust
//! use locidx_overlap::{Interval, IntervalTree, Itree};
//!
//! let mut tree = IntervalTree::new();
//! tree.add_all(vec![
//!     Interval { start: 100u32, end: 200, val: "gene1" },
//!     Interval { start: 150, end: 300, val: "gene2" },
//!     Interval { start: 400, end: 500, val: "gene3" },
//! ]);
//!
//! let overlaps = tree.query(180, 250);
//! assert_eq!(overlaps.len(), 2);
//!
//! // the tree is now built, so the iterator form is available
//! for interval in tree.find_iter(180, 250).unwrap() {
//!     println!("Found overlap: {:?}", interval);
//! }
//! ```

pub mod errors;

/// Centered interval tree.
///
/// See [`IntervalTree`] for details.
pub mod interval_tree;

/// Per-chromosome forest of interval trees.
///
/// See [`IntervalForest`] for details.
pub mod interval_forest;

pub mod traits;

// re-exports
pub use self::errors::OverlapError;
pub use self::interval_forest::IntervalForest;
pub use self::interval_tree::{IntervalNode, IntervalTree, IterFind};
pub use self::traits::{Interval, Itree};
