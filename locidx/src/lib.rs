//! # locidx
//!
//! Genomic interval indexing in two halves:
//!
//! - [`overlap`]: an in-memory centered interval tree, and a forest of them
//!   keyed by chromosome, for overlap and point (stabbing) queries.
//! - [`tabix`]: a reader for tabix (`.tbi`) indexes that streams the lines of a
//!   sorted, BGZF-compressed file overlapping a region.
//!
//! Both share the models and coordinate conventions of [`core`]: positions are
//! zero-based and ranges half-open everywhere except in tabix region strings.
//!
//! ```
//! use locidx::core::models::Region;
//! use locidx::overlap::IntervalForest;
//!
//! let mut forest = IntervalForest::new();
//! forest.add(Region::new("chr1", 100, 200));
//! forest.add(Region::new("1", 150, 300));
//!
//! let hits = forest.query(&Region::new("chr1", 180, 190));
//! assert_eq!(hits.len(), 2);
//! ```
//!
//! Each half sits behind a feature of the same name; all are enabled by default.

#[cfg(feature = "core")]
#[doc(inline)]
pub use locidx_core as core;

#[cfg(feature = "overlap")]
#[doc(inline)]
pub use locidx_overlap as overlap;

#[cfg(feature = "tabix")]
#[doc(inline)]
pub use locidx_tabix as tabix;
