//! Core models shared by the locidx crates.
//!
//! Every crate in the workspace speaks the same coordinate convention: zero-based,
//! half-open `[start, end)` with unsigned positions. Conversions from closed or
//! one-based inputs live in [`coords`] and nowhere else.
//!
//! ```rust
//! use locidx_core::models::{Region, Strand};
//!
//! // a feature covering bases 10..=20 in closed coordinates
//! let region = Region::from_closed("chr1", 10, 20)?;
//! assert_eq!(region.start, 10);
//! assert_eq!(region.end, 21);
//! assert_eq!(region.end_closed(), Some(20));
//! assert_eq!(region.strand, Strand::Unknown);
//! # Ok::<(), locidx_core::RegionError>(())
//! ```
pub mod coords;
pub mod errors;
pub mod models;
pub mod utils;

pub use self::errors::RegionError;
pub use self::utils::normalize_chrom_name;
