//! Region queries against tabix-indexed files.
//!
//! A tabix index (`.tbi`) maps genomic bins of a sorted, BGZF-compressed text
//! file (VCF, BED, SAM, or any tab-delimited format) to byte ranges of the
//! compressed stream. This crate reads such an index and streams the lines
//! overlapping a region without decompressing the whole file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use locidx_tabix::TabixReader;
//!
//! # fn main() -> locidx_tabix::Result<()> {
//! // reads peaks.bed.gz.tbi next to the data file
//! let mut reader = TabixReader::open("peaks.bed.gz")?;
//!
//! for line in reader.query_region("chr1:1,000,000-2,000,000")? {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Positions in region strings are one-based and inclusive, as `tabix` takes
//! them. Everything else in this crate is zero-based and half-open.

pub mod binning;
pub mod errors;
pub mod header;
pub mod index;
pub mod iterator;
pub mod reader;
pub mod stream;
pub mod virtual_offset;

// re-exports
pub use self::binning::{BinInfo, bin_info, reg2bins};
pub use self::errors::{Result, TabixError};
pub use self::header::{RecordInterval, TabixFormat, TabixHeader};
pub use self::index::{TabixIndex, TabixIndexFile};
pub use self::iterator::TabixIterator;
pub use self::reader::{ParsedRegion, TabixReader};
pub use self::stream::VirtualSeekRead;
pub use self::virtual_offset::{Chunk, VirtualOffset, less_than_unsigned, merge_chunks};
