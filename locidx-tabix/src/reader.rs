use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use noodles_bgzf as bgzf;

use locidx_core::coords::{clamp_to_u32, one_based_to_zero_based};
use locidx_core::models::Region;

use crate::errors::{Result, TabixError};
use crate::header::{RecordInterval, TabixHeader};
use crate::index::{TabixIndex, TabixIndexFile};
use crate::iterator::TabixIterator;
use crate::stream::VirtualSeekRead;
use crate::virtual_offset::{Chunk, VirtualOffset, merge_chunks};

/// End of a region given without one, as `chr1` or `chr1:100`
pub const UNBOUNDED_END: u32 = i32::MAX as u32;

/// A region string resolved against the index dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRegion {
    /// `None` when the sequence is not in the index
    pub tid: Option<usize>,
    pub begin: u32,
    pub end: u32,
}

///
/// Random access to a sorted, BGZF-compressed text file through its tabix index.
///
/// The reader owns the data stream and its cursor. Every [`TabixIterator`]
/// borrows the reader mutably, so only one query can be in flight at a time;
/// open one reader per thread to query in parallel.
///
/// # Examples
///
/// ```no_run
/// use locidx_tabix::TabixReader;
///
/// # fn main() -> locidx_tabix::Result<()> {
/// let mut reader = TabixReader::open("variants.vcf.gz")?;
/// for line in reader.query_region("chr1:10,000-20,000")? {
///     println!("{}", line?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TabixReader<S = bgzf::io::Reader<File>> {
    pub(crate) stream: S,
    pub(crate) index: TabixIndexFile,
    show_header: bool,
    /// Last decoded record and the offset right after it, reused across queries
    pub(crate) last_record: Option<(VirtualOffset, RecordInterval)>,
}

impl TabixReader {
    /// Open `path` and its index at `<path>.tbi`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut index_path = path.as_ref().as_os_str().to_owned();
        index_path.push(".tbi");
        Self::with_index_path(path, PathBuf::from(index_path))
    }

    /// Open `path` with an index stored elsewhere.
    pub fn with_index_path<P: AsRef<Path>, Q: AsRef<Path>>(path: P, index_path: Q) -> Result<Self> {
        let index = TabixIndexFile::from_path(index_path)?;
        let stream = bgzf::io::Reader::new(File::open(path.as_ref())?);
        debug!(
            "Opened {} with {} indexed sequences",
            path.as_ref().display(),
            index.num_sequences()
        );
        Ok(TabixReader::new(stream, index))
    }
}

impl<S> TabixReader<S>
where
    S: VirtualSeekRead,
{
    pub fn new(stream: S, index: TabixIndexFile) -> Self {
        TabixReader {
            stream,
            index,
            show_header: false,
            last_record: None,
        }
    }

    pub fn index(&self) -> &TabixIndexFile {
        &self.index
    }

    pub fn header(&self) -> &TabixHeader {
        self.index.header()
    }

    pub fn sequence_names(&self) -> &[String] {
        self.index.sequence_names()
    }

    /// Resolve a sequence name: exact match first, then the normalized name.
    pub fn sequence_id(&self, name: &str) -> Option<usize> {
        self.index.sequence_id(name)
    }

    /// Whether iterators created from now on return header lines.
    pub fn set_show_header(&mut self, show_header: bool) {
        self.show_header = show_header;
    }

    pub fn show_header(&self) -> bool {
        self.show_header
    }

    ///
    /// Parse `chr`, `chr:begin` or `chr:begin-end`, with one-based inclusive
    /// positions, into a zero-based half-open range. Thousands separators are
    /// ignored. A missing begin means the start of the sequence, a missing end
    /// means [`UNBOUNDED_END`].
    ///
    pub fn parse_region(&self, region: &str) -> Result<ParsedRegion> {
        let invalid = || TabixError::InvalidRegion(region.to_string());
        let position = |text: &str| -> Result<i64> {
            text.replace(',', "").trim().parse::<i64>().map_err(|_| invalid())
        };

        let (chrom, begin, end) = match region.rsplit_once(':') {
            None => (region, 0, UNBOUNDED_END),
            Some((chrom, range)) => match range.split_once('-') {
                None => (chrom, one_based_to_zero_based(position(range)?), UNBOUNDED_END),
                Some((begin, end)) => (
                    chrom,
                    one_based_to_zero_based(position(begin)?),
                    clamp_to_u32(position(end)?),
                ),
            },
        };
        if chrom.is_empty() {
            return Err(invalid());
        }

        Ok(ParsedRegion {
            tid: self.sequence_id(chrom),
            begin,
            end,
        })
    }

    ///
    /// Records of sequence `tid` overlapping `[begin, end)`.
    ///
    /// An unknown `tid` or a range without indexed chunks gives an empty
    /// iterator.
    ///
    pub fn query(&mut self, tid: usize, begin: u32, end: u32) -> TabixIterator<'_, S> {
        let chunks = match self.index.index(tid) {
            Some(index) => query_chunks(index, begin, end),
            None => Vec::new(),
        };
        debug!(
            "Query tid {} [{}, {}): {} chunks to read",
            tid,
            begin,
            end,
            chunks.len()
        );
        let show_header = self.show_header;
        TabixIterator::new(self, Some(tid), begin, end, chunks).show_header(show_header)
    }

    /// Records overlapping a region string such as `chr1:100-200`.
    pub fn query_region(&mut self, region: &str) -> Result<TabixIterator<'_, S>> {
        let parsed = self.parse_region(region)?;
        Ok(self.query_parsed(parsed))
    }

    /// Records overlapping a [`Region`], matched by its (normalized) chromosome.
    pub fn query_interval(&mut self, region: &Region) -> TabixIterator<'_, S> {
        let parsed = ParsedRegion {
            tid: self.sequence_id(&region.chr),
            begin: region.start,
            end: region.end,
        };
        self.query_parsed(parsed)
    }

    fn query_parsed(&mut self, parsed: ParsedRegion) -> TabixIterator<'_, S> {
        match parsed.tid {
            Some(tid) => self.query(tid, parsed.begin, parsed.end),
            None => {
                let show_header = self.show_header;
                TabixIterator::new(self, None, parsed.begin, parsed.end, Vec::new())
                    .show_header(show_header)
            }
        }
    }

    ///
    /// Every line of the data file from the start, whatever its sequence.
    ///
    /// The first `skip_lines` lines of the file are dropped unless header lines
    /// are shown.
    ///
    pub fn records(&mut self) -> TabixIterator<'_, S> {
        let show_header = self.show_header;
        let skip = if show_header {
            0
        } else {
            self.header().skip_lines
        };
        let chunks = vec![Chunk::new(VirtualOffset::default(), VirtualOffset::MAX)];
        TabixIterator::new(self, None, 0, UNBOUNDED_END, chunks)
            .show_header(show_header)
            .skip_lines(skip)
    }

    /// Read the next raw line at the current cursor.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.stream.next_line()?)
    }

    /// Whether the record cached at `pos` proves that nothing at or after
    /// `pos` can overlap a query on `tid` ending at `end`.
    pub(crate) fn cached_past_end(&self, pos: VirtualOffset, tid: Option<usize>, end: u32) -> bool {
        match (&self.last_record, tid) {
            (Some((cached_pos, record)), Some(tid)) => {
                *cached_pos == pos && record.tid == Some(tid) && record.begin >= end
            }
            _ => false,
        }
    }
}

/// Candidate chunks of `[begin, end)` in `index`, merged into the read plan.
pub fn query_chunks(index: &TabixIndex, begin: u32, end: u32) -> Vec<Chunk> {
    let candidates = index.candidate_chunks(begin, end);
    let found = candidates.len();
    let merged = merge_chunks(candidates);
    debug!("Merged {} candidate chunks into {}", found, merged.len());
    merged
}
