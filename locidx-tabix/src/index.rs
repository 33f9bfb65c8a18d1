//! Tabix index (`.tbi`) deserialization.
//!
//! The file is BGZF-compressed and laid out little-endian:
//!
//! - magic `TBI\1`, `n_ref: i32`
//! - `preset, seq_col, begin_col, end_col, meta, skip: i32`
//! - `l_nm: i32` followed by `l_nm` bytes of NUL-terminated sequence names
//! - per sequence: `n_bin: i32`, then `{bin: u32, n_chunk: i32, [u: u64, v: u64]}`
//!   per bin, then `n_intv: i32` and `n_intv` linear index offsets (`u64`)
//! - optionally `n_no_coor: u64`, the number of unplaced reads

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::MultiGzDecoder;
use log::debug;

use locidx_core::utils::normalize_chrom_name;

use crate::binning::{LINEAR_INDEX_SHIFT, MAX_BIN, bin_info, reg2bins};
use crate::errors::{Result, TabixError};
use crate::header::TabixHeader;
use crate::virtual_offset::{Chunk, VirtualOffset};

/// Index magic string
pub const TBI_MAGIC: &[u8; 4] = b"TBI\x01";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Binning and linear index of one sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabixIndex {
    bins: HashMap<u32, Vec<Chunk>>,
    linear_index: Vec<VirtualOffset>,
}

impl TabixIndex {
    pub fn new(bins: HashMap<u32, Vec<Chunk>>, linear_index: Vec<VirtualOffset>) -> Self {
        TabixIndex { bins, linear_index }
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let n_bin = read_count(reader, "bin count")?;
        let mut bins = HashMap::new();
        for _ in 0..n_bin {
            let bin = reader
                .read_u32::<LittleEndian>()
                .map_err(|e| truncated(e, "bin number"))?;
            if bin > MAX_BIN {
                return Err(TabixError::InvalidHeader(format!("bin number {} out of range", bin)));
            }
            let n_chunk = read_count(reader, "chunk count")?;
            let mut chunks = Vec::new();
            for _ in 0..n_chunk {
                let u = read_offset(reader, "chunk")?;
                let v = read_offset(reader, "chunk")?;
                chunks.push(Chunk { u, v });
            }
            bins.insert(bin, chunks);
        }

        let n_intv = read_count(reader, "linear index size")?;
        let mut linear_index = Vec::new();
        for _ in 0..n_intv {
            linear_index.push(read_offset(reader, "linear index")?);
        }

        Ok(TabixIndex { bins, linear_index })
    }

    /// Chunks stored for `bin`
    pub fn chunks(&self, bin: u32) -> Option<&[Chunk]> {
        self.bins.get(&bin).map(Vec::as_slice)
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn linear_index(&self) -> &[VirtualOffset] {
        &self.linear_index
    }

    ///
    /// Lower bound on the offset of any record overlapping `begin` or later.
    ///
    /// Windows past the end of the linear index use its last entry; an empty
    /// linear index gives offset zero.
    ///
    pub fn min_offset(&self, begin: u32) -> VirtualOffset {
        let window = (begin >> LINEAR_INDEX_SHIFT) as usize;
        match self.linear_index.last() {
            None => VirtualOffset::default(),
            Some(last) => self.linear_index.get(window).copied().unwrap_or(*last),
        }
    }

    ///
    /// Every chunk of every bin overlapping `[begin, end)` that ends past the
    /// linear index bound. Duplicates across bins are kept.
    ///
    pub fn candidate_chunks(&self, begin: u32, end: u32) -> Vec<Chunk> {
        let floor = self.min_offset(begin);
        reg2bins(begin, end)
            .into_iter()
            .filter_map(|bin| self.bins.get(&bin))
            .flatten()
            .filter(|chunk| floor < chunk.v)
            .copied()
            .collect()
    }
}

impl Display for TabixIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&u32> = self.bins.keys().collect();
        keys.sort();

        writeln!(f, "Binning index size:{}", self.bins.len())?;
        for bin in keys {
            let chunks = &self.bins[bin];
            match bin_info(*bin) {
                Some(info) => writeln!(f, "\t{}", info)?,
                None => writeln!(f, "\tbin: {}", bin)?,
            }
            writeln!(f, "\tNumber of chunks:{}", chunks.len())?;
            for (i, chunk) in chunks.iter().enumerate() {
                writeln!(f, "\t\tchunk {}\t{}", i, chunk)?;
            }
        }
        writeln!(f, "Linear index size: {}", self.linear_index.len())?;
        for (i, offset) in self.linear_index.iter().enumerate() {
            writeln!(f, "\t{}\t{}", i, offset.as_raw())?;
        }
        Ok(())
    }
}

/// The content of a whole `.tbi` file: header, sequence dictionary and one
/// [`TabixIndex`] per sequence.
#[derive(Debug, Clone)]
pub struct TabixIndexFile {
    header: TabixHeader,
    names: Vec<String>,
    name_to_tid: HashMap<String, usize>,
    indexes: Vec<TabixIndex>,
    unplaced_unmapped: Option<u64>,
}

impl TabixIndexFile {
    /// Load an index from disk, gzip/BGZF-compressed or raw.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut bytes = Vec::new();
        BufReader::new(File::open(path.as_ref())?).read_to_end(&mut bytes)?;
        debug!(
            "Read tabix index {} ({} bytes)",
            path.as_ref().display(),
            bytes.len()
        );
        Self::from_bytes(&bytes)
    }

    /// Parse an index held in memory, gzip/BGZF-compressed or raw.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut raw = Vec::new();
            MultiGzDecoder::new(bytes).read_to_end(&mut raw)?;
            Self::read(&mut raw.as_slice())
        } else {
            Self::read(&mut &bytes[..])
        }
    }

    /// Parse an uncompressed index stream.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| truncated(e, "magic"))?;
        if &magic != TBI_MAGIC {
            return Err(TabixError::InvalidMagic(magic));
        }

        let n_ref = read_count(reader, "sequence count")?;
        let mut raw_header = [0i32; 6];
        for field in raw_header.iter_mut() {
            *field = read_i32(reader, "header")?;
        }
        let [preset, seq_col, begin_col, end_col, meta, skip] = raw_header;
        let header = TabixHeader::from_raw(preset, seq_col, begin_col, end_col, meta, skip)?;

        let l_nm = read_count(reader, "name dictionary length")?;
        let mut buf = Vec::new();
        reader.by_ref().take(l_nm as u64).read_to_end(&mut buf)?;
        if buf.len() != l_nm {
            return Err(TabixError::Truncated("name dictionary"));
        }
        let names = parse_sequence_names(&buf)?;
        if names.len() != n_ref {
            return Err(TabixError::SequenceCountMismatch {
                expected: n_ref,
                found: names.len(),
            });
        }

        debug!(
            "Tabix index: {} sequences, format {}, columns {}/{}/{}, meta '{}', skip {}",
            n_ref,
            header.format,
            header.seq_col,
            header.begin_col,
            header.end_col,
            header.meta_char,
            header.skip_lines
        );

        let mut indexes = Vec::with_capacity(names.len());
        for name in names.iter() {
            let index = TabixIndex::read(reader)?;
            debug!(
                "Sequence '{}': {} bins, {} linear index entries",
                name,
                index.num_bins(),
                index.linear_index.len()
            );
            indexes.push(index);
        }

        let unplaced_unmapped = match reader.read_u64::<LittleEndian>() {
            Ok(n) => Some(n),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => None,
            Err(e) => return Err(e.into()),
        };

        Ok(TabixIndexFile::new(header, names, indexes, unplaced_unmapped))
    }

    ///
    /// Assemble an index from parts. Each name is registered both as written
    /// and in its normalized form; an exact name always wins over a normalized
    /// alias of another sequence.
    ///
    pub fn new(
        header: TabixHeader,
        names: Vec<String>,
        indexes: Vec<TabixIndex>,
        unplaced_unmapped: Option<u64>,
    ) -> Self {
        let mut name_to_tid = HashMap::with_capacity(names.len() * 2);
        for (tid, name) in names.iter().enumerate() {
            name_to_tid.insert(name.clone(), tid);
        }
        for (tid, name) in names.iter().enumerate() {
            name_to_tid.entry(normalize_chrom_name(name)).or_insert(tid);
        }
        TabixIndexFile {
            header,
            names,
            name_to_tid,
            indexes,
            unplaced_unmapped,
        }
    }

    pub fn header(&self) -> &TabixHeader {
        &self.header
    }

    /// Sequence names in dictionary order
    pub fn sequence_names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a sequence name: exact match first, then the normalized name.
    pub fn sequence_id(&self, name: &str) -> Option<usize> {
        self.name_to_tid
            .get(name)
            .or_else(|| self.name_to_tid.get(&normalize_chrom_name(name)))
            .copied()
    }

    pub fn index(&self, tid: usize) -> Option<&TabixIndex> {
        self.indexes.get(tid)
    }

    /// The index of a named sequence.
    pub fn index_of(&self, name: &str) -> Result<&TabixIndex> {
        self.sequence_id(name)
            .and_then(|tid| self.indexes.get(tid))
            .ok_or_else(|| TabixError::UnknownSequence(name.to_string()))
    }

    pub fn num_sequences(&self) -> usize {
        self.names.len()
    }

    /// Number of unplaced, unmapped records, when the index stores it
    pub fn unplaced_unmapped(&self) -> Option<u64> {
        self.unplaced_unmapped
    }
}

impl Display for TabixIndexFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, index) in self.names.iter().zip(self.indexes.iter()) {
            writeln!(f, "Sequence: {}", name)?;
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

fn truncated(e: io::Error, what: &'static str) -> TabixError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        TabixError::Truncated(what)
    } else {
        TabixError::Io(e)
    }
}

fn read_i32<R: Read>(reader: &mut R, what: &'static str) -> Result<i32> {
    reader
        .read_i32::<LittleEndian>()
        .map_err(|e| truncated(e, what))
}

fn read_count<R: Read>(reader: &mut R, what: &'static str) -> Result<usize> {
    let value = read_i32(reader, what)?;
    usize::try_from(value).map_err(|_| TabixError::InvalidHeader(format!("{} is {}", what, value)))
}

fn read_offset<R: Read>(reader: &mut R, what: &'static str) -> Result<VirtualOffset> {
    reader
        .read_u64::<LittleEndian>()
        .map(VirtualOffset::new)
        .map_err(|e| truncated(e, what))
}

/// Split the NUL-terminated name dictionary
fn parse_sequence_names(buf: &[u8]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut start = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if byte == 0 {
            let name = std::str::from_utf8(&buf[start..i])
                .map_err(|e| TabixError::InvalidSequenceName(e.to_string()))?;
            names.push(name.to_string());
            start = i + 1;
        }
    }
    if start != buf.len() {
        return Err(TabixError::InvalidSequenceName(
            "name dictionary is not NUL-terminated".to_string(),
        ));
    }
    Ok(names)
}
