//! BGZF virtual offsets and the chunks built from them.
//!
//! A virtual offset packs the compressed offset of a BGZF block into its high 48
//! bits and the offset inside the decompressed block into the low 16 bits. The
//! only operations the index needs are unsigned ordering and the block split.

use std::fmt::{self, Display};

/// Unsigned 64-bit `u < v` using signed arithmetic only.
///
/// This is the comparison used by tools that store offsets in signed 64-bit
/// integers. It agrees with `(u as u64) < (v as u64)` for every input.
#[inline]
pub fn less_than_unsigned(u: i64, v: i64) -> bool {
    (u < v) ^ (u < 0) ^ (v < 0)
}

/// A BGZF virtual file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    pub const MAX: VirtualOffset = VirtualOffset(u64::MAX);

    pub const fn new(raw: u64) -> Self {
        VirtualOffset(raw)
    }

    /// Build from a compressed block start and an offset inside that block.
    pub const fn from_parts(block_offset: u64, within_block_offset: u16) -> Self {
        VirtualOffset((block_offset << 16) | within_block_offset as u64)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Compressed offset of the BGZF block this offset points into
    #[inline]
    pub const fn block_offset(self) -> u64 {
        self.0 >> 16
    }

    /// Offset inside the decompressed block
    #[inline]
    pub const fn within_block_offset(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    /// Whether both offsets point into the same decompressed block.
    #[inline]
    pub const fn same_block(self, other: VirtualOffset) -> bool {
        self.block_offset() == other.block_offset()
    }
}

impl From<u64> for VirtualOffset {
    fn from(raw: u64) -> Self {
        VirtualOffset(raw)
    }
}

impl From<VirtualOffset> for u64 {
    fn from(offset: VirtualOffset) -> Self {
        offset.0
    }
}

impl Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_offset(), self.within_block_offset())
    }
}

/// A half-open range `[u, v)` of the compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub u: VirtualOffset,
    pub v: VirtualOffset,
}

impl Chunk {
    pub fn new(u: impl Into<VirtualOffset>, v: impl Into<VirtualOffset>) -> Self {
        Chunk {
            u: u.into(),
            v: v.into(),
        }
    }
}

impl Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.u.as_raw(), self.v.as_raw())
    }
}

/// Reduce the candidate chunks of a query to a sorted, non-overlapping list.
///
/// `chunks` must already be filtered by the linear index. Chunks are sorted by
/// start, chunks whose end does not pass the previous end are dropped,
/// overlapping neighbours are clipped and finally neighbours that meet inside
/// one decompressed block are coalesced.
pub fn merge_chunks(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    if chunks.is_empty() {
        return chunks;
    }
    chunks.sort_unstable_by_key(|c| c.u);

    // contained chunks
    let mut kept: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match kept.last() {
            Some(last) if chunk.v <= last.v => {}
            _ => kept.push(chunk),
        }
    }

    // overlaps left by merging at index time
    for i in 1..kept.len() {
        if kept[i - 1].v >= kept[i].u {
            kept[i - 1].v = kept[i].u;
        }
    }

    // same-block neighbours
    let mut merged: Vec<Chunk> = Vec::with_capacity(kept.len());
    for chunk in kept {
        match merged.last_mut() {
            Some(last) if last.v.same_block(chunk.u) => last.v = chunk.v,
            _ => merged.push(chunk),
        }
    }
    merged
}
