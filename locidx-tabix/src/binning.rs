//! The hierarchical binning scheme shared by tabix and BAI indexes.
//!
//! Bin `k` at level `l` covers `[(k - o_l) * s_l, (k - o_l + 1) * s_l)` with
//!
//! | level | bins        | size `s_l` |
//! |-------|-------------|------------|
//! | 0     | 0           | 512 Mb     |
//! | 1     | 1-8         | 64 Mb      |
//! | 2     | 9-72        | 8 Mb       |
//! | 3     | 73-584      | 1 Mb       |
//! | 4     | 585-4680    | 128 kb     |
//! | 5     | 4681-37449  | 16 kb      |
//!
//! and `o_l = (8^l - 1) / 7`.

use std::fmt::{self, Display};

/// Number of bins in the scheme
pub const MAX_BIN: u32 = 37450;

/// Positions beyond `2^29` all land in the last bins
pub const MAX_POSITION: u32 = 1 << 29;

/// Width of a linear index window is `2^LINEAR_INDEX_SHIFT` (16 kb)
pub const LINEAR_INDEX_SHIFT: u32 = 14;

/// `(first bin of the level, shift)` for levels 1 to 5
const LEVELS: [(u32, u32); 5] = [(1, 26), (9, 23), (73, 20), (585, 17), (4681, 14)];

/// Every bin that may hold records overlapping `[begin, end)`.
///
/// Bin 0 is always present for a non-empty range; an empty range has no bins.
pub fn reg2bins(begin: u32, end: u32) -> Vec<u32> {
    if begin >= end {
        return Vec::new();
    }
    let end = end.min(MAX_POSITION) - 1;

    let mut bins = vec![0];
    for (offset, shift) in LEVELS {
        bins.extend(offset + (begin >> shift)..=offset + (end >> shift));
    }
    bins
}

/// The level, size and genomic span of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinInfo {
    pub bin: u32,
    pub level: u32,
    pub size: u64,
    pub offset: u32,
    pub start: u64,
    pub end: u64,
}

/// Describe bin `bin`, or `None` when it lies outside the scheme.
pub fn bin_info(bin: u32) -> Option<BinInfo> {
    if bin >= MAX_BIN {
        return None;
    }
    // largest l with (8^l - 1) / 7 <= bin
    let mut level = 0;
    while level < 5 && first_bin_of_level(level + 1) <= bin {
        level += 1;
    }
    let size = 1u64 << (29 - 3 * level);
    let offset = first_bin_of_level(level);
    let start = u64::from(bin - offset) * size;
    Some(BinInfo {
        bin,
        level,
        size,
        offset,
        start,
        end: start + size,
    })
}

fn first_bin_of_level(level: u32) -> u32 {
    ((1 << (3 * level)) - 1) / 7
}

impl Display for BinInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bin: {}, level: {}, size: {}, offset: {}, interval: [ {} , {} )",
            self.bin, self.level, self.size, self.offset, self.start, self.end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_reg2bins_first_window() {
        assert_eq!(reg2bins(0, 1), vec![0, 1, 9, 73, 585, 4681]);
    }

    #[rstest]
    fn test_reg2bins_crossing_windows() {
        // [16383, 16385) straddles the first two 16 kb windows
        assert_eq!(reg2bins(16383, 16385), vec![0, 1, 9, 73, 585, 4681, 4682]);
    }

    #[rstest]
    fn test_reg2bins_empty_range() {
        assert_eq!(reg2bins(10, 10), Vec::<u32>::new());
        assert_eq!(reg2bins(20, 10), Vec::<u32>::new());
    }

    #[rstest]
    fn test_reg2bins_clamps_end() {
        let bins = reg2bins(0, u32::MAX);
        assert_eq!(bins.len(), 37449);
        assert_eq!(bins.last(), Some(&37448));
    }

    #[rstest]
    #[case(0, 0, 1 << 29, 0)]
    #[case(1, 1, 1 << 26, 0)]
    #[case(8, 1, 1 << 26, 7 << 26)]
    #[case(9, 2, 1 << 23, 0)]
    #[case(585, 4, 1 << 17, 0)]
    #[case(4681, 5, 1 << 14, 0)]
    #[case(4682, 5, 1 << 14, 1 << 14)]
    #[case(37448, 5, 1 << 14, 32767 << 14)]
    fn test_bin_info(#[case] bin: u32, #[case] level: u32, #[case] size: u64, #[case] start: u64) {
        let info = bin_info(bin).unwrap();
        assert_eq!(info.level, level);
        assert_eq!(info.size, size);
        assert_eq!(info.start, start);
        assert_eq!(info.end, start + size);
    }

    #[rstest]
    fn test_bin_info_out_of_range() {
        assert_eq!(bin_info(MAX_BIN), None);
    }

    #[rstest]
    fn test_bin_info_display() {
        assert_eq!(
            bin_info(4682).unwrap().to_string(),
            "bin: 4682, level: 5, size: 16384, offset: 4681, interval: [ 16384 , 32768 )"
        );
    }
}
