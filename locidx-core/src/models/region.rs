use std::fmt::{self, Display};
use std::str::FromStr;

use crate::coords::{closed_to_half_open, half_open_to_closed};
use crate::errors::RegionError;
use crate::models::{Interval, Strand};
use crate::utils::normalize_chrom_name;

///
/// A located genomic feature: chromosome, half-open `[start, end)` range, strand
/// and an optional payload (name, id, remaining columns).
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,

    pub rest: Option<String>,
}

impl Region {
    pub fn new(chr: impl Into<String>, start: u32, end: u32) -> Self {
        Region {
            chr: chr.into(),
            start,
            end,
            strand: Strand::Unknown,
            rest: None,
        }
    }

    ///
    /// Build a region, rejecting `start > end`.
    ///
    pub fn try_new(chr: impl Into<String>, start: u32, end: u32) -> Result<Self, RegionError> {
        if start > end {
            return Err(RegionError::InvalidInterval { start, end });
        }
        Ok(Region::new(chr, start, end))
    }

    ///
    /// Build a region from zero-based closed coordinates `[start, end_closed]`.
    ///
    pub fn from_closed(
        chr: impl Into<String>,
        start: u32,
        end_closed: u32,
    ) -> Result<Self, RegionError> {
        let (start, end) = closed_to_half_open(start, end_closed)?;
        Ok(Region::new(chr, start, end))
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_rest(mut self, rest: impl Into<String>) -> Self {
        self.rest = Some(rest.into());
        self
    }

    ///
    /// Get length of the region
    ///
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    ///
    /// Last covered base (closed end), `None` for an empty region
    ///
    pub fn end_closed(&self) -> Option<u32> {
        half_open_to_closed(self.start, self.end).map(|(_, end)| end)
    }

    ///
    /// Chromosome name in its normalized form, see [`normalize_chrom_name`]
    ///
    pub fn chrom_key(&self) -> String {
        normalize_chrom_name(&self.chr)
    }

    ///
    /// Two regions overlap when they sit on the same (normalized) chromosome and
    /// share at least one base.
    ///
    pub fn overlaps(&self, other: &Region) -> bool {
        self.start < other.end && other.start < self.end && self.chrom_key() == other.chrom_key()
    }

    ///
    /// The overlapping portion of two regions, keeping this region's chromosome
    /// and strand. `None` when they don't overlap.
    ///
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Region {
            chr: self.chr.clone(),
            start: self.start.max(other.start),
            end: self.end.min(other.end),
            strand: self.strand,
            rest: None,
        })
    }

    ///
    /// Wrap this region as an [`Interval`] carrying the region itself as payload
    ///
    pub fn into_interval(self) -> Interval<u32, Region> {
        Interval {
            start: self.start,
            end: self.end,
            val: self,
        }
    }

    ///
    /// Get file string of Region
    ///
    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}{}",
            self.chr,
            self.start,
            self.end,
            self.rest
                .as_deref()
                .map_or(String::new(), |s| format!("\t{}", s)),
        )
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

///
/// Parse one BED line: `chr`, `start`, `end`, then any remaining columns as `rest`.
/// A sixth column of `+` or `-` also sets the strand.
///
impl FromStr for Region {
    type Err = RegionError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if parts.len() < 3 {
            return Err(RegionError::RegionParseError(format!(
                "expected at least 3 columns, got '{}'",
                line
            )));
        }

        let coord = |text: &str| {
            text.parse::<u32>().map_err(|_| {
                RegionError::RegionParseError(format!("'{}' is not a position in '{}'", text, line))
            })
        };
        let mut region = Region::try_new(parts[0], coord(parts[1])?, coord(parts[2])?)?;

        if let Some(strand) = parts.get(5).and_then(|s| s.chars().next()) {
            region.strand = Strand::from_char(strand);
        }
        region.rest = Some(parts[3..].join("\t")).filter(|s| !s.is_empty());
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_from_closed() {
        let r = Region::from_closed("1", 10, 20).unwrap();
        assert_eq!((r.start, r.end), (10, 21));
        assert_eq!(r.width(), 11);
        assert_eq!(r.end_closed(), Some(20));
    }

    #[rstest]
    fn test_try_new_rejects_inverted() {
        assert_eq!(
            Region::try_new("1", 20, 10),
            Err(RegionError::InvalidInterval { start: 20, end: 10 })
        );
    }

    #[rstest]
    fn test_overlaps_across_naming_styles() {
        let a = Region::new("chr1", 100, 200);
        let b = Region::new("1", 199, 300);
        let c = Region::new("chr2", 150, 160);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&Region::new("chr1", 200, 300)));
    }

    #[rstest]
    fn test_intersection() {
        let a = Region::new("chr1", 100, 200).with_strand(Strand::Reverse);
        let b = Region::new("chr1", 150, 300);
        let i = a.intersection(&b).unwrap();
        assert_eq!((i.start, i.end), (150, 200));
        assert_eq!(i.strand, Strand::Reverse);
        assert_eq!(a.intersection(&Region::new("chr1", 300, 400)), None);
    }

    #[rstest]
    #[case("chr1\t10\t20", "chr1", 10, 20, Strand::Unknown, None)]
    #[case("chr2\t5\t9\tpeak1\t0\t-\n", "chr2", 5, 9, Strand::Reverse, Some("peak1\t0\t-"))]
    fn test_from_str(
        #[case] line: &str,
        #[case] chr: &str,
        #[case] start: u32,
        #[case] end: u32,
        #[case] strand: Strand,
        #[case] rest: Option<&str>,
    ) {
        let region: Region = line.parse().unwrap();
        assert_eq!(region.chr, chr);
        assert_eq!((region.start, region.end), (start, end));
        assert_eq!(region.strand, strand);
        assert_eq!(region.rest.as_deref(), rest);
    }

    #[rstest]
    #[case("chr1\t10")]
    #[case("chr1\tten\t20")]
    fn test_from_str_rejects(#[case] line: &str) {
        assert!(matches!(
            line.parse::<Region>(),
            Err(RegionError::RegionParseError(_))
        ));
    }

    #[rstest]
    fn test_from_str_rejects_inverted() {
        assert!(matches!(
            "chr1\t20\t10".parse::<Region>(),
            Err(RegionError::InvalidInterval { .. })
        ));
    }

    #[rstest]
    fn test_as_string() {
        let r = Region::new("chr1", 1, 5).with_rest("gene_a");
        assert_eq!(r.to_string(), "chr1\t1\t5\tgene_a");
    }
}
