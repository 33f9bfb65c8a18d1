//! Genome-wide interval indexing: one [`IntervalTree`] per chromosome.
//!
//! [`IntervalForest`] routes every region to the tree of its chromosome. Keys are
//! normalized with [`normalize_chrom_name`], so `chr1`, `Chr1` and `1` share a tree.
//! Querying a chromosome that was never added is not an error, it simply has no
//! overlaps.
//!
//! # Examples
//!
//! ```
//! use locidx_core::models::Region;
//! use locidx_overlap::IntervalForest;
//!
//! let genes = vec![
//!     Region::new("chr1", 1000, 2000).with_rest("BRCA1"),
//!     Region::new("chr1", 5000, 6000).with_rest("TP53"),
//!     Region::new("chr2", 1000, 3000).with_rest("EGFR"),
//! ];
//! let mut forest = IntervalForest::from(genes);
//!
//! let hits = forest.query(&Region::new("1", 1500, 2500));
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].rest.as_deref(), Some("BRCA1"));
//!
//! // unseen chromosomes yield nothing
//! assert!(forest.query(&Region::new("chr7", 0, 10_000)).is_empty());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use log::debug;

use locidx_core::models::{Interval, Region};
use locidx_core::utils::normalize_chrom_name;

use crate::errors::OverlapError;
use crate::{IntervalTree, Itree};

/// A set of interval trees keyed by normalized chromosome name.
///
/// Trees are created on first use and never removed. Like [`IntervalTree`],
/// [`query`](IntervalForest::query) and [`stab`](IntervalForest::stab) rebuild
/// stale trees on demand while [`find`](IntervalForest::find) refuses to.
#[derive(Debug, Clone, Default)]
pub struct IntervalForest {
    name: Option<String>,
    forest: HashMap<String, IntervalTree<u32, Region>>,
}

impl IntervalForest {
    pub fn new() -> Self {
        IntervalForest::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Add a region to the tree of its chromosome.
    pub fn add(&mut self, region: Region) {
        self.get_or_create_tree(&region.chr).add(region.into_interval());
    }

    pub fn add_all(&mut self, regions: impl IntoIterator<Item = Region>) {
        for region in regions {
            self.add(region);
        }
    }

    /// Rebuild every tree that is out of sync.
    pub fn build(&mut self) {
        for (chrom, tree) in self.forest.iter_mut() {
            if !tree.is_in_sync() {
                debug!("Building interval tree for '{}'", chrom);
                tree.build();
            }
        }
    }

    /// The tree for `chrom`, if any region was ever added to it.
    pub fn get_tree(&self, chrom: &str) -> Option<&IntervalTree<u32, Region>> {
        self.forest.get(&normalize_chrom_name(chrom))
    }

    /// The tree for `chrom`, created empty (and in sync) when missing.
    pub fn get_or_create_tree(&mut self, chrom: &str) -> &mut IntervalTree<u32, Region> {
        self.forest.entry(normalize_chrom_name(chrom)).or_default()
    }

    pub fn has_tree(&self, chrom: &str) -> bool {
        self.get_tree(chrom).is_some()
    }

    /// Normalized chromosome keys, sorted
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.forest.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Total number of regions over all trees
    pub fn len(&self) -> usize {
        self.forest.values().map(|tree| tree.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(chromosome key, tree)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IntervalTree<u32, Region>)> {
        self.forest.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All regions overlapping `marker`.
    pub fn query(&mut self, marker: &Region) -> Vec<Region> {
        match self.tree_mut(&marker.chr) {
            Some(tree) => into_regions(tree.query(marker.start, marker.end)),
            None => Vec::new(),
        }
    }

    /// All regions overlapping any of `markers`, concatenated in marker order.
    /// A region hit by several markers appears once per marker.
    pub fn query_all(&mut self, markers: &[Region]) -> Vec<Region> {
        markers.iter().flat_map(|marker| self.query(marker)).collect()
    }

    /// The distinct regions overlapping at least one of `markers`.
    pub fn query_unique(&mut self, markers: &[Region]) -> HashSet<Region> {
        markers.iter().flat_map(|marker| self.query(marker)).collect()
    }

    /// All regions covering the start of `marker`.
    pub fn stab(&mut self, marker: &Region) -> Vec<Region> {
        self.stab_at(&marker.chr, marker.start)
    }

    /// All regions on `chrom` covering `point`.
    pub fn stab_at(&mut self, chrom: &str, point: u32) -> Vec<Region> {
        match self.tree_mut(chrom) {
            Some(tree) => into_regions(tree.stab(point)),
            None => Vec::new(),
        }
    }

    /// For each marker and each region it overlaps, the overlapping portion.
    ///
    /// Results carry the chromosome and strand of the matched region and no
    /// payload.
    pub fn intersect(&mut self, markers: &[Region]) -> Vec<Region> {
        let mut result = Vec::new();
        for marker in markers {
            for hit in self.query(marker) {
                // every hit overlaps the marker, so this is never empty
                if let Some(part) = hit.intersection(marker) {
                    result.push(part);
                }
            }
        }
        result
    }

    /// Read-only form of [`query`](IntervalForest::query); fails when the
    /// chromosome's tree has pending insertions.
    pub fn find(&self, marker: &Region) -> Result<Vec<Region>, OverlapError> {
        match self.get_tree(&marker.chr) {
            Some(tree) => Ok(tree
                .find_iter(marker.start, marker.end)?
                .map(|iv| iv.val.clone())
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    fn tree_mut(&mut self, chrom: &str) -> Option<&mut IntervalTree<u32, Region>> {
        self.forest.get_mut(&normalize_chrom_name(chrom))
    }
}

fn into_regions(hits: Vec<Interval<u32, Region>>) -> Vec<Region> {
    hits.into_iter().map(|iv| iv.val).collect()
}

impl Display for IntervalForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chrom in self.chromosomes() {
            if let Some(tree) = self.forest.get(chrom) {
                writeln!(
                    f,
                    "{}\tsize:{}\tin_sync: {}",
                    chrom,
                    tree.len(),
                    tree.is_in_sync()
                )?;
            }
        }
        Ok(())
    }
}

impl From<Vec<Region>> for IntervalForest {
    fn from(regions: Vec<Region>) -> Self {
        let mut forest = IntervalForest::new();
        forest.add_all(regions);
        forest
    }
}

impl FromIterator<Region> for IntervalForest {
    fn from_iter<It: IntoIterator<Item = Region>>(iter: It) -> Self {
        let mut forest = IntervalForest::new();
        forest.add_all(iter);
        forest
    }
}
