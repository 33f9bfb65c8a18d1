use std::fmt::Debug;

use log::debug;
use num_traits::{PrimInt, Unsigned, identities::zero};

use super::Itree;
use crate::errors::OverlapError;
use locidx_core::models::Interval;

/// One node of a centered interval tree.
///
/// Holds every interval that spans `center`, plus the subtrees of intervals lying
/// entirely to the left (last base before `center`) and entirely to the right
/// (start after `center`). Nodes are created once per build and never mutated.
#[derive(Debug, Clone)]
pub struct IntervalNode<I> {
    center: I,
    /// Indices into the owning tree's interval list
    centered: Vec<usize>,
    left: Option<Box<IntervalNode<I>>>,
    right: Option<Box<IntervalNode<I>>>,
}

impl<I> IntervalNode<I>
where
    I: PrimInt + Unsigned + Send + Sync,
{
    fn leaf() -> Self {
        IntervalNode {
            center: zero::<I>(),
            centered: Vec::new(),
            left: None,
            right: None,
        }
    }

    /// Build a subtree over `indices`, all of which must point at non-empty intervals.
    fn build<T>(intervals: &[Interval<I, T>], indices: Vec<usize>) -> Self
    where
        T: Eq + Clone + Send + Sync,
    {
        if indices.is_empty() {
            return Self::leaf();
        }

        // median over every start and last covered base, taken without interpolation
        let mut points: Vec<I> = Vec::with_capacity(indices.len() * 2);
        for &idx in indices.iter() {
            let interval = &intervals[idx];
            points.push(interval.start);
            points.push(interval.end - I::one());
        }
        points.sort_unstable();
        let center = points[points.len() / 2];

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut centered = Vec::new();
        for idx in indices {
            let interval = &intervals[idx];
            if interval.end - I::one() < center {
                left.push(idx);
            } else if interval.start > center {
                right.push(idx);
            } else {
                centered.push(idx);
            }
        }

        let left = (!left.is_empty()).then(|| Box::new(Self::build(intervals, left)));
        let right = (!right.is_empty()).then(|| Box::new(Self::build(intervals, right)));

        IntervalNode {
            center,
            centered,
            left,
            right,
        }
    }

    /// The median coordinate this node splits on
    pub fn center(&self) -> I {
        self.center
    }

    /// Number of intervals spanning this node's center
    pub fn num_centered(&self) -> usize {
        self.centered.len()
    }

    pub fn left(&self) -> Option<&IntervalNode<I>> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&IntervalNode<I>> {
        self.right.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn count(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.count()) + self.right.as_ref().map_or(0, |n| n.count())
    }

    fn depth(&self) -> usize {
        1 + std::cmp::max(
            self.left.as_ref().map_or(0, |n| n.depth()),
            self.right.as_ref().map_or(0, |n| n.depth()),
        )
    }
}

/// A centered interval tree that rebuilds itself lazily.
///
/// Intervals are appended with [`add`](Itree::add) and indexed by
/// [`build`](Itree::build). Construction takes the median of all interval
/// boundaries at every level, which keeps the left, center and right partitions
/// balanced: `O(n log n)` time and `O(n)` space.
///
/// Two query flavours exist:
///
/// * [`query`](Itree::query) / [`stab`](Itree::stab) take `&mut self` and rebuild
///   first when the tree is out of sync.
/// * [`find`](IntervalTree::find) / [`find_iter`](IntervalTree::find_iter) /
///   [`find_point`](IntervalTree::find_point) take `&self` and return
///   [`OverlapError::OutOfSync`] instead, so a built tree can be shared between
///   threads for reading.
///
/// Intervals are half-open `[start, end)`; empty intervals are kept in the
/// collection but never reported by a query.
///
/// # Examples
///
/// ```
/// use locidx_overlap::{Interval, IntervalTree, Itree};
///
/// let mut tree = IntervalTree::new();
/// tree.add(Interval { start: 10u32, end: 21, val: "a" });
/// tree.add(Interval { start: 15, end: 26, val: "b" });
/// tree.add(Interval { start: 30, end: 41, val: "c" });
///
/// // the first query builds the tree
/// assert_eq!(tree.query(18, 31).len(), 3);
/// assert!(tree.stab(5).is_empty());
///
/// // afterwards, read-only lookups are available
/// let hits: Vec<&str> = tree.find_iter(12, 16).unwrap().map(|iv| iv.val).collect();
/// assert_eq!(hits.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct IntervalTree<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// List of intervals, in insertion order
    intervals: Vec<Interval<I, T>>,
    root: IntervalNode<I>,
    in_sync: bool,
}

impl<I, T> IntervalTree<I, T>
where
    I: PrimInt + Unsigned + Send + Sync + Debug,
    T: Eq + Clone + Send + Sync,
{
    /// An empty tree; it is trivially in sync.
    pub fn new() -> Self {
        IntervalTree {
            intervals: Vec::new(),
            root: IntervalNode::leaf(),
            in_sync: true,
        }
    }

    /// Append an interval, rejecting one whose start lies after its end.
    pub fn try_add(&mut self, interval: Interval<I, T>) -> Result<(), OverlapError> {
        if interval.start > interval.end {
            return Err(OverlapError::InvalidInterval {
                start: format!("{:?}", interval.start),
                end: format!("{:?}", interval.end),
            });
        }
        self.add(interval);
        Ok(())
    }

    /// Read-only overlap query against `[start, end)`.
    pub fn find(&self, start: I, end: I) -> Result<Vec<Interval<I, T>>, OverlapError> {
        Ok(self.find_iter(start, end)?.cloned().collect())
    }

    /// Read-only point query.
    pub fn find_point(&self, point: I) -> Result<Vec<Interval<I, T>>, OverlapError> {
        match point.checked_add(&I::one()) {
            Some(end) => self.find(point, end),
            // nothing ends past the largest representable position
            None => self.ensure_in_sync().map(|_| Vec::new()),
        }
    }

    /// Iterator over the intervals overlapping `[start, end)`, without allocating.
    pub fn find_iter<'a>(&'a self, start: I, end: I) -> Result<IterFind<'a, I, T>, OverlapError> {
        self.ensure_in_sync()?;
        let mut stack = Vec::new();
        if start < end {
            stack.push(&self.root);
        }
        Ok(IterFind {
            intervals: &self.intervals,
            stack,
            centered: Default::default(),
            start,
            end,
        })
    }

    /// All intervals in insertion order
    pub fn intervals(&self) -> &[Interval<I, T>] {
        &self.intervals
    }

    /// Iterate over all intervals in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Interval<I, T>> {
        self.intervals.iter()
    }

    /// The root of the last build
    pub fn root(&self) -> &IntervalNode<I> {
        &self.root
    }

    /// Number of nodes in the last build
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    /// Depth of the last build (a single leaf has depth 1)
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    fn ensure_in_sync(&self) -> Result<(), OverlapError> {
        if self.in_sync {
            Ok(())
        } else {
            Err(OverlapError::OutOfSync)
        }
    }
}

impl<I, T> Itree<I, T> for IntervalTree<I, T>
where
    I: PrimInt + Unsigned + Send + Sync + Debug,
    T: Eq + Clone + Send + Sync,
{
    fn add(&mut self, interval: Interval<I, T>) {
        self.intervals.push(interval);
        self.in_sync = false;
    }

    fn add_all(&mut self, intervals: Vec<Interval<I, T>>) {
        if intervals.is_empty() {
            return;
        }
        self.intervals.extend(intervals);
        self.in_sync = false;
    }

    fn build(&mut self) {
        if self.in_sync {
            return;
        }

        let indices: Vec<usize> = self
            .intervals
            .iter()
            .enumerate()
            .filter(|(_, iv)| !iv.is_empty())
            .map(|(idx, _)| idx)
            .collect();

        self.root = IntervalNode::build(&self.intervals, indices);
        self.in_sync = true;

        debug!(
            "Built interval tree: {} intervals, {} nodes, depth {}",
            self.intervals.len(),
            self.node_count(),
            self.depth()
        );
    }

    fn query(&mut self, start: I, end: I) -> Vec<Interval<I, T>> {
        self.build();
        self.find_iter(start, end)
            .map(|iter| iter.cloned().collect())
            .unwrap_or_default()
    }

    fn stab(&mut self, point: I) -> Vec<Interval<I, T>> {
        self.build();
        self.find_point(point).unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.intervals.len()
    }

    fn is_in_sync(&self) -> bool {
        self.in_sync
    }
}

impl<I, T> Default for IntervalTree<I, T>
where
    I: PrimInt + Unsigned + Send + Sync + Debug,
    T: Eq + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, T> From<Vec<Interval<I, T>>> for IntervalTree<I, T>
where
    I: PrimInt + Unsigned + Send + Sync + Debug,
    T: Eq + Clone + Send + Sync,
{
    /// The tree starts out of sync unless `intervals` is empty.
    fn from(intervals: Vec<Interval<I, T>>) -> Self {
        let mut tree = IntervalTree::new();
        tree.add_all(intervals);
        tree
    }
}

impl<I, T> FromIterator<Interval<I, T>> for IntervalTree<I, T>
where
    I: PrimInt + Unsigned + Send + Sync + Debug,
    T: Eq + Clone + Send + Sync,
{
    fn from_iter<It: IntoIterator<Item = Interval<I, T>>>(iter: It) -> Self {
        IntervalTree::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a, I, T> IntoIterator for &'a IntervalTree<I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    type Item = &'a Interval<I, T>;
    type IntoIter = std::slice::Iter<'a, Interval<I, T>>;

    fn into_iter(self) -> std::slice::Iter<'a, Interval<I, T>> {
        self.intervals.iter()
    }
}

/// An iterator over the intervals in an [`IntervalTree`] that overlap a query range.
///
/// Created by [`IntervalTree::find_iter`]. Nodes are visited depth-first; the
/// left subtree is only entered when the query starts before a node's center and
/// the right subtree only when the query's last base lies after it.
#[derive(Debug)]
pub struct IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    intervals: &'a [Interval<I, T>],
    stack: Vec<&'a IntervalNode<I>>,
    centered: std::slice::Iter<'a, usize>,
    start: I,
    end: I,
}

impl<'a, I, T> Iterator for IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    type Item = &'a Interval<I, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            for &idx in self.centered.by_ref() {
                let interval = &self.intervals[idx];
                if interval.overlap(self.start, self.end) {
                    return Some(interval);
                }
            }

            let node = self.stack.pop()?;
            self.centered = node.centered.iter();

            // start < end holds for anything on the stack, so end - 1 is the query's last base
            if self.start < node.center {
                if let Some(left) = node.left.as_deref() {
                    self.stack.push(left);
                }
            }
            if self.end - I::one() > node.center {
                if let Some(right) = node.right.as_deref() {
                    self.stack.push(right);
                }
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn build_tree(raw: &[(u32, u32)]) -> IntervalTree<u32, usize> {
        let mut tree: IntervalTree<u32, usize> = raw
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| Interval {
                start: a.min(b),
                end: a.max(b),
                val: i,
            })
            .collect();
        tree.build();
        tree
    }

    fn vals<'a>(hits: impl Iterator<Item = &'a Interval<u32, usize>>) -> Vec<usize> {
        let mut v: Vec<usize> = hits.map(|iv| iv.val).collect();
        v.sort();
        v
    }

    proptest! {
        #[test]
        fn test_query_equals_linear_scan(
            raw in prop::collection::vec((0u32..2000, 0u32..2000), 0..200),
            start in 0u32..2100,
            len in 0u32..300,
        ) {
            let tree = build_tree(&raw);
            let end = start + len;
            let expected = vals(tree.iter().filter(|iv| iv.overlap(start, end)));
            prop_assert_eq!(vals(tree.find_iter(start, end).unwrap()), expected);
        }

        #[test]
        fn test_stab_is_unit_query(
            raw in prop::collection::vec((0u32..2000, 0u32..2000), 0..200),
            point in 0u32..2100,
        ) {
            let mut tree = build_tree(&raw);
            let mut stabbed: Vec<usize> = tree.stab(point).into_iter().map(|iv| iv.val).collect();
            stabbed.sort();
            prop_assert_eq!(stabbed, vals(tree.find_iter(point, point + 1).unwrap()));
        }
    }
}
