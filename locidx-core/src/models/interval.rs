use std::cmp::Ordering;

use num_traits::{PrimInt, Unsigned, zero};

///
/// A half-open `[start, end)` range carrying a payload.
///
/// Ordering and equality look at coordinates only, `val` is ignored: two
/// intervals over the same range compare equal whatever they carry.
/// `start == end` is a valid, empty interval that overlaps nothing.
///
#[derive(Debug, Clone)]
pub struct Interval<I, T> {
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
{
    pub fn new(start: I, end: I, val: T) -> Self {
        Interval { start, end, val }
    }

    /// Number of covered positions
    #[inline]
    pub fn len(&self) -> I {
        self.end.checked_sub(&self.start).unwrap_or_else(zero)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Number of positions shared with `other`
    #[inline]
    pub fn intersect(&self, other: &Interval<I, T>) -> I {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        hi.checked_sub(&lo).unwrap_or_else(zero)
    }

    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        start < self.end && self.start < end
    }

    #[inline]
    pub fn contains(&self, point: I) -> bool {
        (self.start..self.end).contains(&point)
    }

    /// The last covered position, `None` when empty
    #[inline]
    pub fn last(&self) -> Option<I> {
        (!self.is_empty()).then(|| self.end - I::one())
    }
}

impl<I: Ord, T> Ord for Interval<I, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl<I: Ord, T> PartialOrd for Interval<I, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: Eq, T> PartialEq for Interval<I, T> {
    fn eq(&self, other: &Self) -> bool {
        (&self.start, &self.end) == (&other.start, &other.end)
    }
}

impl<I: Eq, T> Eq for Interval<I, T> {}
