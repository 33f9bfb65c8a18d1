use num_traits::{PrimInt, Unsigned};

pub use locidx_core::models::Interval;

/// The capability surface shared by interval trees.
///
/// Insertions only append to the backing collection and mark the structure as
/// out of sync; `build` reconstructs the index. `query` and `stab` rebuild on
/// demand, so they never return stale results.
pub trait Itree<I, T>: Send + Sync
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn add(&mut self, interval: Interval<I, T>);

    fn add_all(&mut self, intervals: Vec<Interval<I, T>>);

    fn build(&mut self);

    /// All intervals overlapping the half-open range `[start, end)`.
    fn query(&mut self, start: I, end: I) -> Vec<Interval<I, T>>;

    /// All intervals covering `point`.
    fn stab(&mut self, point: I) -> Vec<Interval<I, T>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_in_sync(&self) -> bool;
}
