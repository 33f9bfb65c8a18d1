//! Coordinate convention conversions.
//!
//! Internally every interval is zero-based and half-open: `[start, end)`. Annotation
//! formats hand us closed intervals (`[start, end_closed]`) or one-based positions,
//! and Tabix's on-disk text columns can be either. All `+1`/`-1` adjustments between
//! those conventions happen here.

use crate::errors::RegionError;

/// Convert a zero-based closed interval `[start, end_closed]` to half-open `[start, end)`.
#[inline]
pub fn closed_to_half_open(start: u32, end_closed: u32) -> Result<(u32, u32), RegionError> {
    if start > end_closed {
        return Err(RegionError::InvalidInterval {
            start,
            end: end_closed,
        });
    }
    let end = end_closed.checked_add(1).ok_or_else(|| {
        RegionError::CoordinateOutOfRange(format!("closed end {end_closed} cannot be made exclusive"))
    })?;
    Ok((start, end))
}

/// Convert a half-open interval back to closed coordinates.
///
/// Returns `None` for empty intervals, which have no closed representation.
#[inline]
pub fn half_open_to_closed(start: u32, end: u32) -> Option<(u32, u32)> {
    if end <= start {
        return None;
    }
    Some((start, end - 1))
}

/// Convert a one-based position to its zero-based counterpart, clamping at zero.
#[inline]
pub fn one_based_to_zero_based(pos: i64) -> u32 {
    clamp_to_u32(pos.saturating_sub(1))
}

/// Convert a one-based, fully closed range (`chr:100-200` as humans write it)
/// to zero-based half-open.
#[inline]
pub fn one_based_closed_to_half_open(begin: i64, end: i64) -> (u32, u32) {
    (one_based_to_zero_based(begin), clamp_to_u32(end))
}

/// Clamp a signed coordinate into `u32`.
#[inline]
pub fn clamp_to_u32(pos: i64) -> u32 {
    pos.clamp(0, u32::MAX as i64) as u32
}
