//! Streaming piecewise-linear regression (component C4, training half).
//!
//! Builds maximal segments from a sorted stream of `(key, target)` points
//! such that every point in a segment lies within `epsilon` of that
//! segment's line. This is the standard "shrinking cone" greedy PLR
//! construction used by PGM-index-family learned indexes: each segment
//! maintains a feasible slope interval that narrows as points are added,
//! and closes as soon as a point would make the interval empty.
//!
//! The reference C++ source this crate is otherwise grounded on did not
//! include its PLR implementation in the retrieved snapshot, so this one is
//! built from the general algorithm rather than transliterated.

/// One maximal linear segment produced by [`PlrBuilder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// The smallest key covered by this segment.
    pub start_key: u64,
    pub slope: f64,
    pub intercept: i64,
    /// Number of points folded into this segment; informational only.
    pub count: usize,
}

/// Incremental builder: feed `(key, target)` pairs in strictly increasing
/// key order, collecting a [`Segment`] each time [`PlrBuilder::add_point`]
/// returns `Some`, and call [`PlrBuilder::finish`] once at the end to flush
/// the last open segment.
pub struct PlrBuilder {
    epsilon: f64,
    first: Option<(u64, i64)>,
    lo_slope: f64,
    hi_slope: f64,
    count: usize,
}

impl PlrBuilder {
    pub fn new(epsilon: usize) -> Self {
        Self {
            epsilon: epsilon as f64,
            first: None,
            lo_slope: f64::NEG_INFINITY,
            hi_slope: f64::INFINITY,
            count: 0,
        }
    }

    /// Feeds the next point. Keys must be strictly increasing across the
    /// whole stream (a duplicate or out-of-order key is a caller bug).
    /// Returns the just-closed segment if `(key, target)` could not be
    /// folded into the currently open one; the point that caused the close
    /// becomes the first point of the next segment.
    pub fn add_point(&mut self, key: u64, target: i64) -> Option<Segment> {
        let Some((x0, y0)) = self.first else {
            self.first = Some((key, target));
            self.count = 1;
            return None;
        };

        debug_assert!(key > x0 || self.count > 1, "plr stream keys must be strictly increasing");
        let dx = (key - x0) as f64;
        let dy = (target - y0) as f64;
        let cand_lo = (dy - self.epsilon) / dx;
        let cand_hi = (dy + self.epsilon) / dx;

        if self.count == 1 {
            self.lo_slope = cand_lo;
            self.hi_slope = cand_hi;
            self.count = 2;
            return None;
        }

        let new_lo = self.lo_slope.max(cand_lo);
        let new_hi = self.hi_slope.min(cand_hi);
        if new_lo > new_hi {
            let closed = self.close_segment(x0, y0);
            self.first = Some((key, target));
            self.lo_slope = f64::NEG_INFINITY;
            self.hi_slope = f64::INFINITY;
            self.count = 1;
            Some(closed)
        } else {
            self.lo_slope = new_lo;
            self.hi_slope = new_hi;
            self.count += 1;
            None
        }
    }

    /// Flushes whatever segment is currently open. Returns `None` if no
    /// points were ever added.
    pub fn finish(mut self) -> Option<Segment> {
        let (x0, y0) = self.first.take()?;
        Some(self.close_segment(x0, y0))
    }

    fn close_segment(&self, x0: u64, y0: i64) -> Segment {
        let slope = if self.count == 1 {
            0.0
        } else {
            debug_assert!(self.lo_slope <= self.hi_slope);
            (self.lo_slope + self.hi_slope) / 2.0
        };
        let intercept = (y0 as f64 - slope * x0 as f64).round() as i64;
        Segment {
            start_key: x0,
            slope,
            intercept,
            count: self.count,
        }
    }
}
