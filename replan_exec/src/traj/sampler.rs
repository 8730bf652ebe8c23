//! # Segment sampler
//!
//! Resamples a piecewise polynomial onto an evenly spaced time grid. Sample times are presented in
//! non-decreasing order so the owning segment is found with a cursor which only moves forward.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{Breakpoints, Poly, TrajError, WindowDefect};
use util::maths::linspace;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locates the segment owning a sample time.
///
/// A time exactly on a breakpoint belongs to the segment starting there, except for the final
/// breakpoint which belongs to the last segment.
#[derive(Debug, Clone)]
pub struct SegmentCursor<'a> {
    breakpoints: &'a [f64],
    index: usize
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> SegmentCursor<'a> {
    pub fn new(breakpoints: &'a Breakpoints) -> Self {
        Self {
            breakpoints: breakpoints.as_slice(),
            index: 0
        }
    }

    /// Index of the current segment.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Advance to the segment owning `time_s` and return its index.
    ///
    /// Fails with `OutOfRange` if `time_s` is beyond the last breakpoint or before the start of
    /// the current segment, as the cursor never moves backwards.
    pub fn locate(&mut self, time_s: f64) -> Result<usize, TrajError> {
        let last_seg = self.breakpoints.len() - 2;
        let start_s = self.breakpoints[self.index];
        let end_s = self.breakpoints[last_seg + 1];

        if !(time_s >= start_s && time_s <= end_s) {
            return Err(TrajError::OutOfRange {
                time_s,
                start_s,
                end_s
            });
        }

        while self.index < last_seg && time_s >= self.breakpoints[self.index + 1] {
            self.index += 1;
        }

        Ok(self.index)
    }

    /// Time relative to the start of the current segment.
    pub fn local_time_s(&self, time_s: f64) -> f64 {
        time_s - self.breakpoints[self.index]
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// The `sample_count` evenly spaced sample times spanning the breakpoints.
///
/// The first sample is on the first breakpoint and the last on the final breakpoint.
pub fn sample_times(breakpoints: &Breakpoints, sample_count: usize) -> Vec<f64> {
    linspace(breakpoints.start_s(), breakpoints.end_s(), sample_count)
}

/// Sample a piecewise polynomial at `sample_count` evenly spaced times.
pub fn sample(
    polys: &[Poly],
    breakpoints: &Breakpoints,
    sample_count: usize
) -> Result<Vec<f64>, TrajError> {
    sample_at(polys, breakpoints, &sample_times(breakpoints, sample_count))
}

/// Sample a piecewise polynomial at the given non-decreasing times.
pub fn sample_at(
    polys: &[Poly],
    breakpoints: &Breakpoints,
    times_s: &[f64]
) -> Result<Vec<f64>, TrajError> {
    if polys.len() != breakpoints.num_segments() {
        return Err(WindowDefect::SegmentCountMismatch {
            expected: breakpoints.num_segments(),
            found: polys.len()
        }
        .into());
    }

    let mut cursor = SegmentCursor::new(breakpoints);

    times_s
        .iter()
        .map(|t| {
            let k = cursor.locate(*t)?;
            Ok(polys[k].eval(cursor.local_time_s(*t)))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn staircase() -> (Vec<Poly>, Breakpoints) {
        // Constant value per segment equal to the segment index
        let polys = (0..3).map(|i| Poly::new(vec![i as f64])).collect();
        (polys, Breakpoints::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap())
    }

    #[test]
    fn test_sample_times_coverage() {
        let (_, bp) = staircase();
        let times = sample_times(&bp, 30);

        assert_eq!(times.len(), 30);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[29], 3.0);
        for t in &times {
            assert!(*t >= 0.0 && *t <= 3.0);
        }
        for w in times.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn test_breakpoint_attribution() {
        let (_, bp) = staircase();
        let mut cursor = SegmentCursor::new(&bp);

        assert_eq!(cursor.locate(0.5).unwrap(), 0);
        assert_eq!(cursor.locate(1.0).unwrap(), 1);
        assert_eq!(cursor.local_time_s(1.0), 0.0);
        assert_eq!(cursor.locate(2.0).unwrap(), 2);

        // The final breakpoint belongs to the last segment
        assert_eq!(cursor.locate(3.0).unwrap(), 2);
        assert_eq!(cursor.local_time_s(3.0), 1.0);
    }

    #[test]
    fn test_sample_staircase() {
        let (polys, bp) = staircase();

        let v = sample_at(&polys, &bp, &[0.0, 0.99, 1.0, 1.5, 2.0, 3.0]).unwrap();
        assert_eq!(v, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);

        let v = sample(&polys, &bp, 31).unwrap();
        assert_eq!(v.len(), 31);
        assert_eq!(v[9], 0.0);
        assert_eq!(v[10], 1.0);
        assert_eq!(v[30], 2.0);
    }

    #[test]
    fn test_local_time_evaluation() {
        // Each segment is t in local time, so the samples are a sawtooth
        let polys = vec![Poly::new(vec![1.0, 0.0]); 3];
        let bp = Breakpoints::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap();

        let v = sample_at(&polys, &bp, &[0.25, 1.25, 2.5, 3.0]).unwrap();
        assert_eq!(v, vec![0.25, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_out_of_range() {
        let (polys, bp) = staircase();

        assert_eq!(
            sample_at(&polys, &bp, &[1.0, 3.5]),
            Err(TrajError::OutOfRange {
                time_s: 3.5,
                start_s: 1.0,
                end_s: 3.0
            })
        );

        // Going backwards past the cursor is also out of range
        assert!(sample_at(&polys, &bp, &[2.5, 0.5]).is_err());
    }

    #[test]
    fn test_segment_count_mismatch() {
        let (polys, bp) = staircase();

        assert_eq!(
            sample(&polys[..2], &bp, 10),
            Err(TrajError::InvalidWindow(WindowDefect::SegmentCountMismatch {
                expected: 3,
                found: 2
            }))
        );
    }
}
