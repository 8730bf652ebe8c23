//! # Polynomial segment fitter
//!
//! Fits one polynomial per axis per pair of neighbouring waypoints. Two policies are provided:
//!
//! - `TwoPoint` fits each segment in isolation from its two endpoint waypoints, by least-squares
//!   regression of an order K polynomial onto the straight line between them over a dense local
//!   time grid. The regression only depends on the order and the grid, so it is solved once when
//!   the fitter is built and each segment then costs a handful of multiplications. There is no
//!   continuity of acceleration or jerk across segment boundaries.
//! - `MinJerk` fits the whole window at once, requiring derivatives `1..K` to be continuous at
//!   every interior breakpoint. The remaining `K - 1` conditions set the lowest derivatives to
//!   zero at the start and end of the window. For order 5 this is the minimum-jerk spline through
//!   the waypoints. One dense linear system is solved per window and shared by all axes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

// Internal
use super::{Breakpoints, Poly, Segment, TrajError, Waypoint, WindowDefect, NUM_AXES};
use util::maths::linspace;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Singular values below this are treated as zero when building the regression.
const PINV_EPS: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fits the segments of a window.
#[derive(Debug, Clone)]
pub struct SegmentFitter {
    /// Order of the fitted polynomials
    order: usize,

    /// Fitting policy
    policy: FitPolicy,

    /// Least-squares solution for a unit ramp over normalised time `s` in `[0, 1]`.
    ///
    /// Holds the coefficients of `s^K .. s^1`; the constant term is pinned to the start value.
    unit_ramp: DVector<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The policy used to fit the segments of a window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPolicy {
    /// Independent least-squares fit per segment
    TwoPoint,

    /// Globally continuous spline over the window
    MinJerk
}

impl Default for FitPolicy {
    fn default() -> Self {
        FitPolicy::TwoPoint
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SegmentFitter {
    /// Create a new fitter.
    ///
    /// `fit_samples` is the number of points in the local time grid used by the `TwoPoint`
    /// regression, and must be at least `order + 1`.
    pub fn new(order: usize, fit_samples: usize, policy: FitPolicy) -> Result<Self, TrajError> {
        if order < 1 {
            return Err(WindowDefect::OrderTooLow(order).into());
        }
        if fit_samples < order + 1 {
            return Err(WindowDefect::TooFewFitSamples {
                order,
                min: order + 1,
                found: fit_samples
            }
            .into());
        }

        // Regression matrix over normalised time, columns s^K .. s^1
        let s: Vec<f64> = linspace(0.0, 1.0, fit_samples);
        let a = DMatrix::from_fn(fit_samples, order, |r, c| s[r].powi((order - c) as i32));
        let ramp = DVector::from_vec(s);

        let pinv = a
            .pseudo_inverse(PINV_EPS)
            .map_err(TrajError::FitFailed)?;

        Ok(Self {
            order,
            policy,
            unit_ramp: pinv * ramp
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn policy(&self) -> FitPolicy {
        self.policy
    }

    /// Fit the segments joining `waypoints` at the given `breakpoints`.
    ///
    /// N waypoints and N breakpoints produce N - 1 segments. Segment `i` starts exactly at
    /// waypoint `i` and ends at waypoint `i + 1` within the numerical tolerance of the fit.
    pub fn fit(
        &self,
        waypoints: &[Waypoint],
        breakpoints: &Breakpoints
    ) -> Result<Vec<Segment>, TrajError> {
        if waypoints.len() < 2 {
            return Err(WindowDefect::TooFewWaypoints(waypoints.len()).into());
        }
        if breakpoints.len() != waypoints.len() {
            return Err(WindowDefect::BreakpointCountMismatch {
                expected: waypoints.len(),
                found: breakpoints.len()
            }
            .into());
        }

        let segments = match self.policy {
            FitPolicy::TwoPoint => self.fit_two_point(waypoints, breakpoints),
            FitPolicy::MinJerk => self.fit_min_jerk(waypoints, breakpoints)?
        };

        trace!(
            "Fitted {} segments of order {} ({:?})",
            segments.len(),
            self.order,
            self.policy
        );

        Ok(segments)
    }

    /// Fit every segment independently from its two endpoints.
    fn fit_two_point(&self, waypoints: &[Waypoint], breakpoints: &Breakpoints) -> Vec<Segment> {
        waypoints
            .windows(2)
            .zip(breakpoints.durations_s())
            .map(|(ends, duration_s)| {
                let fit_axis = |a: usize| self.fit_pair(ends[0][a], ends[1][a], duration_s);
                Segment {
                    axes: [fit_axis(0), fit_axis(1), fit_axis(2), fit_axis(3)],
                    duration_s
                }
            })
            .collect()
    }

    /// Fit a single polynomial from `start` at `t = 0` to `end` at `t = duration_s`.
    fn fit_pair(&self, start: f64, end: f64, duration_s: f64) -> Poly {
        let delta = end - start;

        // Rescale from normalised time s = t / duration to local time
        let mut coeffs: Vec<f64> = self
            .unit_ramp
            .iter()
            .enumerate()
            .map(|(c, a)| delta * a / duration_s.powi((self.order - c) as i32))
            .collect();
        coeffs.push(start);

        Poly::new(coeffs)
    }

    /// Fit all segments together as one continuous spline.
    fn fit_min_jerk(
        &self,
        waypoints: &[Waypoint],
        breakpoints: &Breakpoints
    ) -> Result<Vec<Segment>, TrajError> {
        let k = self.order;
        let n_coeffs = k + 1;
        let durations = breakpoints.durations_s();
        let m = durations.len();
        let n = n_coeffs * m;

        // Unknowns are the coefficients of each segment, lowest power first
        let var = |seg: usize, power: usize| seg * n_coeffs + power;

        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut b = DMatrix::<f64>::zeros(n, NUM_AXES);
        let mut row = 0;

        // Interpolation at both ends of every segment
        for (i, d) in durations.iter().enumerate() {
            a[(row, var(i, 0))] = 1.0;
            for ax in 0..NUM_AXES {
                b[(row, ax)] = waypoints[i][ax];
            }
            row += 1;

            for p in 0..n_coeffs {
                a[(row, var(i, p))] = d.powi(p as i32);
            }
            for ax in 0..NUM_AXES {
                b[(row, ax)] = waypoints[i + 1][ax];
            }
            row += 1;
        }

        // Continuity of derivatives 1..K at interior breakpoints
        for i in 0..(m - 1) {
            for r in 1..k {
                for p in r..n_coeffs {
                    a[(row, var(i, p))] = deriv_factor(p, r, durations[i]);
                }
                a[(row, var(i + 1, r))] = -deriv_factor(r, r, 0.0);
                row += 1;
            }
        }

        // Zero boundary derivatives, the extra one going to the start for even orders
        let num_start = k / 2;
        let num_end = (k - 1) / 2;
        for r in 1..=num_start {
            a[(row, var(0, r))] = deriv_factor(r, r, 0.0);
            row += 1;
        }
        for r in 1..=num_end {
            for p in r..n_coeffs {
                a[(row, var(m - 1, p))] = deriv_factor(p, r, durations[m - 1]);
            }
            row += 1;
        }

        debug_assert_eq!(row, n);

        let x = a
            .lu()
            .solve(&b)
            .ok_or(TrajError::FitFailed("spline system is singular"))?;

        Ok(durations
            .iter()
            .enumerate()
            .map(|(i, duration_s)| {
                let axis_poly = |ax: usize| {
                    Poly::new((0..n_coeffs).rev().map(|p| x[(var(i, p), ax)]).collect())
                };
                Segment {
                    axes: [axis_poly(0), axis_poly(1), axis_poly(2), axis_poly(3)],
                    duration_s: *duration_s
                }
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The factor multiplying the coefficient of `t^power` in the `r`th derivative, evaluated at `t`.
fn deriv_factor(power: usize, r: usize, t: f64) -> f64 {
    let ff = ((power + 1 - r)..=power).fold(1.0, |acc, k| acc * k as f64);
    ff * t.powi((power - r) as i32)
}
