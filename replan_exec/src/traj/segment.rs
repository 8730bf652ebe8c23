//! Polynomials, segments and breakpoints

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{deriv, Axis, TrajError, Waypoint, WindowDefect, NUM_AXES};
use util::maths::{linspace, poly_val};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single-variable polynomial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poly {
    /// Coefficients, highest power first. An order K polynomial has K + 1 coefficients.
    pub coeffs: Vec<f64>
}

/// One piece of a piecewise trajectory: a polynomial per axis, valid over local time
/// `[0, duration_s)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Polynomials for the x, y, z and yaw axes, in that order
    pub axes: [Poly; NUM_AXES],

    /// Duration of the segment
    ///
    /// Units: seconds
    pub duration_s: f64
}

/// Strictly increasing times marking the boundaries of the segments of a piecewise trajectory.
///
/// There is always one more breakpoint than there are segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakpoints(Vec<f64>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Poly {
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Self { coeffs: vec![0.0] }
    }

    /// Order (degree) of the polynomial as stored. Leading zero coefficients are counted.
    pub fn order(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate the polynomial at `t`.
    pub fn eval(&self, t: f64) -> f64 {
        poly_val(t, &self.coeffs)
    }

    /// The `n`th derivative of this polynomial.
    pub fn derivative(&self, n: usize) -> Self {
        Self::new(deriv::poly_derivative(&self.coeffs, n))
    }
}

impl Segment {
    /// Polynomial for the given axis.
    pub fn axis(&self, axis: Axis) -> &Poly {
        &self.axes[axis.index()]
    }

    /// Evaluate all axes at local time `t`.
    pub fn eval(&self, t: f64) -> Waypoint {
        Waypoint::new(
            self.axes[0].eval(t),
            self.axes[1].eval(t),
            self.axes[2].eval(t),
            self.axes[3].eval(t)
        )
    }

    /// The `n`th derivative of every axis polynomial.
    pub fn derivative(&self, n: usize) -> Self {
        Self {
            axes: [
                self.axes[0].derivative(n),
                self.axes[1].derivative(n),
                self.axes[2].derivative(n),
                self.axes[3].derivative(n)
            ],
            duration_s: self.duration_s
        }
    }
}

impl Breakpoints {
    /// Create breakpoints from explicit times, checking they are strictly increasing and finite.
    pub fn new(times_s: Vec<f64>) -> Result<Self, TrajError> {
        if times_s.len() < 2 {
            return Err(WindowDefect::TooFewWaypoints(times_s.len()).into());
        }

        for (i, t) in times_s.iter().enumerate() {
            if !t.is_finite() {
                return Err(WindowDefect::InvalidDuration(*t).into());
            }
            if i > 0 && *t <= times_s[i - 1] {
                return Err(WindowDefect::NonIncreasingBreakpoints(i).into());
            }
        }

        Ok(Self(times_s))
    }

    /// Split `total_duration_s` evenly between the segments joining `num_waypoints` waypoints.
    pub fn uniform(total_duration_s: f64, num_waypoints: usize) -> Result<Self, TrajError> {
        if !(total_duration_s.is_finite() && total_duration_s > 0.0) {
            return Err(WindowDefect::InvalidDuration(total_duration_s).into());
        }

        Self::new(linspace(0.0, total_duration_s, num_waypoints))
    }

    /// Build breakpoints starting at zero from per-segment durations.
    pub fn from_durations(durations_s: &[f64]) -> Result<Self, TrajError> {
        let mut times_s = Vec::with_capacity(durations_s.len() + 1);
        times_s.push(0.0);

        for d in durations_s {
            if !(d.is_finite() && *d > 0.0) {
                return Err(WindowDefect::InvalidDuration(*d).into());
            }
            times_s.push(times_s[times_s.len() - 1] + d);
        }

        Self::new(times_s)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn num_segments(&self) -> usize {
        self.0.len() - 1
    }

    pub fn start_s(&self) -> f64 {
        self.0[0]
    }

    pub fn end_s(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Duration of the `i`th segment, or `None` if there is no such segment.
    pub fn segment_duration_s(&self, i: usize) -> Option<f64> {
        Some(self.0.get(i + 1)? - self.0.get(i)?)
    }

    /// Durations of every segment in order.
    pub fn durations_s(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| w[1] - w[0]).collect()
    }
}
