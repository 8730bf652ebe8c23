//! # Trajectory engine
//!
//! The trajectory engine turns a window of waypoints into a sampled kinematic reference. Each
//! axis (x, y, z, yaw) is described by a piecewise polynomial: one polynomial per pair of
//! neighbouring waypoints, valid over the local time interval `[0, segment_duration)`. The
//! boundaries between segments are given by a breakpoint vector which is shared by all axes.
//!
//! Processing a window involves:
//!  1. Fitting the segments (`fitter`).
//!  1. Differentiating them up to jerk (`deriv`).
//!  1. Resampling each derivative onto a fixed-rate grid (`sampler`).
//!  1. Packing the channels into an aligned reference (`assembler`).
//!
//! Polynomial coefficients are always stored highest power first.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod assembler;
pub mod deriv;
pub mod fitter;
pub mod sampler;
pub mod segment;
pub mod waypoint;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use assembler::*;
pub use deriv::*;
pub use fitter::*;
pub use sampler::*;
pub use segment::*;
pub use waypoint::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of axes in a waypoint (x, y, z, yaw).
pub const NUM_AXES: usize = 4;

/// Number of positional axes (x, y, z).
pub const NUM_POS_AXES: usize = 3;

/// Highest derivative order produced for the positional axes (jerk).
pub const MAX_DERIV_ORDER: usize = 3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur in the trajectory engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajError {
    /// The window handed to the engine is malformed. This indicates a configuration defect and
    /// shall not be retried.
    #[error("Invalid window: {0}")]
    InvalidWindow(WindowDefect),

    /// A sample was requested outside of the interval the trajectory is defined over. This is an
    /// internal invariant violation.
    #[error("Sample time {time_s} s is outside of the interval [{start_s}, {end_s}] s")]
    OutOfRange {
        time_s: f64,
        start_s: f64,
        end_s: f64
    },

    /// The linear algebra behind a fit could not be solved.
    #[error("Polynomial fit failed: {0}")]
    FitFailed(&'static str)
}

/// The ways in which a window can be malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowDefect {
    #[error("at least 2 waypoints are required, found {0}")]
    TooFewWaypoints(usize),

    #[error("breakpoint {0} is not strictly greater than the one before it")]
    NonIncreasingBreakpoints(usize),

    #[error("expected {expected} breakpoints, found {found}")]
    BreakpointCountMismatch {
        expected: usize,
        found: usize
    },

    #[error("expected {expected} segments, found {found}")]
    SegmentCountMismatch {
        expected: usize,
        found: usize
    },

    #[error("polynomial order must be at least 1, found {0}")]
    OrderTooLow(usize),

    #[error("at least {min} fit samples are needed for order {order}, found {found}")]
    TooFewFitSamples {
        order: usize,
        min: usize,
        found: usize
    },

    #[error("durations must be positive and finite, found {0}")]
    InvalidDuration(f64)
}

impl From<WindowDefect> for TrajError {
    fn from(d: WindowDefect) -> Self {
        TrajError::InvalidWindow(d)
    }
}
