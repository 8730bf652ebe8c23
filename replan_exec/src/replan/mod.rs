//! # Replanning control module
//!
//! Replanning control is responsible for turning the full waypoint list into a stream of
//! reference commands, one per control tick, while only ever fitting a bounded window of
//! waypoints at a time.
//!
//! The controller is a state machine:
//!
//! ```text
//! Idle -> Windowing -> Fitting -> Publishing -> (Windowing | Terminal)
//! ```
//!
//! In `Windowing` the next `window_size` waypoints starting at the current waypoint index are
//! selected. The last `window_size - stride` waypoints of the previous window are carried over
//! as the head of the new one, anchoring the new fit to the old. If not enough waypoints remain
//! the controller moves to `Terminal`. `Fitting` fits and samples the window and must complete
//! within one control period. `Publishing` hands out one sample per call to `proc`; after the
//! last sample the waypoint index advances by `stride`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;

use crate::{refine::RefineError, traj::TrajError};
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during replanning.
#[derive(Debug, thiserror::Error)]
pub enum ReplanError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A sequence is already loaded. This error occurs when attempting to start a new sequence
    /// before the current one has finished.
    #[error("Attempted to load a waypoint sequence while one is already loaded")]
    SequenceAlreadyLoaded,

    /// The controller has not been initialised with parameters.
    #[error("The controller has not been initialised")]
    NotInitialised,

    /// The controller reached a fitting or publishing mode without a window. This is an
    /// internal error.
    #[error("No window has been selected")]
    NoWindow,

    #[error("Trajectory error: {0}")]
    Traj(#[from] TrajError),

    #[error("Refinement error: {0}")]
    Refine(#[from] RefineError),
}
