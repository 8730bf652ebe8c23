//! # Replanning library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access the trajectory
//! engine and the replanning controller used by `replan_exec`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Reference curve - synthesises the full waypoint list the vehicle is asked to follow
pub mod curve;

/// Refinement boundary - optional external corrector applied to each fitted window
pub mod refine;

/// Replanning control module - slides a window along the waypoints and publishes references
pub mod replan;

/// Trajectory engine - piecewise polynomial fitting, differentiation and sampling
pub mod traj;
