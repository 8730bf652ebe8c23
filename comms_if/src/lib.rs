//! # Communications interface crate.
//!
//! Provides the interfaces shared between the trajectory generator and the
//! vehicle it commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command definitions for the actuation equipment
pub mod eqpt;
