//! # Equipment Interface
//!
//! This module defines the reference command sent to the vehicle's actuation layer once per
//! control tick, and the trait any actuation layer must implement to receive it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Full kinematic reference for a single control tick.
///
/// Serialises flat so that it can be written as one CSV row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct RefCmd {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,

    pub vx_ms: f64,
    pub vy_ms: f64,
    pub vz_ms: f64,

    pub ax_mss: f64,
    pub ay_mss: f64,
    pub az_mss: f64,

    pub jx_msss: f64,
    pub jy_msss: f64,
    pub jz_msss: f64,

    pub yaw_rad: f64,
    pub yaw_rate_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by an actuation layer when it cannot accept a command.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("The actuation layer is not connected")]
    NotConnected,

    #[error("The actuation layer rejected the command: {0}")]
    Rejected(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The actuation boundary.
///
/// Implementors forward commands to the vehicle. The replanning loop calls `send_cmd` once per
/// tick, and `hold_position` once when no further trajectory is available.
pub trait RefCmdSink {
    /// Publish a reference command for the current tick.
    fn send_cmd(&mut self, cmd: &RefCmd) -> Result<(), SinkError>;

    /// Move to and hold the given position and yaw.
    fn hold_position(&mut self, position_m: [f64; 3], yaw_rad: f64) -> Result<(), SinkError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl RefCmd {
    /// Build a command from a 14-tuple ordered position, velocity, acceleration, jerk (each
    /// x, y, z), yaw, yaw rate.
    pub fn from_array(v: [f64; 14]) -> Self {
        Self {
            x_m: v[0],
            y_m: v[1],
            z_m: v[2],
            vx_ms: v[3],
            vy_ms: v[4],
            vz_ms: v[5],
            ax_mss: v[6],
            ay_mss: v[7],
            az_mss: v[8],
            jx_msss: v[9],
            jy_msss: v[10],
            jz_msss: v[11],
            yaw_rad: v[12],
            yaw_rate_rads: v[13],
        }
    }

    /// Flatten the command into its 14-tuple form.
    pub fn to_array(&self) -> [f64; 14] {
        [
            self.x_m,
            self.y_m,
            self.z_m,
            self.vx_ms,
            self.vy_ms,
            self.vz_ms,
            self.ax_mss,
            self.ay_mss,
            self.az_mss,
            self.jx_msss,
            self.jy_msss,
            self.jz_msss,
            self.yaw_rad,
            self.yaw_rate_rads,
        ]
    }

    /// The position part of the command.
    pub fn position_m(&self) -> [f64; 3] {
        [self.x_m, self.y_m, self.z_m]
    }

    /// A command which holds the given position and yaw with zero rates.
    pub fn hold(position_m: [f64; 3], yaw_rad: f64) -> Self {
        Self {
            x_m: position_m[0],
            y_m: position_m[1],
            z_m: position_m[2],
            yaw_rad,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_array_order() {
        let mut v = [0f64; 14];
        for (i, x) in v.iter_mut().enumerate() {
            *x = i as f64;
        }
        let cmd = RefCmd::from_array(v);

        assert_eq!(cmd.vx_ms, 3.0);
        assert_eq!(cmd.jz_msss, 11.0);
        assert_eq!(cmd.yaw_rate_rads, 13.0);
        assert_eq!(cmd.position_m(), [0.0, 1.0, 2.0]);
        assert_eq!(cmd.to_array(), v);
    }

    #[test]
    fn test_hold() {
        let cmd = RefCmd::hold([1.0, 2.0, 3.0], 0.5);
        assert_eq!(cmd.position_m(), [1.0, 2.0, 3.0]);
        assert_eq!(cmd.yaw_rad, 0.5);
        assert_eq!(cmd.vx_ms, 0.0);
        assert_eq!(cmd.yaw_rate_rads, 0.0);
    }
}
