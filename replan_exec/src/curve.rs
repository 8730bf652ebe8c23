//! # Reference curve
//!
//! Generates the full waypoint list from a Lissajous curve. Each axis is a pure function of the
//! curve parameter `s` (seconds along the curve) and its amplitude, number of periods and the
//! overall period:
//!
//! ```text
//! x   = A_x   (1 - cos(2 pi n_x   s / P))
//! y   = A_y   sin(2 pi n_y   s / P)
//! z   = A_z   sin(2 pi n_z   s / P)
//! yaw = A_yaw sin(2 pi n_yaw s / P)
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::f64::consts::PI;

use crate::traj::Waypoint;
use util::maths::linspace;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the Lissajous reference curve.
#[derive(Debug, Clone, Deserialize)]
pub struct LissajousParams {
    /// Amplitudes of the x, y, z and yaw axes
    ///
    /// Units: meters, radians for yaw
    pub x_amp_m: f64,
    pub y_amp_m: f64,
    pub z_amp_m: f64,
    pub yaw_amp_rad: f64,

    /// Number of periods completed by each axis over the whole curve
    pub x_num_periods: f64,
    pub y_num_periods: f64,
    pub z_num_periods: f64,
    pub yaw_num_periods: f64,

    /// Total period of the curve
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Rate at which the curve is densely sampled before decimation
    ///
    /// Units: Hz
    pub sample_rate_hz: f64,

    /// Every `decimation`th dense sample becomes a waypoint
    pub decimation: usize,

    /// The z axis is shifted so that its lowest waypoint sits at this height
    ///
    /// Units: meters
    pub z_floor_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for LissajousParams {
    fn default() -> Self {
        Self {
            x_amp_m: 2.0,
            y_amp_m: 2.0,
            z_amp_m: 0.8,
            yaw_amp_rad: 0.2,
            x_num_periods: 2.0,
            y_num_periods: 2.0,
            z_num_periods: 2.0,
            yaw_num_periods: 2.0,
            period_s: 6.0,
            sample_rate_hz: 100.0,
            decimation: 30,
            z_floor_m: 1.0,
        }
    }
}

impl LissajousParams {
    /// Evaluate the curve at `s`, without the z shift.
    pub fn eval(&self, s: f64) -> Waypoint {
        Waypoint::new(
            cosine_axis(self.x_amp_m, self.x_num_periods, self.period_s, s),
            sine_axis(self.y_amp_m, self.y_num_periods, self.period_s, s),
            sine_axis(self.z_amp_m, self.z_num_periods, self.period_s, s),
            sine_axis(self.yaw_amp_rad, self.yaw_num_periods, self.period_s, s),
        )
    }

    /// Sample the curve densely over `[0, period_s]` inclusive.
    pub fn dense(&self) -> Vec<Waypoint> {
        let num = (self.period_s * self.sample_rate_hz).round().max(0.0) as usize + 1;
        linspace(0.0, self.period_s, num)
            .into_iter()
            .map(|s| self.eval(s))
            .collect()
    }

    /// Generate the waypoint list: the dense curve decimated, with z shifted onto the floor.
    pub fn generate_waypoints(&self) -> Vec<Waypoint> {
        let mut waypoints: Vec<Waypoint> = self
            .dense()
            .into_iter()
            .step_by(self.decimation.max(1))
            .collect();

        let z_min = waypoints
            .iter()
            .map(|w| w[2])
            .fold(f64::INFINITY, f64::min);

        if z_min.is_finite() {
            for w in waypoints.iter_mut() {
                w[2] = w[2] - z_min + self.z_floor_m;
            }
        }

        waypoints
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// `amp * (1 - cos(2 pi num_periods s / period))`, starting at zero.
pub fn cosine_axis(amp: f64, num_periods: f64, period_s: f64, s: f64) -> f64 {
    amp * (1.0 - (2.0 * PI * num_periods * s / period_s).cos())
}

/// `amp * sin(2 pi num_periods s / period)`
pub fn sine_axis(amp: f64, num_periods: f64, period_s: f64, s: f64) -> f64 {
    amp * (2.0 * PI * num_periods * s / period_s).sin()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_waypoint_count() {
        let p = LissajousParams::default();

        // 601 dense samples, every 30th kept
        assert_eq!(p.dense().len(), 601);
        assert_eq!(p.generate_waypoints().len(), 21);
    }

    #[test]
    fn test_z_floor() {
        let p = LissajousParams::default();
        let wps = p.generate_waypoints();

        let z_min = wps.iter().map(|w| w[2]).fold(f64::INFINITY, f64::min);
        assert!((z_min - 1.0).abs() < 1e-12);

        // Other axes untouched, x starts at zero and y at zero
        assert!(wps[0][0].abs() < 1e-12);
        assert!(wps[0][1].abs() < 1e-12);
    }

    #[test]
    fn test_axes() {
        // Quarter period of a single-period curve
        assert!((sine_axis(2.0, 1.0, 4.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((cosine_axis(2.0, 1.0, 4.0, 2.0) - 4.0).abs() < 1e-12);
        assert!(cosine_axis(2.0, 1.0, 4.0, 0.0).abs() < 1e-12);
    }
}
