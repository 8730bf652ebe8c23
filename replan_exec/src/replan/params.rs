//! Replanning control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::time::Duration;

// Internal
use super::ReplanError;
use crate::traj::{Breakpoints, FitPolicy, TrajError};
use util::time::rate_to_period;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for replanning control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Order of the fitted polynomials. At least 3 is needed for a meaningful jerk reference.
    pub poly_order: usize,

    /// Number of waypoints in each window.
    pub window_size: usize,

    /// Number of waypoints the window advances by after each replanning cycle. Must be between 1
    /// and `window_size`; the difference is the overlap between successive windows.
    pub stride: usize,

    /// Duration of the trajectory fitted over one window.
    ///
    /// Units: seconds
    pub window_duration_s: f64,

    /// Rate at which reference commands are published.
    ///
    /// Units: Hz
    pub output_rate_hz: f64,

    /// Number of points in the local time grid of the least-squares segment fit.
    pub fit_samples: usize,

    /// Fitting policy
    #[serde(default)]
    pub fit_policy: FitPolicy,

    /// Time allowed for one replanning cycle. Defaults to one control period.
    ///
    /// Units: seconds
    #[serde(default)]
    pub fit_deadline_s: Option<f64>,

    /// Configuration id passed to the refinement boundary.
    #[serde(default)]
    pub config_id: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            poly_order: 5,
            window_size: 4,
            stride: 3,
            window_duration_s: 3.0,
            output_rate_hz: 100.0,
            fit_samples: 100,
            fit_policy: FitPolicy::TwoPoint,
            fit_deadline_s: None,
            config_id: 1,
        }
    }
}

impl Params {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), ReplanError> {
        let invalid = |s: String| Err(ReplanError::InvalidParams(s));

        if self.window_size < 2 {
            return invalid(format!(
                "window_size must be at least 2, found {}",
                self.window_size
            ));
        }
        if self.stride == 0 || self.stride > self.window_size {
            return invalid(format!(
                "stride must be between 1 and window_size ({}), found {}",
                self.window_size, self.stride
            ));
        }
        if self.poly_order < 1 {
            return invalid(format!(
                "poly_order must be at least 1, found {}",
                self.poly_order
            ));
        }
        if !(self.window_duration_s.is_finite() && self.window_duration_s > 0.0) {
            return invalid(format!(
                "window_duration_s must be positive, found {}",
                self.window_duration_s
            ));
        }
        if !(self.output_rate_hz.is_finite() && self.output_rate_hz > 0.0) {
            return invalid(format!(
                "output_rate_hz must be positive, found {}",
                self.output_rate_hz
            ));
        }
        if let Some(d) = self.fit_deadline_s {
            if !(d.is_finite() && d >= 0.0) {
                return invalid(format!("fit_deadline_s must not be negative, found {}", d));
            }
        }
        if self.sample_count() == 0 {
            return invalid(String::from(
                "window_duration_s * output_rate_hz must give at least one sample",
            ));
        }

        Ok(())
    }

    /// Number of samples published per window.
    pub fn sample_count(&self) -> usize {
        (self.window_duration_s * self.output_rate_hz).round() as usize
    }

    /// Number of waypoints shared by successive windows.
    pub fn overlap(&self) -> usize {
        self.window_size.saturating_sub(self.stride)
    }

    /// Period of one control tick. Zero if the output rate is invalid.
    pub fn cycle_period(&self) -> Duration {
        rate_to_period(self.output_rate_hz).unwrap_or_default()
    }

    /// Time allowed for one replanning cycle.
    pub fn fit_deadline(&self) -> Duration {
        match self.fit_deadline_s {
            Some(d) => Duration::from_secs_f64(d),
            None => self.cycle_period(),
        }
    }

    /// Breakpoints for a window of `num_waypoints`, the window duration split evenly.
    pub fn breakpoints(&self, num_waypoints: usize) -> Result<Breakpoints, TrajError> {
        Breakpoints::uniform(self.window_duration_s, num_waypoints)
    }
}
