//! # Trajectory assembler
//!
//! Expands the fitted segments of a window into the full kinematic reference: position,
//! velocity, acceleration and jerk for x, y, z, and yaw and yaw rate. All channels share the same
//! sample grid so sample `i` of every channel refers to the same instant.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use ndarray::{Array1, Array2};
use serde::Serialize;

// Internal
use super::{
    deriv, sampler, Axis, Breakpoints, Poly, Segment, SegmentFitter, TrajError, WaypointWindow,
    WindowDefect, NUM_POS_AXES
};
use comms_if::eqpt::RefCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sampled kinematic reference.
///
/// The positional channels are `3 x T` arrays with rows x, y, z.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefTrajectory {
    /// Units: meters
    pub pos_m: Array2<f64>,

    /// Units: meters/second
    pub vel_ms: Array2<f64>,

    /// Units: meters/second^2
    pub acc_mss: Array2<f64>,

    /// Units: meters/second^3
    pub jerk_msss: Array2<f64>,

    /// Units: radians
    pub yaw_rad: Array1<f64>,

    /// Units: radians/second
    pub yaw_rate_rads: Array1<f64>
}

/// Fits and samples windows with a fixed fitter and sample count.
#[derive(Debug, Clone)]
pub struct TrajAssembler {
    fitter: SegmentFitter,
    sample_count: usize
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RefTrajectory {
    /// Number of samples in each channel.
    pub fn len(&self) -> usize {
        self.yaw_rad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yaw_rad.is_empty()
    }

    /// The reference command for sample `i`, or `None` if out of bounds.
    pub fn cmd(&self, i: usize) -> Option<RefCmd> {
        if i >= self.len() {
            return None;
        }

        Some(RefCmd {
            x_m: self.pos_m[[0, i]],
            y_m: self.pos_m[[1, i]],
            z_m: self.pos_m[[2, i]],
            vx_ms: self.vel_ms[[0, i]],
            vy_ms: self.vel_ms[[1, i]],
            vz_ms: self.vel_ms[[2, i]],
            ax_mss: self.acc_mss[[0, i]],
            ay_mss: self.acc_mss[[1, i]],
            az_mss: self.acc_mss[[2, i]],
            jx_msss: self.jerk_msss[[0, i]],
            jy_msss: self.jerk_msss[[1, i]],
            jz_msss: self.jerk_msss[[2, i]],
            yaw_rad: self.yaw_rad[i],
            yaw_rate_rads: self.yaw_rate_rads[i]
        })
    }

    /// Iterate over the reference commands in sample order.
    pub fn cmds(&self) -> impl Iterator<Item = RefCmd> + '_ {
        (0..self.len()).filter_map(move |i| self.cmd(i))
    }

    /// The positional channel for the given derivative order (0 to 3).
    pub fn channel(&self, order: usize) -> Option<&Array2<f64>> {
        match order {
            0 => Some(&self.pos_m),
            1 => Some(&self.vel_ms),
            2 => Some(&self.acc_mss),
            3 => Some(&self.jerk_msss),
            _ => None
        }
    }
}

impl TrajAssembler {
    pub fn new(fitter: SegmentFitter, sample_count: usize) -> Self {
        Self {
            fitter,
            sample_count
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn fitter(&self) -> &SegmentFitter {
        &self.fitter
    }

    /// Fit the segments of a window.
    pub fn fit(
        &self,
        window: &WaypointWindow,
        breakpoints: &Breakpoints
    ) -> Result<Vec<Segment>, TrajError> {
        self.fitter.fit(window.waypoints(), breakpoints)
    }

    /// Fit and sample a window in one go, returning the segments alongside the reference.
    pub fn assemble(
        &self,
        window: &WaypointWindow,
        breakpoints: &Breakpoints
    ) -> Result<(Vec<Segment>, RefTrajectory), TrajError> {
        let segments = self.fit(window, breakpoints)?;
        let traj = sample_segments(&segments, breakpoints, self.sample_count)?;

        Ok((segments, traj))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Sample already fitted segments into a reference trajectory.
///
/// The jerk of the final sample is set to zero on all positional axes, as the independently
/// fitted segments carry no jerk continuity into whatever follows the window.
pub fn sample_segments(
    segments: &[Segment],
    breakpoints: &Breakpoints,
    sample_count: usize
) -> Result<RefTrajectory, TrajError> {
    if segments.len() != breakpoints.num_segments() {
        return Err(WindowDefect::SegmentCountMismatch {
            expected: breakpoints.num_segments(),
            found: segments.len()
        }
        .into());
    }

    let zeros = || Array2::<f64>::zeros((NUM_POS_AXES, sample_count));
    let (mut pos_m, mut vel_ms, mut acc_mss, mut jerk_msss) = (zeros(), zeros(), zeros(), zeros());

    for axis in Axis::POSITION.iter() {
        let polys = axis_polys(segments, *axis);
        let mut channels = [&mut pos_m, &mut vel_ms, &mut acc_mss, &mut jerk_msss];

        for (order, channel) in channels.iter_mut().enumerate() {
            let values = sampler::sample(&deriv::derivative(&polys, order), breakpoints, sample_count)?;
            channel
                .row_mut(axis.index())
                .assign(&Array1::from(values));
        }
    }

    let yaw_polys = axis_polys(segments, Axis::Yaw);
    let yaw_rad = Array1::from(sampler::sample(&yaw_polys, breakpoints, sample_count)?);
    let yaw_rate_rads = Array1::from(sampler::sample(
        &deriv::derivative(&yaw_polys, 1),
        breakpoints,
        sample_count
    )?);

    if sample_count > 0 {
        jerk_msss.column_mut(sample_count - 1).fill(0.0);
    }

    Ok(RefTrajectory {
        pos_m,
        vel_ms,
        acc_mss,
        jerk_msss,
        yaw_rad,
        yaw_rate_rads
    })
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Collect the polynomials of one axis across all segments.
fn axis_polys(segments: &[Segment], axis: Axis) -> Vec<Poly> {
    segments.iter().map(|s| s.axis(axis).clone()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj::MAX_DERIV_ORDER;
    use crate::traj::{FitPolicy, Waypoint};

    fn window() -> WaypointWindow {
        let wps = vec![
            Waypoint::new(0.0, 0.0, 1.0, 0.0),
            Waypoint::new(0.5, 1.0, 1.4, 0.1),
            Waypoint::new(1.5, 1.5, 1.8, 0.2),
            Waypoint::new(3.0, 1.0, 1.0, 0.1)
        ];
        WaypointWindow::from_slice(&wps, 0, 4).unwrap()
    }

    #[test]
    fn test_assemble_shapes() {
        let fitter = SegmentFitter::new(5, 100, FitPolicy::TwoPoint).unwrap();
        let asm = TrajAssembler::new(fitter, 300);
        let bp = Breakpoints::uniform(3.0, 4).unwrap();

        let (segs, traj) = asm.assemble(&window(), &bp).unwrap();

        assert_eq!(segs.len(), 3);
        assert_eq!(traj.len(), 300);
        for order in 0..=MAX_DERIV_ORDER {
            assert_eq!(traj.channel(order).unwrap().dim(), (3, 300));
        }
        assert_eq!(traj.yaw_rad.len(), 300);
        assert_eq!(traj.yaw_rate_rads.len(), 300);
        assert!(traj.channel(4).is_none());

        // First sample is the first waypoint
        let first = traj.cmd(0).unwrap();
        assert_eq!(first.position_m(), [0.0, 0.0, 1.0]);
        assert_eq!(first.yaw_rad, 0.0);
        assert!(traj.cmd(300).is_none());
        assert_eq!(traj.cmds().count(), 300);
    }

    #[test]
    fn test_final_jerk_zeroed() {
        // The min jerk fit has non-zero jerk at the end of the window
        let fitter = SegmentFitter::new(5, 100, FitPolicy::MinJerk).unwrap();
        let asm = TrajAssembler::new(fitter, 50);
        let bp = Breakpoints::uniform(3.0, 4).unwrap();

        let (segs, traj) = asm.assemble(&window(), &bp).unwrap();

        let last = &segs[2];
        let raw_jerk = last.derivative(3).eval(last.duration_s);
        assert!(raw_jerk[0].abs() > 1e-6);

        let cmd = traj.cmd(49).unwrap();
        assert_eq!([cmd.jx_msss, cmd.jy_msss, cmd.jz_msss], [0.0, 0.0, 0.0]);

        // Earlier samples are left alone
        let mid = traj.cmd(25).unwrap();
        assert!(mid.jx_msss.abs() > 0.0);
    }

    #[test]
    fn test_channels_aligned() {
        let fitter = SegmentFitter::new(5, 100, FitPolicy::MinJerk).unwrap();
        let asm = TrajAssembler::new(fitter, 31);
        let bp = Breakpoints::uniform(3.0, 4).unwrap();

        let (segs, traj) = asm.assemble(&window(), &bp).unwrap();

        // Sample 10 is t = 1.0, the start of the second segment
        let cmd = traj.cmd(10).unwrap();
        let pos = segs[1].eval(0.0);
        let vel = segs[1].derivative(1).eval(0.0);
        assert_eq!(cmd.x_m, pos[0]);
        assert_eq!(cmd.vy_ms, vel[1]);
        assert_eq!(cmd.yaw_rad, pos[3]);
        assert_eq!(cmd.yaw_rate_rads, vel[3]);
    }

    #[test]
    fn test_segment_count_mismatch() {
        let fitter = SegmentFitter::new(3, 10, FitPolicy::TwoPoint).unwrap();
        let bp = Breakpoints::uniform(3.0, 4).unwrap();
        let segs = fitter.fit(window().waypoints(), &bp).unwrap();

        let short_bp = Breakpoints::uniform(3.0, 3).unwrap();
        assert!(matches!(
            sample_segments(&segs, &short_bp, 10),
            Err(TrajError::InvalidWindow(WindowDefect::SegmentCountMismatch { .. }))
        ));
    }
}
