//! Replanning control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;
use std::time::Instant;

// Internal
use super::*;
use crate::{
    refine::{refine_checked, Refiner},
    traj::{sample_segments, RefTrajectory, Segment, SegmentFitter, TrajAssembler, Waypoint,
        WaypointWindow},
};
use comms_if::eqpt::RefCmd;
use util::{maths::norm, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Replanning controller.
///
/// Owns the full waypoint sequence and the [`ReplanState`], and produces one reference command
/// per call to `proc`.
#[derive(Default)]
pub struct ReplanCtrl {
    params: Params,

    /// Executing mode
    mode: ReplanMode,

    output_cmd: Option<RefCmd>,
    report: StatusReport,

    /// Full waypoint sequence of the flight
    waypoints: Vec<Waypoint>,

    state: ReplanState,

    /// The window whose trajectory is being, or was last, published
    window: Option<WaypointWindow>,

    /// The window selected for the next fit
    next_window: Option<WaypointWindow>,

    assembler: Option<TrajAssembler>,

    /// Sampled trajectory of the current window
    traj: Option<RefTrajectory>,

    /// Index of the next sample of `traj` to publish
    sample_index: usize,

    /// The last command handed out, re-emitted when a deadline is missed
    last_cmd: Option<RefCmd>,

    refiner: Option<Box<dyn Refiner>>,

    num_windows: usize,
}

/// State carried between replanning cycles.
#[derive(Debug, Clone, Default)]
pub struct ReplanState {
    /// Index into the full sequence of the first waypoint of the current window. Advanced by the
    /// stride after each window has been published.
    pub current_waypoint_index: usize,

    /// Configuration id passed to the refiner.
    pub rho: u32,

    /// Segments of the most recent successful fit.
    pub segments: Vec<Segment>,
}

/// The status report containing various error flags and monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    pub current_waypoint_index: usize,

    /// Start index of the window being published
    pub window_start: Option<usize>,

    /// Time taken by the replanning cycle run on this tick, if any.
    ///
    /// Units: seconds
    pub fit_duration_s: Option<f64>,

    /// If true the replanning cycle did not finish within its deadline and the previous command
    /// was held for this tick
    pub deadline_missed: bool,

    /// Distance between the last published position and the first sample of a newly fitted
    /// window.
    ///
    /// Units: meters
    pub boundary_pos_gap_m: Option<f64>,

    /// If true the last sample of a window was published on this tick
    pub window_complete: bool,

    /// If true there are no more full windows to publish
    pub terminal: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of ReplanCtrl. Each mode is handled by a
/// `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReplanMode {
    Idle,
    Windowing,
    Fitting,
    Publishing,
    Terminal,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ReplanMode {
    fn default() -> Self {
        ReplanMode::Idle
    }
}

impl State for ReplanCtrl {
    type InitData = &'static str;
    type InitError = ReplanError;

    type InputData = ();
    type OutputData = Option<RefCmd>;
    type StatusReport = StatusReport;
    type ProcError = ReplanError;

    /// Initialise the ReplanCtrl module.
    ///
    /// Expected init data is a path to the parameter file. Any refiner already attached is kept.
    fn init(&mut self, params_path: Self::InitData, _session: &Session) -> Result<(), ReplanError> {
        let params: Params = params::load(params_path).map_err(ReplanError::ParamLoadError)?;

        let refiner = self.refiner.take();
        *self = Self::new(params)?;
        self.refiner = refiner;

        Ok(())
    }

    /// Process replanning control.
    ///
    /// Processing runs the mode functions until one of them has decided the output of this tick,
    /// so that a window transition does not leave a tick without a command.
    fn proc(&mut self, _input: &()) -> Result<(Option<RefCmd>, StatusReport), ReplanError> {
        // Setup cycle data
        self.output_cmd = None;
        self.report = StatusReport::default();

        // Mode execution. Each of the mode functions sets the mode to switch to and returns true
        // once the tick is complete.
        loop {
            let tick_complete = match self.mode {
                ReplanMode::Idle => self.mode_idle(),
                ReplanMode::Windowing => self.mode_windowing(),
                ReplanMode::Fitting => self.mode_fitting(),
                ReplanMode::Publishing => self.mode_publishing(),
                ReplanMode::Terminal => self.mode_terminal(),
            }?;

            if tick_complete {
                break;
            }
        }

        self.report.current_waypoint_index = self.state.current_waypoint_index;
        if self.report.window_start.is_none() {
            self.report.window_start = self.window.as_ref().map(|w| w.start_index());
        }

        Ok((self.output_cmd, self.report))
    }
}

impl ReplanCtrl {
    /// Create a new controller from validated parameters.
    pub fn new(params: Params) -> Result<Self, ReplanError> {
        params.validate()?;

        let fitter = SegmentFitter::new(params.poly_order, params.fit_samples, params.fit_policy)?;
        let assembler = TrajAssembler::new(fitter, params.sample_count());

        Ok(Self {
            state: ReplanState {
                rho: params.config_id,
                ..Default::default()
            },
            assembler: Some(assembler),
            params,
            ..Default::default()
        })
    }

    /// Attach a refiner which is run on every window's segments before they are sampled.
    pub fn with_refiner(mut self, refiner: Box<dyn Refiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    /// Begin executing a waypoint sequence.
    ///
    /// Execution begins on the next call to `proc`. Loading a new sequence while one is being
    /// executed results in an error; to stop a sequence call `abort`.
    pub fn begin_sequence(&mut self, waypoints: Vec<Waypoint>) -> Result<(), ReplanError> {
        match self.mode {
            ReplanMode::Idle | ReplanMode::Terminal => (),
            _ => return Err(ReplanError::SequenceAlreadyLoaded),
        }

        if self.assembler.is_none() {
            return Err(ReplanError::NotInitialised);
        }

        info!(
            "Beginning sequence of {} waypoints ({} per window, stride {})",
            waypoints.len(),
            self.params.window_size,
            self.params.stride
        );

        self.waypoints = waypoints;
        self.reset();
        self.mode = ReplanMode::Windowing;

        Ok(())
    }

    /// Abort the current sequence.
    ///
    /// The controller returns to `Idle` and produces no further commands. The caller is
    /// responsible for holding the vehicle at `last_cmd`.
    pub fn abort(&mut self) {
        if self.mode != ReplanMode::Idle {
            warn!(
                "Sequence aborted at waypoint {}",
                self.state.current_waypoint_index
            );
        }

        self.mode = ReplanMode::Idle;
        self.next_window = None;
        self.traj = None;
    }

    /// True once no more full windows remain.
    pub fn is_finished(&self) -> bool {
        self.mode == ReplanMode::Terminal
    }

    pub fn mode(&self) -> ReplanMode {
        self.mode
    }

    pub fn state(&self) -> &ReplanState {
        &self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The last command handed out by `proc`.
    pub fn last_cmd(&self) -> Option<RefCmd> {
        self.last_cmd
    }

    /// Number of windows fitted since the sequence began.
    pub fn num_windows(&self) -> usize {
        self.num_windows
    }

    /// The window currently being published, if any.
    pub fn window(&self) -> Option<&WaypointWindow> {
        self.window.as_ref()
    }

    /// Number of waypoints past the end of the last fitted window.
    pub fn unconsumed_waypoints(&self) -> usize {
        let consumed = match self.window {
            Some(ref w) => w.end_index(),
            None => self.state.current_waypoint_index,
        };

        self.waypoints.len().saturating_sub(consumed)
    }

    fn reset(&mut self) {
        self.state = ReplanState {
            rho: self.params.config_id,
            ..Default::default()
        };
        self.window = None;
        self.next_window = None;
        self.traj = None;
        self.sample_index = 0;
        self.last_cmd = None;
        self.num_windows = 0;
    }

    /// Mode idle.
    ///
    /// No actions are taken in this mode. To leave it the user must call `begin_sequence`.
    fn mode_idle(&mut self) -> Result<bool, ReplanError> {
        Ok(true)
    }

    /// Mode windowing.
    ///
    /// Selects the next window. The first window is sliced straight from the sequence, every
    /// following one is built by advancing the previous window so that the overlapping waypoints
    /// are carried over.
    fn mode_windowing(&mut self) -> Result<bool, ReplanError> {
        let next = match self.window {
            Some(ref w) => w.advance(&self.waypoints, self.params.stride),
            None => WaypointWindow::from_slice(
                &self.waypoints,
                self.state.current_waypoint_index,
                self.params.window_size,
            ),
        };

        match next {
            Some(w) => {
                debug_assert_eq!(w.start_index(), self.state.current_waypoint_index);
                self.next_window = Some(w);
                self.mode = ReplanMode::Fitting;
            }
            None => {
                info!(
                    "Sequence complete after {} windows, {} waypoints unconsumed",
                    self.num_windows,
                    self.unconsumed_waypoints()
                );
                self.mode = ReplanMode::Terminal;
            }
        }

        Ok(false)
    }

    /// Mode fitting.
    ///
    /// Fits, refines and samples the selected window. Nothing in the controller's state is
    /// changed unless every step succeeds.
    fn mode_fitting(&mut self) -> Result<bool, ReplanError> {
        let window = self.next_window.as_ref().ok_or(ReplanError::NoWindow)?;
        let assembler = self.assembler.as_ref().ok_or(ReplanError::NotInitialised)?;

        let start = Instant::now();

        let breakpoints = self.params.breakpoints(window.len())?;
        let mut segments = assembler.fit(window, &breakpoints)?;
        if let Some(ref refiner) = self.refiner {
            segments = refine_checked(refiner.as_ref(), &segments, self.state.rho)?;
        }
        let traj = sample_segments(&segments, &breakpoints, assembler.sample_count())?;

        let elapsed = start.elapsed();

        // ---- COMMIT ----

        let gap_m = match (self.last_cmd, traj.cmd(0)) {
            (Some(last), Some(first)) => norm(&last.position_m(), &first.position_m()),
            _ => None,
        };

        info!(
            "Window [{}, {}) fitted in {:.3} ms",
            window.start_index(),
            window.end_index(),
            elapsed.as_secs_f64() * 1e3
        );

        self.report.window_start = Some(window.start_index());
        self.report.fit_duration_s = Some(elapsed.as_secs_f64());
        self.report.boundary_pos_gap_m = gap_m;

        self.window = self.next_window.take();
        self.state.segments = segments;
        self.traj = Some(traj);
        self.sample_index = 0;
        self.num_windows += 1;
        self.mode = ReplanMode::Publishing;

        if elapsed >= self.params.fit_deadline() {
            warn!(
                "Replanning took {:.3} ms, over the {:.3} ms deadline. Holding the last command.",
                elapsed.as_secs_f64() * 1e3,
                self.params.fit_deadline().as_secs_f64() * 1e3
            );
            self.report.deadline_missed = true;
            self.output_cmd = self.last_cmd;
            return Ok(true);
        }

        Ok(false)
    }

    /// Mode publishing.
    ///
    /// Hands out the next sample of the current trajectory. After the last sample the waypoint
    /// index advances by the stride and the next window is selected on the following tick.
    fn mode_publishing(&mut self) -> Result<bool, ReplanError> {
        let traj = self.traj.as_ref().ok_or(ReplanError::NoWindow)?;
        let cmd = traj.cmd(self.sample_index).ok_or(ReplanError::NoWindow)?;

        trace!("Sample {}/{}: {:?}", self.sample_index, traj.len(), cmd);

        self.output_cmd = Some(cmd);
        self.last_cmd = Some(cmd);
        self.sample_index += 1;

        if self.sample_index >= traj.len() {
            self.report.window_complete = true;
            self.state.current_waypoint_index += self.params.stride;
            self.mode = ReplanMode::Windowing;
        }

        Ok(true)
    }

    /// Mode terminal.
    ///
    /// No command is produced. The caller must issue the final hold command.
    fn mode_terminal(&mut self) -> Result<bool, ReplanError> {
        self.report.terminal = true;
        self.traj = None;

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::refine::{IdentityRefiner, RefineError};
    use crate::traj::Poly;

    fn waypoints(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| {
                let i = i as f64;
                Waypoint::new(i, 0.5 * i, 1.0 + 0.1 * i, 0.01 * i)
            })
            .collect()
    }

    fn params(window_size: usize, stride: usize) -> Params {
        Params {
            poly_order: 5,
            window_size,
            stride,
            window_duration_s: 0.3,
            output_rate_hz: 100.0,
            fit_samples: 50,
            // Generous so the tests never depend on scheduling
            fit_deadline_s: Some(10.0),
            ..Default::default()
        }
    }

    /// Run the controller to completion, returning every output and report.
    fn run(ctrl: &mut ReplanCtrl) -> Vec<(Option<RefCmd>, StatusReport)> {
        let mut out = Vec::new();
        for _ in 0..10_000 {
            let r = ctrl.proc(&()).unwrap();
            let terminal = r.1.terminal;
            out.push(r);
            if terminal {
                break;
            }
        }
        out
    }

    #[test]
    fn test_terminal_condition() {
        let mut ctrl = ReplanCtrl::new(params(4, 4)).unwrap();
        ctrl.begin_sequence(waypoints(10)).unwrap();

        let out = run(&mut ctrl);

        let starts: Vec<usize> = out.iter().filter_map(|(_, r)| r.fit_duration_s.and(r.window_start)).collect();
        assert_eq!(starts, vec![0, 4]);
        assert_eq!(ctrl.num_windows(), 2);
        assert!(ctrl.is_finished());
        assert_eq!(ctrl.unconsumed_waypoints(), 2);
        assert_eq!(ctrl.state().current_waypoint_index, 8);

        // One command per sample, then nothing once terminal
        let cmds = out.iter().filter(|(c, _)| c.is_some()).count();
        assert_eq!(cmds, 2 * ctrl.params().sample_count());
        assert!(out.last().unwrap().0.is_none());
    }

    #[test]
    fn test_overlap_continuity() {
        let wps = waypoints(8);
        let mut ctrl = ReplanCtrl::new(params(4, 2)).unwrap();
        ctrl.begin_sequence(wps.clone()).unwrap();

        // First window
        ctrl.proc(&()).unwrap();
        let first = ctrl.window().unwrap().clone();

        // Publish the rest of the first window, then the next tick fits the second
        for _ in 1..ctrl.params().sample_count() {
            ctrl.proc(&()).unwrap();
        }
        let (_, report) = ctrl.proc(&()).unwrap();
        let second = ctrl.window().unwrap().clone();

        assert_eq!(report.window_start, Some(2));
        assert_eq!(first.overlap_with(&second), 2);
        assert_eq!(first.waypoints()[2..], second.waypoints()[..2]);
        assert_eq!(second.waypoints(), &wps[2..6]);

        // The new window starts at its first waypoint, one waypoint back from where the previous
        // one ended
        let gap = report.boundary_pos_gap_m.unwrap();
        let expected = norm(&[wps[3][0], wps[3][1], wps[3][2]], &[wps[2][0], wps[2][1], wps[2][2]])
            .unwrap();
        assert!((gap - expected).abs() < 1e-6);
    }

    #[test]
    fn test_publishes_window_in_order() {
        let wps = waypoints(4);
        let mut ctrl = ReplanCtrl::new(params(4, 3)).unwrap();
        ctrl.begin_sequence(wps.clone()).unwrap();

        let out = run(&mut ctrl);
        let cmds: Vec<RefCmd> = out.iter().filter_map(|(c, _)| *c).collect();

        assert_eq!(cmds.len(), ctrl.params().sample_count());
        for (cmd, wp) in [(cmds[0], wps[0]), (*cmds.last().unwrap(), wps[3])].iter() {
            assert!((cmd.x_m - wp[0]).abs() < 1e-6);
            assert!((cmd.y_m - wp[1]).abs() < 1e-6);
            assert!((cmd.z_m - wp[2]).abs() < 1e-6);
            assert!((cmd.yaw_rad - wp[3]).abs() < 1e-6);
        }
        assert_eq!(cmds.last().unwrap().jx_msss, 0.0);
        assert_eq!(ctrl.last_cmd(), cmds.last().copied());
    }

    #[test]
    fn test_deadline_hold() {
        let mut p = params(4, 2);
        p.fit_deadline_s = Some(0.0);
        let mut ctrl = ReplanCtrl::new(p).unwrap();
        ctrl.begin_sequence(waypoints(6)).unwrap();

        // Nothing has been published yet so there is nothing to hold
        let (cmd, report) = ctrl.proc(&()).unwrap();
        assert!(report.deadline_missed);
        assert!(cmd.is_none());

        // The fitted window is published from the next tick
        let (cmd, report) = ctrl.proc(&()).unwrap();
        assert!(!report.deadline_missed);
        let first = cmd.unwrap();

        for _ in 2..ctrl.params().sample_count() {
            ctrl.proc(&()).unwrap();
        }
        let (last, report) = ctrl.proc(&()).unwrap();
        assert!(report.window_complete);
        let last = last.unwrap();
        assert_ne!(first, last);

        // The second window misses its deadline too, so the last command is held
        let (cmd, report) = ctrl.proc(&()).unwrap();
        assert!(report.deadline_missed);
        assert_eq!(cmd, Some(last));
        assert_eq!(report.window_start, Some(2));
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            ReplanCtrl::new(params(4, 5)),
            Err(ReplanError::InvalidParams(_))
        ));
        assert!(matches!(
            ReplanCtrl::new(params(1, 1)),
            Err(ReplanError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_sequence_already_loaded() {
        let mut ctrl = ReplanCtrl::new(params(4, 4)).unwrap();
        ctrl.begin_sequence(waypoints(10)).unwrap();
        assert!(matches!(
            ctrl.begin_sequence(waypoints(10)),
            Err(ReplanError::SequenceAlreadyLoaded)
        ));

        ctrl.abort();
        assert_eq!(ctrl.mode(), ReplanMode::Idle);
        assert!(ctrl.proc(&()).unwrap().0.is_none());
        assert!(ctrl.begin_sequence(waypoints(10)).is_ok());
    }

    #[test]
    fn test_short_sequence_is_terminal() {
        let mut ctrl = ReplanCtrl::new(params(4, 2)).unwrap();
        ctrl.begin_sequence(waypoints(3)).unwrap();

        let (cmd, report) = ctrl.proc(&()).unwrap();
        assert!(cmd.is_none());
        assert!(report.terminal);
        assert_eq!(ctrl.num_windows(), 0);
        assert_eq!(ctrl.unconsumed_waypoints(), 3);
    }

    #[test]
    fn test_not_initialised() {
        let mut ctrl = ReplanCtrl::default();
        assert!(matches!(
            ctrl.begin_sequence(waypoints(4)),
            Err(ReplanError::NotInitialised)
        ));
    }

    struct Offset(f64);

    impl Refiner for Offset {
        fn refine(&self, segments: &[Segment], config_id: u32) -> Result<Vec<Segment>, RefineError> {
            if config_id != 7 {
                return Err(RefineError::UnknownConfig(config_id));
            }

            Ok(segments
                .iter()
                .map(|s| {
                    let mut s = s.clone();
                    let mut c = s.axes[0].coeffs.clone();
                    if let Some(last) = c.last_mut() {
                        *last += self.0;
                    }
                    s.axes[0] = Poly::new(c);
                    s
                })
                .collect())
        }
    }

    #[test]
    fn test_refiner_applied() {
        let wps = waypoints(4);
        let mut p = params(4, 3);
        p.config_id = 7;

        let mut ctrl = ReplanCtrl::new(p).unwrap().with_refiner(Box::new(Offset(0.5)));
        ctrl.begin_sequence(wps.clone()).unwrap();
        let (cmd, _) = ctrl.proc(&()).unwrap();
        assert!((cmd.unwrap().x_m - (wps[0][0] + 0.5)).abs() < 1e-6);

        let mut ctrl = ReplanCtrl::new(params(4, 3))
            .unwrap()
            .with_refiner(Box::new(IdentityRefiner));
        ctrl.begin_sequence(wps.clone()).unwrap();
        let (cmd, _) = ctrl.proc(&()).unwrap();
        assert!((cmd.unwrap().x_m - wps[0][0]).abs() < 1e-6);
    }

    #[test]
    fn test_no_partial_state_on_failure() {
        // The refiner rejects config 0, so the first fit fails
        let mut ctrl = ReplanCtrl::new(params(4, 3))
            .unwrap()
            .with_refiner(Box::new(Offset(0.5)));
        ctrl.begin_sequence(waypoints(8)).unwrap();

        assert!(matches!(
            ctrl.proc(&()),
            Err(ReplanError::Refine(RefineError::UnknownConfig(0)))
        ));
        assert!(ctrl.state().segments.is_empty());
        assert_eq!(ctrl.state().current_waypoint_index, 0);
        assert_eq!(ctrl.num_windows(), 0);
        assert!(ctrl.window().is_none());
        assert!(ctrl.last_cmd().is_none());
    }
}
