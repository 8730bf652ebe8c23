//! Main replanning executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and parameters
//!     - Generate the reference waypoints
//!     - Main loop, one cycle per output sample:
//!         - Replanning control processing
//!         - Send the reference command to the actuation sink
//!         - Sleep for the remainder of the cycle
//!     - Once no more windows remain, hold at the last published position
//!
//! # Usage
//!
//! `replan_exec [curve_params.toml]`, the curve parameter file defaulting to `lissajous.toml`.
//! Both parameter files are looked up in `$REPLAN_SW_ROOT/params`.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::eqpt::RefCmdSink;
use replan_lib::{
    curve::LissajousParams,
    refine::IdentityRefiner,
    replan::{ReplanCtrl, ReplanError},
    traj::TrajError,
};

mod archive_sink;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::Instant;

// Internal
use archive_sink::ArchiveSink;
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default curve parameter file.
const DEFAULT_CURVE_PARAMS: &str = "lissajous.toml";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("replan_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger. Per-sample output from the controller is only wanted when explicitly
    // debugging.
    logger_init(
        LevelFilter::Trace,
        &[("replan_lib::replan::state", LevelFilter::Debug)],
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    info!("Trajectory Replanning Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- ARGUMENTS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let curve_params_file = match args.len() {
        1 => DEFAULT_CURVE_PARAMS.to_string(),
        2 => args[1].clone(),
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut replan_ctrl = ReplanCtrl::default().with_refiner(Box::new(IdentityRefiner));
    replan_ctrl
        .init("replan_ctrl.toml", &session)
        .wrap_err("Failed to initialise ReplanCtrl")?;
    info!("ReplanCtrl init complete: {:#?}", replan_ctrl.params());

    let curve_params: LissajousParams = util::params::load(&curve_params_file)
        .wrap_err_with(|| format!("Could not load curve params from {}", curve_params_file))?;

    let waypoints = curve_params.generate_waypoints();
    info!("Generated {} waypoints", waypoints.len());

    let mut sink = ArchiveSink::new(&session)?;
    let mut window_archiver = Archiver::from_path(&session, "replan_windows.csv")
        .map_err(|e| eyre!("Could not create the window archive: {}", e))?;

    info!("Module initialisation complete\n");

    replan_ctrl
        .begin_sequence(waypoints)
        .wrap_err("Failed to begin the waypoint sequence")?;

    // ---- MAIN LOOP ----

    let cycle_period = replan_ctrl.params().cycle_period();
    let mut num_cycles: u64 = 0;
    let mut num_deadline_misses: u64 = 0;

    info!("Beginning main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- REPLANNING ----

        let (cmd, report) = match replan_ctrl.proc(&()) {
            Ok(o) => o,
            Err(ReplanError::Traj(e @ TrajError::OutOfRange { .. })) => {
                raise_error!("Sampling invariant violated: {}", e)
            }
            Err(e) => return Err(e).wrap_err("Replanning failed"),
        };

        if report.deadline_missed {
            num_deadline_misses += 1;
        }

        if report.fit_duration_s.is_some() {
            if let Err(e) = window_archiver.serialise(&report) {
                warn!("Could not archive the window report: {}", e);
            }
        }

        if report.terminal {
            break;
        }

        // ---- ACTUATION ----

        if let Some(cmd) = cmd {
            if let Err(e) = sink.send_cmd(&cmd) {
                warn!("Could not send the reference command: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        num_cycles += 1;
    }

    // ---- STABILISATION ----

    match replan_ctrl.last_cmd() {
        Some(last) => sink
            .hold_position(last.position_m(), last.yaw_rad)
            .wrap_err("Failed to send the final hold command")?,
        None => warn!("No command was published, nothing to hold"),
    }

    // ---- SHUTDOWN ----

    info!(
        "Published {} commands over {} windows in {} cycles, {} deadline misses",
        sink.num_cmds(),
        replan_ctrl.num_windows(),
        num_cycles,
        num_deadline_misses
    );
    info!("End of execution");

    Ok(())
}
