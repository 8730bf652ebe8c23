//! Actuation sink which archives commands instead of sending them to a vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::eyre, Report};
use log::info;

use comms_if::eqpt::{RefCmd, RefCmdSink, SinkError};
use util::{archive::Archiver, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Writes every published command to `ref_cmds.csv` and every hold to `holds.csv` in the
/// session's archive directory.
pub struct ArchiveSink {
    cmds: Archiver,
    holds: Archiver,
    num_cmds: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArchiveSink {
    pub fn new(session: &Session) -> Result<Self, Report> {
        let cmds = Archiver::from_path(session, "ref_cmds.csv")
            .map_err(|e| eyre!("Could not create the command archive: {}", e))?;
        let holds = Archiver::from_path(session, "holds.csv")
            .map_err(|e| eyre!("Could not create the hold archive: {}", e))?;

        Ok(Self {
            cmds,
            holds,
            num_cmds: 0,
        })
    }

    /// Number of commands archived so far.
    pub fn num_cmds(&self) -> u64 {
        self.num_cmds
    }
}

impl RefCmdSink for ArchiveSink {
    fn send_cmd(&mut self, cmd: &RefCmd) -> Result<(), SinkError> {
        self.cmds
            .serialise(cmd)
            .map_err(|e| SinkError::Rejected(e.to_string()))?;
        self.num_cmds += 1;

        Ok(())
    }

    fn hold_position(&mut self, position_m: [f64; 3], yaw_rad: f64) -> Result<(), SinkError> {
        info!(
            "Holding at ({:.3}, {:.3}, {:.3}) m, yaw {:.3} rad",
            position_m[0], position_m[1], position_m[2], yaw_rad
        );

        self.holds
            .serialise(&RefCmd::hold(position_m, yaw_rad))
            .map_err(|e| SinkError::Rejected(e.to_string()))
    }
}
