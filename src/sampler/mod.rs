use crate::error::{Error, Result};

use tracing::debug;

use std::path::Path;
use std::process::{Command, Stdio};

mod snapshot;

pub use snapshot::{LatencyRecord, Snapshot};

/// A source of perf counter dumps for a daemon admin socket.
pub trait CounterSource {
    fn perf_dump(&self, socket: &Path) -> Result<Snapshot>;
}

/// Dumps counters by running the admin CLI against the socket:
///
/// `<program> --format json --admin-daemon <socket> perf dump`
pub struct AdminCommand {
    program: String,
}

impl AdminCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl CounterSource for AdminCommand {
    fn perf_dump(&self, socket: &Path) -> Result<Snapshot> {
        debug!("dumping perf counters from {:?}", socket);

        let output = Command::new(&self.program)
            .args(["--format", "json", "--admin-daemon"])
            .arg(socket)
            .args(["perf", "dump"])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::Command {
                command: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Snapshot::from_slice(&output.stdout).map_err(|source| Error::Parse {
            path: socket.to_path_buf(),
            source,
        })
    }
}
