//! Discovery of gateway instances from their admin sockets.
//!
//! Each running gateway exposes an admin socket named after the daemon, eg
//! `/var/run/ceph/ceph-client.rgw.a.asok`. The second and third dot-separated
//! tokens of the file name are the instance type (`rgw`) and id (`a`).

use crate::config::Config;
use crate::error::{Error, Result};

use glob::Pattern;
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

/// A locally running gateway process.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instance {
    kind: String,
    id: String,
    socket: PathBuf,
}

impl Instance {
    pub fn new(kind: &str, id: &str, socket: impl Into<PathBuf>) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
            socket: socket.into(),
        }
    }

    /// Instance type, eg `rgw` or `rwb`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Key of this instance's section in a perf dump, eg `client.rgw.a`.
    pub fn section(&self, prefix: &str) -> String {
        format!("{prefix}.{}.{}", self.kind, self.id)
    }
}

/// Splits a socket file name into instance type and id.
pub struct NamingConvention {
    regex: Regex,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            regex: Regex::new(r"^[^.]*\.(?P<kind>[^.]+)\.(?P<id>[^.]+)(?:\..*)?$")
                .expect("naming convention regex is valid"),
        }
    }
}

impl NamingConvention {
    /// Returns `None` for file names with fewer than three dot-separated
    /// tokens.
    pub fn parse(&self, file_name: &str) -> Option<(String, String)> {
        let captures = self.regex.captures(file_name)?;

        Some((captures["kind"].to_string(), captures["id"].to_string()))
    }
}

pub struct Discovery {
    dir: PathBuf,
    pattern: Pattern,
    naming: NamingConvention,
}

impl Discovery {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_pattern(
            config.general().socket_dir(),
            config.general().socket_pattern(),
        )
    }

    pub fn with_pattern(dir: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let glob = Pattern::new(pattern).map_err(|source| Error::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            dir: dir.into(),
            pattern: glob,
            naming: NamingConvention::default(),
        })
    }

    /// Lists the instances whose sockets are currently present, ordered by
    /// socket path.
    pub fn instances(&self) -> Result<Vec<Instance>> {
        if !self.dir.is_dir() {
            debug!("socket directory {:?} does not exist", self.dir);
            return Ok(Vec::new());
        }

        let mut instances = Vec::new();

        let entries = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.dir).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory loop"));
                Error::io(source, path)
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                continue;
            };

            if !self.pattern.matches(name) {
                continue;
            }

            match self.naming.parse(name) {
                Some((kind, id)) => instances.push(Instance::new(&kind, &id, entry.path())),
                None => warn!("skipping socket with unexpected name: {:?}", entry.path()),
            }
        }

        debug!("discovered {} instance(s) in {:?}", instances.len(), self.dir);

        Ok(instances)
    }
}
