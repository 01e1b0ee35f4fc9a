use crate::error::{Error, Result};

use serde::Deserialize;

use std::path::{Path, PathBuf};

mod counters;
mod general;
mod log;

pub use counters::{Counters, LatencyCounter};
pub use general::General;
pub use log::{Level, Log};

fn socket_dir() -> PathBuf {
    "/var/run/ceph".into()
}

fn socket_pattern() -> String {
    "ceph-client.*".into()
}

fn output_dir() -> PathBuf {
    "/tmp".into()
}

fn admin_command() -> String {
    "ceph".into()
}

fn section_prefix() -> String {
    "client".into()
}

fn monitored() -> Vec<String> {
    [
        "req",
        "failed_req",
        "get",
        "get_b",
        "put",
        "put_b",
        "qlen",
        "qactive",
        "cache_hit",
        "cache_miss",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn latency() -> Vec<LatencyCounter> {
    vec![
        LatencyCounter::new("get_initial_lat", Vec::new()),
        LatencyCounter::new("put_initial_lat", vec!["rgw".into()]),
    ]
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    general: General,
    #[serde(default)]
    counters: Counters,
    #[serde(default)]
    log: Log,
}

impl Config {
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("unable to open config file {path:?}: {e}")))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config file: {e}")))?;

        config.general.check()?;
        config.counters.check()?;

        Ok(config)
    }

    pub fn general(&self) -> &General {
        &self.general
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn log(&self) -> &Log {
        &self.log
    }
}

/// Counter names end up in output file names, so they must be a single path
/// component.
fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config(format!("{kind} counter name must not be empty")));
    }

    if name.contains('/') || name == "." || name == ".." {
        return Err(Error::Config(format!(
            "{kind} counter name `{name}` is not a valid file name"
        )));
    }

    Ok(())
}
