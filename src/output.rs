//! Flat file output consumed by the monitoring agent.
//!
//! Every metric is a file holding a single value and nothing else:
//!
//! - `<dir>/<type>.<counter>` the reported value
//! - `<dir>/last_<type>.<counter>` the raw latency state from the previous run

use crate::error::{Error, Result};

use tempfile::NamedTempFile;
use tracing::trace;

use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Output {
    dir: PathBuf,
}

impl Output {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn metric_path(&self, kind: &str, name: &str) -> PathBuf {
        self.dir.join(format!("{kind}.{name}"))
    }

    pub fn state_path(&self, kind: &str, name: &str) -> PathBuf {
        self.dir.join(format!("last_{kind}.{name}"))
    }
}

/// Replace the contents of `path` with `value`.
///
/// The value is written to a temporary file next to the destination and
/// renamed into place, so readers see either the old or the new value.
pub fn write_value(path: &Path, value: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(e, dir))?;

    file.write_all(value.as_bytes())
        .map_err(|e| Error::io(e, file.path()))?;

    // temporary files are created owner-only, the monitoring agent usually
    // runs as another user
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::io(e, file.path()))?;
    }

    file.persist(path).map_err(|e| Error::io(e.error, path))?;

    trace!("{:?} = {value}", path);

    Ok(())
}

/// Render a float the way the monitoring agent has always received them:
/// shortest round-trip digits, keeping a trailing `.0` for whole numbers and
/// switching to `1e+16` / `1e-05` exponent form outside `[1e-4, 1e16)`.
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();

    if !value.is_finite() {
        format!("{value}")
    } else if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let exp = format!("{value:e}");

        match exp.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => exp,
        }
    } else if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
