//! Average latency over the interval between two runs.
//!
//! Latency counters are cumulative: the daemon reports how many operations it
//! has completed (`avgcount`) and the total time they took (`sum`). Keeping the
//! raw pair from the previous run lets each run report the mean latency of
//! only the operations that completed since then, however long ago that was.

use crate::error::{Error, Result};
use crate::output::{format_float, write_value};
use crate::sampler::LatencyRecord;

use tracing::{info, warn};

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

/// Cumulative `(count, sum)` pair persisted between runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeltaState {
    pub count: f64,
    pub sum: f64,
}

impl DeltaState {
    pub fn new(count: f64, sum: f64) -> Self {
        Self { count, sum }
    }

    /// Read the state left by the previous run. A missing file means there
    /// was no previous run. An unreadable one is discarded so that this run
    /// re-baselines.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(e, path)),
        };

        match content.parse() {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("discarding latency state in {:?}: {e}", path);
                Ok(None)
            }
        }
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        write_value(path, &self.to_string())
    }

    /// Compare against the state from the previous run.
    pub fn since(&self, last: Option<DeltaState>) -> Outcome {
        let Some(last) = last else {
            return Outcome::Bootstrap;
        };

        let count = self.count - last.count;
        let sum = self.sum - last.sum;

        if count > 0.0 {
            Outcome::Latency(round(sum / count, 3))
        } else if count < 0.0 {
            Outcome::Reset
        } else {
            Outcome::Idle
        }
    }
}

impl From<LatencyRecord> for DeltaState {
    fn from(record: LatencyRecord) -> Self {
        Self::new(record.avgcount, record.sum)
    }
}

impl fmt::Display for DeltaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_float(self.count), format_float(self.sum))
    }
}

#[derive(Debug, PartialEq)]
pub struct ParseStateError(String);

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeltaState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut fields = s.split_whitespace().map(|f| {
            f.parse::<f64>()
                .map_err(|e| ParseStateError(format!("invalid field `{f}`: {e}")))
        });

        match (fields.next(), fields.next(), fields.next()) {
            (Some(count), Some(sum), None) => Ok(Self::new(count?, sum?)),
            _ => Err(ParseStateError(format!(
                "expected `<count> <sum>`, found `{}`",
                s.trim()
            ))),
        }
    }
}

/// What a run reports for one latency counter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// No previous state, nothing to compare against yet.
    Bootstrap,
    /// Mean latency of the operations completed during the interval.
    Latency(f64),
    /// No operations completed during the interval.
    Idle,
    /// The count went backwards, the daemon restarted.
    Reset,
}

impl Outcome {
    /// File content for this outcome, `0` unless there is a latency to report.
    pub fn value(&self) -> String {
        match self {
            Self::Latency(latency) => format_float(*latency),
            _ => "0".to_string(),
        }
    }
}

/// Report the latency since the state in `state_path` to `output_path`, then
/// replace the state with `current`.
///
/// The state is replaced whatever the outcome, so after a counter reset the
/// next run measures from the new baseline.
pub fn compute_and_persist(
    current: DeltaState,
    state_path: &Path,
    output_path: &Path,
) -> Result<Outcome> {
    let last = DeltaState::load(state_path)?;
    let outcome = current.since(last);

    if outcome == Outcome::Reset {
        info!(
            "counter reset detected for {:?}, re-baselining",
            output_path.file_name().unwrap_or_default()
        );
    }

    write_value(output_path, &outcome.value())?;
    current.store(state_path)?;

    Ok(outcome)
}

/// Round to `places` decimals based on the exact binary value, so `1.2345`
/// (stored just below the tie) becomes `1.234`.
fn round(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    struct Paths {
        _dir: tempfile::TempDir,
        state: PathBuf,
        output: PathBuf,
    }

    fn paths() -> Paths {
        let dir = tempfile::tempdir().unwrap();

        Paths {
            state: dir.path().join("last_rgw.get_initial_lat"),
            output: dir.path().join("rgw.get_initial_lat"),
            _dir: dir,
        }
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn outcomes() {
        let last = Some(DeltaState::new(100.0, 50.0));

        assert_eq!(DeltaState::new(150.0, 80.0).since(last), Outcome::Latency(0.6));
        assert_eq!(DeltaState::new(100.0, 50.0).since(last), Outcome::Idle);
        assert_eq!(DeltaState::new(100.0, 55.0).since(last), Outcome::Idle);
        assert_eq!(DeltaState::new(3.0, 0.2).since(last), Outcome::Reset);
        assert_eq!(DeltaState::new(3.0, 0.2).since(None), Outcome::Bootstrap);
    }

    #[test]
    fn rounds_to_three_places() {
        let last = Some(DeltaState::new(0.0, 0.0));

        assert_eq!(DeltaState::new(3.0, 1.0).since(last), Outcome::Latency(0.333));
        assert_eq!(DeltaState::new(3.0, 2.0).since(last), Outcome::Latency(0.667));
        assert_eq!(
            DeltaState::new(7.0, 0.0001).since(last),
            Outcome::Latency(0.0)
        );
    }

    #[test]
    fn rounding_follows_binary_value() {
        assert_eq!(round(1.2345, 3), 1.234);
        assert_eq!(round(0.1235, 3), 0.123);
        assert_eq!(round(0.0045, 3), 0.004);
        assert_eq!(round(1.0005, 3), 1.0);
        assert_eq!(round(0.6, 3), 0.6);
        assert_eq!(round(2.0 / 3.0, 3), 0.667);

        // 10 ops totalling 12.345s
        let last = Some(DeltaState::new(0.0, 0.0));
        let outcome = DeltaState::new(10.0, 12.345).since(last);

        assert_eq!(outcome, Outcome::Latency(1.234));
        assert_eq!(outcome.value(), "1.234");
    }

    #[test]
    fn outcome_values() {
        assert_eq!(Outcome::Bootstrap.value(), "0");
        assert_eq!(Outcome::Idle.value(), "0");
        assert_eq!(Outcome::Reset.value(), "0");
        assert_eq!(Outcome::Latency(0.6).value(), "0.6");
        assert_eq!(Outcome::Latency(1.0).value(), "1.0");
    }

    #[test]
    fn state_text() {
        assert_eq!(DeltaState::new(5.0, 2.5).to_string(), "5.0 2.5");
        assert_eq!("5.0 2.5".parse(), Ok(DeltaState::new(5.0, 2.5)));
        assert_eq!("5 2.5\n".parse(), Ok(DeltaState::new(5.0, 2.5)));
        assert!("5.0".parse::<DeltaState>().is_err());
        assert!("5.0 2.5 1".parse::<DeltaState>().is_err());
        assert!("five 2.5".parse::<DeltaState>().is_err());
        assert!("".parse::<DeltaState>().is_err());
    }

    #[test]
    fn bootstrap() {
        let paths = paths();

        let outcome =
            compute_and_persist(DeltaState::new(150.0, 80.0), &paths.state, &paths.output)
                .unwrap();

        assert_eq!(outcome, Outcome::Bootstrap);
        assert_eq!(read(&paths.output), "0");
        assert_eq!(read(&paths.state), "150.0 80.0");
    }

    #[test]
    fn interval() {
        let paths = paths();
        std::fs::write(&paths.state, "100.0 50.0").unwrap();

        let outcome =
            compute_and_persist(DeltaState::new(150.0, 80.0), &paths.state, &paths.output)
                .unwrap();

        assert_eq!(outcome, Outcome::Latency(0.6));
        assert_eq!(read(&paths.output), "0.6");
        assert_eq!(read(&paths.state), "150.0 80.0");
    }

    #[test]
    fn unchanged_counters() {
        let paths = paths();
        std::fs::write(&paths.state, "100.0 50.0").unwrap();

        let outcome =
            compute_and_persist(DeltaState::new(100.0, 50.0), &paths.state, &paths.output)
                .unwrap();

        assert_eq!(outcome, Outcome::Idle);
        assert_eq!(read(&paths.output), "0");
        assert_eq!(read(&paths.state), "100.0 50.0");
    }

    #[test]
    fn reset_rebaselines() {
        let paths = paths();
        std::fs::write(&paths.state, "100.0 50.0").unwrap();

        let outcome =
            compute_and_persist(DeltaState::new(4.0, 1.0), &paths.state, &paths.output).unwrap();

        assert_eq!(outcome, Outcome::Reset);
        assert_eq!(read(&paths.output), "0");
        assert_eq!(read(&paths.state), "4.0 1.0");

        // the next interval is measured from the post-restart values
        let outcome =
            compute_and_persist(DeltaState::new(6.0, 2.0), &paths.state, &paths.output).unwrap();

        assert_eq!(outcome, Outcome::Latency(0.5));
        assert_eq!(read(&paths.output), "0.5");
    }

    #[test]
    fn corrupt_state_rebaselines() {
        let paths = paths();
        std::fs::write(&paths.state, "garbage").unwrap();

        let outcome =
            compute_and_persist(DeltaState::new(9.0, 6.5), &paths.state, &paths.output).unwrap();

        assert_eq!(outcome, Outcome::Bootstrap);
        assert_eq!(read(&paths.output), "0");
        assert_eq!(read(&paths.state), "9.0 6.5");
    }
}
