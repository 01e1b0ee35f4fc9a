use super::*;

use std::collections::HashSet;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Counters {
    #[serde(default = "monitored")]
    monitored: Vec<String>,
    #[serde(default = "latency")]
    latency: Vec<LatencyCounter>,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            monitored: monitored(),
            latency: latency(),
        }
    }
}

impl Counters {
    pub fn check(&self) -> Result<()> {
        for name in self.monitored() {
            check_name("monitored", name)?;
        }

        let mut seen = HashSet::new();

        for counter in self.latency() {
            check_name("latency", &counter.name)?;

            if !seen.insert(counter.name.as_str()) {
                return Err(Error::Config(format!(
                    "latency counter `{}` is listed more than once",
                    counter.name
                )));
            }
        }

        Ok(())
    }

    /// Counters written verbatim, one file each.
    pub fn monitored(&self) -> &[String] {
        &self.monitored
    }

    pub fn latency(&self) -> &[LatencyCounter] {
        &self.latency
    }

    /// Latency counters tracked for instances of the given type.
    pub fn latency_for<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a LatencyCounter> {
        self.latency.iter().filter(move |c| c.applies_to(kind))
    }
}

/// A `{avgcount, sum}` counter which is reported as the average latency over
/// the interval between two runs.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LatencyCounter {
    name: String,
    // instance types exposing this counter, empty means all of them
    #[serde(default)]
    types: Vec<String>,
}

impl LatencyCounter {
    pub fn new(name: &str, types: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            types,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applies_to(&self, kind: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_latency_is_rgw_only() {
        let counters = Counters::default();

        let rgw: Vec<&str> = counters.latency_for("rgw").map(|c| c.name()).collect();
        let rwb: Vec<&str> = counters.latency_for("rwb").map(|c| c.name()).collect();

        assert_eq!(rgw, ["get_initial_lat", "put_initial_lat"]);
        assert_eq!(rwb, ["get_initial_lat"]);
    }

    #[test]
    fn duplicate_latency_counter() {
        let counters = Counters {
            monitored: Vec::new(),
            latency: vec![
                LatencyCounter::new("get_initial_lat", Vec::new()),
                LatencyCounter::new("get_initial_lat", vec!["rgw".into()]),
            ],
        };

        assert!(counters.check().is_err());
    }
}
