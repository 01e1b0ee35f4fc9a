use crate::error::{Error, Result};

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Number;

use std::collections::HashMap;

/// A single value from a perf dump section.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum CounterValue {
    Scalar(Number),
    Latency(LatencyRecord),
    // histograms and anything else we don't report
    Other(IgnoredAny),
}

/// Cumulative count of operations and the sum of their latencies, in seconds.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct LatencyRecord {
    pub avgcount: f64,
    pub sum: f64,
}

/// The full counter dump of one daemon, keyed by section then counter name.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    sections: HashMap<String, HashMap<String, CounterValue>>,
}

impl Snapshot {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn section<'a>(&'a self, key: &'a str) -> Result<Section<'a>> {
        self.sections
            .get(key)
            .map(|counters| Section { key, counters })
            .ok_or_else(|| Error::MissingSection(key.to_string()))
    }
}

/// The counters of one section, eg `client.rgw.a`.
pub struct Section<'a> {
    key: &'a str,
    counters: &'a HashMap<String, CounterValue>,
}

impl<'a> Section<'a> {
    fn get(&self, name: &str) -> Result<&'a CounterValue> {
        self.counters
            .get(name)
            .ok_or_else(|| Error::MissingCounter {
                section: self.key.to_string(),
                counter: name.to_string(),
            })
    }

    fn shape(&self, name: &str, expected: &'static str) -> Error {
        Error::UnexpectedShape {
            section: self.key.to_string(),
            counter: name.to_string(),
            expected,
        }
    }

    pub fn scalar(&self, name: &str) -> Result<&'a Number> {
        match self.get(name)? {
            CounterValue::Scalar(n) => Ok(n),
            _ => Err(self.shape(name, "scalar")),
        }
    }

    pub fn latency(&self, name: &str) -> Result<LatencyRecord> {
        match self.get(name)? {
            CounterValue::Latency(record) => Ok(*record),
            _ => Err(self.shape(name, "latency record")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "AsyncMessenger::Worker-0": {
            "msgr_recv_messages": 1234,
            "msgr_running_total_time": 12.5
        },
        "client.rgw.a": {
            "req": 10,
            "failed_req": 0,
            "qlen": 0,
            "get_b": 1048576,
            "get_initial_lat": {
                "avgcount": 5,
                "sum": 2.5,
                "avgtime": 0.5
            },
            "lat_histogram": {
                "axes": [],
                "values": []
            },
            "ratio": 0.25
        }
    }"#;

    #[test]
    fn parses_perf_dump() {
        let snapshot = Snapshot::from_slice(DUMP.as_bytes()).unwrap();
        let section = snapshot.section("client.rgw.a").unwrap();

        assert_eq!(section.scalar("req").unwrap().to_string(), "10");
        assert_eq!(section.scalar("get_b").unwrap().to_string(), "1048576");
        assert_eq!(section.scalar("ratio").unwrap().to_string(), "0.25");
        assert_eq!(
            section.latency("get_initial_lat").unwrap(),
            LatencyRecord {
                avgcount: 5.0,
                sum: 2.5
            }
        );
    }

    #[test]
    fn missing_section() {
        let snapshot = Snapshot::from_slice(DUMP.as_bytes()).unwrap();

        assert!(matches!(
            snapshot.section("client.rgw.b"),
            Err(Error::MissingSection(key)) if key == "client.rgw.b"
        ));
    }

    #[test]
    fn missing_counter() {
        let snapshot = Snapshot::from_slice(DUMP.as_bytes()).unwrap();
        let section = snapshot.section("client.rgw.a").unwrap();

        assert!(matches!(
            section.scalar("cache_hit"),
            Err(Error::MissingCounter { counter, .. }) if counter == "cache_hit"
        ));
        assert!(matches!(
            section.latency("put_initial_lat"),
            Err(Error::MissingCounter { .. })
        ));
    }

    #[test]
    fn unexpected_shapes() {
        let snapshot = Snapshot::from_slice(DUMP.as_bytes()).unwrap();
        let section = snapshot.section("client.rgw.a").unwrap();

        assert!(matches!(
            section.scalar("get_initial_lat"),
            Err(Error::UnexpectedShape { .. })
        ));
        assert!(matches!(
            section.latency("req"),
            Err(Error::UnexpectedShape { .. })
        ));
        assert!(matches!(
            section.scalar("lat_histogram"),
            Err(Error::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn malformed() {
        assert!(Snapshot::from_slice(b"").is_err());
        assert!(Snapshot::from_slice(b"admin_socket: exception").is_err());
        assert!(Snapshot::from_slice(b"[1, 2, 3]").is_err());
        assert!(Snapshot::from_slice(br#"{"client.rgw.a": 1}"#).is_err());
    }
}
