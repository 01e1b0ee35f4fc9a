use crate::config::Config;
use crate::discovery::{Discovery, Instance};
use crate::error::Result;
use crate::latency::{compute_and_persist, DeltaState};
use crate::output::{write_value, Output};
use crate::sampler::CounterSource;

use tracing::debug;

/// Samples every discovered instance once.
///
/// For each instance the monitored counters are written as-is and each
/// applicable latency counter is turned into the mean latency since the
/// previous run. Any error ends the run; files already written for earlier
/// instances are left in place.
pub struct Agent<S> {
    config: Config,
    discovery: Discovery,
    output: Output,
    source: S,
}

impl<S: CounterSource> Agent<S> {
    pub fn new(config: Config, source: S) -> Result<Self> {
        let discovery = Discovery::new(&config)?;
        let output = Output::new(config.general().output_dir());

        Ok(Self {
            config,
            discovery,
            output,
            source,
        })
    }

    /// Returns the number of instances sampled.
    pub fn run(&self) -> Result<usize> {
        let instances = self.discovery.instances()?;

        if instances.is_empty() {
            debug!(
                "no sockets matching {:?} in {:?}",
                self.config.general().socket_pattern(),
                self.config.general().socket_dir()
            );
        }

        for instance in &instances {
            self.sample(instance)?;
        }

        Ok(instances.len())
    }

    fn sample(&self, instance: &Instance) -> Result<()> {
        debug!("sampling {} instance {}", instance.kind(), instance.id());

        let snapshot = self.source.perf_dump(instance.socket())?;

        let key = instance.section(self.config.general().section_prefix());
        let section = snapshot.section(&key)?;

        let kind = instance.kind();

        for name in self.config.counters().monitored() {
            let value = section.scalar(name)?;

            write_value(&self.output.metric_path(kind, name), &value.to_string())?;
        }

        for counter in self.config.counters().latency_for(kind) {
            let name = counter.name();
            let current = DeltaState::from(section.latency(name)?);

            let outcome = compute_and_persist(
                current,
                &self.output.state_path(kind, name),
                &self.output.metric_path(kind, name),
            )?;

            debug!("{key} {name}: {outcome:?}");
        }

        Ok(())
    }
}
